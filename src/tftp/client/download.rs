use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::Transferred;
use super::session::Session;
use crate::tftp::core::{BLOCK_SIZE, Convert, Mode, Packet, Socket, TransferError, TransferRequest};

/// Receiving side of a transfer (RRQ)
pub(crate) struct Download<S> {
    session: Session<S>,
    request: TransferRequest,
}

impl<S: Socket> Download<S> {
    pub fn new(session: Session<S>, filename: &str, mode: Mode) -> Self {
        Self {
            session,
            request: TransferRequest::read(filename, mode),
        }
    }

    /// Fetch the remote file into `local`. On any failure `local` is removed.
    pub fn run(mut self, local: &Path) -> Result<Transferred, TransferError> {
        log::debug!("Requesting {} ({})", self.request.filename(), self.request.mode());
        self.session.send(&self.request.packet())?;

        let mut file = PartialFile::create(local)?;
        let mut convert = Convert::new(self.request.mode());
        let mut expected: u16 = 1;
        let mut total = Transferred::default();

        loop {
            match self.session.receive()? {
                Packet::Data { block_num, data } => {
                    let last = data.len() < BLOCK_SIZE;

                    if block_num == expected {
                        file.write_all(&convert.incoming(&data))?;
                        self.session.send(&Packet::Ack(block_num))?;
                        log::debug!("Block {} ({} bytes) acknowledged", block_num, data.len());

                        total.bytes += data.len() as u64;
                        total.blocks += 1;
                        expected = expected.wrapping_add(1);
                    } else if last {
                        log::warn!(
                            "Final block {} arrived out of sequence, expected {}",
                            block_num,
                            expected
                        );
                    } else {
                        log::warn!(
                            "Received unexpected block {}, expected {}",
                            block_num,
                            expected
                        );
                    }

                    if last {
                        break;
                    }
                }
                Packet::Error { code, msg } => {
                    return Err(TransferError::Protocol { code, message: msg });
                }
                other => {
                    log::warn!("Received unexpected {} packet", other.kind());
                    self.session.spend_retry()?;
                }
            }
        }

        if let Some(b) = convert.finish() {
            file.write_all(&[b])?;
        }
        file.persist()?;

        log::debug!("Transfer complete. Total bytes: {}", total.bytes);
        Ok(total)
    }
}

/// Download destination that deletes itself unless the transfer completes
struct PartialFile {
    path: PathBuf,
    file: Option<File>,
    keep: bool,
}

impl PartialFile {
    fn create(path: &Path) -> Result<Self, TransferError> {
        let file = File::create(path).map_err(TransferError::local(path))?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
            keep: false,
        })
    }

    fn write_all(&mut self, data: &[u8]) -> Result<(), TransferError> {
        if let Some(file) = self.file.as_mut() {
            file.write_all(data).map_err(TransferError::local(&self.path))?;
        }
        Ok(())
    }

    fn persist(mut self) -> Result<(), TransferError> {
        if let Some(file) = self.file.take() {
            file.sync_all().map_err(TransferError::local(&self.path))?;
        }
        self.keep = true;
        Ok(())
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        // Close before removing
        self.file.take();
        if self.keep {
            return;
        }
        match fs::remove_file(&self.path) {
            Ok(()) => log::debug!("Removed partial file {}", self.path.display()),
            Err(e) => log::warn!("Failed to remove {}: {}", self.path.display(), e),
        }
    }
}

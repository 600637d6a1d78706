use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use super::Transferred;
use super::session::Session;
use crate::tftp::core::{
    BLOCK_SIZE, Mode, NetasciiReader, Packet, Socket, TransferError, TransferRequest,
};

/// Sending side of a transfer (WRQ)
pub(crate) struct Upload<S> {
    session: Session<S>,
    request: TransferRequest,
}

impl<S: Socket> Upload<S> {
    pub fn new(session: Session<S>, filename: &str, mode: Mode) -> Self {
        Self {
            session,
            request: TransferRequest::write(filename, mode),
        }
    }

    /// Send `local` to the server. The file is opened before anything goes
    /// on the wire, so a missing file never produces a WRQ.
    pub fn run(mut self, local: &Path) -> Result<Transferred, TransferError> {
        let file = match File::open(local) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(TransferError::FileNotFound(local.to_path_buf()));
            }
            Err(e) => return Err(TransferError::local(local)(e)),
        };
        let mut reader: Box<dyn Read> = match self.request.mode() {
            Mode::Octet => Box::new(file),
            Mode::Netascii => Box::new(NetasciiReader::new(file)),
        };

        // The WRQ is acknowledged as block 0
        log::debug!("Offering {} ({})", self.request.filename(), self.request.mode());
        self.session.send(&self.request.packet())?;
        self.await_ack(0)?;

        let mut block: u16 = 0;
        let mut total = Transferred::default();
        loop {
            let data = read_block(&mut reader).map_err(TransferError::local(local))?;
            let len = data.len();
            let block_num = block.wrapping_add(1);

            self.session.send(&Packet::Data { block_num, data })?;
            self.await_ack(block_num)?;
            log::debug!("Block {} ({} bytes) acknowledged", block_num, len);

            total.bytes += len as u64;
            total.blocks += 1;
            block = block_num;

            if len < BLOCK_SIZE {
                break;
            }
        }

        log::debug!("Transfer complete. Total bytes: {}", total.bytes);
        Ok(total)
    }

    /// Wait for the ACK of `block`, resending the buffered packet whenever
    /// something else shows up.
    fn await_ack(&mut self, block: u16) -> Result<(), TransferError> {
        loop {
            match self.session.receive()? {
                Packet::Ack(n) if n == block => return Ok(()),
                Packet::Error { code, msg } => {
                    return Err(TransferError::Protocol { code, message: msg });
                }
                Packet::Ack(n) => {
                    log::warn!("Unexpected ACK {}, expected {}. Resending...", n, block);
                }
                other => {
                    log::warn!(
                        "Unexpected {} packet while waiting for ACK {}. Resending...",
                        other.kind(),
                        block
                    );
                }
            }

            if !self.session.retransmit()? {
                return Err(TransferError::Unacknowledged {
                    block,
                    retries: self.session.retries(),
                });
            }
        }
    }
}

/// Read up to one full block, only stopping short at end of file
fn read_block(reader: &mut impl Read) -> io::Result<Vec<u8>> {
    let mut block = Vec::with_capacity(BLOCK_SIZE);
    reader.take(BLOCK_SIZE as u64).read_to_end(&mut block)?;
    Ok(block)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tftp::client::session::testing::*;
    use crate::tftp::core::ErrorCode;

    fn local_file(dir: &tempfile::TempDir, contents: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join("local.bin");
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn upload(socket: &ScriptedSocket, retries: u32, local: &Path) -> Result<Transferred, TransferError> {
        let session = Session::new(socket.clone(), addr(SERVER), retries);
        Upload::new(session, "remote.bin", Mode::Octet).run(local)
    }

    fn data_blocks(socket: &ScriptedSocket) -> Vec<(u16, usize)> {
        socket
            .sent_packets()
            .into_iter()
            .filter_map(|p| match p {
                Packet::Data { block_num, data } => Some((block_num, data.len())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn exact_block_file_sends_empty_trailer() {
        let dir = tempfile::tempdir().unwrap();
        let local = local_file(&dir, &[7u8; 512]);
        let socket = ScriptedSocket::default();
        socket
            .reply(PEER, Packet::Ack(0))
            .reply(PEER, Packet::Ack(1))
            .reply(PEER, Packet::Ack(2));

        let total = upload(&socket, 0, &local).unwrap();
        assert_eq!(total, Transferred { bytes: 512, blocks: 2 });

        let sent = socket.sent();
        assert_eq!(
            sent[0],
            (
                addr(SERVER),
                Packet::Wrq {
                    filename: "remote.bin".to_string(),
                    mode: Mode::Octet
                }
            )
        );
        assert_eq!(sent[1].0, addr(PEER));
        assert_eq!(data_blocks(&socket), vec![(1, 512), (2, 0)]);
    }

    #[test]
    fn blocks_are_numbered_in_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let local = local_file(&dir, &[1u8; 1300]);
        let socket = ScriptedSocket::default();
        for n in 0..=3 {
            socket.reply(PEER, Packet::Ack(n));
        }

        upload(&socket, 0, &local).unwrap();
        assert_eq!(data_blocks(&socket), vec![(1, 512), (2, 512), (3, 276)]);
    }

    #[test]
    fn block_numbers_wrap_after_65535() {
        let dir = tempfile::tempdir().unwrap();
        let local = local_file(&dir, &vec![9u8; 65536 * BLOCK_SIZE]);
        let socket = ScriptedSocket::default();
        socket.reply(PEER, Packet::Ack(0));
        for n in 1..=u16::MAX {
            socket.reply(PEER, Packet::Ack(n));
        }
        socket.reply(PEER, Packet::Ack(0)).reply(PEER, Packet::Ack(1));

        let total = upload(&socket, 0, &local).unwrap();
        assert_eq!(total.blocks, 65537);

        // Index 0 is the WRQ, index n is DATA(n) up to 65535
        assert_eq!(socket.sent_count(), 65538);
        let header = |index| match socket.sent_at(index) {
            Packet::Data { block_num, data } => (block_num, data.len()),
            other => panic!("unexpected packet {:?}", other),
        };
        assert_eq!(header(65535), (65535, BLOCK_SIZE));
        assert_eq!(header(65536), (0, BLOCK_SIZE));
        assert_eq!(header(65537), (1, 0));
    }

    #[test]
    fn missing_file_sends_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let socket = ScriptedSocket::default();

        let err = upload(&socket, 0, &dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, TransferError::FileNotFound(_)));
        assert!(socket.sent().is_empty());
    }

    #[test]
    fn wrong_ack_resends_same_block() {
        let dir = tempfile::tempdir().unwrap();
        let local = local_file(&dir, b"hello");
        let socket = ScriptedSocket::default();
        socket
            .reply(PEER, Packet::Ack(0))
            .reply(PEER, Packet::Ack(0))
            .reply(PEER, Packet::Ack(1));

        upload(&socket, 1, &local).unwrap();
        let data = Packet::Data {
            block_num: 1,
            data: b"hello".to_vec(),
        };
        assert_eq!(socket.sent_packets()[1..], [data.clone(), data]);
    }

    #[test]
    fn timeout_resends_buffered_block() {
        let dir = tempfile::tempdir().unwrap();
        let local = local_file(&dir, &[3u8; 600]);
        let socket = ScriptedSocket::default();
        socket
            .reply(PEER, Packet::Ack(0))
            .timeout()
            .reply(PEER, Packet::Ack(1))
            .reply(PEER, Packet::Ack(2));

        upload(&socket, 1, &local).unwrap();
        assert_eq!(data_blocks(&socket), vec![(1, 512), (1, 512), (2, 88)]);
    }

    #[test]
    fn wrong_acks_exhaust_budget() {
        let dir = tempfile::tempdir().unwrap();
        let local = local_file(&dir, b"x");
        let socket = ScriptedSocket::default();
        socket.reply(PEER, Packet::Ack(0));
        for _ in 0..3 {
            socket.reply(PEER, Packet::Ack(5));
        }

        let err = upload(&socket, 2, &local).unwrap_err();
        assert!(matches!(
            err,
            TransferError::Unacknowledged {
                block: 1,
                retries: 2
            }
        ));
    }

    #[test]
    fn unanswered_wrq_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let local = local_file(&dir, b"x");
        let socket = ScriptedSocket::default();

        let err = upload(&socket, 1, &local).unwrap_err();
        assert!(matches!(err, TransferError::Timeout { retries: 1 }));
        assert!(
            socket
                .sent_packets()
                .iter()
                .all(|p| matches!(p, Packet::Wrq { .. }))
        );
    }

    #[test]
    fn server_error_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let local = local_file(&dir, b"x");
        let socket = ScriptedSocket::default();
        socket.reply(
            PEER,
            Packet::Error {
                code: ErrorCode::FileExists,
                msg: Some("exists".to_string()),
            },
        );

        let err = upload(&socket, 0, &local).unwrap_err();
        assert!(matches!(
            err,
            TransferError::Protocol {
                code: ErrorCode::FileExists,
                ..
            }
        ));
    }

    #[test]
    fn netascii_upload() {
        let dir = tempfile::tempdir().unwrap();
        let local = local_file(&dir, b"a\nb");
        let socket = ScriptedSocket::default();
        socket.reply(PEER, Packet::Ack(0)).reply(PEER, Packet::Ack(1));

        let session = Session::new(socket.clone(), addr(SERVER), 0);
        Upload::new(session, "a.txt", Mode::Netascii)
            .run(&local)
            .unwrap();
        assert_eq!(
            socket.sent_packets()[1],
            Packet::Data {
                block_num: 1,
                data: b"a\r\nb".to_vec()
            }
        );
    }
}

use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::path::Path;

use super::Transferred;
use super::config::ClientConfig;
use super::download::Download;
use super::session::Session;
use super::upload::Upload;
use crate::tftp::core::TransferError;

/// TFTP client
///
/// Supports file upload (PUT) and download (GET) operations. Each call opens
/// its own socket and runs exactly one lock-step transfer.
///
/// # Example
///
/// ```rust,no_run
/// use tftpc::tftp::client::{Client, ClientConfig};
/// use std::path::Path;
///
/// let config = ClientConfig::new("192.168.1.100", 69);
/// let client = Client::new(config);
///
/// // Download file
/// client.get("remote.txt", Path::new("local.txt")).unwrap();
///
/// // Upload file
/// client.put(Path::new("local.txt"), "remote.txt").unwrap();
/// ```
#[derive(Debug)]
pub struct Client {
    config: ClientConfig,
}

impl Client {
    /// Create a new TFTP client
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    /// Download a file from the server (RRQ - Read Request)
    ///
    /// # Arguments
    ///
    /// * `remote_file` - File name on the server
    /// * `local_file` - Local save path, removed again if the transfer fails
    pub fn get(&self, remote_file: &str, local_file: &Path) -> Result<Transferred, TransferError> {
        log::info!("Downloading {} to {}", remote_file, local_file.display());

        let (socket, server_addr) = self.open()?;
        let session = Session::new(socket, server_addr, self.config.retries);
        let total = Download::new(session, remote_file, self.config.mode).run(local_file)?;

        log::info!(
            "Download complete: {} ({} bytes in {} blocks)",
            local_file.display(),
            total.bytes,
            total.blocks
        );
        Ok(total)
    }

    /// Upload a file to the server (WRQ - Write Request)
    ///
    /// # Arguments
    ///
    /// * `local_file` - Local file path, must exist
    /// * `remote_file` - File name on the server
    pub fn put(&self, local_file: &Path, remote_file: &str) -> Result<Transferred, TransferError> {
        log::info!("Uploading {} to {}", local_file.display(), remote_file);

        if !local_file.exists() {
            return Err(TransferError::FileNotFound(local_file.to_path_buf()));
        }

        let (socket, server_addr) = self.open()?;
        let session = Session::new(socket, server_addr, self.config.retries);
        let total = Upload::new(session, remote_file, self.config.mode).run(local_file)?;

        log::info!(
            "Upload complete: {} ({} bytes in {} blocks)",
            remote_file,
            total.bytes,
            total.blocks
        );
        Ok(total)
    }

    /// Resolve the server and bind an ephemeral local socket of the same family
    fn open(&self) -> Result<(UdpSocket, SocketAddr), TransferError> {
        let target = format!("{}:{}", self.config.server, self.config.port);
        let server_addr = (self.config.server.as_str(), self.config.port)
            .to_socket_addrs()
            .map_err(|_| TransferError::Resolve(target.clone()))?
            .next()
            .ok_or(TransferError::Resolve(target))?;

        let bind_addr = if server_addr.is_ipv4() {
            "0.0.0.0:0"
        } else {
            "[::]:0"
        };
        let socket = UdpSocket::bind(bind_addr).map_err(TransferError::Network)?;
        socket
            .set_read_timeout(Some(self.config.timeout))
            .map_err(TransferError::Network)?;
        socket
            .set_write_timeout(Some(self.config.timeout))
            .map_err(TransferError::Network)?;

        log::debug!(
            "Bound {} for server {}",
            socket.local_addr().map_err(TransferError::Network)?,
            server_addr
        );
        Ok((socket, server_addr))
    }
}

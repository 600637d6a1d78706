use std::io;
use std::path::PathBuf;

use thiserror::Error;

use super::packet::{ErrorCode, MalformedPacket};

/// Why a transfer stopped short. Every variant is terminal for the transfer.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("malformed packet: {0}")]
    Malformed(#[from] MalformedPacket),

    #[error("server error {code}{}", detail(.message))]
    Protocol {
        code: ErrorCode,
        message: Option<String>,
    },

    #[error("timed out waiting for a reply after {retries} retransmission(s)")]
    Timeout { retries: u32 },

    #[error("block {block} not acknowledged after {retries} retransmission(s)")]
    Unacknowledged { block: u16, retries: u32 },

    #[error("local file {} does not exist", .0.display())]
    FileNotFound(PathBuf),

    #[error("local file {}: {source}", .path.display())]
    LocalIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not resolve server address {0}")]
    Resolve(String),

    #[error("network error: {0}")]
    Network(#[source] io::Error),
}

impl TransferError {
    pub(crate) fn local(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| TransferError::LocalIo { path, source }
    }
}

fn detail(message: &Option<String>) -> String {
    match message {
        Some(msg) => format!(": {}", msg),
        None => String::new(),
    }
}

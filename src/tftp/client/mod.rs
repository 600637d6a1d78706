//! TFTP client implementation
//!
//! - `client`: Resolves the server, owns the socket, runs one transfer
//! - `session`: Peer tracking and retransmission shared by both directions
//! - `download`: Lock-step receive loop (RRQ)
//! - `upload`: Lock-step send loop (WRQ)
//! - `config`: Client configuration

#[allow(clippy::module_inception)]
mod client;
mod config;
mod download;
mod session;
mod upload;

pub use client::Client;
pub use config::{ClientConfig, DEFAULT_PORT};

/// What a completed transfer moved over the wire
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Transferred {
    /// DATA payload bytes
    pub bytes: u64,
    /// DATA blocks acknowledged, including a trailing empty one
    pub blocks: u64,
}

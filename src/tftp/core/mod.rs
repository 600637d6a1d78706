//! TFTP core protocol implementation
//!
//! This module contains the protocol vocabulary shared by both transfer directions:
//! - `packet`: Packet serialization and deserialization
//! - `request`: The RRQ/WRQ that opens a transfer
//! - `socket`: Socket abstraction layer
//! - `convert`: Netascii conversion
//! - `error`: Transfer error taxonomy

mod convert;
mod error;
mod packet;
mod request;
mod socket;

// Public core types
pub use convert::{Convert, NetasciiReader};
pub use error::TransferError;
pub use packet::{BLOCK_SIZE, ErrorCode, MAX_PACKET_SIZE, MalformedPacket, Mode, Packet};
pub use request::{Direction, TransferRequest};
pub use socket::{Socket, is_timeout};

//! tftpc - a lock-step TFTP client
//!
//! See [`tftp`] for the protocol implementation.

pub mod tftp;

//! TFTP (Trivial File Transfer Protocol) client
//!
//! Lock-step get/put over UDP, based on
//! [RFC 1350](https://www.rfc-editor.org/rfc/rfc1350) TFTP Protocol version 2.
//! Option negotiation (RFC 2347 and friends) is not supported; every block
//! is 512 bytes and only one block is in flight at a time.
//!
//! ## Module Structure
//!
//! ```text
//! tftp/
//! ├── core/           # Core protocol implementation
//! │   ├── packet      # Packet serialization/deserialization
//! │   ├── request     # RRQ/WRQ request description
//! │   ├── socket      # Socket abstraction layer
//! │   ├── convert     # Netascii conversion
//! │   └── error       # Transfer errors
//! │
//! └── client/         # TFTP client
//!     ├── client      # Entry point for get/put
//!     ├── session     # Peer tracking and retransmission
//!     ├── download    # Receive loop
//!     ├── upload      # Send loop
//!     └── config      # Client configuration
//! ```
//!
//! ## Usage Examples
//!
//! ### Fetch a file
//!
//! ```rust,no_run
//! use tftpc::tftp::client::{Client, ClientConfig};
//! use std::path::Path;
//! use std::time::Duration;
//!
//! let config = ClientConfig::new("10.0.0.1", 69).with_timeout(Duration::from_secs(2));
//! let client = Client::new(config);
//! client.get("pxelinux.0", Path::new("pxelinux.0")).unwrap();
//! ```

// Submodules
pub mod client;
pub mod core;

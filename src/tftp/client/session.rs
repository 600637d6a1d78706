use std::net::SocketAddr;

use crate::tftp::core::{
    ErrorCode, MAX_PACKET_SIZE, MalformedPacket, Packet, Socket, TransferError, is_timeout,
};

/// Transport state shared by both transfer directions
///
/// Owns the socket for the whole transfer, remembers the last packet sent so
/// it can be retransmitted, and pins the peer to the address of the first
/// valid reply (the server answers from a fresh port, not the one the
/// request went to).
pub(crate) struct Session<S> {
    socket: S,
    server: SocketAddr,
    peer: Option<SocketAddr>,
    retries: u32,
    attempts_left: u32,
    last_sent: Vec<u8>,
    buf: Vec<u8>,
}

impl<S: Socket> Session<S> {
    pub fn new(socket: S, server: SocketAddr, retries: u32) -> Self {
        Self {
            socket,
            server,
            peer: None,
            retries,
            attempts_left: retries,
            last_sent: Vec::new(),
            // One spare byte so an oversized datagram shows up as longer than any valid packet
            buf: vec![0u8; MAX_PACKET_SIZE + 1],
        }
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    #[cfg(test)]
    pub fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }

    fn destination(&self) -> SocketAddr {
        self.peer.unwrap_or(self.server)
    }

    /// Send a new packet; it becomes the one retransmitted on timeout
    pub fn send(&mut self, packet: &Packet) -> Result<(), TransferError> {
        log::trace!("Sending {} to {}", packet.kind(), self.destination());
        self.last_sent = packet.serialize();
        self.attempts_left = self.retries;
        self.transmit()
    }

    /// Resend the buffered packet, spending one retry. `Ok(false)` once the
    /// budget is gone.
    pub fn retransmit(&mut self) -> Result<bool, TransferError> {
        if self.attempts_left == 0 {
            return Ok(false);
        }
        self.attempts_left -= 1;
        log::debug!(
            "Retransmitting to {} ({} retries left)",
            self.destination(),
            self.attempts_left
        );
        self.transmit()?;
        Ok(true)
    }

    /// Spend one retry without sending anything, for replies that do not
    /// move the transfer forward. `Err(Timeout)` once the budget is gone.
    pub fn spend_retry(&mut self) -> Result<(), TransferError> {
        if self.attempts_left == 0 {
            return Err(TransferError::Timeout {
                retries: self.retries,
            });
        }
        self.attempts_left -= 1;
        Ok(())
    }

    fn transmit(&self) -> Result<(), TransferError> {
        self.socket
            .send_to(&self.last_sent, self.destination())
            .map_err(TransferError::Network)?;
        Ok(())
    }

    /// Wait for the next packet from the peer, retransmitting on every timeout
    pub fn receive(&mut self) -> Result<Packet, TransferError> {
        loop {
            if let Some(packet) = self.receive_once()? {
                return Ok(packet);
            }
            log::warn!("Timed out waiting for reply from {}", self.destination());
            if !self.retransmit()? {
                return Err(TransferError::Timeout {
                    retries: self.retries,
                });
            }
        }
    }

    /// One bounded wait. `None` when the socket timeout expired.
    fn receive_once(&mut self) -> Result<Option<Packet>, TransferError> {
        loop {
            let (amt, from) = match self.socket.recv_from(&mut self.buf) {
                Ok(received) => received,
                Err(e) if is_timeout(&e) => return Ok(None),
                Err(e) => return Err(TransferError::Network(e)),
            };

            if self.peer.is_some_and(|peer| peer != from) {
                log::warn!(
                    "Ignoring datagram from {}, transfer is with {}",
                    from,
                    self.destination()
                );
                self.reject_stranger(from);
                self.spend_retry()?;
                continue;
            }

            if amt > MAX_PACKET_SIZE {
                return Err(MalformedPacket::TooLong {
                    kind: "datagram",
                    len: amt,
                }
                .into());
            }

            let packet = Packet::deserialize(&self.buf[..amt])?;
            if self.peer.is_none() {
                log::debug!("Server replied from {}", from);
                self.peer = Some(from);
            }
            return Ok(Some(packet));
        }
    }

    fn reject_stranger(&self, addr: SocketAddr) {
        let packet = Packet::Error {
            code: ErrorCode::UnknownTransferId,
            msg: Some("Unknown transfer ID".to_string()),
        };
        if let Err(e) = self.socket.send_to(&packet.serialize(), addr) {
            log::debug!("Failed to notify {}: {}", addr, e);
        }
    }
}

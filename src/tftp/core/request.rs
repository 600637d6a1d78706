use super::packet::{Mode, Packet};

/// Which way the file travels, seen from the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Server to client (RRQ)
    Read,
    /// Client to server (WRQ)
    Write,
}

/// The request that opens a transfer. Fixed for the lifetime of one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    filename: String,
    mode: Mode,
    direction: Direction,
}

impl TransferRequest {
    pub fn read(filename: impl Into<String>, mode: Mode) -> Self {
        Self {
            filename: filename.into(),
            mode,
            direction: Direction::Read,
        }
    }

    pub fn write(filename: impl Into<String>, mode: Mode) -> Self {
        Self {
            filename: filename.into(),
            mode,
            direction: Direction::Write,
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// The RRQ or WRQ that opens this transfer
    pub fn packet(&self) -> Packet {
        let filename = self.filename.clone();
        let mode = self.mode;
        match self.direction {
            Direction::Read => Packet::Rrq { filename, mode },
            Direction::Write => Packet::Wrq { filename, mode },
        }
    }
}

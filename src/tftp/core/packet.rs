use std::fmt;

use serde::Deserialize;
use thiserror::Error;

/// Payload size of a full DATA block. Anything shorter ends the transfer.
pub const BLOCK_SIZE: usize = 512;

/// Largest datagram a peer may legally send (DATA header + full block).
pub const MAX_PACKET_SIZE: usize = 4 + BLOCK_SIZE;

const OPCODE_RRQ: u16 = 1;
const OPCODE_WRQ: u16 = 2;
const OPCODE_DATA: u16 = 3;
const OPCODE_ACK: u16 = 4;
const OPCODE_ERROR: u16 = 5;

/// Transfer mode carried in RRQ/WRQ
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Raw 8-bit bytes
    #[default]
    Octet,
    /// Text with CR LF line endings on the wire
    Netascii,
}

impl Mode {
    /// Wire representation of the mode
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Octet => "octet",
            Mode::Netascii => "netascii",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("octet") {
            Some(Mode::Octet)
        } else if s.eq_ignore_ascii_case("netascii") {
            Some(Mode::Netascii)
        } else {
            None
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// TFTP error codes (RFC 1350 appendix)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    NotDefined,
    FileNotFound,
    AccessViolation,
    DiskFull,
    IllegalOperation,
    UnknownTransferId,
    FileExists,
    NoSuchUser,
    /// Code outside the defined 0..=7 range
    Unknown(u16),
}

impl ErrorCode {
    pub fn from_u16(code: u16) -> Self {
        match code {
            0 => ErrorCode::NotDefined,
            1 => ErrorCode::FileNotFound,
            2 => ErrorCode::AccessViolation,
            3 => ErrorCode::DiskFull,
            4 => ErrorCode::IllegalOperation,
            5 => ErrorCode::UnknownTransferId,
            6 => ErrorCode::FileExists,
            7 => ErrorCode::NoSuchUser,
            other => ErrorCode::Unknown(other),
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            ErrorCode::NotDefined => 0,
            ErrorCode::FileNotFound => 1,
            ErrorCode::AccessViolation => 2,
            ErrorCode::DiskFull => 3,
            ErrorCode::IllegalOperation => 4,
            ErrorCode::UnknownTransferId => 5,
            ErrorCode::FileExists => 6,
            ErrorCode::NoSuchUser => 7,
            ErrorCode::Unknown(code) => *code,
        }
    }

    /// Fixed human-readable reason for the code
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::NotDefined => "Not defined, see error message (if any).",
            ErrorCode::FileNotFound => "File not found.",
            ErrorCode::AccessViolation => "Access violation.",
            ErrorCode::DiskFull => "Disk full or allocation exceeded.",
            ErrorCode::IllegalOperation => "Illegal TFTP operation.",
            ErrorCode::UnknownTransferId => "Unknown transfer ID.",
            ErrorCode::FileExists => "File already exists.",
            ErrorCode::NoSuchUser => "No such user.",
            ErrorCode::Unknown(_) => "Unknown error code.",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.as_u16(), self.description())
    }
}

/// Received bytes that do not form a known TFTP message
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedPacket {
    #[error("{kind} packet too short ({len} bytes)")]
    TooShort { kind: &'static str, len: usize },
    #[error("{kind} packet too long ({len} bytes)")]
    TooLong { kind: &'static str, len: usize },
    #[error("unknown opcode {0}")]
    UnknownOpcode(u16),
    #[error("{0} field is missing its null terminator")]
    Unterminated(&'static str),
    #[error("unsupported transfer mode '{0}'")]
    UnknownMode(String),
}

/// A single TFTP message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    Rrq { filename: String, mode: Mode },
    Wrq { filename: String, mode: Mode },
    Data { block_num: u16, data: Vec<u8> },
    Ack(u16),
    Error { code: ErrorCode, msg: Option<String> },
}

impl Packet {
    /// Short name used in log lines
    pub fn kind(&self) -> &'static str {
        match self {
            Packet::Rrq { .. } => "RRQ",
            Packet::Wrq { .. } => "WRQ",
            Packet::Data { .. } => "DATA",
            Packet::Ack(_) => "ACK",
            Packet::Error { .. } => "ERROR",
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        match self {
            Packet::Rrq { filename, mode } => serialize_request(OPCODE_RRQ, filename, *mode),
            Packet::Wrq { filename, mode } => serialize_request(OPCODE_WRQ, filename, *mode),
            Packet::Data { block_num, data } => {
                let mut buf = Vec::with_capacity(4 + data.len());
                buf.extend_from_slice(&OPCODE_DATA.to_be_bytes());
                buf.extend_from_slice(&block_num.to_be_bytes());
                buf.extend_from_slice(data);
                buf
            }
            Packet::Ack(block_num) => {
                let mut buf = Vec::with_capacity(4);
                buf.extend_from_slice(&OPCODE_ACK.to_be_bytes());
                buf.extend_from_slice(&block_num.to_be_bytes());
                buf
            }
            Packet::Error { code, msg } => {
                let msg = msg.as_deref().unwrap_or_default();
                let mut buf = Vec::with_capacity(5 + msg.len());
                buf.extend_from_slice(&OPCODE_ERROR.to_be_bytes());
                buf.extend_from_slice(&code.as_u16().to_be_bytes());
                buf.extend_from_slice(msg.as_bytes());
                buf.push(0);
                buf
            }
        }
    }

    /// Decode a datagram. Only the shape is checked; block numbers and error
    /// codes are passed through untouched.
    pub fn deserialize(buf: &[u8]) -> Result<Packet, MalformedPacket> {
        if buf.len() < 2 {
            return Err(MalformedPacket::TooShort {
                kind: "opcode",
                len: buf.len(),
            });
        }
        let opcode = u16::from_be_bytes([buf[0], buf[1]]);
        let body = &buf[2..];

        match opcode {
            OPCODE_RRQ | OPCODE_WRQ => {
                let (filename, rest) = take_string(body, "filename")?;
                let (mode, _) = take_string(rest, "mode")?;
                let mode = Mode::parse(&mode).ok_or(MalformedPacket::UnknownMode(mode))?;
                Ok(if opcode == OPCODE_RRQ {
                    Packet::Rrq { filename, mode }
                } else {
                    Packet::Wrq { filename, mode }
                })
            }
            OPCODE_DATA => {
                let block_num = take_u16(body, "DATA", buf.len())?;
                if buf.len() > MAX_PACKET_SIZE {
                    return Err(MalformedPacket::TooLong {
                        kind: "DATA",
                        len: buf.len(),
                    });
                }
                Ok(Packet::Data {
                    block_num,
                    data: body[2..].to_vec(),
                })
            }
            OPCODE_ACK => Ok(Packet::Ack(take_u16(body, "ACK", buf.len())?)),
            OPCODE_ERROR => {
                let code = ErrorCode::from_u16(take_u16(body, "ERROR", buf.len())?);
                let (msg, _) = take_string(&body[2..], "error message")?;
                Ok(Packet::Error {
                    code,
                    msg: (!msg.is_empty()).then_some(msg),
                })
            }
            other => Err(MalformedPacket::UnknownOpcode(other)),
        }
    }
}

fn serialize_request(opcode: u16, filename: &str, mode: Mode) -> Vec<u8> {
    let mode = mode.as_str();
    let mut buf = Vec::with_capacity(4 + filename.len() + mode.len());
    buf.extend_from_slice(&opcode.to_be_bytes());
    buf.extend_from_slice(filename.as_bytes());
    buf.push(0);
    buf.extend_from_slice(mode.as_bytes());
    buf.push(0);
    buf
}

fn take_u16(body: &[u8], kind: &'static str, len: usize) -> Result<u16, MalformedPacket> {
    match body {
        [hi, lo, ..] => Ok(u16::from_be_bytes([*hi, *lo])),
        _ => Err(MalformedPacket::TooShort { kind, len }),
    }
}

/// Split off a null-terminated string, returning it and the bytes after the terminator
fn take_string<'a>(
    buf: &'a [u8],
    field: &'static str,
) -> Result<(String, &'a [u8]), MalformedPacket> {
    let end = buf
        .iter()
        .position(|&b| b == 0)
        .ok_or(MalformedPacket::Unterminated(field))?;
    let text = String::from_utf8_lossy(&buf[..end]).into_owned();
    Ok((text, &buf[end + 1..]))
}

//! Netascii line-ending translation
//!
//! On the wire a newline is `CR LF` and a bare carriage return is `CR NUL`.
//! Uploads expand local bytes through [`NetasciiReader`]; downloads fold the
//! wire form back through [`Convert`].

use std::borrow::Cow;
use std::io::{self, Read};

use super::packet::Mode;

const CR: u8 = b'\r';
const LF: u8 = b'\n';
const NUL: u8 = 0;

/// Inbound translation for received DATA payloads
///
/// A CR at the end of one block is held back until the next block shows
/// whether it was `CR LF` or `CR NUL`.
#[derive(Debug)]
pub struct Convert {
    mode: Mode,
    pending_cr: bool,
}

impl Convert {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            pending_cr: false,
        }
    }

    /// Translate one payload to local bytes
    pub fn incoming<'a>(&mut self, data: &'a [u8]) -> Cow<'a, [u8]> {
        if self.mode == Mode::Octet {
            return Cow::Borrowed(data);
        }

        let mut out = Vec::with_capacity(data.len() + 1);
        for &b in data {
            if self.pending_cr {
                self.pending_cr = false;
                match b {
                    LF => {
                        out.push(LF);
                        continue;
                    }
                    NUL => {
                        out.push(CR);
                        continue;
                    }
                    _ => out.push(CR),
                }
            }
            if b == CR {
                self.pending_cr = true;
            } else {
                out.push(b);
            }
        }
        Cow::Owned(out)
    }

    /// Bytes still owed once the last block has arrived
    pub fn finish(&mut self) -> Option<u8> {
        std::mem::take(&mut self.pending_cr).then_some(CR)
    }
}

/// Outbound translation: wraps a local reader and yields netascii bytes
#[derive(Debug)]
pub struct NetasciiReader<R> {
    inner: R,
    // Second byte of an expansion that did not fit in the caller's buffer
    carry: Option<u8>,
}

impl<R: Read> NetasciiReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, carry: None }
    }
}

impl<R: Read> Read for NetasciiReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        let mut written = 0;
        if let Some(b) = self.carry.take() {
            buf[0] = b;
            written = 1;
        }

        // Each source byte expands to at most two, so read half the free space
        let room = (buf.len() - written) / 2;
        if room == 0 {
            if written > 0 {
                return Ok(written);
            }
            // One-byte buffer: read a single byte and carry the rest
            let mut one = [0u8; 1];
            if self.inner.read(&mut one)? == 0 {
                return Ok(0);
            }
            let (first, second) = expand(one[0]);
            buf[0] = first;
            self.carry = second;
            return Ok(1);
        }

        let mut raw = vec![0u8; room];
        let n = self.inner.read(&mut raw)?;
        for &b in &raw[..n] {
            let (first, second) = expand(b);
            buf[written] = first;
            written += 1;
            if let Some(second) = second {
                buf[written] = second;
                written += 1;
            }
        }
        Ok(written)
    }
}

fn expand(b: u8) -> (u8, Option<u8>) {
    match b {
        LF => (CR, Some(LF)),
        CR => (CR, Some(NUL)),
        other => (other, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn octet_passes_through() {
        let mut convert = Convert::new(Mode::Octet);
        let data = b"a\r\nb\r\0";
        assert!(matches!(convert.incoming(data), Cow::Borrowed(_)));
        assert_eq!(convert.finish(), None);
    }

    #[test]
    fn netascii_decodes_line_endings() {
        let mut convert = Convert::new(Mode::Netascii);
        assert_eq!(&*convert.incoming(b"one\r\ntwo\r\0three"), b"one\ntwo\rthree");
        assert_eq!(convert.finish(), None);
    }

    #[test]
    fn netascii_cr_split_across_blocks() {
        let mut convert = Convert::new(Mode::Netascii);
        assert_eq!(&*convert.incoming(b"line\r"), b"line");
        assert_eq!(&*convert.incoming(b"\nnext\r"), b"\nnext");
        assert_eq!(&*convert.incoming(b"x"), b"\rx");
        assert_eq!(&*convert.incoming(b"end\r"), b"end");
        assert_eq!(convert.finish(), Some(b'\r'));
    }

    #[test]
    fn reader_expands_line_endings() {
        let mut reader = NetasciiReader::new(&b"a\nb\rc"[..]);
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"a\r\nb\r\0c");
    }

    #[test]
    fn reader_handles_tiny_buffers() {
        let mut reader = NetasciiReader::new(&b"\n\n"[..]);
        let mut out = Vec::new();
        let mut one = [0u8; 1];
        loop {
            let n = reader.read(&mut one).unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&one[..n]);
        }
        assert_eq!(out, b"\r\n\r\n");
    }
}

//! Primitive readers
//!
//! Line, length-prefixed integer and blob reads over a buffered byte
//! stream. Every higher-level reader in the decoder is built from these.

use std::io::{self, BufRead, ErrorKind, Read};

use bytes::{Bytes, BytesMut};

use crate::error::{KvWireError, Result, Violation};

/// Delimiter byte preceding each fragment of a chunked blob
pub const CHUNK_DELIMITER: u8 = b';';

/// Marker byte used in place of a length for streamed values
pub const STREAMED_LENGTH: u8 = b'?';

/// A decoded length / integer field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Header {
    /// Explicit value (may be negative for legacy nulls)
    Int(i64),

    /// `?`: the value is streamed and its length is not known yet
    Unbounded,
}

/// Low-level reader over a buffered stream
pub(crate) struct WireReader<R> {
    inner: R,
}

impl<R: BufRead> WireReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    // -------------------------------------------------------------------------
    // Byte-level helpers
    // -------------------------------------------------------------------------

    /// Borrow the buffered bytes, refilling if empty. Empty means EOF.
    fn fill(&mut self) -> io::Result<&[u8]> {
        loop {
            match self.inner.fill_buf() {
                Ok(_) => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        self.inner.fill_buf()
    }

    pub fn read_byte(&mut self) -> Result<u8> {
        let byte = match self.fill()?.first() {
            Some(&b) => b,
            None => return Err(eof().into()),
        };
        self.inner.consume(1);
        Ok(byte)
    }

    /// Read one byte and require it to be `expected`
    pub fn expect_byte(&mut self, expected: u8) -> Result<()> {
        let found = self.read_byte()?;
        if found != expected {
            return Err(Violation::UnexpectedByte { expected, found }.into());
        }
        Ok(())
    }

    /// Read and verify a CRLF terminator
    pub fn expect_crlf(&mut self) -> Result<()> {
        self.expect_byte(b'\r')?;
        self.expect_byte(b'\n')
    }

    // -------------------------------------------------------------------------
    // Primitive readers
    // -------------------------------------------------------------------------

    /// Read a CRLF-terminated line of at most `max` bytes and return it
    /// without the terminator
    pub fn read_line(&mut self, max: usize) -> Result<Bytes> {
        let limit = (max as u64).saturating_add(2);
        let mut line = Vec::new();
        Read::take(&mut self.inner, limit).read_until(b'\n', &mut line)?;
        if line.last() != Some(&b'\n') {
            if line.len() as u64 >= limit {
                return Err(Violation::BlobTooLarge { len: line.len() as u64, max }.into());
            }
            return Err(eof().into());
        }
        if !line.ends_with(b"\r\n") {
            return Err(Violation::MissingCrlf.into());
        }
        line.truncate(line.len() - 2);
        Ok(Bytes::from(line))
    }

    /// Read a signed decimal header terminated by CRLF, or `?` for streamed
    pub fn read_header(&mut self) -> Result<Header> {
        let mut value: i64 = 0;
        let mut negative = false;
        let mut digits = 0usize;

        loop {
            let c = self.read_byte()?;
            match c {
                b'0'..=b'9' => {
                    // Accumulate toward the sign so i64::MIN fits
                    let digit = i64::from(c - b'0');
                    value = value
                        .checked_mul(10)
                        .and_then(|v| {
                            if negative {
                                v.checked_sub(digit)
                            } else {
                                v.checked_add(digit)
                            }
                        })
                        .ok_or(Violation::IntegerOverflow)?;
                    digits += 1;
                }
                b'\r' => {
                    self.expect_byte(b'\n')?;
                    break;
                }
                b'-' if digits == 0 && !negative => negative = true,
                STREAMED_LENGTH if digits == 0 && !negative => {
                    self.expect_crlf()?;
                    return Ok(Header::Unbounded);
                }
                other => return Err(Violation::UnexpectedNumberByte(other).into()),
            }
        }

        if digits == 0 {
            return Err(Violation::EmptyNumber.into());
        }
        Ok(Header::Int(value))
    }

    /// Read a header that must be an explicit integer
    pub fn read_integer(&mut self, marker: u8) -> Result<i64> {
        match self.read_header()? {
            Header::Int(n) => Ok(n),
            Header::Unbounded => Err(Violation::UnexpectedStreamedLength(marker).into()),
        }
    }

    /// Read exactly `len` payload bytes followed by CRLF
    pub fn read_exact_blob(&mut self, len: usize, max: usize) -> Result<Bytes> {
        check_blob_len(len as u64, max)?;
        let mut buf = vec![0u8; len];
        self.inner.read_exact(&mut buf)?;
        self.expect_crlf()?;
        Ok(Bytes::from(buf))
    }

    /// Reassemble a chunked blob: `;<len>\r\n<bytes>\r\n` repeated until
    /// a zero-length fragment.
    pub fn read_chunked_blob(&mut self, max: usize) -> Result<Bytes> {
        let mut buf = BytesMut::new();
        let mut chunks = 0usize;

        loop {
            self.expect_byte(CHUNK_DELIMITER)?;
            let len = match self.read_header()? {
                Header::Int(n) if n >= 0 => n as u64,
                Header::Int(_) => return Err(Violation::UnexpectedNumberByte(b'-').into()),
                Header::Unbounded => {
                    return Err(Violation::UnexpectedStreamedLength(CHUNK_DELIMITER).into())
                }
            };
            if len == 0 {
                tracing::trace!("Reassembled {} blob chunks ({} bytes)", chunks, buf.len());
                return Ok(buf.freeze());
            }

            check_blob_len(buf.len() as u64 + len, max)?;
            let start = buf.len();
            buf.resize(start + len as usize, 0);
            self.inner.read_exact(&mut buf[start..])?;
            self.expect_crlf()?;
            chunks += 1;
        }
    }
}

fn check_blob_len(len: u64, max: usize) -> Result<()> {
    if len > max as u64 {
        return Err(KvWireError::ProtocolViolation(Violation::BlobTooLarge { len, max }));
    }
    Ok(())
}

fn eof() -> io::Error {
    io::Error::new(ErrorKind::UnexpectedEof, "stream ended mid-value")
}

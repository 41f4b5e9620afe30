//! Command encoder
//!
//! Serializes a command as an array of blob strings:
//!
//! ```text
//! *<argc>\r\n
//! $<len>\r\n<arg>\r\n      (repeated argc times)
//! ```

use std::io::Write;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::Result;
use super::value::ValueType;

const CRLF: &[u8] = b"\r\n";

/// Exact encoded size of a command
pub fn encoded_len<A: AsRef<[u8]>>(args: &[A]) -> usize {
    let mut len = 1 + decimal_len(args.len()) + 2;
    for arg in args {
        let arg = arg.as_ref();
        len += 1 + decimal_len(arg.len()) + 2 + arg.len() + 2;
    }
    len
}

/// Append the encoding of one command to `buf`
pub fn encode_command_into<A: AsRef<[u8]>>(buf: &mut BytesMut, args: &[A]) {
    buf.reserve(encoded_len(args));

    put_header(buf, ValueType::Array.marker(), args.len());
    for arg in args {
        let arg = arg.as_ref();
        put_header(buf, ValueType::BlobString.marker(), arg.len());
        buf.put_slice(arg);
        buf.put_slice(CRLF);
    }
}

/// Encode one command into a fresh buffer
pub fn encode_command<A: AsRef<[u8]>>(args: &[A]) -> Bytes {
    let mut buf = BytesMut::with_capacity(encoded_len(args));
    encode_command_into(&mut buf, args);
    buf.freeze()
}

/// Write a command to a stream
///
/// The writer is not flushed, so several commands can be queued before a
/// single flush.
pub fn write_command<W: Write, A: AsRef<[u8]>>(writer: &mut W, args: &[A]) -> Result<()> {
    writer.write_all(&encode_command(args))?;
    Ok(())
}

/// Write several commands with a single `write_all`
pub fn write_pipeline<W: Write, A: AsRef<[u8]>>(writer: &mut W, commands: &[&[A]]) -> Result<()> {
    let mut buf = BytesMut::with_capacity(commands.iter().map(|&c| encoded_len(c)).sum());
    for &args in commands {
        encode_command_into(&mut buf, args);
    }
    writer.write_all(&buf)?;
    Ok(())
}

fn put_header(buf: &mut BytesMut, marker: u8, n: usize) {
    buf.put_u8(marker);
    put_decimal(buf, n);
    buf.put_slice(CRLF);
}

fn put_decimal(buf: &mut BytesMut, mut n: usize) {
    let mut digits = [0u8; 20];
    let mut pos = digits.len();
    loop {
        pos -= 1;
        digits[pos] = b'0' + (n % 10) as u8;
        n /= 10;
        if n == 0 {
            break;
        }
    }
    buf.put_slice(&digits[pos..]);
}

fn decimal_len(mut n: usize) -> usize {
    let mut len = 1;
    while n >= 10 {
        n /= 10;
        len += 1;
    }
    len
}

//! Connection Codec
//!
//! Pairs a decoder and an encoder over one already-established stream.

use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Read, Write};
use std::net::TcpStream;
use std::time::Duration;

use bytes::BytesMut;

use crate::config::CodecConfig;
use crate::error::{KvWireError, Result};
use crate::protocol::{encode_command_into, Decoder, Value};

/// Framing layer for a single connection
///
/// Requests and replies are handled one direction at a time. Once a reply
/// has started arriving, any failure (a protocol violation, or an I/O error
/// such as a read timeout) leaves the stream position unknown, so the
/// connection marks itself poisoned and every later call fails with
/// [`KvWireError::Poisoned`]; the owner is expected to drop it and reconnect.
/// A timeout before the first byte of a reply leaves the stream intact.
pub struct Connection<R, W: Write> {
    /// Buffered stream reader feeding the decoder
    decoder: Decoder<BufReader<R>>,

    /// Buffered stream writer
    writer: BufWriter<W>,

    /// Scratch buffer reused for encoding
    encode_buf: BytesMut,

    /// Set once a read failed mid-value
    poisoned: bool,

    /// Peer description for logging
    peer_addr: String,
}

impl<R: Read, W: Write> Connection<R, W> {
    /// Create a connection with default configuration
    pub fn new(reader: R, writer: W) -> Self {
        let config = CodecConfig::default();
        Self::build(reader, writer, &config, "unknown".to_string())
    }

    /// Create a connection with the given configuration
    pub fn with_config(reader: R, writer: W, config: &CodecConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(reader, writer, config, "unknown".to_string()))
    }

    fn build(reader: R, writer: W, config: &CodecConfig, peer_addr: String) -> Self {
        Self {
            decoder: Decoder::with_config(
                BufReader::with_capacity(config.read_buffer_size, reader),
                config,
            ),
            writer: BufWriter::with_capacity(config.write_buffer_size, writer),
            encode_buf: BytesMut::with_capacity(256),
            poisoned: false,
            peer_addr,
        }
    }

    /// Send one command and flush
    pub fn send<A: AsRef<[u8]>>(&mut self, args: &[A]) -> Result<()> {
        self.ensure_healthy()?;
        self.encode_buf.clear();
        encode_command_into(&mut self.encode_buf, args);
        self.writer.write_all(&self.encode_buf)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Send several commands with one flush
    pub fn send_pipeline<A: AsRef<[u8]>>(&mut self, commands: &[&[A]]) -> Result<()> {
        self.ensure_healthy()?;
        self.encode_buf.clear();
        for &args in commands {
            encode_command_into(&mut self.encode_buf, args);
        }
        self.writer.write_all(&self.encode_buf)?;
        self.writer.flush()?;
        tracing::trace!("Flushed pipeline of {} commands to {}", commands.len(), self.peer_addr);
        Ok(())
    }

    /// Read the next value from the server
    pub fn receive(&mut self) -> Result<Value> {
        self.ensure_healthy()?;

        // Nothing consumed yet: a failure here leaves the stream at a boundary
        match self.decoder.get_mut().fill_buf() {
            Ok([]) => {
                return Err(KvWireError::Io(ErrorKind::UnexpectedEof.into()));
            }
            Ok(_) => {}
            Err(e) => return Err(e.into()),
        }

        match self.decoder.decode() {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::warn!("Poisoning connection to {}: {}", self.peer_addr, e);
                self.poisoned = true;
                Err(e)
            }
        }
    }

    /// Send one command and read its reply
    pub fn request<A: AsRef<[u8]>>(&mut self, args: &[A]) -> Result<Value> {
        self.send(args)?;
        self.receive()
    }

    /// True once a read failed mid-value
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }

    /// Tear down into the underlying reader and writer
    ///
    /// Bytes buffered but not yet decoded are lost; unflushed output is
    /// flushed first.
    pub fn into_parts(self) -> Result<(R, W)> {
        let reader = self.decoder.into_inner().into_inner();
        let writer = self
            .writer
            .into_inner()
            .map_err(|e| KvWireError::Io(e.into_error()))?;
        Ok((reader, writer))
    }

    fn ensure_healthy(&self) -> Result<()> {
        if self.poisoned {
            return Err(KvWireError::Poisoned);
        }
        Ok(())
    }
}

impl Connection<TcpStream, TcpStream> {
    /// Wrap an already-connected TCP stream
    ///
    /// Disables Nagle's algorithm, applies timeouts and splits the stream
    /// into separate read / write handles.
    pub fn from_tcp(stream: TcpStream, config: &CodecConfig) -> Result<Self> {
        config.validate()?;

        // Get peer address for logging before we split the stream
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        if config.read_timeout_ms > 0 {
            stream.set_read_timeout(Some(Duration::from_millis(config.read_timeout_ms)))?;
        }
        if config.write_timeout_ms > 0 {
            stream.set_write_timeout(Some(Duration::from_millis(config.write_timeout_ms)))?;
        }

        let read_stream = stream.try_clone()?;
        tracing::debug!("Connection codec attached to {}", peer_addr);

        Ok(Self::build(read_stream, stream, config, peer_addr))
    }
}

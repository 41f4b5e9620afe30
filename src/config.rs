//! Configuration for kvwire
//!
//! Centralized codec limits and buffer sizing with sensible defaults.

use crate::error::{KvWireError, Result};

/// Configuration for a decoder / connection pair
#[derive(Debug, Clone)]
pub struct CodecConfig {
    // -------------------------------------------------------------------------
    // Decoder Limits
    // -------------------------------------------------------------------------
    /// Deepest aggregate nesting accepted before the stream is rejected.
    /// Attribute units count as one level for their own elements.
    pub max_depth: usize,

    /// Largest blob accepted, in bytes. Chunked blobs are checked against
    /// their reassembled total.
    pub max_blob_len: usize,

    // -------------------------------------------------------------------------
    // Buffering
    // -------------------------------------------------------------------------
    /// Capacity of the buffered reader (bytes)
    pub read_buffer_size: usize,

    /// Capacity of the buffered writer (bytes)
    pub write_buffer_size: usize,

    // -------------------------------------------------------------------------
    // Socket Configuration
    // -------------------------------------------------------------------------
    /// Read timeout applied by `Connection::from_tcp` (milliseconds, 0 = none)
    pub read_timeout_ms: u64,

    /// Write timeout applied by `Connection::from_tcp` (milliseconds, 0 = none)
    pub write_timeout_ms: u64,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_depth: 128,
            max_blob_len: 512 * 1024 * 1024, // 512 MB, server default proto-max-bulk-len
            read_buffer_size: 16 * 1024,
            write_buffer_size: 16 * 1024,
            read_timeout_ms: 5000,
            write_timeout_ms: 5000,
        }
    }
}

impl CodecConfig {
    /// Create a new config builder
    pub fn builder() -> CodecConfigBuilder {
        CodecConfigBuilder::default()
    }

    /// Reject limits that would make every decode fail
    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(KvWireError::Config("max_depth must be at least 1".to_string()));
        }
        if self.max_blob_len == 0 {
            return Err(KvWireError::Config("max_blob_len must be at least 1".to_string()));
        }
        if self.read_buffer_size == 0 || self.write_buffer_size == 0 {
            return Err(KvWireError::Config(format!(
                "buffer sizes must be non-zero (read {}, write {})",
                self.read_buffer_size, self.write_buffer_size
            )));
        }
        Ok(())
    }
}

/// Builder for CodecConfig
#[derive(Default)]
pub struct CodecConfigBuilder {
    config: CodecConfig,
}

impl CodecConfigBuilder {
    /// Set the maximum aggregate nesting depth
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.config.max_depth = depth;
        self
    }

    /// Set the maximum blob length (in bytes)
    pub fn max_blob_len(mut self, len: usize) -> Self {
        self.config.max_blob_len = len;
        self
    }

    /// Set the read buffer capacity (in bytes)
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.config.read_buffer_size = size;
        self
    }

    /// Set the write buffer capacity (in bytes)
    pub fn write_buffer_size(mut self, size: usize) -> Self {
        self.config.write_buffer_size = size;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> CodecConfig {
        self.config
    }
}

//! # kvwire
//!
//! The client-side wire codec for RESP-speaking key-value stores:
//! - RESP2 and RESP3 framing decoded into a single value model
//! - Chunked blob strings and streamed aggregates
//! - Attribute units attached to the value they precede
//! - Commands encoded as arrays of blob strings
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Connection (network)                        │
//! │           BufReader / BufWriter, poisoning                   │
//! └───────────────┬─────────────────────────────┬───────────────┘
//!                 │                             │
//!                 ▼                             ▼
//!   ┌───────────────────────────┐     ┌───────────────────┐
//!   │     Decoder (dispatch)    │     │      Encoder      │
//!   │  marker table, attributes │     │  *N / $len args   │
//!   └─────────────┬─────────────┘     └───────────────────┘
//!                 │
//!                 ▼
//!   ┌───────────────────────────┐
//!   │     Primitive readers     │
//!   │ line / header / blob /    │
//!   │ chunk reassembly          │
//!   └───────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{KvWireError, Result, Violation};
pub use config::CodecConfig;
pub use protocol::{Command, Decoder, Value, ValueType};
pub use network::Connection;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of kvwire
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Network Module
//!
//! Buffered framing over an already-connected byte stream.
//!
//! ## Model
//! - One `Connection` per stream, never shared across threads
//! - Send and receive alternate; pipelining batches sends before reads
//! - A protocol violation poisons the connection

mod connection;

pub use connection::Connection;

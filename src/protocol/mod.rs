//! Protocol Module
//!
//! RESP2 / RESP3 framing for the client side of a key-value store
//! connection.
//!
//! ## Value Format
//!
//! Every unit starts with a one-byte marker:
//! ```text
//! ┌──────────┬───────────────────────────────┬──────┐
//! │Marker (1)│  Length / text / payload      │ CRLF │
//! └──────────┴───────────────────────────────┴──────┘
//! ```
//!
//! ### Markers
//! - `$` `!` `=`     : blob string / blob error / verbatim   (`$<len>\r\n<bytes>\r\n`)
//! - `+` `-` `,` `(` : simple string / error / double / big number (line)
//! - `:`             : integer
//! - `_` `.`         : null / end-of-stream sentinel
//! - `#`             : boolean (`t` / `f`)
//! - `*` `~` `>`     : array / set / push (`<len>` elements)
//! - `%` `|`         : map / attributes (`<len>` key/value pairs)
//!
//! ### Streamed Values
//! A length of `?` means the size is unknown up front:
//! ```text
//! $?\r\n;3\r\nabc\r\n;4\r\ndefg\r\n;0\r\n     -> "abcdefg"
//! *?\r\n:1\r\n:2\r\n.\r\n                     -> [1, 2]
//! ```
//!
//! ### Attributes
//! A `|` unit is never returned on its own; it is attached to the value
//! that follows it.
//!
//! ### Request Format
//! Commands always go out as an array of blob strings.

mod command;
mod decoder;
mod encoder;
mod reader;
mod value;

pub use command::Command;
pub use decoder::{decode_value, read_value, Decoder};
pub use encoder::{encode_command, encode_command_into, encoded_len, write_command, write_pipeline};
pub use reader::{CHUNK_DELIMITER, STREAMED_LENGTH};
pub use value::{Data, Value, ValueType};

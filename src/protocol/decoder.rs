//! Type dispatch decoder
//!
//! Reads one value per call: a marker byte selects the reader through a
//! fixed 256-entry table, aggregate readers recurse back into the decoder
//! for their elements, and attributes units are absorbed and attached to
//! the value that follows them.

use std::io::BufRead;

use crate::config::CodecConfig;
use crate::error::{KvWireError, Result, Violation};
use super::reader::{Header, WireReader};
use super::value::{Data, Value, ValueType};

/// Upper bound on elements preallocated for a bounded aggregate; larger
/// aggregates grow as elements actually arrive.
const MAX_PREALLOCATED_ELEMENTS: usize = 4096;

/// How the remainder of a value is consumed once its marker is known
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    /// Length-prefixed blob, chunk-capable
    Blob,
    /// CRLF-terminated text
    Line,
    /// Signed decimal
    Integer,
    /// Terminator only
    Null,
    /// `t` / `f` then terminator
    Boolean,
    /// `length` elements, or streamed until the end-of-stream sentinel
    Sequence,
    /// `2 × length` interleaved elements, or streamed
    Pairs,
}

impl ValueType {
    const fn shape(self) -> Shape {
        match self {
            ValueType::BlobString | ValueType::BlobError | ValueType::VerbatimString => Shape::Blob,
            ValueType::SimpleString
            | ValueType::SimpleError
            | ValueType::Double
            | ValueType::BigNumber => Shape::Line,
            ValueType::Integer => Shape::Integer,
            ValueType::Null | ValueType::EndOfStream => Shape::Null,
            ValueType::Boolean => Shape::Boolean,
            ValueType::Array | ValueType::Set | ValueType::Push => Shape::Sequence,
            ValueType::Map | ValueType::Attributes => Shape::Pairs,
        }
    }
}

/// Marker byte → value type. Built at compile time, never mutated.
static MARKERS: [Option<ValueType>; 256] = build_marker_table();

const fn build_marker_table() -> [Option<ValueType>; 256] {
    let mut table = [None; 256];
    let mut i = 0;
    while i < ValueType::ALL.len() {
        let ty = ValueType::ALL[i];
        table[ty.marker() as usize] = Some(ty);
        i += 1;
    }
    table
}

pub(crate) fn lookup(marker: u8) -> Option<ValueType> {
    MARKERS[marker as usize]
}

// =============================================================================
// Decoder
// =============================================================================

/// Decodes values from a buffered byte stream
///
/// One decoder per connection; it keeps no state between calls besides the
/// underlying reader.
pub struct Decoder<R> {
    reader: WireReader<R>,
    max_depth: usize,
    max_blob_len: usize,
}

impl<R: BufRead> Decoder<R> {
    /// Create a decoder with default limits
    pub fn new(reader: R) -> Self {
        Self::with_config(reader, &CodecConfig::default())
    }

    /// Create a decoder with limits taken from `config`
    pub fn with_config(reader: R, config: &CodecConfig) -> Self {
        Self {
            reader: WireReader::new(reader),
            max_depth: config.max_depth,
            max_blob_len: config.max_blob_len,
        }
    }

    pub fn get_ref(&self) -> &R {
        self.reader.get_ref()
    }

    pub fn get_mut(&mut self) -> &mut R {
        self.reader.get_mut()
    }

    pub fn into_inner(self) -> R {
        self.reader.into_inner()
    }

    /// Read exactly one value from the stream
    ///
    /// Attributes units preceding the value are consumed and attached to it.
    /// Stream errors are returned as `KvWireError::Io`; malformed framing as
    /// `KvWireError::ProtocolViolation`, after which the stream must be
    /// abandoned.
    pub fn decode(&mut self) -> Result<Value> {
        self.read_next(0)
    }

    fn read_next(&mut self, depth: usize) -> Result<Value> {
        let mut pending: Option<Box<Value>> = None;

        loop {
            let marker = self.reader.read_byte()?;
            let ty = lookup(marker).ok_or(Violation::UnknownMarker(marker))?;
            let data = self.read_data(ty, depth)?;

            if ty == ValueType::Attributes {
                if pending.is_some() {
                    tracing::trace!("Replacing pending attributes with a newer unit");
                }
                pending = Some(Box::new(Value::new(ty, data)));
                continue;
            }

            let mut value = Value::new(retag(ty, &data), data);
            value.set_attributes(pending);
            return Ok(value);
        }
    }

    fn read_data(&mut self, ty: ValueType, depth: usize) -> Result<Data> {
        let marker = ty.marker();
        match ty.shape() {
            Shape::Line => Ok(Data::Str(self.reader.read_line(self.max_blob_len)?)),
            Shape::Blob => self.read_blob(),
            Shape::Integer => Ok(Data::Int(self.reader.read_integer(marker)?)),
            Shape::Null => {
                self.reader.expect_crlf()?;
                Ok(Data::Null)
            }
            Shape::Boolean => {
                let b = match self.reader.read_byte()? {
                    b't' => 1,
                    b'f' => 0,
                    other => return Err(Violation::InvalidBoolean(other).into()),
                };
                self.reader.expect_crlf()?;
                Ok(Data::Int(b))
            }
            Shape::Sequence => self.read_aggregate(depth, 1),
            Shape::Pairs => self.read_aggregate(depth, 2),
        }
    }

    fn read_blob(&mut self) -> Result<Data> {
        match self.reader.read_header()? {
            Header::Int(len) if len < 0 => Ok(Data::Null),
            Header::Int(len) => {
                let len = usize::try_from(len).map_err(|_| Violation::BlobTooLarge {
                    len: len as u64,
                    max: self.max_blob_len,
                })?;
                Ok(Data::Str(self.reader.read_exact_blob(len, self.max_blob_len)?))
            }
            Header::Unbounded => Ok(Data::Str(self.reader.read_chunked_blob(self.max_blob_len)?)),
        }
    }

    /// Bounded: `len × per_entry` elements. Streamed: elements until the
    /// end-of-stream sentinel, which is not included.
    fn read_aggregate(&mut self, depth: usize, per_entry: usize) -> Result<Data> {
        let depth = depth + 1;
        if depth > self.max_depth {
            return Err(KvWireError::ProtocolViolation(Violation::NestingTooDeep {
                max: self.max_depth,
            }));
        }

        match self.reader.read_header()? {
            Header::Int(len) if len < 0 => Ok(Data::Null),
            Header::Int(len) => {
                let count = usize::try_from(len)
                    .ok()
                    .and_then(|n| n.checked_mul(per_entry))
                    .ok_or(Violation::IntegerOverflow)?;
                let mut elements = Vec::with_capacity(count.min(MAX_PREALLOCATED_ELEMENTS));
                for _ in 0..count {
                    elements.push(self.read_next(depth)?);
                }
                Ok(Data::Elements(elements))
            }
            Header::Unbounded => {
                let mut elements = Vec::new();
                loop {
                    let element = self.read_next(depth)?;
                    if element.value_type() == ValueType::EndOfStream {
                        if elements.len() % per_entry != 0 {
                            return Err(Violation::OddMapLength(elements.len()).into());
                        }
                        tracing::trace!("Streamed aggregate ended after {} elements", elements.len());
                        return Ok(Data::Elements(elements));
                    }
                    elements.push(element);
                }
            }
        }
    }
}

/// Legacy null blobs / aggregates (`$-1`, `*-1`) are reported as nulls
fn retag(ty: ValueType, data: &Data) -> ValueType {
    match data {
        Data::Null if ty != ValueType::EndOfStream => ValueType::Null,
        _ => ty,
    }
}

// =============================================================================
// Stream-based helpers
// =============================================================================

/// Read one value from a buffered stream
pub fn read_value<R: BufRead>(reader: &mut R) -> Result<Value> {
    Decoder::new(reader).decode()
}

/// Decode the first value held in `bytes`
pub fn decode_value(bytes: &[u8]) -> Result<Value> {
    Decoder::new(bytes).decode()
}

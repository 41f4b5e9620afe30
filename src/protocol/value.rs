//! Value definitions
//!
//! Represents every decoded protocol unit.

use std::fmt;

use bytes::Bytes;

/// Value types, one per wire marker byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ValueType {
    BlobString = b'$',
    BlobError = b'!',
    VerbatimString = b'=',
    SimpleString = b'+',
    SimpleError = b'-',
    Double = b',',
    BigNumber = b'(',
    Integer = b':',
    Null = b'_',
    EndOfStream = b'.',
    Boolean = b'#',
    Array = b'*',
    Set = b'~',
    Push = b'>',
    Map = b'%',
    Attributes = b'|',
}

impl ValueType {
    /// Every type, in marker-table order
    pub const ALL: [ValueType; 16] = [
        ValueType::BlobString,
        ValueType::BlobError,
        ValueType::VerbatimString,
        ValueType::SimpleString,
        ValueType::SimpleError,
        ValueType::Double,
        ValueType::BigNumber,
        ValueType::Integer,
        ValueType::Null,
        ValueType::EndOfStream,
        ValueType::Boolean,
        ValueType::Array,
        ValueType::Set,
        ValueType::Push,
        ValueType::Map,
        ValueType::Attributes,
    ];

    /// The wire marker byte
    pub const fn marker(self) -> u8 {
        self as u8
    }

    /// Look up the type registered for a marker byte
    pub fn from_marker(marker: u8) -> Option<Self> {
        super::decoder::lookup(marker)
    }

    /// Simple or blob error
    pub fn is_error(self) -> bool {
        matches!(self, ValueType::SimpleError | ValueType::BlobError)
    }

    /// Map-shaped aggregates store interleaved key/value elements
    pub fn is_map(self) -> bool {
        matches!(self, ValueType::Map | ValueType::Attributes)
    }

    pub fn is_aggregate(self) -> bool {
        matches!(
            self,
            ValueType::Array | ValueType::Set | ValueType::Push | ValueType::Map | ValueType::Attributes
        )
    }
}

/// Payload of a value; which arm is populated follows the value type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Data {
    /// Raw text of strings, errors, doubles and big numbers
    Str(Bytes),

    /// Integers and booleans (1 / 0)
    Int(i64),

    /// Null and end-of-stream
    Null,

    /// Aggregate elements; maps are flattened key, value, key, value...
    Elements(Vec<Value>),
}

/// A decoded protocol value
///
/// Values are immutable once built. The attributes unit that preceded the
/// value on the wire, if any, travels with it and is reachable through
/// [`Value::attributes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Value {
    ty: ValueType,
    data: Data,
    attrs: Option<Box<Value>>,
}

impl Value {
    /// Build a value from its parts
    pub fn new(ty: ValueType, data: Data) -> Self {
        Self { ty, data, attrs: None }
    }

    pub fn blob_string(bytes: impl Into<Bytes>) -> Self {
        Self::new(ValueType::BlobString, Data::Str(bytes.into()))
    }

    pub fn simple_string(text: impl Into<Bytes>) -> Self {
        Self::new(ValueType::SimpleString, Data::Str(text.into()))
    }

    pub fn simple_error(text: impl Into<Bytes>) -> Self {
        Self::new(ValueType::SimpleError, Data::Str(text.into()))
    }

    pub fn integer(n: i64) -> Self {
        Self::new(ValueType::Integer, Data::Int(n))
    }

    pub fn boolean(b: bool) -> Self {
        Self::new(ValueType::Boolean, Data::Int(b as i64))
    }

    pub fn null() -> Self {
        Self::new(ValueType::Null, Data::Null)
    }

    pub fn array(elements: Vec<Value>) -> Self {
        Self::new(ValueType::Array, Data::Elements(elements))
    }

    pub fn set(elements: Vec<Value>) -> Self {
        Self::new(ValueType::Set, Data::Elements(elements))
    }

    pub fn push(elements: Vec<Value>) -> Self {
        Self::new(ValueType::Push, Data::Elements(elements))
    }

    /// Build a map, flattening entries into interleaved elements
    pub fn map(entries: Vec<(Value, Value)>) -> Self {
        Self::new(ValueType::Map, Data::Elements(flatten(entries)))
    }

    /// Build an attributes unit, flattening entries like [`Value::map`]
    pub fn attributes_unit(entries: Vec<(Value, Value)>) -> Self {
        Self::new(ValueType::Attributes, Data::Elements(flatten(entries)))
    }

    /// Attach the attributes unit that preceded this value
    pub fn with_attributes(mut self, attrs: Value) -> Self {
        self.attrs = Some(Box::new(attrs));
        self
    }

    pub(crate) fn set_attributes(&mut self, attrs: Option<Box<Value>>) {
        self.attrs = attrs;
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn value_type(&self) -> ValueType {
        self.ty
    }

    pub fn data(&self) -> &Data {
        &self.data
    }

    pub fn into_data(self) -> Data {
        self.data
    }

    /// The attributes unit attached to this value
    pub fn attributes(&self) -> Option<&Value> {
        self.attrs.as_deref()
    }

    pub fn is_null(&self) -> bool {
        matches!(self.data, Data::Null)
    }

    pub fn is_error(&self) -> bool {
        self.ty.is_error()
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match &self.data {
            Data::Str(b) => Some(b),
            _ => None,
        }
    }

    /// String payload, if it is valid UTF-8
    pub fn as_str(&self) -> Option<&str> {
        self.as_bytes().and_then(|b| std::str::from_utf8(b).ok())
    }

    pub fn as_int(&self) -> Option<i64> {
        match self.data {
            Data::Int(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match (self.ty, &self.data) {
            (ValueType::Boolean, Data::Int(n)) => Some(*n != 0),
            _ => None,
        }
    }

    pub fn elements(&self) -> Option<&[Value]> {
        match &self.data {
            Data::Elements(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_elements(self) -> Option<Vec<Value>> {
        match self.data {
            Data::Elements(v) => Some(v),
            _ => None,
        }
    }

    /// Key/value pairs of a map or attributes unit
    pub fn map_entries(&self) -> Option<impl Iterator<Item = (&Value, &Value)>> {
        if !self.ty.is_map() {
            return None;
        }
        self.elements()
            .map(|v| v.chunks_exact(2).map(|pair| (&pair[0], &pair[1])))
    }

    /// Error text of a simple or blob error
    pub fn error_message(&self) -> Option<&str> {
        if self.is_error() {
            self.as_str()
        } else {
            None
        }
    }
}

fn flatten(entries: Vec<(Value, Value)>) -> Vec<Value> {
    let mut elements = Vec::with_capacity(entries.len() * 2);
    for (k, v) in entries {
        elements.push(k);
        elements.push(v);
    }
    elements
}

// =============================================================================
// Display (redis-cli style)
// =============================================================================

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}

impl Value {
    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        match (&self.data, self.ty) {
            (Data::Null, ValueType::EndOfStream) => write!(f, "(end of stream)"),
            (Data::Null, _) => write!(f, "(nil)"),
            (Data::Int(n), ValueType::Boolean) => write!(f, "({})", *n != 0),
            (Data::Int(n), _) => write!(f, "(integer) {}", n),
            (Data::Str(s), ValueType::SimpleError | ValueType::BlobError) => {
                write!(f, "(error) {}", s.escape_ascii())
            }
            (Data::Str(s), ValueType::Double) => write!(f, "(double) {}", s.escape_ascii()),
            (Data::Str(s), ValueType::BigNumber) => write!(f, "(big number) {}", s.escape_ascii()),
            (Data::Str(s), ValueType::SimpleString) => write!(f, "{}", s.escape_ascii()),
            (Data::Str(s), _) => write!(f, "\"{}\"", s.escape_ascii()),
            (Data::Elements(v), _) if v.is_empty() => write!(f, "(empty {})", aggregate_name(self.ty)),
            (Data::Elements(v), ty) if ty.is_map() => {
                for (i, pair) in v.chunks(2).enumerate() {
                    if i > 0 {
                        write!(f, "\n{:indent$}", "", indent = indent)?;
                    }
                    let label = format!("{}# ", i + 1);
                    write!(f, "{}", label)?;
                    pair[0].fmt_indented(f, indent + label.len())?;
                    if let Some(value) = pair.get(1) {
                        write!(f, " => ")?;
                        value.fmt_indented(f, indent + label.len())?;
                    }
                }
                Ok(())
            }
            (Data::Elements(v), _) => {
                for (i, element) in v.iter().enumerate() {
                    if i > 0 {
                        write!(f, "\n{:indent$}", "", indent = indent)?;
                    }
                    let label = format!("{}) ", i + 1);
                    write!(f, "{}", label)?;
                    element.fmt_indented(f, indent + label.len())?;
                }
                Ok(())
            }
        }
    }
}

fn aggregate_name(ty: ValueType) -> &'static str {
    match ty {
        ValueType::Set => "set",
        ValueType::Push => "push",
        ValueType::Map => "map",
        ValueType::Attributes => "attributes",
        _ => "array",
    }
}

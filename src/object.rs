//! PDF object types.
//!
//! The object graph is an arena: composite values own their children, and every
//! cross-record edge is an [`ObjectRef`] naming a record id inside a specific
//! [`ObjectStorage`](crate::storage::ObjectStorage). Cycles are therefore plain integers
//! and never ownership cycles.

use crate::storage::StorageId;
use bytes::Bytes;
use indexmap::IndexMap;

/// Dictionary with insertion-ordered keys, so output is deterministic.
pub type Dictionary = IndexMap<String, Object>;

/// PDF object representation.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    /// Null object
    Null,
    /// Boolean value
    Boolean(bool),
    /// Integer value
    Integer(i64),
    /// Real (floating-point) value
    Real(f64),
    /// Name (written with a leading `/`)
    Name(String),
    /// Literal string, written as `(...)`
    LiteralString(Vec<u8>),
    /// Hexadecimal string, written as `<...>`
    HexString(Vec<u8>),
    /// Array of objects
    Array(Vec<Object>),
    /// Dictionary (key-value pairs)
    Dictionary(Dictionary),
    /// Stream (dictionary + data)
    Stream(Stream),
    /// Indirect object reference
    Reference(ObjectRef),
}

/// Stream object: a dictionary plus a raw, already-encoded payload.
///
/// The `Length` entry is computed when the stream is serialized and must not be
/// supplied by the caller.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Stream {
    /// Stream dictionary
    pub dict: Dictionary,
    /// Stream data
    pub data: Bytes,
}

impl Stream {
    /// Create a stream from a dictionary and payload.
    pub fn new(dict: Dictionary, data: impl Into<Bytes>) -> Self {
        Self {
            dict,
            data: data.into(),
        }
    }

    /// Create a stream with an empty dictionary.
    pub fn from_data(data: impl Into<Bytes>) -> Self {
        Self::new(Dictionary::new(), data)
    }
}

/// Reference to an indirect object.
///
/// A reference is only meaningful inside the storage that minted it; `storage`
/// records that identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    /// Object number
    pub id: u32,
    /// Generation number
    pub gen: u16,
    /// Identity of the owning storage
    pub storage: StorageId,
}

impl ObjectRef {
    /// Create a new object reference.
    pub fn new(id: u32, gen: u16, storage: StorageId) -> Self {
        Self { id, gen, storage }
    }
}

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} R", self.id, self.gen)
    }
}

/// Numeric value accepted by the token writer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    /// Integer, written without a fractional part
    Integer(i64),
    /// Real, written with at most six fractional digits
    Real(f64),
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number::Integer(value)
    }
}

impl From<i32> for Number {
    fn from(value: i32) -> Self {
        Number::Integer(value as i64)
    }
}

impl From<u32> for Number {
    fn from(value: u32) -> Self {
        Number::Integer(value as i64)
    }
}

impl From<usize> for Number {
    fn from(value: usize) -> Self {
        Number::Integer(value as i64)
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::Real(value)
    }
}

impl From<f32> for Number {
    fn from(value: f32) -> Self {
        Number::Real(value as f64)
    }
}

impl Object {
    /// Get the type name of this object (without data).
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Null => "Null",
            Object::Boolean(_) => "Boolean",
            Object::Integer(_) => "Integer",
            Object::Real(_) => "Real",
            Object::Name(_) => "Name",
            Object::LiteralString(_) => "LiteralString",
            Object::HexString(_) => "HexString",
            Object::Array(_) => "Array",
            Object::Dictionary(_) => "Dictionary",
            Object::Stream(_) => "Stream",
            Object::Reference(_) => "Reference",
        }
    }

    /// Create a Name object.
    pub fn name(s: impl Into<String>) -> Object {
        Object::Name(s.into())
    }

    /// Create a literal string object.
    pub fn literal(s: impl Into<Vec<u8>>) -> Object {
        Object::LiteralString(s.into())
    }

    /// Create a hexadecimal string object.
    pub fn hex(s: impl Into<Vec<u8>>) -> Object {
        Object::HexString(s.into())
    }

    /// Create a Dictionary object from key/value pairs, preserving their order.
    pub fn dict(entries: Vec<(&str, Object)>) -> Object {
        Object::Dictionary(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    /// Create a Stream object.
    pub fn stream(dict: Dictionary, data: impl Into<Bytes>) -> Object {
        Object::Stream(Stream::new(dict, data))
    }

    /// Try to cast to integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Object::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to cast to name.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Object::Name(s) => Some(s),
            _ => None,
        }
    }

    /// Try to cast to dictionary. Works for both Dictionary and Stream objects.
    pub fn as_dict(&self) -> Option<&Dictionary> {
        match self {
            Object::Dictionary(d) => Some(d),
            Object::Stream(stream) => Some(&stream.dict),
            _ => None,
        }
    }

    /// Try to cast to a mutable dictionary.
    pub fn as_dict_mut(&mut self) -> Option<&mut Dictionary> {
        match self {
            Object::Dictionary(d) => Some(d),
            Object::Stream(stream) => Some(&mut stream.dict),
            _ => None,
        }
    }

    /// Try to cast to array.
    pub fn as_array(&self) -> Option<&Vec<Object>> {
        match self {
            Object::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Try to cast to stream.
    pub fn as_stream(&self) -> Option<&Stream> {
        match self {
            Object::Stream(stream) => Some(stream),
            _ => None,
        }
    }

    /// Try to cast to reference.
    pub fn as_reference(&self) -> Option<ObjectRef> {
        match self {
            Object::Reference(r) => Some(*r),
            _ => None,
        }
    }

    /// Try to cast to string bytes (literal or hexadecimal).
    pub fn as_string(&self) -> Option<&[u8]> {
        match self {
            Object::LiteralString(s) | Object::HexString(s) => Some(s),
            _ => None,
        }
    }

    /// Check if object is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }

    /// Check if object is a stream.
    pub fn is_stream(&self) -> bool {
        matches!(self, Object::Stream(_))
    }
}

impl From<bool> for Object {
    fn from(value: bool) -> Self {
        Object::Boolean(value)
    }
}

impl From<i64> for Object {
    fn from(value: i64) -> Self {
        Object::Integer(value)
    }
}

impl From<f64> for Object {
    fn from(value: f64) -> Self {
        Object::Real(value)
    }
}

impl From<Number> for Object {
    fn from(value: Number) -> Self {
        match value {
            Number::Integer(i) => Object::Integer(i),
            Number::Real(r) => Object::Real(r),
        }
    }
}

impl From<ObjectRef> for Object {
    fn from(value: ObjectRef) -> Self {
        Object::Reference(value)
    }
}

impl From<Dictionary> for Object {
    fn from(value: Dictionary) -> Self {
        Object::Dictionary(value)
    }
}

impl From<Vec<Object>> for Object {
    fn from(value: Vec<Object>) -> Self {
        Object::Array(value)
    }
}

impl From<Stream> for Object {
    fn from(value: Stream) -> Self {
        Object::Stream(value)
    }
}

//! The typed object tree produced by content types.

use derive_more::Display;
use indexmap::IndexMap;

use crate::content::ContentTypeRef;
use crate::error::{Error, Result};

/// A value read by a [`crate::content::ContentType`]
///
/// The variant only says what shape the value has. The handler that produced it
/// decides how it is encoded.
#[derive(Debug, Clone, PartialEq, Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Value {
    /// Absent reference, written as type id 0
    #[display("null")]
    Null,
    #[display("{_0}")]
    Boolean(bool),
    #[display("{_0}")]
    Byte(u8),
    #[display("{_0}")]
    SByte(i8),
    #[display("{_0}")]
    Int16(i16),
    #[display("{_0}")]
    UInt16(u16),
    #[display("{_0}")]
    Int32(i32),
    #[display("{_0}")]
    UInt32(u32),
    #[display("{_0}")]
    Int64(i64),
    #[display("{_0}")]
    UInt64(u64),
    #[display("{_0}")]
    Single(f32),
    #[display("{_0}")]
    Double(f64),
    #[display("{_0:?}")]
    Char(char),
    #[display("{_0:?}")]
    String(String),
    /// Duration in 100ns ticks
    #[display("{_0} ticks")]
    TimeSpan(i64),
    /// Raw byte array
    #[display("[{} bytes]", _0.len())]
    Bytes(Vec<u8>),
    /// Fixed array or list
    #[display("[{} items]", _0.len())]
    Array(Vec<Value>),
    /// Key value pairs in stream order
    #[display("{{{} entries}}", _0.len())]
    Map(Vec<(Value, Value)>),
    /// Named fields in declaration order
    #[display("{{{} fields}}", _0.len())]
    Record(IndexMap<String, Value>),
}

impl Value {
    /// Name of the variant, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Boolean(_) => "Boolean",
            Value::Byte(_) => "Byte",
            Value::SByte(_) => "SByte",
            Value::Int16(_) => "Int16",
            Value::UInt16(_) => "UInt16",
            Value::Int32(_) => "Int32",
            Value::UInt32(_) => "UInt32",
            Value::Int64(_) => "Int64",
            Value::UInt64(_) => "UInt64",
            Value::Single(_) => "Single",
            Value::Double(_) => "Double",
            Value::Char(_) => "Char",
            Value::String(_) => "String",
            Value::TimeSpan(_) => "TimeSpan",
            Value::Bytes(_) => "Bytes",
            Value::Array(_) => "Array",
            Value::Map(_) => "Map",
            Value::Record(_) => "Record",
        }
    }

    /// Error for a value that does not fit the handler writing it
    pub fn mismatch(&self, expected: impl Into<String>) -> Error {
        Error::TypeMismatch {
            expected: expected.into(),
            found: self.kind().to_owned(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Record(fields) => Some(fields),
            _ => None,
        }
    }

    /// Look up a field of a record
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.as_record().and_then(|fields| fields.get(name))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int32(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

/// A value together with the handler of its root
///
/// Handlers of nested values follow from the root handler's schema.
#[derive(Debug, Clone)]
pub struct TypedObject {
    pub content_type: ContentTypeRef,
    pub value: Value,
}

impl TypedObject {
    pub fn new(content_type: ContentTypeRef, value: Value) -> TypedObject {
        TypedObject {
            content_type,
            value,
        }
    }
}

impl PartialEq for TypedObject {
    fn eq(&self, other: &Self) -> bool {
        self.content_type.name() == other.content_type.name() && self.value == other.value
    }
}

/// Fetch a required field of a record value
pub(crate) fn require_field<'v>(
    fields: &'v IndexMap<String, Value>,
    name: &str,
) -> Result<&'v Value> {
    fields
        .get(name)
        .ok_or_else(|| Error::InvalidValue(format!("missing field `{name}`")))
}

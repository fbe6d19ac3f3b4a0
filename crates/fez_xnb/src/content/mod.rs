//! Content types: the handlers that read and write one structural type.
//!
//! Every handler has two qualifiers. [`ContentType::name`] is the reader name written
//! in a container's type table. [`ContentType::target`] is the runtime type the
//! handler produces, which generic handlers use as their template arguments.
//!
//! | Handler                          | Reader name                                      |
//! |----------------------------------|--------------------------------------------------|
//! | [`primitive::PrimitiveContentType`] | `Microsoft.Xna.Framework.Content.Int32Reader`, ... |
//! | [`primitive::EnumContentType`]   | `...EnumReader`1[[T]]`                           |
//! | [`generic::ArrayContentType`]    | `...ArrayReader`1[[T]]`                          |
//! | [`generic::ByteArrayContentType`] | `...ArrayReader`1[[System.Byte]]`               |
//! | [`generic::ListContentType`]     | `...ListReader`1[[T]]`                           |
//! | [`generic::DictionaryContentType`] | `...DictionaryReader`2[[K],[V]]`               |
//! | [`generic::NullableContentType`] | `...NullableReader`1[[T]]`                       |
//! | [`record::RecordContentType`]    | declared by the schema                           |

use std::fmt::Debug;
use std::io::{self, Cursor, Read, Write};
use std::sync::Arc;

use tracing::debug;

use crate::binary::{ReadXnbExt, WriteXnbExt};
use crate::error::{Error, Result};
use crate::qualifier::TypeQualifier;
use crate::value::Value;

pub mod generic;
pub mod primitive;
pub mod record;
pub mod xna;

/// Namespace of the readers shipped with XNA
pub const XNA_READERS: &str = "Microsoft.Xna.Framework.Content";

/// Shared handle to a content type
pub type ContentTypeRef = Arc<dyn ContentType>;

/// Whether a nested value is preceded by its type id
///
/// XNA writes a type id before every reference type and before values written with
/// `WriteObject`, and nothing before raw value types. The schema author decides per
/// element and per field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tagging {
    /// A 7-bit type id precedes the value, 0 meaning null
    Tagged,
    /// The value follows directly
    Untagged,
}

/// Reads and writes one structural type
pub trait ContentType: Debug + Send + Sync {
    /// Qualifier written to the type table
    fn name(&self) -> &TypeQualifier;

    /// Qualifier of the runtime type this handler produces
    fn target(&self) -> &TypeQualifier;

    /// Read one value
    fn read(&self, ctx: &mut ReadContext) -> Result<Value>;

    /// Write one value
    fn write(&self, ctx: &mut WriteContext, value: &Value) -> Result<()>;

    /// Handlers this one delegates to
    fn dependencies(&self) -> Vec<ContentTypeRef> {
        Vec::new()
    }

    /// Project a value to JSON
    #[cfg(feature = "serde")]
    fn to_json(&self, value: &Value) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(value)?)
    }

    /// Rebuild a value from its JSON projection
    #[cfg(feature = "serde")]
    fn from_json(&self, json: &serde_json::Value) -> Result<Value>;
}

/// Every handler reachable from `root`, `root` first, without duplicate names
pub fn reachable(root: &ContentTypeRef) -> Vec<ContentTypeRef> {
    let mut found: Vec<ContentTypeRef> = Vec::new();
    let mut stack = vec![root.clone()];
    while let Some(handler) = stack.pop() {
        if found.iter().any(|h| h.name() == handler.name()) {
            continue;
        }
        let mut dependencies = handler.dependencies();
        dependencies.reverse();
        stack.extend(dependencies);
        found.push(handler);
    }
    found
}

/// One entry of a container's type table
#[derive(Debug, Clone, PartialEq)]
pub struct TypeTableEntry {
    /// Reader name as stored in the file
    pub name: String,

    /// Parsed reader name, `None` when it could not be parsed
    pub qualifier: Option<TypeQualifier>,

    /// Reader version, always 0 in practice
    pub version: i32,
}

impl TypeTableEntry {
    /// Entry for a parsed qualifier
    pub fn new(qualifier: TypeQualifier) -> TypeTableEntry {
        TypeTableEntry {
            name: qualifier.to_string(),
            qualifier: Some(qualifier),
            version: 0,
        }
    }

    /// Entry for a name read from a file
    pub fn parse(name: String, version: i32) -> TypeTableEntry {
        let qualifier = TypeQualifier::parse(&name).ok();
        TypeTableEntry {
            name,
            qualifier,
            version,
        }
    }
}

/// Cursor over a container body handed to [`ContentType::read`]
pub struct ReadContext<'a> {
    cursor: Cursor<&'a [u8]>,
    table: &'a [TypeTableEntry],
}

impl<'a> ReadContext<'a> {
    pub fn new(data: &'a [u8], table: &'a [TypeTableEntry]) -> ReadContext<'a> {
        ReadContext {
            cursor: Cursor::new(data),
            table,
        }
    }

    /// Read a nested value with `handler`
    pub fn read_object(&mut self, handler: &ContentTypeRef, tagging: Tagging) -> Result<Value> {
        if tagging == Tagging::Tagged {
            let id = self.read_7bit_encoded_int()?;
            if id == 0 {
                return Ok(Value::Null);
            }

            let entry = self
                .table
                .get(id as usize - 1)
                .ok_or(Error::UnknownTypeId {
                    id,
                    count: self.table.len(),
                })?;
            if entry.qualifier.as_ref() != Some(handler.name()) {
                debug!(
                    expected = %handler.name(),
                    found = %entry.name,
                    "type id does not match the schema"
                );
            }
        }

        handler.read(self)
    }

    /// Offset from the start of the data
    pub fn position(&self) -> u64 {
        self.cursor.position()
    }

    /// Bytes left to read
    pub fn remaining(&self) -> u64 {
        (self.cursor.get_ref().len() as u64).saturating_sub(self.cursor.position())
    }

    /// Borrow the unread bytes
    pub fn rest(&self) -> &'a [u8] {
        let data = *self.cursor.get_ref();
        &data[(self.cursor.position() as usize).min(data.len())..]
    }
}

impl Read for ReadContext<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.cursor.read(buf)
    }
}

/// Output buffer handed to [`ContentType::write`]
pub struct WriteContext<'a> {
    buffer: Vec<u8>,
    table: &'a [TypeTableEntry],
}

impl<'a> WriteContext<'a> {
    pub fn new(table: &'a [TypeTableEntry]) -> WriteContext<'a> {
        WriteContext {
            buffer: Vec::new(),
            table,
        }
    }

    /// 1-based id of `handler` in the type table
    pub fn type_id(&self, handler: &dyn ContentType) -> Result<u32> {
        self.table
            .iter()
            .position(|e| e.qualifier.as_ref() == Some(handler.name()))
            .map(|index| index as u32 + 1)
            .ok_or_else(|| Error::UnknownContentType(handler.name().to_string()))
    }

    /// Write a nested value with `handler`
    pub fn write_object(
        &mut self,
        handler: &ContentTypeRef,
        tagging: Tagging,
        value: &Value,
    ) -> Result<()> {
        if tagging == Tagging::Tagged {
            if value.is_null() {
                self.write_7bit_encoded_int(0)?;
                return Ok(());
            }
            let id = self.type_id(handler.as_ref())?;
            self.write_7bit_encoded_int(id)?;
        }

        handler.write(self, value)
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }
}

impl Write for WriteContext<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Reader name in the XNA namespace with the targets of `templates` as arguments
pub(crate) fn xna_reader(name: &str, templates: &[&ContentTypeRef]) -> TypeQualifier {
    templates
        .iter()
        .fold(TypeQualifier::new(XNA_READERS, name), |q, t| {
            q.with_template(t.target().clone())
        })
}

#[cfg(test)]
pub(crate) mod test {
    use pretty_assertions::assert_eq;

    use super::{reachable, ContentTypeRef, ReadContext, Tagging, TypeTableEntry, WriteContext};
    use crate::content::generic::{DictionaryContentType, ListContentType};
    use crate::content::primitive::{PrimitiveContentType, PrimitiveKind};
    use crate::error::{Error, Result};
    use crate::value::Value;

    /// Write `value` with `handler` and read it back, using the handlers reachable
    /// from `handler` as the type table
    pub(crate) fn round_trip(handler: &ContentTypeRef, value: &Value) -> Result<(Vec<u8>, Value)> {
        let table = reachable(handler)
            .iter()
            .map(|h| TypeTableEntry::new(h.name().clone()))
            .collect::<Vec<_>>();

        let mut writer = WriteContext::new(&table);
        writer.write_object(handler, Tagging::Untagged, value)?;
        let bytes = writer.into_inner();

        let mut reader = ReadContext::new(&bytes, &table);
        let read = reader.read_object(handler, Tagging::Untagged)?;
        assert_eq!(reader.remaining(), 0);

        Ok((bytes, read))
    }

    #[test]
    fn reachable_handlers_are_unique_and_ordered() {
        let string = PrimitiveContentType::shared(PrimitiveKind::String);
        let inner: ContentTypeRef =
            DictionaryContentType::shared(&string, Tagging::Tagged, &string, Tagging::Tagged);
        let outer: ContentTypeRef =
            DictionaryContentType::shared(&string, Tagging::Tagged, &inner, Tagging::Tagged);

        let names = reachable(&outer)
            .iter()
            .map(|h| h.name().name.clone())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["DictionaryReader", "StringReader", "DictionaryReader"]);
    }

    #[test]
    fn tagged_null_is_type_id_zero() -> Result<()> {
        let string = PrimitiveContentType::shared(PrimitiveKind::String);
        let table = vec![TypeTableEntry::new(string.name().clone())];

        let mut writer = WriteContext::new(&table);
        writer.write_object(&string, Tagging::Tagged, &Value::Null)?;
        writer.write_object(&string, Tagging::Tagged, &Value::from("a"))?;
        let bytes = writer.into_inner();
        assert_eq!(bytes, vec![0x00, 0x01, 0x01, b'a']);

        let mut reader = ReadContext::new(&bytes, &table);
        assert_eq!(reader.read_object(&string, Tagging::Tagged)?, Value::Null);
        assert_eq!(reader.read_object(&string, Tagging::Tagged)?, Value::from("a"));
        Ok(())
    }

    #[test]
    fn type_id_outside_the_table_is_rejected() {
        let int = PrimitiveContentType::shared(PrimitiveKind::Int32);
        let table = vec![TypeTableEntry::new(int.name().clone())];
        let bytes = [0x02, 0x00, 0x00, 0x00, 0x00];

        let mut reader = ReadContext::new(&bytes, &table);
        assert!(matches!(
            reader.read_object(&int, Tagging::Tagged),
            Err(Error::UnknownTypeId { id: 2, count: 1 })
        ));
    }

    #[test]
    fn unknown_handler_cannot_be_tagged() {
        let int = PrimitiveContentType::shared(PrimitiveKind::Int32);
        let list: ContentTypeRef = ListContentType::shared(&int, Tagging::Untagged);

        let mut writer = WriteContext::new(&[]);
        let result = writer.write_object(&list, Tagging::Tagged, &Value::Array(Vec::new()));
        assert!(matches!(result, Err(Error::UnknownContentType(_))));
    }
}

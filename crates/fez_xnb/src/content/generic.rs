//! Handlers for XNA's generic collection readers.
//!
//! Each one wraps the handlers of its elements and builds its reader name from their
//! target types, e.g. `ListReader`1[[System.Int32]]`.

use std::io::Read;
use std::sync::Arc;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::content::{xna_reader, ContentType, ContentTypeRef, ReadContext, Tagging, WriteContext};
use crate::error::{Error, Result};
use crate::qualifier::TypeQualifier;
use crate::value::Value;

const COLLECTIONS: &str = "System.Collections.Generic";

fn read_count(ctx: &mut ReadContext) -> Result<usize> {
    let count = ctx.read_i32::<LittleEndian>()?;
    usize::try_from(count).map_err(|_| Error::InvalidValue(format!("negative element count {count}")))
}

fn write_count(ctx: &mut WriteContext, count: usize) -> Result<()> {
    let count = i32::try_from(count)
        .map_err(|_| Error::InvalidValue(format!("{count} elements do not fit an i32 count")))?;
    ctx.write_i32::<LittleEndian>(count)?;
    Ok(())
}

/// Preallocate no more than the bytes left could hold
fn capacity(ctx: &ReadContext, count: usize) -> usize {
    count.min(ctx.remaining() as usize)
}

fn read_elements(
    ctx: &mut ReadContext,
    element: &ContentTypeRef,
    tagging: Tagging,
) -> Result<Vec<Value>> {
    let count = read_count(ctx)?;
    let mut items = Vec::with_capacity(capacity(ctx, count));
    for _ in 0..count {
        items.push(ctx.read_object(element, tagging)?);
    }
    Ok(items)
}

fn write_elements(
    ctx: &mut WriteContext,
    element: &ContentTypeRef,
    tagging: Tagging,
    items: &[Value],
) -> Result<()> {
    write_count(ctx, items.len())?;
    for item in items {
        ctx.write_object(element, tagging, item)?;
    }
    Ok(())
}

#[cfg(feature = "serde")]
fn element_to_json(handler: &ContentTypeRef, value: &Value) -> Result<serde_json::Value> {
    if value.is_null() {
        Ok(serde_json::Value::Null)
    } else {
        handler.to_json(value)
    }
}

#[cfg(feature = "serde")]
fn element_from_json(
    handler: &ContentTypeRef,
    tagging: Tagging,
    json: &serde_json::Value,
) -> Result<Value> {
    if json.is_null() && tagging == Tagging::Tagged {
        Ok(Value::Null)
    } else {
        handler.from_json(json)
    }
}

#[cfg(feature = "serde")]
fn json_array<'j>(json: &'j serde_json::Value, target: &TypeQualifier) -> Result<&'j Vec<serde_json::Value>> {
    json.as_array()
        .ok_or_else(|| Error::InvalidValue(format!("expected an array for {target}, found {json}")))
}

/// Fixed size array, `T[]`
#[derive(Debug)]
pub struct ArrayContentType {
    name: TypeQualifier,
    target: TypeQualifier,
    element: ContentTypeRef,
    tagging: Tagging,
}

impl ArrayContentType {
    pub fn new(element: &ContentTypeRef, tagging: Tagging) -> ArrayContentType {
        ArrayContentType {
            name: xna_reader("ArrayReader", &[element]),
            target: element.target().clone().array_of(),
            element: element.clone(),
            tagging,
        }
    }

    pub fn shared(element: &ContentTypeRef, tagging: Tagging) -> ContentTypeRef {
        Arc::new(ArrayContentType::new(element, tagging))
    }
}

impl ContentType for ArrayContentType {
    fn name(&self) -> &TypeQualifier {
        &self.name
    }

    fn target(&self) -> &TypeQualifier {
        &self.target
    }

    fn read(&self, ctx: &mut ReadContext) -> Result<Value> {
        read_elements(ctx, &self.element, self.tagging).map(Value::Array)
    }

    fn write(&self, ctx: &mut WriteContext, value: &Value) -> Result<()> {
        let items = value
            .as_array()
            .ok_or_else(|| value.mismatch(self.target.to_string()))?;
        write_elements(ctx, &self.element, self.tagging, items)
    }

    fn dependencies(&self) -> Vec<ContentTypeRef> {
        vec![self.element.clone()]
    }

    #[cfg(feature = "serde")]
    fn to_json(&self, value: &Value) -> Result<serde_json::Value> {
        let items = value
            .as_array()
            .ok_or_else(|| value.mismatch(self.target.to_string()))?;
        items
            .iter()
            .map(|item| element_to_json(&self.element, item))
            .collect::<Result<Vec<_>>>()
            .map(serde_json::Value::Array)
    }

    #[cfg(feature = "serde")]
    fn from_json(&self, json: &serde_json::Value) -> Result<Value> {
        json_array(json, &self.target)?
            .iter()
            .map(|item| element_from_json(&self.element, self.tagging, item))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array)
    }
}

/// `byte[]`, read in one go into [`Value::Bytes`]
#[derive(Debug)]
pub struct ByteArrayContentType {
    name: TypeQualifier,
    target: TypeQualifier,
}

impl ByteArrayContentType {
    pub fn new() -> ByteArrayContentType {
        let byte = TypeQualifier::new("System", "Byte");
        ByteArrayContentType {
            name: TypeQualifier::new(crate::content::XNA_READERS, "ArrayReader")
                .with_template(byte.clone()),
            target: byte.array_of(),
        }
    }

    pub fn shared() -> ContentTypeRef {
        Arc::new(ByteArrayContentType::new())
    }
}

impl Default for ByteArrayContentType {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentType for ByteArrayContentType {
    fn name(&self) -> &TypeQualifier {
        &self.name
    }

    fn target(&self) -> &TypeQualifier {
        &self.target
    }

    fn read(&self, ctx: &mut ReadContext) -> Result<Value> {
        let count = read_count(ctx)?;
        if count as u64 > ctx.remaining() {
            return Err(Error::TruncatedStream(format!(
                "byte array of {count} bytes with {} left",
                ctx.remaining()
            )));
        }
        let mut data = vec![0; count];
        ctx.read_exact(&mut data)?;
        Ok(Value::Bytes(data))
    }

    fn write(&self, ctx: &mut WriteContext, value: &Value) -> Result<()> {
        let Value::Bytes(data) = value else {
            return Err(value.mismatch("Byte[]"));
        };
        write_count(ctx, data.len())?;
        std::io::Write::write_all(ctx, data)?;
        Ok(())
    }

    #[cfg(feature = "serde")]
    fn from_json(&self, json: &serde_json::Value) -> Result<Value> {
        json_array(json, &self.target)?
            .iter()
            .map(|b| {
                b.as_u64()
                    .and_then(|b| u8::try_from(b).ok())
                    .ok_or_else(|| Error::InvalidValue(format!("{b} is not a byte")))
            })
            .collect::<Result<Vec<_>>>()
            .map(Value::Bytes)
    }
}

/// Growable list, `List<T>`
#[derive(Debug)]
pub struct ListContentType {
    name: TypeQualifier,
    target: TypeQualifier,
    element: ContentTypeRef,
    tagging: Tagging,
}

impl ListContentType {
    pub fn new(element: &ContentTypeRef, tagging: Tagging) -> ListContentType {
        ListContentType {
            name: xna_reader("ListReader", &[element]),
            target: TypeQualifier::new(COLLECTIONS, "List").with_template(element.target().clone()),
            element: element.clone(),
            tagging,
        }
    }

    pub fn shared(element: &ContentTypeRef, tagging: Tagging) -> ContentTypeRef {
        Arc::new(ListContentType::new(element, tagging))
    }
}

impl ContentType for ListContentType {
    fn name(&self) -> &TypeQualifier {
        &self.name
    }

    fn target(&self) -> &TypeQualifier {
        &self.target
    }

    fn read(&self, ctx: &mut ReadContext) -> Result<Value> {
        read_elements(ctx, &self.element, self.tagging).map(Value::Array)
    }

    fn write(&self, ctx: &mut WriteContext, value: &Value) -> Result<()> {
        let items = value
            .as_array()
            .ok_or_else(|| value.mismatch(self.target.to_string()))?;
        write_elements(ctx, &self.element, self.tagging, items)
    }

    fn dependencies(&self) -> Vec<ContentTypeRef> {
        vec![self.element.clone()]
    }

    #[cfg(feature = "serde")]
    fn to_json(&self, value: &Value) -> Result<serde_json::Value> {
        let items = value
            .as_array()
            .ok_or_else(|| value.mismatch(self.target.to_string()))?;
        items
            .iter()
            .map(|item| element_to_json(&self.element, item))
            .collect::<Result<Vec<_>>>()
            .map(serde_json::Value::Array)
    }

    #[cfg(feature = "serde")]
    fn from_json(&self, json: &serde_json::Value) -> Result<Value> {
        json_array(json, &self.target)?
            .iter()
            .map(|item| element_from_json(&self.element, self.tagging, item))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array)
    }
}

/// Key value map, `Dictionary<K, V>`
///
/// Entries keep their stream order. With `String` keys the JSON projection is an
/// object, otherwise an array of `{"key", "value"}` objects.
#[derive(Debug)]
pub struct DictionaryContentType {
    name: TypeQualifier,
    target: TypeQualifier,
    key: ContentTypeRef,
    key_tagging: Tagging,
    value: ContentTypeRef,
    value_tagging: Tagging,
}

impl DictionaryContentType {
    pub fn new(
        key: &ContentTypeRef,
        key_tagging: Tagging,
        value: &ContentTypeRef,
        value_tagging: Tagging,
    ) -> DictionaryContentType {
        DictionaryContentType {
            name: xna_reader("DictionaryReader", &[key, value]),
            target: TypeQualifier::new(COLLECTIONS, "Dictionary")
                .with_template(key.target().clone())
                .with_template(value.target().clone()),
            key: key.clone(),
            key_tagging,
            value: value.clone(),
            value_tagging,
        }
    }

    pub fn shared(
        key: &ContentTypeRef,
        key_tagging: Tagging,
        value: &ContentTypeRef,
        value_tagging: Tagging,
    ) -> ContentTypeRef {
        Arc::new(DictionaryContentType::new(key, key_tagging, value, value_tagging))
    }

    fn has_string_keys(&self) -> bool {
        *self.key.target() == TypeQualifier::new("System", "String")
    }

    fn entries<'v>(&self, value: &'v Value) -> Result<&'v [(Value, Value)]> {
        match value {
            Value::Map(entries) => Ok(entries),
            other => Err(other.mismatch(self.target.to_string())),
        }
    }
}

impl ContentType for DictionaryContentType {
    fn name(&self) -> &TypeQualifier {
        &self.name
    }

    fn target(&self) -> &TypeQualifier {
        &self.target
    }

    fn read(&self, ctx: &mut ReadContext) -> Result<Value> {
        let count = read_count(ctx)?;
        let mut entries = Vec::with_capacity(capacity(ctx, count));
        for _ in 0..count {
            let key = ctx.read_object(&self.key, self.key_tagging)?;
            let value = ctx.read_object(&self.value, self.value_tagging)?;
            entries.push((key, value));
        }
        Ok(Value::Map(entries))
    }

    fn write(&self, ctx: &mut WriteContext, value: &Value) -> Result<()> {
        let entries = self.entries(value)?;
        write_count(ctx, entries.len())?;
        for (k, v) in entries {
            ctx.write_object(&self.key, self.key_tagging, k)?;
            ctx.write_object(&self.value, self.value_tagging, v)?;
        }
        Ok(())
    }

    fn dependencies(&self) -> Vec<ContentTypeRef> {
        vec![self.key.clone(), self.value.clone()]
    }

    #[cfg(feature = "serde")]
    fn to_json(&self, value: &Value) -> Result<serde_json::Value> {
        let entries = self.entries(value)?;

        if self.has_string_keys() {
            let mut object = serde_json::Map::with_capacity(entries.len());
            for (k, v) in entries {
                let key = k.as_str().ok_or_else(|| k.mismatch("String"))?;
                object.insert(key.to_owned(), element_to_json(&self.value, v)?);
            }
            return Ok(serde_json::Value::Object(object));
        }

        entries
            .iter()
            .map(|(k, v)| -> Result<serde_json::Value> {
                Ok(serde_json::json!({
                    "key": element_to_json(&self.key, k)?,
                    "value": element_to_json(&self.value, v)?,
                }))
            })
            .collect::<Result<Vec<_>>>()
            .map(serde_json::Value::Array)
    }

    #[cfg(feature = "serde")]
    fn from_json(&self, json: &serde_json::Value) -> Result<Value> {
        if let serde_json::Value::Object(object) = json {
            if self.has_string_keys() {
                return object
                    .iter()
                    .map(|(k, v)| -> Result<(Value, Value)> {
                        Ok((
                            Value::from(k.as_str()),
                            element_from_json(&self.value, self.value_tagging, v)?,
                        ))
                    })
                    .collect::<Result<Vec<_>>>()
                    .map(Value::Map);
            }
        }

        let missing = |part: &str| Error::InvalidValue(format!("dictionary entry without `{part}`"));
        json_array(json, &self.target)?
            .iter()
            .map(|entry| -> Result<(Value, Value)> {
                let k = entry.get("key").ok_or_else(|| missing("key"))?;
                let v = entry.get("value").ok_or_else(|| missing("value"))?;
                Ok((
                    element_from_json(&self.key, self.key_tagging, k)?,
                    element_from_json(&self.value, self.value_tagging, v)?,
                ))
            })
            .collect::<Result<Vec<_>>>()
            .map(Value::Map)
    }
}

/// `Nullable<T>`: a presence flag then the untagged value
#[derive(Debug)]
pub struct NullableContentType {
    name: TypeQualifier,
    target: TypeQualifier,
    inner: ContentTypeRef,
}

impl NullableContentType {
    pub fn new(inner: &ContentTypeRef) -> NullableContentType {
        NullableContentType {
            name: xna_reader("NullableReader", &[inner]),
            target: TypeQualifier::new("System", "Nullable").with_template(inner.target().clone()),
            inner: inner.clone(),
        }
    }

    pub fn shared(inner: &ContentTypeRef) -> ContentTypeRef {
        Arc::new(NullableContentType::new(inner))
    }
}

impl ContentType for NullableContentType {
    fn name(&self) -> &TypeQualifier {
        &self.name
    }

    fn target(&self) -> &TypeQualifier {
        &self.target
    }

    fn read(&self, ctx: &mut ReadContext) -> Result<Value> {
        if ctx.read_u8()? == 0 {
            return Ok(Value::Null);
        }
        ctx.read_object(&self.inner, Tagging::Untagged)
    }

    fn write(&self, ctx: &mut WriteContext, value: &Value) -> Result<()> {
        if value.is_null() {
            ctx.write_u8(0)?;
            return Ok(());
        }
        ctx.write_u8(1)?;
        ctx.write_object(&self.inner, Tagging::Untagged, value)
    }

    fn dependencies(&self) -> Vec<ContentTypeRef> {
        vec![self.inner.clone()]
    }

    #[cfg(feature = "serde")]
    fn to_json(&self, value: &Value) -> Result<serde_json::Value> {
        element_to_json(&self.inner, value)
    }

    #[cfg(feature = "serde")]
    fn from_json(&self, json: &serde_json::Value) -> Result<Value> {
        element_from_json(&self.inner, Tagging::Tagged, json)
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::{
        ArrayContentType, ByteArrayContentType, DictionaryContentType, ListContentType,
        NullableContentType,
    };
    use crate::content::primitive::{PrimitiveContentType, PrimitiveKind};
    use crate::content::test::round_trip;
    use crate::content::{ContentType, ContentTypeRef, ReadContext, Tagging};
    use crate::error::{Error, Result};
    use crate::value::Value;

    fn int() -> ContentTypeRef {
        PrimitiveContentType::shared(PrimitiveKind::Int32)
    }

    fn string() -> ContentTypeRef {
        PrimitiveContentType::shared(PrimitiveKind::String)
    }

    #[test]
    fn list_of_int32() -> Result<()> {
        let list = ListContentType::shared(&int(), Tagging::Untagged);
        assert_eq!(
            list.name().to_string(),
            "Microsoft.Xna.Framework.Content.ListReader`1[[System.Int32]]"
        );
        assert_eq!(
            list.target().to_string(),
            "System.Collections.Generic.List`1[[System.Int32]]"
        );

        let value = Value::Array(vec![1.into(), 2.into(), 3.into()]);
        let (bytes, read) = round_trip(&list, &value)?;

        #[rustfmt::skip]
        assert_eq!(bytes, vec![
            0x03, 0x00, 0x00, 0x00,
            0x01, 0x00, 0x00, 0x00,
            0x02, 0x00, 0x00, 0x00,
            0x03, 0x00, 0x00, 0x00,
        ]);
        assert_eq!(read, value);
        Ok(())
    }

    #[test]
    fn empty_collections() -> Result<()> {
        let list = ListContentType::shared(&string(), Tagging::Tagged);
        let (bytes, read) = round_trip(&list, &Value::Array(Vec::new()))?;
        assert_eq!(bytes, vec![0x00; 4]);
        assert_eq!(read, Value::Array(Vec::new()));

        let map = DictionaryContentType::shared(&string(), Tagging::Tagged, &int(), Tagging::Untagged);
        let (bytes, read) = round_trip(&map, &Value::Map(Vec::new()))?;
        assert_eq!(bytes, vec![0x00; 4]);
        assert_eq!(read, Value::Map(Vec::new()));
        Ok(())
    }

    #[test]
    fn tagged_elements_carry_type_ids() -> Result<()> {
        let string = string();
        let array = ArrayContentType::shared(&string, Tagging::Tagged);
        assert_eq!(array.target().to_string(), "System.String[]");

        let value = Value::Array(vec![Value::from("a"), Value::Null]);
        let (bytes, read) = round_trip(&array, &value)?;

        // the table is [ArrayReader, StringReader], so strings are id 2
        #[rustfmt::skip]
        assert_eq!(bytes, vec![
            0x02, 0x00, 0x00, 0x00,
            0x02, 0x01, b'a',
            0x00,
        ]);
        assert_eq!(read, value);
        Ok(())
    }

    #[test]
    fn nested_dictionaries() -> Result<()> {
        let string = string();
        let inner = DictionaryContentType::shared(&string, Tagging::Tagged, &string, Tagging::Tagged);
        let outer = DictionaryContentType::shared(&string, Tagging::Tagged, &inner, Tagging::Tagged);

        let value = Value::Map(vec![
            (
                Value::from("en"),
                Value::Map(vec![(Value::from("HELLO"), Value::from("Hello"))]),
            ),
            (Value::from("fr"), Value::Map(Vec::new())),
        ]);
        let (_, read) = round_trip(&outer, &value)?;
        assert_eq!(read, value);
        Ok(())
    }

    #[test]
    fn byte_array_is_one_blob() -> Result<()> {
        let bytes = ByteArrayContentType::shared();
        assert_eq!(
            bytes.name().to_string(),
            "Microsoft.Xna.Framework.Content.ArrayReader`1[[System.Byte]]"
        );

        let (encoded, read) = round_trip(&bytes, &Value::Bytes(vec![9, 8, 7]))?;
        assert_eq!(encoded, vec![0x03, 0x00, 0x00, 0x00, 9, 8, 7]);
        assert_eq!(read, Value::Bytes(vec![9, 8, 7]));
        Ok(())
    }

    #[test]
    fn byte_array_longer_than_data_is_truncated() {
        let handler = ByteArrayContentType::shared();
        let data = [0x10, 0x00, 0x00, 0x00, 0x01];
        let mut ctx = ReadContext::new(&data, &[]);
        assert!(matches!(
            handler.read(&mut ctx),
            Err(Error::TruncatedStream(_))
        ));
    }

    #[test]
    fn negative_count_is_rejected() {
        let list = ListContentType::shared(&int(), Tagging::Untagged);
        let data = [0xFF, 0xFF, 0xFF, 0xFF];
        let mut ctx = ReadContext::new(&data, &[]);
        assert!(matches!(list.read(&mut ctx), Err(Error::InvalidValue(_))));
    }

    #[test]
    fn nullable_has_a_presence_flag() -> Result<()> {
        let nullable = NullableContentType::shared(&int());
        let (bytes, read) = round_trip(&nullable, &Value::Null)?;
        assert_eq!(bytes, vec![0x00]);
        assert_eq!(read, Value::Null);

        let (bytes, read) = round_trip(&nullable, &Value::Int32(5))?;
        assert_eq!(bytes, vec![0x01, 0x05, 0x00, 0x00, 0x00]);
        assert_eq!(read, Value::Int32(5));
        Ok(())
    }

    #[cfg(feature = "serde")]
    #[test]
    fn dictionary_json_shape_depends_on_keys() -> Result<()> {
        use serde_json::json;

        let by_name = DictionaryContentType::new(&string(), Tagging::Tagged, &int(), Tagging::Untagged);
        let value = Value::Map(vec![(Value::from("b"), 2.into()), (Value::from("a"), 1.into())]);
        let json = by_name.to_json(&value)?;
        assert_eq!(json, json!({"b": 2, "a": 1}));
        assert_eq!(by_name.from_json(&json)?, value);

        let by_number = DictionaryContentType::new(&int(), Tagging::Untagged, &string(), Tagging::Tagged);
        let value = Value::Map(vec![(7.into(), Value::from("seven")), (8.into(), Value::Null)]);
        let json = by_number.to_json(&value)?;
        assert_eq!(
            json,
            json!([{"key": 7, "value": "seven"}, {"key": 8, "value": null}])
        );
        assert_eq!(by_number.from_json(&json)?, value);
        Ok(())
    }
}

//! Structured types described by an ordered field schema.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::content::{ContentType, ContentTypeRef, ReadContext, Tagging, WriteContext};
use crate::error::{Error, Result};
use crate::qualifier::TypeQualifier;
use crate::value::{require_field, Value};

/// One named field of a [`RecordContentType`]
#[derive(Debug, Clone)]
pub struct RecordField {
    pub name: String,
    pub handler: ContentTypeRef,
    pub tagging: Tagging,
}

/// Reads and writes its fields in declaration order
///
/// The field order is the wire layout. Values are [`Value::Record`]s keyed by field
/// name.
///
/// ```
/// use fez_xnb::content::primitive::{PrimitiveContentType, PrimitiveKind};
/// use fez_xnb::content::record::RecordContentType;
/// use fez_xnb::content::Tagging;
/// use fez_xnb::TypeQualifier;
///
/// let int = PrimitiveContentType::shared(PrimitiveKind::Int32);
/// let point = RecordContentType::new(
///     TypeQualifier::new("Microsoft.Xna.Framework.Content", "PointReader"),
///     TypeQualifier::new("Microsoft.Xna.Framework", "Point"),
/// )
/// .field("X", &int, Tagging::Untagged)
/// .field("Y", &int, Tagging::Untagged);
///
/// assert_eq!(point.fields().len(), 2);
/// ```
#[derive(Debug)]
pub struct RecordContentType {
    name: TypeQualifier,
    target: TypeQualifier,
    fields: Vec<RecordField>,
}

impl RecordContentType {
    pub fn new(name: TypeQualifier, target: TypeQualifier) -> RecordContentType {
        RecordContentType {
            name,
            target,
            fields: Vec::new(),
        }
    }

    /// Append a field
    pub fn field(mut self, name: &str, handler: &ContentTypeRef, tagging: Tagging) -> Self {
        self.fields.push(RecordField {
            name: name.to_owned(),
            handler: handler.clone(),
            tagging,
        });
        self
    }

    pub fn fields(&self) -> &[RecordField] {
        &self.fields
    }

    pub fn shared(self) -> ContentTypeRef {
        Arc::new(self)
    }

    fn record<'v>(&self, value: &'v Value) -> Result<&'v IndexMap<String, Value>> {
        value
            .as_record()
            .ok_or_else(|| value.mismatch(self.target.to_string()))
    }
}

impl ContentType for RecordContentType {
    fn name(&self) -> &TypeQualifier {
        &self.name
    }

    fn target(&self) -> &TypeQualifier {
        &self.target
    }

    fn read(&self, ctx: &mut ReadContext) -> Result<Value> {
        let mut values = IndexMap::with_capacity(self.fields.len());
        for field in &self.fields {
            let value = ctx.read_object(&field.handler, field.tagging)?;
            values.insert(field.name.clone(), value);
        }
        Ok(Value::Record(values))
    }

    fn write(&self, ctx: &mut WriteContext, value: &Value) -> Result<()> {
        let values = self.record(value)?;
        for field in &self.fields {
            let value = require_field(values, &field.name)?;
            ctx.write_object(&field.handler, field.tagging, value)?;
        }
        Ok(())
    }

    fn dependencies(&self) -> Vec<ContentTypeRef> {
        self.fields.iter().map(|f| f.handler.clone()).collect()
    }

    #[cfg(feature = "serde")]
    fn to_json(&self, value: &Value) -> Result<serde_json::Value> {
        let values = self.record(value)?;
        let mut object = serde_json::Map::with_capacity(self.fields.len());
        for field in &self.fields {
            let value = require_field(values, &field.name)?;
            let json = if value.is_null() {
                serde_json::Value::Null
            } else {
                field.handler.to_json(value)?
            };
            object.insert(field.name.clone(), json);
        }
        Ok(serde_json::Value::Object(object))
    }

    #[cfg(feature = "serde")]
    fn from_json(&self, json: &serde_json::Value) -> Result<Value> {
        let object = json.as_object().ok_or_else(|| {
            Error::InvalidValue(format!("expected an object for {}, found {json}", self.target))
        })?;

        let mut values = IndexMap::with_capacity(self.fields.len());
        for field in &self.fields {
            let json = object.get(&field.name).ok_or_else(|| {
                Error::InvalidValue(format!("{} is missing field `{}`", self.target, field.name))
            })?;
            let value = if json.is_null() && field.tagging == Tagging::Tagged {
                Value::Null
            } else {
                field.handler.from_json(json)?
            };
            values.insert(field.name.clone(), value);
        }
        Ok(Value::Record(values))
    }
}

//! XNA framework value types, as records of scalar fields.

use crate::content::primitive::{PrimitiveContentType, PrimitiveKind};
use crate::content::record::RecordContentType;
use crate::content::{ContentTypeRef, Tagging, XNA_READERS};
use crate::qualifier::TypeQualifier;

const FRAMEWORK: &str = "Microsoft.Xna.Framework";

fn scalar_record(name: &str, kind: PrimitiveKind, fields: &[&str]) -> ContentTypeRef {
    let scalar = PrimitiveContentType::shared(kind);
    fields
        .iter()
        .fold(
            RecordContentType::new(
                TypeQualifier::new(XNA_READERS, format!("{name}Reader")),
                TypeQualifier::new(FRAMEWORK, name),
            ),
            |record, field| record.field(field, &scalar, Tagging::Untagged),
        )
        .shared()
}

/// `Rectangle`: X, Y, Width and Height as `i32`
pub fn rectangle() -> ContentTypeRef {
    scalar_record("Rectangle", PrimitiveKind::Int32, &["X", "Y", "Width", "Height"])
}

/// `Point`: X and Y as `i32`
pub fn point() -> ContentTypeRef {
    scalar_record("Point", PrimitiveKind::Int32, &["X", "Y"])
}

/// `Vector2`: X and Y as `f32`
pub fn vector2() -> ContentTypeRef {
    scalar_record("Vector2", PrimitiveKind::Single, &["X", "Y"])
}

/// `Vector3`: X, Y and Z as `f32`
pub fn vector3() -> ContentTypeRef {
    scalar_record("Vector3", PrimitiveKind::Single, &["X", "Y", "Z"])
}

/// `Color`: packed RGBA bytes
pub fn color() -> ContentTypeRef {
    scalar_record("Color", PrimitiveKind::Byte, &["R", "G", "B", "A"])
}

/// Every framework value type
pub fn all() -> Vec<ContentTypeRef> {
    vec![rectangle(), point(), vector2(), vector3(), color()]
}

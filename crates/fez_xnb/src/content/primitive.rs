//! Scalar content types.

use std::fmt::Write as _;
use std::sync::Arc;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::binary::{ReadXnbExt, WriteXnbExt};
use crate::content::{xna_reader, ContentType, ContentTypeRef, ReadContext, WriteContext, XNA_READERS};
use crate::error::{Error, Result};
use crate::qualifier::TypeQualifier;
use crate::value::Value;

const TICKS_PER_SECOND: u64 = 10_000_000;

/// The scalar types XNA has built-in readers for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Boolean,
    Byte,
    SByte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Single,
    Double,
    Char,
    String,
    TimeSpan,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 14] = [
        PrimitiveKind::Boolean,
        PrimitiveKind::Byte,
        PrimitiveKind::SByte,
        PrimitiveKind::Int16,
        PrimitiveKind::UInt16,
        PrimitiveKind::Int32,
        PrimitiveKind::UInt32,
        PrimitiveKind::Int64,
        PrimitiveKind::UInt64,
        PrimitiveKind::Single,
        PrimitiveKind::Double,
        PrimitiveKind::Char,
        PrimitiveKind::String,
        PrimitiveKind::TimeSpan,
    ];

    /// .NET name of the type, without namespace
    pub fn type_name(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "Boolean",
            PrimitiveKind::Byte => "Byte",
            PrimitiveKind::SByte => "SByte",
            PrimitiveKind::Int16 => "Int16",
            PrimitiveKind::UInt16 => "UInt16",
            PrimitiveKind::Int32 => "Int32",
            PrimitiveKind::UInt32 => "UInt32",
            PrimitiveKind::Int64 => "Int64",
            PrimitiveKind::UInt64 => "UInt64",
            PrimitiveKind::Single => "Single",
            PrimitiveKind::Double => "Double",
            PrimitiveKind::Char => "Char",
            PrimitiveKind::String => "String",
            PrimitiveKind::TimeSpan => "TimeSpan",
        }
    }
}

/// Handler for one [`PrimitiveKind`]
#[derive(Debug)]
pub struct PrimitiveContentType {
    kind: PrimitiveKind,
    name: TypeQualifier,
    target: TypeQualifier,
}

impl PrimitiveContentType {
    pub fn new(kind: PrimitiveKind) -> PrimitiveContentType {
        PrimitiveContentType {
            kind,
            name: reader_for(kind),
            target: TypeQualifier::new("System", kind.type_name()),
        }
    }

    pub fn shared(kind: PrimitiveKind) -> ContentTypeRef {
        Arc::new(PrimitiveContentType::new(kind))
    }

    /// A handler for every primitive kind
    pub fn all() -> Vec<ContentTypeRef> {
        PrimitiveKind::ALL.into_iter().map(Self::shared).collect()
    }

    pub fn kind(&self) -> PrimitiveKind {
        self.kind
    }
}

fn read_char<R: std::io::Read>(reader: &mut R) -> Result<char> {
    let first = reader.read_u8()?;
    let width = match first {
        0x00..=0x7F => 1,
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF7 => 4,
        _ => return Err(Error::InvalidValue(format!("{first:#04x} does not start a UTF-8 char"))),
    };
    let mut buffer = [first, 0, 0, 0];
    reader.read_exact(&mut buffer[1..width])?;
    let decoded = std::str::from_utf8(&buffer[..width])
        .map_err(|e| Error::InvalidValue(e.to_string()))?;
    decoded
        .chars()
        .next()
        .ok_or_else(|| Error::InvalidValue("empty char".into()))
}

impl ContentType for PrimitiveContentType {
    fn name(&self) -> &TypeQualifier {
        &self.name
    }

    fn target(&self) -> &TypeQualifier {
        &self.target
    }

    fn read(&self, ctx: &mut ReadContext) -> Result<Value> {
        Ok(match self.kind {
            PrimitiveKind::Boolean => Value::Boolean(ctx.read_u8()? != 0),
            PrimitiveKind::Byte => Value::Byte(ctx.read_u8()?),
            PrimitiveKind::SByte => Value::SByte(ctx.read_i8()?),
            PrimitiveKind::Int16 => Value::Int16(ctx.read_i16::<LittleEndian>()?),
            PrimitiveKind::UInt16 => Value::UInt16(ctx.read_u16::<LittleEndian>()?),
            PrimitiveKind::Int32 => Value::Int32(ctx.read_i32::<LittleEndian>()?),
            PrimitiveKind::UInt32 => Value::UInt32(ctx.read_u32::<LittleEndian>()?),
            PrimitiveKind::Int64 => Value::Int64(ctx.read_i64::<LittleEndian>()?),
            PrimitiveKind::UInt64 => Value::UInt64(ctx.read_u64::<LittleEndian>()?),
            PrimitiveKind::Single => Value::Single(ctx.read_f32::<LittleEndian>()?),
            PrimitiveKind::Double => Value::Double(ctx.read_f64::<LittleEndian>()?),
            PrimitiveKind::Char => Value::Char(read_char(ctx)?),
            PrimitiveKind::String => Value::String(ctx.read_xnb_string()?),
            PrimitiveKind::TimeSpan => Value::TimeSpan(ctx.read_i64::<LittleEndian>()?),
        })
    }

    fn write(&self, ctx: &mut WriteContext, value: &Value) -> Result<()> {
        match (self.kind, value) {
            (PrimitiveKind::Boolean, Value::Boolean(v)) => ctx.write_u8(u8::from(*v))?,
            (PrimitiveKind::Byte, Value::Byte(v)) => ctx.write_u8(*v)?,
            (PrimitiveKind::SByte, Value::SByte(v)) => ctx.write_i8(*v)?,
            (PrimitiveKind::Int16, Value::Int16(v)) => ctx.write_i16::<LittleEndian>(*v)?,
            (PrimitiveKind::UInt16, Value::UInt16(v)) => ctx.write_u16::<LittleEndian>(*v)?,
            (PrimitiveKind::Int32, Value::Int32(v)) => ctx.write_i32::<LittleEndian>(*v)?,
            (PrimitiveKind::UInt32, Value::UInt32(v)) => ctx.write_u32::<LittleEndian>(*v)?,
            (PrimitiveKind::Int64, Value::Int64(v)) => ctx.write_i64::<LittleEndian>(*v)?,
            (PrimitiveKind::UInt64, Value::UInt64(v)) => ctx.write_u64::<LittleEndian>(*v)?,
            (PrimitiveKind::Single, Value::Single(v)) => ctx.write_f32::<LittleEndian>(*v)?,
            (PrimitiveKind::Double, Value::Double(v)) => ctx.write_f64::<LittleEndian>(*v)?,
            (PrimitiveKind::Char, Value::Char(v)) => {
                let mut buffer = [0u8; 4];
                std::io::Write::write_all(ctx, v.encode_utf8(&mut buffer).as_bytes())?
            }
            (PrimitiveKind::String, Value::String(v)) => ctx.write_xnb_string(v)?,
            (PrimitiveKind::TimeSpan, Value::TimeSpan(v)) => ctx.write_i64::<LittleEndian>(*v)?,
            (kind, other) => return Err(other.mismatch(kind.type_name())),
        }
        Ok(())
    }

    #[cfg(feature = "serde")]
    fn to_json(&self, value: &Value) -> Result<serde_json::Value> {
        Ok(match value {
            Value::TimeSpan(ticks) => serde_json::Value::String(format_timespan(*ticks)),
            other => serde_json::to_value(other)?,
        })
    }

    #[cfg(feature = "serde")]
    fn from_json(&self, json: &serde_json::Value) -> Result<Value> {
        let invalid = || Error::InvalidValue(format!("{json} is not a {}", self.kind.type_name()));

        fn int<T: TryFrom<i64>>(json: &serde_json::Value) -> Option<T> {
            json.as_i64().and_then(|v| T::try_from(v).ok())
        }

        let value = match self.kind {
            PrimitiveKind::Boolean => json.as_bool().map(Value::Boolean),
            PrimitiveKind::Byte => int(json).map(Value::Byte),
            PrimitiveKind::SByte => int(json).map(Value::SByte),
            PrimitiveKind::Int16 => int(json).map(Value::Int16),
            PrimitiveKind::UInt16 => int(json).map(Value::UInt16),
            PrimitiveKind::Int32 => int(json).map(Value::Int32),
            PrimitiveKind::UInt32 => int(json).map(Value::UInt32),
            PrimitiveKind::Int64 => json.as_i64().map(Value::Int64),
            PrimitiveKind::UInt64 => json.as_u64().map(Value::UInt64),
            PrimitiveKind::Single => json.as_f64().map(|v| Value::Single(v as f32)),
            PrimitiveKind::Double => json.as_f64().map(Value::Double),
            PrimitiveKind::Char => json.as_str().and_then(|s| {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(Value::Char(c)),
                    _ => None,
                }
            }),
            PrimitiveKind::String => json.as_str().map(Value::from),
            PrimitiveKind::TimeSpan => match json {
                serde_json::Value::String(s) => parse_timespan(s).map(Value::TimeSpan),
                other => other.as_i64().map(Value::TimeSpan),
            },
        };

        value.ok_or_else(invalid)
    }
}

/// Format ticks the way .NET's invariant `TimeSpan` format does: `[-][d.]hh:mm:ss[.fffffff]`
pub fn format_timespan(ticks: i64) -> String {
    let magnitude = ticks.unsigned_abs();
    let fraction = magnitude % TICKS_PER_SECOND;
    let total_seconds = magnitude / TICKS_PER_SECOND;
    let days = total_seconds / 86_400;
    let hours = total_seconds % 86_400 / 3_600;
    let minutes = total_seconds % 3_600 / 60;
    let seconds = total_seconds % 60;

    let mut out = String::new();
    if ticks < 0 {
        out.push('-');
    }
    if days > 0 {
        let _ = write!(out, "{days}.");
    }
    let _ = write!(out, "{hours:02}:{minutes:02}:{seconds:02}");
    if fraction > 0 {
        let _ = write!(out, ".{fraction:07}");
    }
    out
}

/// Parse the output of [`format_timespan`]
pub fn parse_timespan(input: &str) -> Option<i64> {
    let (negative, input) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input),
    };

    let (head, tail) = input.split_once(':')?;
    let (days, hours) = match head.split_once('.') {
        Some((d, h)) => (d.parse::<u64>().ok()?, h.parse::<u64>().ok()?),
        None => (0, head.parse::<u64>().ok()?),
    };
    let (minutes, tail) = tail.split_once(':')?;
    let minutes = minutes.parse::<u64>().ok()?;
    let (seconds, fraction) = tail.split_once('.').unwrap_or((tail, ""));
    let seconds = seconds.parse::<u64>().ok()?;

    if hours >= 24 || minutes >= 60 || seconds >= 60 || fraction.len() > 7 {
        return None;
    }
    let fraction = if fraction.is_empty() {
        0
    } else {
        format!("{fraction:0<7}").parse::<u64>().ok()?
    };

    let total = days
        .checked_mul(24)?
        .checked_add(hours)?
        .checked_mul(60)?
        .checked_add(minutes)?
        .checked_mul(60)?
        .checked_add(seconds)?
        .checked_mul(TICKS_PER_SECOND)?
        .checked_add(fraction)?;
    let ticks = i64::try_from(total).ok()?;
    Some(if negative { -ticks } else { ticks })
}

/// Handler for an `i32` backed enum
///
/// Values stay [`Value::Int32`] in the tree. The variant names are only used for the
/// JSON projection.
#[derive(Debug)]
pub struct EnumContentType {
    name: TypeQualifier,
    target: TypeQualifier,
    variants: Vec<(String, i32)>,
}

impl EnumContentType {
    /// Enum whose variants are numbered from 0 in order
    pub fn new(target: TypeQualifier, variants: &[&str]) -> EnumContentType {
        EnumContentType {
            name: TypeQualifier::new(XNA_READERS, "EnumReader").with_template(target.clone()),
            target,
            variants: variants
                .iter()
                .zip(0..)
                .map(|(name, value)| ((*name).to_owned(), value))
                .collect(),
        }
    }

    pub fn shared(target: TypeQualifier, variants: &[&str]) -> ContentTypeRef {
        Arc::new(EnumContentType::new(target, variants))
    }

    /// Name of the variant with value `value`
    pub fn variant_name(&self, value: i32) -> Option<&str> {
        self.variants
            .iter()
            .find(|(_, v)| *v == value)
            .map(|(n, _)| n.as_str())
    }
}

impl ContentType for EnumContentType {
    fn name(&self) -> &TypeQualifier {
        &self.name
    }

    fn target(&self) -> &TypeQualifier {
        &self.target
    }

    fn read(&self, ctx: &mut ReadContext) -> Result<Value> {
        Ok(Value::Int32(ctx.read_i32::<LittleEndian>()?))
    }

    fn write(&self, ctx: &mut WriteContext, value: &Value) -> Result<()> {
        let raw = value
            .as_i32()
            .ok_or_else(|| value.mismatch(self.target.to_string()))?;
        ctx.write_i32::<LittleEndian>(raw)?;
        Ok(())
    }

    #[cfg(feature = "serde")]
    fn to_json(&self, value: &Value) -> Result<serde_json::Value> {
        let raw = value
            .as_i32()
            .ok_or_else(|| value.mismatch(self.target.to_string()))?;
        Ok(match self.variant_name(raw) {
            Some(name) => serde_json::Value::from(name),
            None => serde_json::Value::from(raw),
        })
    }

    #[cfg(feature = "serde")]
    fn from_json(&self, json: &serde_json::Value) -> Result<Value> {
        let found = match json {
            serde_json::Value::String(name) => self
                .variants
                .iter()
                .find(|(n, _)| n.eq_ignore_ascii_case(name))
                .map(|(_, v)| *v),
            other => other.as_i64().and_then(|v| i32::try_from(v).ok()),
        };
        found.map(Value::Int32).ok_or_else(|| {
            Error::InvalidValue(format!("{json} is not a variant of {}", self.target))
        })
    }
}

/// `Microsoft.Xna.Framework.Content.{Kind}Reader`
fn reader_for(kind: PrimitiveKind) -> TypeQualifier {
    xna_reader(&format!("{}Reader", kind.type_name()), &[])
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::{
        format_timespan, parse_timespan, EnumContentType, PrimitiveContentType, PrimitiveKind,
    };
    use crate::content::test::round_trip;
    use crate::content::ContentType;
    use crate::error::{Error, Result};
    use crate::qualifier::TypeQualifier;
    use crate::value::Value;

    #[test]
    fn primitives_round_trip() -> Result<()> {
        let cases = [
            (PrimitiveKind::Boolean, Value::Boolean(true), vec![0x01u8]),
            (PrimitiveKind::Byte, Value::Byte(0xFE), vec![0xFE]),
            (PrimitiveKind::SByte, Value::SByte(-2), vec![0xFE]),
            (PrimitiveKind::Int16, Value::Int16(-2), vec![0xFE, 0xFF]),
            (PrimitiveKind::UInt16, Value::UInt16(0x1234), vec![0x34, 0x12]),
            (PrimitiveKind::Int32, Value::Int32(-1), vec![0xFF; 4]),
            (PrimitiveKind::UInt32, Value::UInt32(7), vec![0x07, 0x00, 0x00, 0x00]),
            (PrimitiveKind::Int64, Value::Int64(1), vec![0x01, 0, 0, 0, 0, 0, 0, 0]),
            (PrimitiveKind::UInt64, Value::UInt64(u64::MAX), vec![0xFF; 8]),
            (PrimitiveKind::Single, Value::Single(1.0), vec![0x00, 0x00, 0x80, 0x3F]),
            (PrimitiveKind::Double, Value::Double(-2.0), vec![0, 0, 0, 0, 0, 0, 0, 0xC0]),
            (PrimitiveKind::Char, Value::Char('é'), vec![0xC3, 0xA9]),
            (PrimitiveKind::String, Value::from(""), vec![0x00]),
            (PrimitiveKind::String, Value::from("FEZ"), vec![0x03, b'F', b'E', b'Z']),
            (PrimitiveKind::TimeSpan, Value::TimeSpan(10_000), vec![0x10, 0x27, 0, 0, 0, 0, 0, 0]),
        ];

        for (kind, value, encoded) in cases {
            let handler = PrimitiveContentType::shared(kind);
            let (bytes, read) = round_trip(&handler, &value)?;
            assert_eq!(bytes, encoded, "{kind:?}");
            assert_eq!(read, value);
        }
        Ok(())
    }

    #[test]
    fn reader_names_follow_xna() {
        let handler = PrimitiveContentType::new(PrimitiveKind::Int32);
        assert_eq!(
            handler.name.to_string(),
            "Microsoft.Xna.Framework.Content.Int32Reader"
        );
        assert_eq!(handler.target.to_string(), "System.Int32");
        assert_eq!(
            PrimitiveContentType::new(PrimitiveKind::TimeSpan).name.to_string(),
            "Microsoft.Xna.Framework.Content.TimeSpanReader"
        );
    }

    #[test]
    fn wrong_value_kind_is_a_mismatch() {
        let handler = PrimitiveContentType::shared(PrimitiveKind::Int32);
        assert!(matches!(
            round_trip(&handler, &Value::from("12")),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn timespan_text_form() {
        assert_eq!(format_timespan(0), "00:00:00");
        assert_eq!(format_timespan(1_000_000), "00:00:00.1000000");
        assert_eq!(format_timespan(-36_000_000_000), "-01:00:00");
        assert_eq!(format_timespan(864_000_000_000 + 10_000_000), "1.00:00:01");

        assert_eq!(parse_timespan("00:00:00.1"), Some(1_000_000));
        assert_eq!(parse_timespan("1.00:00:01"), Some(864_010_000_000));
        assert_eq!(parse_timespan("-01:00:00"), Some(-36_000_000_000));
        assert_eq!(parse_timespan("25:00:00"), None);
        assert_eq!(parse_timespan("soon"), None);
    }

    #[test]
    fn enums_are_int32_on_the_wire() -> Result<()> {
        let handler = EnumContentType::shared(
            TypeQualifier::new("FezEngine.Structure", "AssembleChords"),
            &["C_maj", "Csharp_maj", "D_maj"],
        );
        assert_eq!(
            handler.name().to_string(),
            "Microsoft.Xna.Framework.Content.EnumReader`1[[FezEngine.Structure.AssembleChords]]"
        );

        let (bytes, read) = round_trip(&handler, &Value::Int32(2))?;
        assert_eq!(bytes, vec![0x02, 0x00, 0x00, 0x00]);
        assert_eq!(read, Value::Int32(2));
        Ok(())
    }

    #[cfg(feature = "serde")]
    #[test]
    fn enums_use_variant_names_in_json() -> Result<()> {
        let handler = EnumContentType::new(
            TypeQualifier::new("FezEngine.Structure", "AssembleChords"),
            &["C_maj", "Csharp_maj"],
        );

        assert_eq!(handler.to_json(&Value::Int32(1))?, serde_json::json!("Csharp_maj"));
        assert_eq!(handler.to_json(&Value::Int32(9))?, serde_json::json!(9));
        assert_eq!(handler.from_json(&serde_json::json!("c_maj"))?, Value::Int32(0));
        assert!(handler.from_json(&serde_json::json!("nope")).is_err());
        Ok(())
    }
}

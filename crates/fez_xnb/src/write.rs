use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};
use tracing::{debug, instrument};

use crate::binary::WriteXnbExt;
use crate::content::{reachable, ContentTypeRef, TypeTableEntry, WriteContext};
use crate::error::{Error, Result};
use crate::format::AssetFormat;
use crate::header::{XnbHeader, HEADER_SIZE};
use crate::read::{Payload, XnbFile};
use crate::value::TypedObject;

/// Writes typed objects as uncompressed containers
///
/// ```
/// use fez_xnb::content::generic::ListContentType;
/// use fez_xnb::content::primitive::{PrimitiveContentType, PrimitiveKind};
/// use fez_xnb::content::Tagging;
/// use fez_xnb::{TypedObject, Value, XnbWriter};
///
/// let int = PrimitiveContentType::shared(PrimitiveKind::Int32);
/// let list = ListContentType::shared(&int, Tagging::Untagged);
/// let object = TypedObject::new(list, Value::Array(vec![1.into(), 2.into(), 3.into()]));
///
/// let bytes = XnbWriter::for_object(&object).write(&object)?;
/// assert_eq!(&bytes[..3], b"XNB");
/// # Ok::<(), fez_xnb::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct XnbWriter {
    header: XnbHeader,
    content_types: Vec<ContentTypeRef>,
}

impl XnbWriter {
    /// Writer whose type table lists `content_types` in order
    pub fn new(content_types: Vec<ContentTypeRef>) -> XnbWriter {
        XnbWriter {
            header: XnbHeader::default(),
            content_types,
        }
    }

    /// Writer whose type table holds every handler reachable from the object's root
    pub fn for_object(object: &TypedObject) -> XnbWriter {
        XnbWriter::new(reachable(&object.content_type))
    }

    /// Writer using the type table an asset format declares
    pub fn for_format(format: &dyn AssetFormat) -> XnbWriter {
        XnbWriter::new(format.content_types())
    }

    /// Use the platform and profile of `header`, the compressed flag is always cleared
    pub fn with_header(mut self, header: XnbHeader) -> XnbWriter {
        self.header = header;
        self
    }

    /// Serialize `object` into a whole container
    #[instrument(skip_all, fields(primary = %object.content_type.name()), err)]
    pub fn write(&self, object: &TypedObject) -> Result<Vec<u8>> {
        let table = self
            .content_types
            .iter()
            .map(|h| TypeTableEntry::new(h.name().clone()))
            .collect::<Vec<_>>();

        assemble(self.header, &table, 0, &[], |ctx| {
            let id = ctx.type_id(object.content_type.as_ref())?;
            ctx.write_7bit_encoded_int(id)?;
            object.content_type.write(ctx, &object.value)
        })
    }

    /// Serialize `object` into `writer`
    pub fn write_to<W: Write>(&self, object: &TypedObject, writer: &mut W) -> Result<()> {
        writer.write_all(&self.write(object)?)?;
        Ok(())
    }
}

impl XnbFile {
    /// Serialize back to an uncompressed container
    ///
    /// The original type table is kept, so unconverted payloads are written back
    /// byte for byte.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        assemble(
            self.header,
            &self.type_table,
            self.shared_resources,
            &self.shared_data,
            |ctx| match &self.payload {
                Payload::Converted(object) => {
                    let id = ctx.type_id(object.content_type.as_ref())?;
                    ctx.write_7bit_encoded_int(id)?;
                    object.content_type.write(ctx, &object.value)
                }
                Payload::Unconverted {
                    primary_type_id,
                    data,
                } => {
                    ctx.write_7bit_encoded_int(*primary_type_id)?;
                    ctx.write_all(data)?;
                    Ok(())
                }
            },
        )
    }
}

/// Lay out header, type table, shared resource count and the primary object
fn assemble<F>(
    header: XnbHeader,
    table: &[TypeTableEntry],
    shared_resources: u32,
    shared_data: &[u8],
    primary: F,
) -> Result<Vec<u8>>
where
    F: FnOnce(&mut WriteContext) -> Result<()>,
{
    let mut ctx = WriteContext::new(table);

    let count = u32::try_from(table.len())
        .map_err(|_| Error::InvalidValue("type table is too large".into()))?;
    ctx.write_7bit_encoded_int(count)?;
    for entry in table {
        ctx.write_xnb_string(&entry.name)?;
        ctx.write_i32::<LittleEndian>(entry.version)?;
    }
    ctx.write_7bit_encoded_int(shared_resources)?;

    primary(&mut ctx)?;
    ctx.write_all(shared_data)?;
    let body = ctx.into_inner();

    let header = XnbHeader {
        flags: header.flags.with_compressed(false),
        file_size: u32::try_from(HEADER_SIZE + body.len())
            .map_err(|_| Error::InvalidValue("container exceeds 4 GiB".into()))?,
        ..header
    };
    debug!(size = header.file_size, types = table.len(), "assembled container");

    let mut output = header.to_bytes()?;
    output.extend_from_slice(&body);
    Ok(output)
}

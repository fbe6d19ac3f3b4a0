use std::io::Cursor;
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use tracing::{debug, instrument, warn};

use crate::binary::ReadXnbExt;
use crate::compression::{Decompressor, DecompressorOptions};
use crate::content::{ReadContext, TypeTableEntry};
use crate::error::{Error, Result};
use crate::header::XnbHeader;
use crate::qualifier::TypeQualifier;
use crate::registry::{self, TypeRegistry};
use crate::value::TypedObject;

/// The primary object of a container
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Read by a registered content type
    Converted(TypedObject),

    /// No content type is registered for the primary type, the bytes are kept as-is
    Unconverted {
        /// 1-based type table id of the primary object, 0 for null
        primary_type_id: u32,
        /// Everything after the primary type id
        data: Vec<u8>,
    },
}

/// A parsed XNB container
///
/// The body is always held decompressed.
#[derive(Debug, Clone, PartialEq)]
pub struct XnbFile {
    /// Header as read, the compressed flag may still be set
    pub header: XnbHeader,

    /// Type table in file order
    pub type_table: Vec<TypeTableEntry>,

    /// Declared number of shared resources
    pub shared_resources: u32,

    /// Bytes of the shared resources following a converted primary object
    pub shared_data: Vec<u8>,

    /// The primary object
    pub payload: Payload,
}

impl XnbFile {
    /// Read a container with the process wide registry and default options
    pub fn read(bytes: &[u8]) -> Result<XnbFile> {
        XnbFile::read_with(bytes, registry::global(), DecompressorOptions::default())
    }

    /// Read a container file from disk
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<XnbFile> {
        let bytes = std::fs::read(path.as_ref())?;
        XnbFile::read(&bytes)
    }

    /// Read a container, resolving types with `registry`
    #[instrument(skip_all, fields(size = bytes.len()), err)]
    pub fn read_with(
        bytes: &[u8],
        registry: &TypeRegistry,
        options: DecompressorOptions,
    ) -> Result<XnbFile> {
        let (header, body) = Decompressor::new(options).container_body(bytes)?;
        let mut cursor = Cursor::new(body.as_slice());

        let count = cursor.read_7bit_encoded_int()? as usize;
        let mut type_table = Vec::with_capacity(count.min(body.len()));
        for _ in 0..count {
            let name = cursor.read_xnb_string()?;
            let version = cursor.read_i32::<LittleEndian>()?;
            let entry = TypeTableEntry::parse(name, version);
            if entry.qualifier.is_none() {
                warn!(name = %entry.name, "unparseable type in the type table");
            }
            type_table.push(entry);
        }
        debug!(types = type_table.len(), "read type table");

        let shared_resources = cursor.read_7bit_encoded_int()?;
        if shared_resources > 0 {
            warn!(shared_resources, "shared resources are kept but never read");
        }

        let primary_type_id = cursor.read_7bit_encoded_int()?;
        let rest = &body[cursor.position() as usize..];

        let handler = match primary_type_id {
            0 => {
                warn!("primary object is null");
                None
            }
            id => {
                let entry = type_table
                    .get(id as usize - 1)
                    .ok_or(Error::UnknownTypeId {
                        id,
                        count: type_table.len(),
                    })?;
                let handler = entry
                    .qualifier
                    .as_ref()
                    .and_then(|q| registry.by_qualifier(q));
                if handler.is_none() {
                    warn!(name = %entry.name, "no content type registered, keeping raw payload");
                }
                handler
            }
        };

        let Some(handler) = handler else {
            return Ok(XnbFile {
                header,
                type_table,
                shared_resources,
                shared_data: Vec::new(),
                payload: Payload::Unconverted {
                    primary_type_id,
                    data: rest.to_vec(),
                },
            });
        };

        let mut ctx = ReadContext::new(rest, &type_table);
        let value = handler.read(&mut ctx)?;
        let remaining = ctx.remaining();
        let shared_data = ctx.rest().to_vec();
        if remaining > 0 && shared_resources == 0 {
            return Err(Error::TrailingData(remaining));
        }

        Ok(XnbFile {
            header,
            payload: Payload::Converted(TypedObject::new(handler.clone(), value)),
            type_table,
            shared_resources,
            shared_data,
        })
    }

    /// Reader name of the primary object
    pub fn primary_qualifier(&self) -> Option<&TypeQualifier> {
        match &self.payload {
            Payload::Converted(object) => Some(object.content_type.name()),
            Payload::Unconverted {
                primary_type_id, ..
            } => self
                .type_table
                .get((*primary_type_id as usize).checked_sub(1)?)
                .and_then(|e| e.qualifier.as_ref()),
        }
    }

    /// The typed object, if the primary type was understood
    pub fn object(&self) -> Option<&TypedObject> {
        match &self.payload {
            Payload::Converted(object) => Some(object),
            Payload::Unconverted { .. } => None,
        }
    }

    /// Whether a registered handler read the primary object
    pub fn is_converted(&self) -> bool {
        matches!(self.payload, Payload::Converted(_))
    }
}

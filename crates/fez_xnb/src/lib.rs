//! This library handles reading from and creating **XNB** asset containers used by *FEZ*.
//!
//! # XNB Container Format Documentation
//!
//! XNB is the content pipeline output of Microsoft XNA. Every asset the game loads
//! (text, music tracks, animations, levels) is one container holding one primary
//! object, described by a table of the readers needed to rebuild it.
//!
//! ## File Structure
//!
//! | Offset (bytes) | Field                  | Description                                                |
//! |----------------|------------------------|------------------------------------------------------------|
//! | 0x0000         | Magic number           | 3 bytes: `XNB`                                             |
//! | 0x0003         | Platform               | 1 byte: `w` (Windows), `x` (Xbox 360) or `m` (Phone)       |
//! | 0x0004         | Version                | 1 byte: Always 5                                           |
//! | 0x0005         | Flags                  | 1 byte: `0x80` compressed, `0x01` HiDef                    |
//! | 0x0006         | File Size              | 4 bytes: Size of the whole container                       |
//! | 0x000A         | Decompressed Size      | 4 bytes: Only present when compressed                      |
//!
//! The body follows, LZX compressed when the flag says so (see [`compression`]).
//!
//! ### Body
//!
//! | Field            | Description                                                              |
//! |------------------|--------------------------------------------------------------------------|
//! | Type Count       | 7-bit encoded number of type table entries                               |
//! | Type Table       | Per entry: 7-bit length prefixed reader name, then a 4 byte version      |
//! | Shared Resources | 7-bit encoded count, 0 for every FEZ asset                               |
//! | Primary Type Id  | 7-bit encoded 1-based index into the type table, 0 for null              |
//! | Primary Object   | Written by the reader the id points at                                   |
//!
//! Reader names are .NET type names, e.g.
//! ``Microsoft.Xna.Framework.Content.ListReader`1[[System.Int32]]``. They are parsed
//! into a [`TypeQualifier`] and looked up in a [`registry::TypeRegistry`]. Nested values
//! may carry their own 7-bit type id, see [`content::Tagging`].
//!
//! ## Additional Information
//!
//! - **File Extension**: `.xnb`
//! - **Endianness**: Little-endian for all multi-byte integers, big-endian for LZX
//!   frame sizes
//!
//! ```no_run
//! use fez_xnb::XnbFile;
//!
//! let file = XnbFile::open("gomez.xnb")?;
//! if let Some(object) = file.object() {
//!     println!("{}: {}", object.content_type.name(), object.value);
//! }
//! # Ok::<(), fez_xnb::Error>(())
//! ```

pub mod assets;
pub mod binary;
pub mod compression;
pub mod content;
pub mod error;
pub mod format;
pub mod header;
pub mod lzx;
pub mod qualifier;
pub mod read;
pub mod registry;
pub mod value;
pub mod write;

pub use compression::{compress, decompress, decompress_container, DecompressorOptions};
pub use content::{ContentType, ContentTypeRef, Tagging};
pub use error::{Error, Result};
pub use format::{AssetFormat, AssetFormatRef, FormatList};
pub use header::{XnbFlags, XnbHeader};
pub use qualifier::TypeQualifier;
pub use read::{Payload, XnbFile};
pub use registry::TypeRegistry;
pub use value::{TypedObject, Value};
pub use write::XnbWriter;

/// Extension of XNB containers
pub const XNB_EXTENSION: &str = "xnb";

//! This library handles reading from and creating **PAK** archives used by *FEZ*.
//!
//! # PAK Archive Format Documentation
//!
//! A PAK file bundles many named asset payloads (mostly XNB containers, plus raw
//! audio and shader blobs) into a single file. The game ships four of them in its
//! `Content` directory: `Essentials.pak`, `Music.pak`, `Other.pak` and `Updates.pak`.
//!
//! ## File Structure
//!
//! A PAK file consists of an entry count, an index describing every entry, and the
//! concatenated payloads of all entries in index order.
//!
//! | Offset (bytes) | Field                  | Description                                                |
//! |----------------|------------------------|------------------------------------------------------------|
//! | 0x0000         | Entry Count            | 4 bytes: Number of entries in the archive                  |
//! | 0x0004         | Index                  | Entry Count index records, see below                       |
//! | ...            | Payloads               | Entry payloads, back to back, in index order               |
//!
//! ### Index Record
//!
//! | Field        | Description                                                               |
//! |--------------|---------------------------------------------------------------------------|
//! | Path         | 7-bit encoded byte length followed by the UTF-8 path                      |
//! | Length       | 4 bytes: Size of the payload in bytes                                     |
//!
//! - **Path**: A relative, backslash separated path without an extension (e.g.
//!   `other textures\\splash\\polytron`). The extension is recovered by sniffing the
//!   payload, see [`PakEntry::sniff_extension`].
//! - **Length**: The payload of the entry. The offset of a payload is the sum of the
//!   lengths of all entries before it.
//!
//! Paths are not required to be unique. Replacing an entry is done by removing every
//! matching entry and adding the new one, see [`PakArchive::remove_all`].
//!
//! ## Additional Information
//!
//! - **File Extension**: `.pak`
//! - **Endianness**: Little-endian for all multi-byte integers
//!

pub mod error;
pub mod read;
pub mod sniff;
pub mod types;
pub mod write;

pub use read::{PakArchive, PakEntry};
pub use sniff::DEFAULT_EXTENSION;

/// Extension every PAK archive path must carry
pub const PAK_EXTENSION: &str = "pak";

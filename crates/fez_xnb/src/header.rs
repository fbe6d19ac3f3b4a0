//! The fixed 10 byte container header.

use std::io::Cursor;

use binrw::{binrw, BinRead, BinWrite};
use derive_more::Display;

use crate::error::{Error, Result};

/// Size of [`XnbHeader`] on the wire
pub const HEADER_SIZE: usize = 10;

/// Size of the decompressed size field that follows the header of a compressed container
pub const DECOMPRESSED_SIZE_FIELD: usize = 4;

/// The only container version this crate reads and writes
pub const XNB_VERSION: u8 = 5;

/// Target platform tag, `w` for Windows
pub const PLATFORM_WINDOWS: u8 = b'w';

/// Container flag bitset
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display)]
#[display("{_0:#04x}")]
pub struct XnbFlags(pub u8);

impl XnbFlags {
    /// Built for the HiDef graphics profile
    pub const HI_DEF: u8 = 0x01;

    /// Body is LZX compressed
    pub const COMPRESSED: u8 = 0x80;

    /// Whether the body is compressed
    pub fn is_compressed(self) -> bool {
        self.0 & Self::COMPRESSED != 0
    }

    /// Whether the content targets HiDef
    pub fn is_hi_def(self) -> bool {
        self.0 & Self::HI_DEF != 0
    }

    /// Copy of these flags with the compressed bit set or cleared
    pub fn with_compressed(self, compressed: bool) -> XnbFlags {
        if compressed {
            XnbFlags(self.0 | Self::COMPRESSED)
        } else {
            XnbFlags(self.0 & !Self::COMPRESSED)
        }
    }
}

/// XNB container header
///
/// | Field     | Size | Description                                   |
/// |-----------|------|-----------------------------------------------|
/// | Magic     | 3    | `XNB`                                         |
/// | Platform  | 1    | `w`, `x` or `m`                               |
/// | Version   | 1    | Always 5                                      |
/// | Flags     | 1    | See [`XnbFlags`]                              |
/// | File Size | 4    | Size of the whole container, header included  |
#[binrw]
#[brw(magic = b"XNB", little)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XnbHeader {
    /// Target platform tag
    pub platform: u8,

    /// Format version
    pub version: u8,

    /// Container flags
    pub flags: XnbFlags,

    /// Total size of the container in bytes
    pub file_size: u32,
}

impl Default for XnbHeader {
    fn default() -> Self {
        XnbHeader {
            platform: PLATFORM_WINDOWS,
            version: XNB_VERSION,
            flags: XnbFlags::default(),
            file_size: HEADER_SIZE as u32,
        }
    }
}

impl XnbHeader {
    /// Parse and validate the header at the start of `bytes`
    pub fn parse(bytes: &[u8]) -> Result<XnbHeader> {
        let header = XnbHeader::read(&mut Cursor::new(bytes)).map_err(|e| {
            let cause = e.root_cause();
            if matches!(cause, binrw::Error::BadMagic { .. }) {
                Error::InvalidMagic
            } else if cause.is_eof() {
                Error::TruncatedStream(format!(
                    "header needs {HEADER_SIZE} bytes, found {}",
                    bytes.len()
                ))
            } else {
                Error::BinRWError(e)
            }
        })?;

        if header.version != XNB_VERSION {
            return Err(Error::UnsupportedVersion(header.version));
        }

        Ok(header)
    }

    /// Whether the body following this header is compressed
    pub fn is_compressed(&self) -> bool {
        self.flags.is_compressed()
    }

    /// Serialize the header
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::with_capacity(HEADER_SIZE));
        self.write(&mut buffer)?;
        Ok(buffer.into_inner())
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use crate::error::{Error, Result};
    use crate::header::{XnbFlags, XnbHeader};

    #[test]
    fn parse_header() -> Result<()> {
        #[rustfmt::skip]
        let input = [
            b'X', b'N', b'B',
            b'w',
            0x05,
            0x81,
            0x2A, 0x01, 0x00, 0x00,
        ];

        let header = XnbHeader::parse(&input)?;
        assert_eq!(header.platform, b'w');
        assert!(header.is_compressed());
        assert!(header.flags.is_hi_def());
        assert_eq!(header.file_size, 0x12A);
        assert_eq!(header.to_bytes()?, input.to_vec());

        Ok(())
    }

    #[test]
    fn bad_magic_is_rejected() {
        let input = *b"XNA\x77\x05\x00\x0A\x00\x00\x00";
        assert!(matches!(XnbHeader::parse(&input), Err(Error::InvalidMagic)));
    }

    #[test]
    fn other_versions_are_rejected() {
        let input = *b"XNBw\x04\x00\x0A\x00\x00\x00";
        assert!(matches!(
            XnbHeader::parse(&input),
            Err(Error::UnsupportedVersion(4))
        ));
    }

    #[test]
    fn short_header_is_truncated() {
        assert!(matches!(
            XnbHeader::parse(b"XNBw\x05"),
            Err(Error::TruncatedStream(_))
        ));
    }

    #[test]
    fn compressed_flag_toggles() {
        let flags = XnbFlags(XnbFlags::HI_DEF | XnbFlags::COMPRESSED);
        assert_eq!(flags.with_compressed(false), XnbFlags(XnbFlags::HI_DEF));
        assert_eq!(XnbFlags(0).with_compressed(true).to_string(), "0x80");
    }
}

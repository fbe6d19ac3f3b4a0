//! Frame handling for compressed container bodies.
//!
//! A compressed body is a sequence of frames, each prefixed by its sizes:
//!
//! | Prefix                           | Frame size          | Block size            |
//! |----------------------------------|---------------------|-----------------------|
//! | `FF hi lo hi lo`                 | big-endian `u16`    | big-endian `u16`      |
//! | `hi lo` (first byte is not `FF`) | `0x8000`            | `(hi << 8) \| lo`     |
//!
//! A frame consumes `block size` compressed bytes and produces `frame size` bytes.

use std::io::{self, Cursor};

use bon::Builder;
use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt};
use tracing::{debug, instrument, warn};

use crate::error::{Error, Result};
use crate::header::{XnbHeader, DECOMPRESSED_SIZE_FIELD, HEADER_SIZE};
use crate::lzx::LzxDecoder;

/// Flag byte announcing explicit frame and block sizes
pub const FRAME_SENTINEL: u8 = 0xFF;

/// Frame size of frames without explicit sizes
pub const DEFAULT_FRAME_SIZE: usize = 0x8000;

/// Size prefix of one compressed frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Bytes this frame decompresses to
    pub frame_size: usize,

    /// Compressed bytes following the prefix
    pub block_size: usize,

    /// Whether the sizes were given after a [`FRAME_SENTINEL`]
    pub explicit: bool,
}

impl FrameHeader {
    /// Read a frame prefix
    pub fn read<R: io::Read>(reader: &mut R) -> io::Result<FrameHeader> {
        let flag = reader.read_u8()?;
        if flag == FRAME_SENTINEL {
            let frame_size = reader.read_u16::<BigEndian>()? as usize;
            let block_size = reader.read_u16::<BigEndian>()? as usize;
            Ok(FrameHeader {
                frame_size,
                block_size,
                explicit: true,
            })
        } else {
            let low = reader.read_u8()? as usize;
            Ok(FrameHeader {
                frame_size: DEFAULT_FRAME_SIZE,
                block_size: ((flag as usize) << 8) | low,
                explicit: false,
            })
        }
    }

    /// Size of the prefix on the wire
    pub fn encoded_len(&self) -> usize {
        if self.explicit {
            5
        } else {
            2
        }
    }

    /// A zero size ends the stream early
    pub fn is_end(&self) -> bool {
        self.frame_size == 0 || self.block_size == 0
    }
}

/// Options for how compressed bodies are decoded
#[derive(Debug, Clone, Copy, Builder)]
pub struct DecompressorOptions {
    /// Window size exponent, XNB always uses 16 (64 KiB)
    #[builder(default = 16)]
    pub window_bits: u8,

    /// Reset the window when a frame carries explicit sizes
    ///
    /// XNA only emits explicit sizes for a short final frame that continues the
    /// window; disable this to decode such streams.
    #[builder(default = true)]
    pub reset_on_explicit_frame: bool,
}

impl Default for DecompressorOptions {
    fn default() -> Self {
        DecompressorOptions::builder().build()
    }
}

/// Decodes compressed container bodies
#[derive(Debug, Clone, Copy, Default)]
pub struct Decompressor {
    options: DecompressorOptions,
}

impl Decompressor {
    /// Create a decompressor with the given options
    pub fn new(options: DecompressorOptions) -> Decompressor {
        Decompressor { options }
    }

    /// The options this decompressor was created with
    pub fn options(&self) -> DecompressorOptions {
        self.options
    }

    /// Decode every frame of `input` and check the result is `decompressed_size` long
    #[instrument(skip_all, fields(compressed = input.len(), decompressed_size = decompressed_size), err)]
    pub fn decompress(&self, input: &[u8], decompressed_size: usize) -> Result<Vec<u8>> {
        let mut lzx = LzxDecoder::new(self.options.window_bits)?;
        let mut output = Vec::with_capacity(decompressed_size);
        let mut cursor = Cursor::new(input);
        let mut frames = 0usize;

        while (cursor.position() as usize) < input.len() {
            let offset = cursor.position() as usize;
            let frame = FrameHeader::read(&mut cursor).map_err(|_| {
                Error::TruncatedStream(format!("frame prefix at offset {offset} is cut short"))
            })?;

            if frame.is_end() {
                debug!(offset, "zero sized frame ends the stream");
                break;
            }

            let start = offset + frame.encoded_len();
            let block = input.get(start..start + frame.block_size).ok_or_else(|| {
                Error::TruncatedStream(format!(
                    "frame at offset {offset} declares {} compressed bytes, {} remain",
                    frame.block_size,
                    input.len() - start
                ))
            })?;

            if frame.explicit && self.options.reset_on_explicit_frame {
                lzx.reset();
            }

            lzx.decompress_frame(block, frame.frame_size, &mut output)?;
            cursor.set_position((start + frame.block_size) as u64);
            frames += 1;
        }

        debug!(frames, decompressed = output.len(), "decompressed body");

        if output.len() != decompressed_size {
            return Err(Error::IntegrityFailure {
                expected: decompressed_size,
                actual: output.len(),
            });
        }

        Ok(output)
    }

    /// Split a whole container into its header and uncompressed body
    pub fn container_body(&self, bytes: &[u8]) -> Result<(XnbHeader, Vec<u8>)> {
        let header = XnbHeader::parse(bytes)?;
        let file_size = header.file_size as usize;
        if file_size > bytes.len() {
            return Err(Error::TruncatedStream(format!(
                "container declares {file_size} bytes, found {}",
                bytes.len()
            )));
        }
        if file_size < bytes.len() {
            warn!(
                extra = bytes.len() - file_size,
                "ignoring bytes after the declared container size"
            );
        }

        if !header.is_compressed() {
            let body = bytes
                .get(HEADER_SIZE..file_size)
                .ok_or_else(|| Error::TruncatedStream("container has no body".into()))?;
            return Ok((header, body.to_vec()));
        }

        let body_start = HEADER_SIZE + DECOMPRESSED_SIZE_FIELD;
        let size_field = bytes.get(HEADER_SIZE..body_start).ok_or_else(|| {
            Error::TruncatedStream("compressed container has no decompressed size".into())
        })?;
        let decompressed_size = LittleEndian::read_u32(size_field) as usize;
        let compressed = bytes.get(body_start..file_size).ok_or_else(|| {
            Error::TruncatedStream("compressed container has no body".into())
        })?;

        let body = self.decompress(compressed, decompressed_size)?;
        Ok((header, body))
    }
}

/// Decode a compressed body with the default options
pub fn decompress(input: &[u8], decompressed_size: usize) -> Result<Vec<u8>> {
    Decompressor::default().decompress(input, decompressed_size)
}

/// Compressing container bodies is not supported
pub fn compress(_input: &[u8]) -> Result<Vec<u8>> {
    Err(Error::Unsupported("LZX compression".into()))
}

/// Return an uncompressed copy of a whole container.
///
/// Uncompressed containers are copied as they are. Compressed ones get their body
/// decoded, the compressed flag cleared and the file size updated.
pub fn decompress_container(bytes: &[u8]) -> Result<Vec<u8>> {
    decompress_container_with(bytes, DecompressorOptions::default())
}

/// [`decompress_container`] with explicit options
pub fn decompress_container_with(bytes: &[u8], options: DecompressorOptions) -> Result<Vec<u8>> {
    let header = XnbHeader::parse(bytes)?;
    if !header.is_compressed() {
        return Ok(bytes.to_vec());
    }

    let (header, body) = Decompressor::new(options).container_body(bytes)?;
    let header = XnbHeader {
        flags: header.flags.with_compressed(false),
        file_size: u32::try_from(HEADER_SIZE + body.len())
            .map_err(|_| Error::InvalidValue("decompressed container exceeds 4 GiB".into()))?,
        ..header
    };

    let mut output = header.to_bytes()?;
    output.extend_from_slice(&body);
    Ok(output)
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use pretty_assertions::assert_eq;
    use tracing_test::traced_test;

    use super::{
        compress, decompress, decompress_container, Decompressor, DecompressorOptions,
        FrameHeader, FRAME_SENTINEL,
    };
    use crate::error::{Error, Result};
    use crate::lzx::test::{verbatim_a_block, BitWriter, Pretree};

    #[test]
    fn read_frame_headers() -> std::io::Result<()> {
        let explicit = FrameHeader::read(&mut Cursor::new([0xFF, 0x80, 0x00, 0x00, 0x64]))?;
        assert_eq!(
            explicit,
            FrameHeader {
                frame_size: 0x8000,
                block_size: 100,
                explicit: true
            }
        );

        let inherited = FrameHeader::read(&mut Cursor::new([0x12, 0x34]))?;
        assert_eq!(inherited.frame_size, 0x8000);
        assert_eq!(inherited.block_size, 0x1234);
        assert_eq!(inherited.encoded_len(), 2);
        Ok(())
    }

    fn hello_world_stream() -> Vec<u8> {
        #[rustfmt::skip]
        let mut input = vec![
            // frame: 11 bytes out of a 27 byte block
            0xFF, 0x00, 0x0B, 0x00, 0x1B,
            // no e8, uncompressed block of 11 bytes
            0x00, 0x30, 0xB0, 0x00,
            // R0, R1, R2
            0x01, 0x00, 0x00, 0x00,
            0x01, 0x00, 0x00, 0x00,
            0x01, 0x00, 0x00, 0x00,
        ];
        input.extend_from_slice(b"hello world");
        input
    }

    #[traced_test]
    #[test]
    fn decompress_single_frame() -> Result<()> {
        assert_eq!(decompress(&hello_world_stream(), 11)?, b"hello world");
        Ok(())
    }

    #[test]
    fn size_mismatch_is_an_integrity_failure() {
        let result = decompress(&hello_world_stream(), 12);
        assert!(matches!(
            result,
            Err(Error::IntegrityFailure {
                expected: 12,
                actual: 11
            })
        ));
    }

    #[test]
    fn zero_block_ends_stream_early() -> Result<()> {
        let mut input = hello_world_stream();
        input.extend_from_slice(&[0x00, 0x00, 0xAA, 0xBB, 0xCC]);
        assert_eq!(decompress(&input, 11)?, b"hello world");
        Ok(())
    }

    #[test]
    fn cut_block_is_truncated() {
        let input = hello_world_stream();
        let result = decompress(&input[..input.len() - 3], 11);
        assert!(matches!(result, Err(Error::TruncatedStream(_))));
    }

    /// Sentinel frame followed by an inherited frame, both 0x8000 bytes of `A`
    fn two_frame_stream() -> Vec<u8> {
        let mut first = BitWriter::default();
        first.write(0, 1);
        verbatim_a_block(&mut first, &Pretree { one: 16 }, 122, 157, true);
        let first = first.finish();

        // the second frame starts with a fresh block whose lengths are deltas
        // against the first block's trees, so symbol 0 keeps a length of 1
        let mut second = BitWriter::default();
        verbatim_a_block(&mut second, &Pretree { one: 0 }, 124, 100, false);
        let second = second.finish();

        let mut stream = vec![FRAME_SENTINEL, 0x80, 0x00];
        stream.extend_from_slice(&(first.len() as u16).to_be_bytes());
        stream.extend_from_slice(&first);
        stream.extend_from_slice(&(second.len() as u16).to_be_bytes());
        stream.extend_from_slice(&second);
        stream
    }

    #[traced_test]
    #[test]
    fn explicit_frame_then_inherited_frame_share_the_window() -> Result<()> {
        let stream = two_frame_stream();
        let output = decompress(&stream, 0x10000)?;

        assert_eq!(output.len(), 0x10000);
        assert!(output.iter().all(|&b| b == b'A'));
        Ok(())
    }

    #[test]
    fn window_reset_can_be_disabled() -> Result<()> {
        let options = DecompressorOptions::builder()
            .reset_on_explicit_frame(false)
            .build();
        let output = Decompressor::new(options).decompress(&two_frame_stream(), 0x10000)?;
        assert_eq!(output.len(), 0x10000);
        Ok(())
    }

    #[test]
    fn compression_is_unsupported() {
        assert!(matches!(compress(b"anything"), Err(Error::Unsupported(_))));
    }

    #[test]
    fn uncompressed_container_is_copied() -> Result<()> {
        let mut input = b"XNBw\x05\x01".to_vec();
        input.extend_from_slice(&16u32.to_le_bytes());
        input.extend_from_slice(&[0x01, 0x02, 0x03, 0x04, 0x05, 0x06]);

        assert_eq!(decompress_container(&input)?, input);
        Ok(())
    }

    #[test]
    fn compressed_container_is_reframed() -> Result<()> {
        let stream = hello_world_stream();
        let mut input = b"XNBw\x05\x81".to_vec();
        input.extend_from_slice(&((14 + stream.len()) as u32).to_le_bytes());
        input.extend_from_slice(&11u32.to_le_bytes());
        input.extend_from_slice(&stream);

        let mut expected = b"XNBw\x05\x01".to_vec();
        expected.extend_from_slice(&21u32.to_le_bytes());
        expected.extend_from_slice(b"hello world");

        assert_eq!(decompress_container(&input)?, expected);
        Ok(())
    }

    #[test]
    fn container_shorter_than_declared_is_truncated() {
        let mut input = b"XNBw\x05\x00".to_vec();
        input.extend_from_slice(&64u32.to_le_bytes());
        input.push(0x01);

        let result = Decompressor::default().container_body(&input);
        assert!(matches!(result, Err(Error::TruncatedStream(_))));
    }
}

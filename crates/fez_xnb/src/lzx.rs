//! LZX frame decoder.
//!
//! Decodes the LZX variant produced by XNA's content pipeline: a sliding window
//! shared by every frame of a stream, canonical Huffman trees whose code lengths
//! are sent as deltas against the previous block, three repeated match offsets
//! and optional Intel `E8` call translation.
//!
//! The decoder only knows about frames. Splitting a container body into frames is
//! done by [`crate::compression`].

use byteorder::{ByteOrder, LittleEndian};
use tracing::trace;

use crate::error::{Error, Result};

const MIN_MATCH: usize = 2;
const NUM_CHARS: usize = 256;
const NUM_PRIMARY_LENGTHS: usize = 7;
const NUM_SECONDARY_LENGTHS: usize = 249;

const PRETREE_NUM_ELEMENTS: usize = 20;
const PRETREE_TABLEBITS: u32 = 6;
const MAINTREE_MAXSYMBOLS: usize = NUM_CHARS + 50 * 8;
const MAINTREE_TABLEBITS: u32 = 12;
const LENGTH_MAXSYMBOLS: usize = NUM_SECONDARY_LENGTHS + 1;
const LENGTH_TABLEBITS: u32 = 12;
const ALIGNED_NUM_ELEMENTS: usize = 8;
const ALIGNED_TABLEBITS: u32 = 7;
const LENTABLE_SAFETY: usize = 64;

const HUFF_MAXBITS: u32 = 16;
const UNUSED: u16 = 0xFFFF;

/// Frames after which Intel call translation stops
const E8_MAX_FRAMES: u32 = 32768;

const EXTRA_BITS: [u8; 51] = extra_bits_table();
const POSITION_BASE: [u32; 51] = position_base_table();

const fn extra_bits_table() -> [u8; 51] {
    let mut table = [0u8; 51];
    let mut i = 0;
    let mut bits = 0u8;
    while i < 51 {
        table[i] = bits;
        if i + 1 < 51 {
            table[i + 1] = bits;
        }
        if i != 0 && bits < 17 {
            bits += 1;
        }
        i += 2;
    }
    table
}

const fn position_base_table() -> [u32; 51] {
    let mut table = [0u32; 51];
    let mut i = 0;
    let mut base = 0u32;
    while i < 51 {
        table[i] = base;
        base += 1 << EXTRA_BITS[i];
        i += 1;
    }
    table
}

fn corrupt(message: impl Into<String>) -> Error {
    Error::CorruptStream(message.into())
}

/// MSB-first bit reader over 16-bit little-endian words
///
/// Reads past the end of the input yield zero bits; the decoder checks how far it
/// overran once a block header has been read.
struct BitReader<'a> {
    input: &'a [u8],
    pos: usize,
    buffer: u32,
    bits_left: u32,
}

impl<'a> BitReader<'a> {
    fn new(input: &'a [u8]) -> BitReader<'a> {
        BitReader {
            input,
            pos: 0,
            buffer: 0,
            bits_left: 0,
        }
    }

    fn reset(&mut self) {
        self.buffer = 0;
        self.bits_left = 0;
    }

    fn next_byte(&mut self) -> u32 {
        let byte = self.input.get(self.pos).copied().unwrap_or(0);
        self.pos += 1;
        byte as u32
    }

    fn ensure(&mut self, bits: u32) {
        while self.bits_left < bits {
            let lo = self.next_byte();
            let hi = self.next_byte();
            self.buffer |= ((hi << 8) | lo) << (16 - self.bits_left);
            self.bits_left += 16;
        }
    }

    fn peek(&self, bits: u32) -> u32 {
        if bits == 0 {
            0
        } else {
            self.buffer >> (32 - bits)
        }
    }

    fn remove(&mut self, bits: u32) {
        self.buffer = self.buffer.checked_shl(bits).unwrap_or(0);
        self.bits_left -= bits;
    }

    fn read(&mut self, bits: u32) -> u32 {
        match bits {
            0 => 0,
            1..=16 => {
                self.ensure(bits);
                let value = self.peek(bits);
                self.remove(bits);
                value
            }
            _ => {
                let high = self.read(bits - 16);
                (high << 16) | self.read(16)
            }
        }
    }

    fn read_raw(&mut self, length: usize) -> Result<&'a [u8]> {
        let bytes = self
            .input
            .get(self.pos..self.pos + length)
            .ok_or_else(|| {
                Error::TruncatedStream(format!(
                    "uncompressed block needs {length} bytes at offset {}",
                    self.pos
                ))
            })?;
        self.pos += length;
        Ok(bytes)
    }
}

/// Canonical Huffman tree with a direct lookup table and overflow nodes for long codes
struct HuffmanTree {
    lens: Vec<u8>,
    table: Vec<u16>,
    table_bits: u32,
    symbols: usize,
    empty: bool,
}

impl HuffmanTree {
    fn new(max_symbols: usize, table_bits: u32) -> HuffmanTree {
        HuffmanTree {
            lens: vec![0; max_symbols + LENTABLE_SAFETY],
            table: vec![0; (1 << table_bits) + max_symbols * 2],
            table_bits,
            symbols: max_symbols,
            empty: true,
        }
    }

    fn clear_lengths(&mut self) {
        self.lens.fill(0);
    }

    /// Rebuild the lookup table from the first `symbols` code lengths
    fn build(&mut self, symbols: usize) -> Result<()> {
        self.symbols = symbols;
        self.empty = self.lens[..symbols].iter().all(|&l| l == 0);
        if self.empty {
            return Ok(());
        }

        let nbits = self.table_bits;
        let lens = &self.lens[..symbols];
        let table = &mut self.table;

        let mut pos: u32 = 0;
        let mut table_mask: u32 = 1 << nbits;
        let mut bit_mask: u32 = table_mask >> 1;

        for bit_num in 1..=nbits {
            for (sym, _) in lens.iter().enumerate().filter(|(_, &l)| l as u32 == bit_num) {
                let leaf = pos as usize;
                pos += bit_mask;
                if pos > table_mask {
                    return Err(corrupt("huffman table overrun"));
                }
                table[leaf..leaf + bit_mask as usize].fill(sym as u16);
            }
            bit_mask >>= 1;
        }

        if pos == table_mask {
            return Ok(());
        }

        table[pos as usize..table_mask as usize].fill(UNUSED);

        let mut next_symbol = (table_mask >> 1).max(symbols as u32) as usize;
        pos <<= 16;
        table_mask <<= 16;
        bit_mask = 1 << 15;

        for bit_num in nbits + 1..=HUFF_MAXBITS {
            for (sym, _) in lens.iter().enumerate().filter(|(_, &l)| l as u32 == bit_num) {
                if pos >= table_mask {
                    return Err(corrupt("huffman table overrun"));
                }
                let mut leaf = (pos >> 16) as usize;
                for fill in 0..bit_num - nbits {
                    if table[leaf] == UNUSED {
                        if (next_symbol << 1) + 1 >= table.len() {
                            return Err(corrupt("huffman table overrun"));
                        }
                        table[next_symbol << 1] = UNUSED;
                        table[(next_symbol << 1) + 1] = UNUSED;
                        table[leaf] = next_symbol as u16;
                        next_symbol += 1;
                    }
                    leaf = (table[leaf] as usize) << 1;
                    if (pos >> (15 - fill)) & 1 != 0 {
                        leaf += 1;
                    }
                }
                table[leaf] = sym as u16;
                pos += bit_mask;
            }
            bit_mask >>= 1;
        }

        if pos == table_mask {
            Ok(())
        } else {
            Err(corrupt("incomplete huffman table"))
        }
    }

    fn decode(&self, bits: &mut BitReader) -> Result<usize> {
        if self.empty {
            return Err(corrupt("symbol read from an empty huffman tree"));
        }

        bits.ensure(HUFF_MAXBITS);
        let mut sym = self.table[bits.peek(self.table_bits) as usize];
        if sym as usize >= self.symbols {
            let mut mask: u32 = 1 << (32 - self.table_bits);
            loop {
                mask >>= 1;
                if mask == 0 || sym == UNUSED {
                    return Err(corrupt("invalid huffman code"));
                }
                let index = ((sym as usize) << 1) | usize::from(bits.buffer & mask != 0);
                sym = *self
                    .table
                    .get(index)
                    .ok_or_else(|| corrupt("invalid huffman code"))?;
                if (sym as usize) < self.symbols {
                    break;
                }
            }
        }

        let sym = sym as usize;
        bits.remove(self.lens[sym] as u32);
        Ok(sym)
    }
}

/// Read code lengths `first..last` as pretree coded deltas against the previous lengths
fn read_lengths(
    pretree: &mut HuffmanTree,
    lens: &mut [u8],
    first: usize,
    last: usize,
    bits: &mut BitReader,
) -> Result<()> {
    for len in pretree.lens.iter_mut().take(PRETREE_NUM_ELEMENTS) {
        *len = bits.read(4) as u8;
    }
    pretree.build(PRETREE_NUM_ELEMENTS)?;

    let delta = |previous: u8, code: usize| ((previous as usize + 17 - code) % 17) as u8;

    let mut x = first;
    while x < last {
        match pretree.decode(bits)? {
            17 => {
                let run = bits.read(4) as usize + 4;
                zero_run(lens, x, run)?;
                x += run;
            }
            18 => {
                let run = bits.read(5) as usize + 20;
                zero_run(lens, x, run)?;
                x += run;
            }
            19 => {
                let run = bits.read(1) as usize + 4;
                let code = pretree.decode(bits)?;
                let slots = lens
                    .get_mut(x..x + run)
                    .ok_or_else(|| corrupt("code length run overflows the table"))?;
                let value = delta(slots[0], code);
                slots.fill(value);
                x += run;
            }
            code => {
                let slot = lens
                    .get_mut(x)
                    .ok_or_else(|| corrupt("code length run overflows the table"))?;
                *slot = delta(*slot, code);
                x += 1;
            }
        }
    }

    Ok(())
}

fn zero_run(lens: &mut [u8], start: usize, run: usize) -> Result<()> {
    lens.get_mut(start..start + run)
        .ok_or_else(|| corrupt("code length run overflows the table"))?
        .fill(0);
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockType {
    Invalid,
    Verbatim,
    Aligned,
    Uncompressed,
}

/// Stateful LZX decoder
///
/// The window, repeated offsets and tree lengths persist between calls to
/// [`LzxDecoder::decompress_frame`] until [`LzxDecoder::reset`] is called.
pub struct LzxDecoder {
    window: Vec<u8>,
    window_posn: usize,
    repeated: [usize; 3],
    main_elements: usize,
    header_read: bool,
    block_type: BlockType,
    block_length: usize,
    block_remaining: usize,
    frames_read: u32,
    intel_filesize: i32,
    intel_curpos: i32,
    intel_started: bool,
    pretree: HuffmanTree,
    main_tree: HuffmanTree,
    length_tree: HuffmanTree,
    aligned_tree: HuffmanTree,
}

impl LzxDecoder {
    /// Create a decoder with a window of `1 << window_bits` bytes.
    ///
    /// `window_bits` must be between 15 and 21.
    pub fn new(window_bits: u8) -> Result<LzxDecoder> {
        let position_slots = match window_bits {
            15 => 30,
            16 => 32,
            17 => 34,
            18 => 36,
            19 => 38,
            20 => 42,
            21 => 50,
            _ => {
                return Err(Error::Unsupported(format!(
                    "LZX window of {window_bits} bits"
                )))
            }
        };

        let mut decoder = LzxDecoder {
            window: vec![0; 1 << window_bits],
            window_posn: 0,
            repeated: [1; 3],
            main_elements: NUM_CHARS + (position_slots << 3),
            header_read: false,
            block_type: BlockType::Invalid,
            block_length: 0,
            block_remaining: 0,
            frames_read: 0,
            intel_filesize: 0,
            intel_curpos: 0,
            intel_started: false,
            pretree: HuffmanTree::new(PRETREE_NUM_ELEMENTS, PRETREE_TABLEBITS),
            main_tree: HuffmanTree::new(MAINTREE_MAXSYMBOLS, MAINTREE_TABLEBITS),
            length_tree: HuffmanTree::new(LENGTH_MAXSYMBOLS, LENGTH_TABLEBITS),
            aligned_tree: HuffmanTree::new(ALIGNED_NUM_ELEMENTS, ALIGNED_TABLEBITS),
        };
        decoder.reset();
        Ok(decoder)
    }

    /// Forget the window and every piece of state carried between frames
    pub fn reset(&mut self) {
        self.window.fill(0);
        self.window_posn = 0;
        self.repeated = [1; 3];
        self.header_read = false;
        self.block_type = BlockType::Invalid;
        self.block_length = 0;
        self.block_remaining = 0;
        self.frames_read = 0;
        self.intel_filesize = 0;
        self.intel_curpos = 0;
        self.intel_started = false;
        self.main_tree.clear_lengths();
        self.length_tree.clear_lengths();
    }

    /// Size of the sliding window in bytes
    pub fn window_size(&self) -> usize {
        self.window.len()
    }

    /// Decode one frame of `frame_size` bytes from `input`, appending it to `output`
    pub fn decompress_frame(
        &mut self,
        input: &[u8],
        frame_size: usize,
        output: &mut Vec<u8>,
    ) -> Result<()> {
        let window_size = self.window.len();
        if frame_size > window_size {
            return Err(corrupt(format!(
                "frame of {frame_size} bytes does not fit the {window_size} byte window"
            )));
        }

        let mut bits = BitReader::new(input);

        if !self.header_read {
            if bits.read(1) != 0 {
                let high = bits.read(16);
                let low = bits.read(16);
                self.intel_filesize = ((high << 16) | low) as i32;
            }
            self.header_read = true;
        }

        let mut togo = frame_size as isize;
        while togo > 0 {
            if self.block_remaining == 0 {
                self.read_block_header(&mut bits)?;
            }

            if bits.pos > input.len() && (bits.pos > input.len() + 2 || bits.bits_left < 16) {
                return Err(Error::TruncatedStream(format!(
                    "block header overruns the {} byte frame input",
                    input.len()
                )));
            }

            while self.block_remaining > 0 && togo > 0 {
                let run = (self.block_remaining as isize).min(togo);
                togo -= run;
                self.block_remaining -= run as usize;

                self.window_posn &= window_size - 1;
                if self.window_posn + run as usize > window_size {
                    return Err(corrupt("run crosses the end of the window"));
                }

                let leftover = match self.block_type {
                    BlockType::Verbatim => self.decode_matches(&mut bits, run, false)?,
                    BlockType::Aligned => self.decode_matches(&mut bits, run, true)?,
                    BlockType::Uncompressed => {
                        let raw = bits.read_raw(run as usize)?;
                        self.window[self.window_posn..self.window_posn + raw.len()]
                            .copy_from_slice(raw);
                        self.window_posn += raw.len();
                        0
                    }
                    BlockType::Invalid => return Err(corrupt("data before a block header")),
                };

                if leftover < 0 {
                    let overrun = leftover.unsigned_abs();
                    if overrun > self.block_remaining {
                        return Err(corrupt("match runs past the end of its block"));
                    }
                    self.block_remaining -= overrun;
                    togo -= overrun as isize;
                }
            }
        }

        if togo != 0 {
            return Err(corrupt(format!(
                "frame decoded {} bytes past its {frame_size} byte limit",
                -togo
            )));
        }

        let end = if self.window_posn == 0 {
            window_size
        } else {
            self.window_posn
        };
        let start = end
            .checked_sub(frame_size)
            .ok_or_else(|| corrupt("frame straddles the window wrap"))?;

        let offset = output.len();
        output.extend_from_slice(&self.window[start..end]);
        self.translate_e8(&mut output[offset..]);

        trace!(frame_size, block_remaining = self.block_remaining, "decoded lzx frame");

        Ok(())
    }

    fn read_block_header(&mut self, bits: &mut BitReader) -> Result<()> {
        if self.block_type == BlockType::Uncompressed {
            if self.block_length & 1 == 1 {
                bits.pos += 1;
            }
            bits.reset();
        }

        let kind = bits.read(3);
        let high = bits.read(16) as usize;
        let low = bits.read(8) as usize;
        self.block_length = (high << 8) | low;
        self.block_remaining = self.block_length;

        self.block_type = match kind {
            1 => {
                self.read_main_and_length_trees(bits)?;
                BlockType::Verbatim
            }
            2 => {
                for len in self.aligned_tree.lens.iter_mut().take(ALIGNED_NUM_ELEMENTS) {
                    *len = bits.read(3) as u8;
                }
                self.aligned_tree.build(ALIGNED_NUM_ELEMENTS)?;
                self.read_main_and_length_trees(bits)?;
                BlockType::Aligned
            }
            3 => {
                self.intel_started = true;
                bits.ensure(16);
                if bits.bits_left > 16 {
                    bits.pos -= 2;
                }
                bits.reset();
                for slot in self.repeated.iter_mut() {
                    *slot = LittleEndian::read_u32(bits.read_raw(4)?) as usize;
                }
                BlockType::Uncompressed
            }
            other => return Err(corrupt(format!("invalid block type {other}"))),
        };

        trace!(
            block_type = ?self.block_type,
            block_length = self.block_length,
            "lzx block"
        );

        Ok(())
    }

    fn read_main_and_length_trees(&mut self, bits: &mut BitReader) -> Result<()> {
        read_lengths(&mut self.pretree, &mut self.main_tree.lens, 0, NUM_CHARS, bits)?;
        read_lengths(
            &mut self.pretree,
            &mut self.main_tree.lens,
            NUM_CHARS,
            self.main_elements,
            bits,
        )?;
        self.main_tree.build(self.main_elements)?;
        if self.main_tree.lens[0xE8] != 0 {
            self.intel_started = true;
        }

        read_lengths(
            &mut self.pretree,
            &mut self.length_tree.lens,
            0,
            NUM_SECONDARY_LENGTHS,
            bits,
        )?;
        self.length_tree.build(LENGTH_MAXSYMBOLS)
    }

    /// Decode literals and matches until `run` bytes were produced.
    ///
    /// Returns how far the last match overshot `run`, as a value `<= 0`.
    fn decode_matches(&mut self, bits: &mut BitReader, mut run: isize, aligned: bool) -> Result<isize> {
        let window_size = self.window.len();

        while run > 0 {
            let element = self.main_tree.decode(bits)?;
            if element < NUM_CHARS {
                self.window[self.window_posn] = element as u8;
                self.window_posn += 1;
                run -= 1;
                continue;
            }

            let element = element - NUM_CHARS;
            let mut match_length = element & NUM_PRIMARY_LENGTHS;
            if match_length == NUM_PRIMARY_LENGTHS {
                match_length += self.length_tree.decode(bits)?;
            }
            match_length += MIN_MATCH;

            let slot = element >> 3;
            let match_offset = match slot {
                0 => self.repeated[0],
                1 => {
                    self.repeated.swap(0, 1);
                    self.repeated[0]
                }
                2 => {
                    self.repeated.swap(0, 2);
                    self.repeated[0]
                }
                _ => {
                    let offset = if aligned {
                        self.aligned_offset(bits, slot)?
                    } else {
                        verbatim_offset(bits, slot)
                    };
                    self.repeated = [offset, self.repeated[0], self.repeated[1]];
                    offset
                }
            };

            if match_offset == 0 || match_offset > window_size {
                return Err(corrupt(format!("match offset {match_offset} is outside the window")));
            }
            if self.window_posn + match_length > window_size {
                return Err(corrupt("match runs over the window wrap"));
            }

            let dest = self.window_posn;
            for i in 0..match_length {
                let src = (dest + i + window_size - match_offset) & (window_size - 1);
                self.window[dest + i] = self.window[src];
            }
            self.window_posn += match_length;
            run -= match_length as isize;
        }

        Ok(run)
    }

    fn aligned_offset(&self, bits: &mut BitReader, slot: usize) -> Result<usize> {
        let extra = EXTRA_BITS[slot] as u32;
        let mut offset = POSITION_BASE[slot] as usize - 2;
        match extra {
            0 => offset = 1,
            1 | 2 => offset += bits.read(extra) as usize,
            3 => offset += self.aligned_tree.decode(bits)?,
            _ => {
                offset += (bits.read(extra - 3) as usize) << 3;
                offset += self.aligned_tree.decode(bits)?;
            }
        }
        Ok(offset)
    }

    fn translate_e8(&mut self, frame: &mut [u8]) {
        if self.frames_read < E8_MAX_FRAMES && self.intel_filesize != 0 {
            if frame.len() > 10 && self.intel_started {
                let filesize = self.intel_filesize;
                let mut curpos = self.intel_curpos;
                let end = frame.len() - 10;
                let mut i = 0;
                while i < end {
                    if frame[i] != 0xE8 {
                        i += 1;
                        curpos = curpos.wrapping_add(1);
                        continue;
                    }
                    let absolute = LittleEndian::read_i32(&frame[i + 1..i + 5]);
                    if absolute >= curpos.wrapping_neg() && absolute < filesize {
                        let relative = if absolute >= 0 {
                            absolute - curpos
                        } else {
                            absolute + filesize
                        };
                        LittleEndian::write_i32(&mut frame[i + 1..i + 5], relative);
                    }
                    i += 5;
                    curpos = curpos.wrapping_add(5);
                }
            }
            self.intel_curpos = self.intel_curpos.wrapping_add(frame.len() as i32);
        }
        self.frames_read += 1;
    }
}

fn verbatim_offset(bits: &mut BitReader, slot: usize) -> usize {
    if slot == 3 {
        return 1;
    }
    let extra = EXTRA_BITS[slot] as u32;
    POSITION_BASE[slot] as usize - 2 + bits.read(extra) as usize
}

#[cfg(test)]
pub(crate) mod test {
    use pretty_assertions::assert_eq;

    use super::{BitReader, HuffmanTree, LzxDecoder, EXTRA_BITS, POSITION_BASE};
    use crate::error::{Error, Result};

    /// MSB-first bit writer producing 16-bit little-endian words, the inverse of `BitReader`
    #[derive(Default)]
    pub(crate) struct BitWriter {
        bytes: Vec<u8>,
        word: u32,
        used: u32,
    }

    impl BitWriter {
        pub(crate) fn write(&mut self, value: u32, bits: u32) {
            for i in (0..bits).rev() {
                self.word = (self.word << 1) | ((value >> i) & 1);
                self.used += 1;
                if self.used == 16 {
                    self.bytes.extend_from_slice(&(self.word as u16).to_le_bytes());
                    self.word = 0;
                    self.used = 0;
                }
            }
        }

        pub(crate) fn finish(mut self) -> Vec<u8> {
            if self.used > 0 {
                let pad = 16 - self.used;
                self.write(0, pad);
            }
            self.bytes
        }
    }

    /// Pretree coded lengths: symbol 16 (or 0) as `0`, 17 as `10`, 18 as `11`
    pub(crate) struct Pretree {
        pub(crate) one: u32,
    }

    impl Pretree {
        pub(crate) fn write_lengths(&self, w: &mut BitWriter) {
            for sym in 0..20 {
                let len = if sym == self.one {
                    1
                } else if sym == 17 || sym == 18 {
                    2
                } else {
                    0
                };
                w.write(len, 4);
            }
        }

        pub(crate) fn set(&self, w: &mut BitWriter) {
            w.write(0b0, 1);
        }

        pub(crate) fn zeros(&self, w: &mut BitWriter, mut count: u32) {
            while count > 0 {
                if count >= 20 {
                    let run = count.min(51);
                    w.write(0b11, 2);
                    w.write(run - 20, 5);
                    count -= run;
                } else {
                    let run = count.min(19);
                    assert!(run >= 4, "short zero runs are not needed by these streams");
                    w.write(0b10, 2);
                    w.write(run - 4, 4);
                    count -= run;
                }
            }
        }
    }

    /// Verbatim block whose only codes are literal `A` and a repeated-offset match
    /// with length footer 0 (9 bytes) or 248 (257 bytes).
    pub(crate) fn verbatim_a_block(
        w: &mut BitWriter,
        pretree: &Pretree,
        long_matches: u32,
        short_matches: u32,
        leading_literal: bool,
    ) {
        let length = u32::from(leading_literal) + long_matches * 257 + short_matches * 9;

        w.write(1, 3);
        w.write(length >> 8, 16);
        w.write(length & 0xFF, 8);

        // main tree 0..256, only 'A' (65)
        pretree.write_lengths(w);
        pretree.zeros(w, 65);
        pretree.set(w);
        pretree.zeros(w, 190);

        // main tree 256..512, only 263 (slot 0, length footer follows)
        pretree.write_lengths(w);
        pretree.zeros(w, 7);
        pretree.set(w);
        pretree.zeros(w, 248);

        // length tree, footers 0 and 248
        pretree.write_lengths(w);
        pretree.set(w);
        pretree.zeros(w, 247);
        pretree.set(w);

        if leading_literal {
            w.write(0, 1);
        }
        for _ in 0..long_matches {
            w.write(0b11, 2);
        }
        for _ in 0..short_matches {
            w.write(0b10, 2);
        }
    }

    #[test]
    fn tables_match_lzx_constants() {
        assert_eq!(&EXTRA_BITS[..8], &[0, 0, 0, 0, 1, 1, 2, 2]);
        assert_eq!(EXTRA_BITS[50], 17);
        assert_eq!(&POSITION_BASE[..8], &[0, 1, 2, 3, 4, 6, 8, 12]);
        assert_eq!(POSITION_BASE[31], 1572864);
    }

    #[test]
    fn bit_reader_reads_msb_first_words() {
        let mut bits = BitReader::new(&[0x34, 0x12, 0xCD, 0xAB]);
        assert_eq!(bits.read(4), 0x1);
        assert_eq!(bits.read(8), 0x23);
        assert_eq!(bits.read(8), 0x4A);
        assert_eq!(bits.read(12), 0xBCD);
        assert_eq!(bits.read(16), 0);
    }

    #[test]
    fn huffman_tree_decodes_canonical_codes() -> Result<()> {
        let mut tree = HuffmanTree::new(4, 6);
        tree.lens[..4].copy_from_slice(&[2, 1, 3, 3]);
        tree.build(4)?;

        // 1 -> "0", 0 -> "10", 2 -> "110", 3 -> "111"
        let mut w = BitWriter::default();
        for (code, len) in [(0b0, 1), (0b10, 2), (0b110, 3), (0b111, 3)] {
            w.write(code, len);
        }
        let input = w.finish();
        let mut bits = BitReader::new(&input);

        let decoded = (0..4)
            .map(|_| tree.decode(&mut bits))
            .collect::<Result<Vec<_>>>()?;
        assert_eq!(decoded, vec![1, 0, 2, 3]);

        Ok(())
    }

    #[test]
    fn oversubscribed_tree_is_corrupt() {
        let mut tree = HuffmanTree::new(3, 6);
        tree.lens[..3].copy_from_slice(&[1, 1, 1]);
        assert!(matches!(tree.build(3), Err(Error::CorruptStream(_))));
    }

    #[test]
    fn uncompressed_block() -> Result<()> {
        #[rustfmt::skip]
        let mut input = vec![
            // no e8, uncompressed, 11 bytes
            0x00, 0x30, 0xB0, 0x00,
            // R0, R1, R2
            0x01, 0x00, 0x00, 0x00,
            0x01, 0x00, 0x00, 0x00,
            0x01, 0x00, 0x00, 0x00,
        ];
        input.extend_from_slice(b"hello world");

        let mut decoder = LzxDecoder::new(16)?;
        let mut output = Vec::new();
        decoder.decompress_frame(&input, 11, &mut output)?;

        assert_eq!(output, b"hello world");
        Ok(())
    }

    #[test]
    fn verbatim_block_with_matches() -> Result<()> {
        let mut w = BitWriter::default();
        w.write(0, 1);
        verbatim_a_block(&mut w, &Pretree { one: 16 }, 1, 2, true);
        let input = w.finish();

        let mut decoder = LzxDecoder::new(16)?;
        let mut output = Vec::new();
        decoder.decompress_frame(&input, 1 + 257 + 18, &mut output)?;

        assert_eq!(output, vec![b'A'; 276]);
        Ok(())
    }

    #[test]
    fn invalid_block_type_is_corrupt() -> Result<()> {
        let mut w = BitWriter::default();
        w.write(0, 1);
        w.write(7, 3);
        w.write(0, 24);
        let input = w.finish();

        let mut decoder = LzxDecoder::new(16)?;
        let result = decoder.decompress_frame(&input, 16, &mut Vec::new());
        assert!(matches!(result, Err(Error::CorruptStream(_))));
        Ok(())
    }

    #[test]
    fn window_bits_are_validated() {
        assert!(LzxDecoder::new(14).is_err());
        assert!(LzxDecoder::new(22).is_err());
        assert!(LzxDecoder::new(21).is_ok());
    }
}

//! Base types for structure of PAK file.

use std::io::{Read, Seek, Write};

use binrw::{binrw, BinResult};
use byteorder::{ReadBytesExt, WriteBytesExt};

/// PAK file index
///
/// Lists every entry of the archive in storage order. The payloads follow the
/// index directly, so the index alone fixes where each payload starts.
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PakIndex {
    #[br(temp)]
    #[bw(calc = records.len() as u32)]
    count: u32,

    /// The records in the order their payloads are stored
    #[br(count = count)]
    pub records: Vec<PakRecord>,
}

impl PakIndex {
    /// Combined size of all payloads described by this index
    pub fn payload_size(&self) -> u64 {
        self.records.iter().map(|r| r.length as u64).sum()
    }
}

/// PAK index record
///
/// Defines an entry in the PAK file
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PakRecord {
    /// Path of the entry inside the archive, without an extension
    #[br(parse_with = read_path)]
    #[bw(write_with = write_path)]
    pub path: String,

    /// The size of this entry's payload
    pub length: u32,
}

fn read_7bit_encoded<R: Read>(reader: &mut R) -> std::io::Result<u32> {
    let mut value = 0u32;
    for shift in (0..35).step_by(7) {
        let byte = reader.read_u8()?;
        value |= ((byte & 0x7F) as u32) << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        "7-bit encoded integer is too long",
    ))
}

fn write_7bit_encoded<W: Write>(writer: &mut W, mut value: u32) -> std::io::Result<()> {
    while value >= 0x80 {
        writer.write_u8((value as u8) | 0x80)?;
        value >>= 7;
    }
    writer.write_u8(value as u8)
}

#[binrw::parser(reader)]
fn read_path() -> BinResult<String> {
    let pos = reader.stream_position()?;
    let length = read_7bit_encoded(reader)?;

    let mut buffer = vec![0u8; length as usize];
    reader.read_exact(&mut buffer)?;

    String::from_utf8(buffer).map_err(|e| binrw::Error::Custom {
        pos,
        err: Box::new(e),
    })
}

#[binrw::writer(writer)]
fn write_path(path: &String) -> BinResult<()> {
    write_7bit_encoded(writer, path.len() as u32)?;
    writer.write_all(path.as_bytes())?;
    Ok(())
}

//! Primitive encodings shared by the type table and the content types.
//!
//! Both are the encodings of .NET's `BinaryReader`: unsigned integers split in
//! 7-bit groups (low group first, high bit set while more groups follow), and
//! strings prefixed by their UTF-8 byte length in that same encoding.

use std::io::{self, Read, Write};

use byteorder::{ReadBytesExt, WriteBytesExt};

use crate::error::Result;

/// Extends [`Read`] with the XNB variable length encodings
pub trait ReadXnbExt: Read {
    /// Read a 7-bit encoded unsigned integer
    fn read_7bit_encoded_int(&mut self) -> io::Result<u32> {
        let mut value = 0u32;
        for shift in (0..35).step_by(7) {
            let byte = self.read_u8()?;
            value |= ((byte & 0x7F) as u32) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "7-bit encoded integer is too long",
        ))
    }

    /// Read a length prefixed UTF-8 string
    fn read_xnb_string(&mut self) -> Result<String> {
        let length = self.read_7bit_encoded_int()? as usize;
        let mut buffer = vec![0u8; length];
        self.read_exact(&mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

impl<R: Read + ?Sized> ReadXnbExt for R {}

/// Extends [`Write`] with the XNB variable length encodings
pub trait WriteXnbExt: Write {
    /// Write a 7-bit encoded unsigned integer
    fn write_7bit_encoded_int(&mut self, mut value: u32) -> io::Result<()> {
        while value >= 0x80 {
            self.write_u8((value as u8) | 0x80)?;
            value >>= 7;
        }
        self.write_u8(value as u8)
    }

    /// Write a length prefixed UTF-8 string
    fn write_xnb_string(&mut self, value: &str) -> io::Result<()> {
        self.write_7bit_encoded_int(value.len() as u32)?;
        self.write_all(value.as_bytes())
    }
}

impl<W: Write + ?Sized> WriteXnbExt for W {}

//! Types for writing PAK archives
//!

use binrw::BinWrite;
use std::{
    fs::File,
    io::{BufWriter, Cursor, Write},
    path::Path,
};
use tracing::{debug, instrument};

use crate::{
    error::{Error, Result},
    read::{has_pak_extension, PakArchive},
    types::{PakIndex, PakRecord},
};

impl PakArchive {
    /// Serialize the archive: entry count, index, then every payload in order.
    ///
    /// ```
    /// # fn doit() -> fez_pak::error::Result<()>
    /// # {
    /// use fez_pak::{PakArchive, PakEntry};
    ///
    /// let mut pak = PakArchive::new();
    /// pak.add(PakEntry::from_bytes("hello", b"Hello, World!".to_vec()));
    ///
    /// let mut buf = Vec::new();
    /// pak.write(&mut buf)?;
    ///
    /// assert_eq!(PakArchive::from_bytes(buf)?.len(), 1);
    /// # Ok(())
    /// # }
    /// # doit().unwrap();
    /// ```
    pub fn write<W: Write>(&self, mut writer: W) -> Result<()> {
        let index = PakIndex {
            records: self
                .entries
                .iter()
                .map(|entry| -> Result<PakRecord> {
                    let length = u32::try_from(entry.size()).map_err(|_| {
                        Error::InvalidArchive(format!(
                            "{} is too large to be packed ({} bytes)",
                            entry.path(),
                            entry.size()
                        ))
                    })?;
                    Ok(PakRecord {
                        path: entry.path().to_owned(),
                        length,
                    })
                })
                .collect::<Result<Vec<_>>>()?,
        };

        let mut header = Cursor::new(Vec::new());
        index.write(&mut header)?;
        writer.write_all(header.get_ref())?;

        for entry in &self.entries {
            writer.write_all(entry.data())?;
        }
        writer.flush()?;

        debug!(
            entries = self.entries.len(),
            bytes = header.get_ref().len() as u64 + self.payload_size(),
            "wrote pak archive"
        );

        Ok(())
    }

    /// Write the archive to `path`, which must end in `.pak`
    #[instrument(skip_all, fields(path = %path.as_ref().display()), err)]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if !has_pak_extension(path) {
            return Err(Error::InvalidExtension(path.to_path_buf()));
        }

        self.write(BufWriter::new(File::create(path)?))
    }

    /// Serialize the archive into a new buffer
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.write(&mut buffer)?;
        Ok(buffer)
    }
}

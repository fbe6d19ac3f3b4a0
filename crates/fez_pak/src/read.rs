//! Types for reading PAK archives
//!

use binrw::BinRead;
use std::{
    fmt::{self, Debug},
    fs::File,
    io::{Cursor, Read},
    ops::Range,
    path::Path,
    sync::Arc,
};
use tracing::{debug, instrument};

use crate::{
    error::{EntryNotFoundError, Error, Result},
    sniff,
    types::PakIndex,
    PAK_EXTENSION,
};

/// A single named payload of a PAK archive
///
/// Entries read from an archive share the archive's buffer, so opening one does not
/// copy its payload.
#[derive(Clone)]
pub struct PakEntry {
    path: String,
    data: Arc<[u8]>,
    range: Range<usize>,
}

impl Debug for PakEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "PakEntry({:?}, {} bytes)", self.path, self.range.len())
    }
}

impl PakEntry {
    /// Stage a new entry for packing
    pub fn from_bytes(path: impl Into<String>, data: impl Into<Vec<u8>>) -> PakEntry {
        let data: Arc<[u8]> = data.into().into();
        let range = 0..data.len();
        PakEntry {
            path: path.into(),
            data,
            range,
        }
    }

    /// Get the path of the entry
    ///
    /// Paths are `\\` separated and carry no extension. They come straight from
    /// the index, so they may be rooted or contain `..`; join only their normal
    /// components onto an output directory.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Get the size of the payload, in bytes
    pub fn size(&self) -> u64 {
        self.range.len() as u64
    }

    /// Borrow the payload
    pub fn data(&self) -> &[u8] {
        &self.data[self.range.clone()]
    }

    /// Open a reader over the payload
    pub fn open(&self) -> Cursor<&[u8]> {
        Cursor::new(self.data())
    }

    /// Copy the payload out of the archive
    pub fn read_all(&self) -> Vec<u8> {
        self.data().to_vec()
    }

    /// Guess the extension of the payload from its leading bytes
    ///
    /// Returns the first match of the signature table, then `default`, then
    /// [`crate::DEFAULT_EXTENSION`].
    pub fn sniff_extension(&self, default: Option<&str>) -> String {
        sniff::extension_or(self.data(), default)
    }
}

/// PAK archive
///
/// ```no_run
/// fn list_pak_contents(path: &str) -> fez_pak::error::Result<()> {
///     let pak = fez_pak::PakArchive::open(path)?;
///
///     for entry in pak.iter() {
///         println!("{}{} ({} bytes)", entry.path(), entry.sniff_extension(None), entry.size());
///     }
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct PakArchive {
    pub(crate) entries: Vec<PakEntry>,
}

impl PakArchive {
    /// Create an empty archive
    pub fn new() -> PakArchive {
        PakArchive::default()
    }

    /// Open the PAK archive at `path`
    ///
    /// The path must end in `.pak`; this is checked before the file is touched.
    #[instrument(skip_all, fields(path = %path.as_ref().display()), err)]
    pub fn open(path: impl AsRef<Path>) -> Result<PakArchive> {
        let path = path.as_ref();
        if !has_pak_extension(path) {
            return Err(Error::InvalidExtension(path.to_path_buf()));
        }

        let file = File::open(path)?;
        PakArchive::read(file)
    }

    /// Read a PAK archive collecting the entries it contains.
    ///
    /// The whole archive is loaded into memory. A truncated index or a payload region
    /// that disagrees with the index fails the whole archive.
    pub fn read<R: Read>(mut reader: R) -> Result<PakArchive> {
        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer)?;
        PakArchive::from_bytes(buffer)
    }

    /// Parse an in-memory PAK archive
    pub fn from_bytes(buffer: impl Into<Vec<u8>>) -> Result<PakArchive> {
        let buffer: Arc<[u8]> = buffer.into().into();

        let mut cursor = Cursor::new(&buffer[..]);
        let index = PakIndex::read(&mut cursor)
            .map_err(|e| Error::InvalidArchive(format!("unreadable index: {e}")))?;

        let start = cursor.position() as usize;
        let available = (buffer.len() - start) as u64;
        let expected = index.payload_size();
        if available < expected {
            return Err(Error::InvalidArchive(format!(
                "payloads are truncated, index describes {expected} bytes but {available} remain"
            )));
        }
        if available > expected {
            return Err(Error::InvalidArchive(format!(
                "{} unexpected bytes after the last payload",
                available - expected
            )));
        }

        let mut offset = start;
        let entries = index
            .records
            .into_iter()
            .map(|record| {
                let range = offset..offset + record.length as usize;
                offset = range.end;
                PakEntry {
                    path: record.path,
                    data: buffer.clone(),
                    range,
                }
            })
            .collect::<Vec<_>>();

        debug!(entries = entries.len(), "read pak archive");

        Ok(PakArchive { entries })
    }

    /// Number of entries contained in this PAK.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether this PAK archive contains no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over the entries in storage order
    pub fn iter(&self) -> std::slice::Iter<'_, PakEntry> {
        self.entries.iter()
    }

    /// Returns an iterator over all the paths in this archive.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.path())
    }

    /// Total size of the payloads in the archive
    pub fn payload_size(&self) -> u64 {
        self.entries.iter().map(PakEntry::size).sum()
    }

    /// Get an entry by index
    pub fn get(&self, index: usize) -> Result<&PakEntry> {
        self.entries
            .get(index)
            .ok_or(Error::EntryNotFound(EntryNotFoundError::Index(index)))
    }

    /// Search for the first entry with the given path
    pub fn by_path(&self, path: &str) -> Result<&PakEntry> {
        self.entries
            .iter()
            .find(|e| e.path == path)
            .ok_or_else(|| Error::EntryNotFound(EntryNotFoundError::Path(path.to_owned())))
    }

    /// Append an entry
    pub fn add(&mut self, entry: PakEntry) {
        self.entries.push(entry);
    }

    /// Remove every entry matching `predicate`, returning how many were removed
    pub fn remove_all(&mut self, mut predicate: impl FnMut(&PakEntry) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| !predicate(e));
        before - self.entries.len()
    }
}

impl<'a> IntoIterator for &'a PakArchive {
    type Item = &'a PakEntry;
    type IntoIter = std::slice::Iter<'a, PakEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub(crate) fn has_pak_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(PAK_EXTENSION))
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use std::io::Read;
    use tracing_test::traced_test;

    use crate::error::{Error, Result};
    use crate::read::{PakArchive, PakEntry};

    #[test]
    fn read_empty_pak() -> Result<()> {
        let archive = PakArchive::from_bytes(vec![0x00, 0x00, 0x00, 0x00])?;
        assert!(archive.is_empty());
        Ok(())
    }

    #[test]
    fn read_truncated_count() {
        let archive = PakArchive::from_bytes(vec![0x01, 0x00]);
        assert!(matches!(archive, Err(Error::InvalidArchive(_))));
    }

    #[traced_test]
    #[test]
    fn read_pak_with_entries() -> Result<()> {
        #[rustfmt::skip]
        let input = vec![
            // Count
            0x02, 0x00, 0x00, 0x00,
            // Index
            0x05, b'h', b'e', b'l', b'l', b'o', 0x05, 0x00, 0x00, 0x00,
            0x05, b'w', b'o', b'r', b'l', b'd', 0x03, 0x00, 0x00, 0x00,
            // Payloads
            b'H', b'e', b'l', b'l', b'o',
            b'W', b'o', b'r',
        ];

        let archive = PakArchive::from_bytes(input)?;
        assert_eq!(archive.len(), 2);
        assert_eq!(archive.paths().collect::<Vec<_>>(), vec!["hello", "world"]);

        let mut buffer = Vec::new();
        archive.get(0)?.open().read_to_end(&mut buffer)?;
        assert_eq!(buffer, b"Hello");

        assert_eq!(archive.by_path("world")?.data(), b"Wor");
        assert_eq!(archive.payload_size(), 8);

        Ok(())
    }

    #[test]
    fn read_pak_with_missing_payload() {
        #[rustfmt::skip]
        let input = vec![
            0x01, 0x00, 0x00, 0x00,
            0x01, b'a', 0x04, 0x00, 0x00, 0x00,
            0x01, 0x02,
        ];

        let archive = PakArchive::from_bytes(input);
        assert!(matches!(archive, Err(Error::InvalidArchive(_))));
    }

    #[test]
    fn read_pak_with_trailing_bytes() {
        #[rustfmt::skip]
        let input = vec![
            0x01, 0x00, 0x00, 0x00,
            0x01, b'a', 0x01, 0x00, 0x00, 0x00,
            0x01, 0x02,
        ];

        let archive = PakArchive::from_bytes(input);
        assert!(matches!(archive, Err(Error::InvalidArchive(_))));
    }

    #[test]
    fn open_rejects_other_extensions() {
        let result = PakArchive::open("/definitely/not/here/Essentials.zip");
        assert!(matches!(result, Err(Error::InvalidExtension(_))));
    }

    #[test]
    fn missing_entries_are_reported() {
        let archive = PakArchive::new();
        assert!(archive.get(3).is_err());
        assert!(archive.by_path("nope").is_err());
    }

    #[test]
    fn remove_all_counts_only_matches() -> Result<()> {
        let mut archive = PakArchive::new();
        archive.add(PakEntry::from_bytes("a", b"XNBw".to_vec()));
        archive.add(PakEntry::from_bytes("a", b"OggS".to_vec()));
        archive.add(PakEntry::from_bytes("b", b"XNBw".to_vec()));
        archive.add(PakEntry::from_bytes("a", b"XNBx".to_vec()));

        let removed =
            archive.remove_all(|e| e.path() == "a" && e.sniff_extension(None) == ".xnb");

        assert_eq!(removed, 2);
        assert_eq!(archive.len(), 2);
        assert_eq!(archive.get(0)?.sniff_extension(None), ".ogg");
        assert_eq!(archive.get(1)?.path(), "b");

        assert_eq!(archive.remove_all(|e| e.path() == "zzz"), 0);

        Ok(())
    }
}

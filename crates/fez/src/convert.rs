//! Conversions between archive entries and files on disk.

use std::path::{Component, Path, PathBuf};

use clap::ValueEnum;
use fez_pak::{PakArchive, PakEntry};
use fez_xnb::compression::decompress_container_with;
use fez_xnb::{DecompressorOptions, TypeRegistry, XnbFile, XnbWriter};
use miette::{Context, IntoDiagnostic, Result};
use tracing::debug;

use crate::report::Outcome;

const XNB: &str = ".xnb";

/// How archive entries are written out
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum UnpackMode {
    /// Payloads exactly as stored
    #[default]
    Raw,
    /// XNB containers with their body decompressed
    Decompressed,
    /// Known assets in their external format, everything else raw
    Converted,
}

/// File contents produced from one archive entry or one container
#[derive(Debug)]
pub struct Converted {
    /// Extension to append to the entry path, with its leading dot
    pub extension: String,
    pub data: Vec<u8>,
    pub outcome: Outcome,
}

/// Produce the file to write for `entry`
pub fn unpack_entry(
    entry: &PakEntry,
    mode: UnpackMode,
    registry: &TypeRegistry,
    options: DecompressorOptions,
) -> Result<Converted> {
    let extension = entry.sniff_extension(None);

    if mode == UnpackMode::Raw || extension != XNB {
        return Ok(Converted {
            outcome: Outcome::passthrough(format!("stored as {extension}")),
            extension,
            data: entry.read_all(),
        });
    }

    match mode {
        UnpackMode::Decompressed => Ok(Converted {
            extension,
            data: decompress_container_with(entry.data(), options)?,
            outcome: Outcome::converted("decompressed XNB"),
        }),
        _ => convert_xnb(entry.data(), registry, options),
    }
}

/// Convert a container to the external format registered for its primary type
///
/// Containers without a registered format are returned unchanged.
pub fn convert_xnb(
    data: &[u8],
    registry: &TypeRegistry,
    options: DecompressorOptions,
) -> Result<Converted> {
    let file = XnbFile::read_with(data, registry, options)?;
    let format = file
        .primary_qualifier()
        .and_then(|q| registry.formats().find_by_qualifier(q));

    if let (Some(object), Some(format)) = (file.object(), format) {
        return Ok(Converted {
            extension: format.extension().to_owned(),
            data: format.to_external(object)?,
            outcome: Outcome::converted(format.name()),
        });
    }

    let name = file
        .primary_qualifier()
        .map(|q| q.name.trim_end_matches("Reader").to_owned())
        .unwrap_or_else(|| "null".to_owned());
    Ok(Converted {
        extension: XNB.to_owned(),
        data: data.to_vec(),
        outcome: Outcome::passthrough(format!("unknown format {name}, kept as XNB")),
    })
}

/// Where an entry unpacks to below `directory`
///
/// Empty and parent components of the archive path are dropped so entries cannot
/// escape the target directory.
pub fn output_path(directory: &Path, entry_path: &str, extension: &str) -> PathBuf {
    let file = format!("{entry_path}{extension}");
    let relative = file
        .split(['\\', '/'])
        .filter(|part| !part.is_empty() && *part != "." && *part != "..")
        .collect::<PathBuf>();
    directory.join(relative)
}

/// One file of a directory, ready to be added to an archive
#[derive(Debug)]
pub struct PackedAsset {
    /// Archive path, without extension
    pub path: String,
    /// Extension the payload sniffs as
    pub extension: String,
    pub data: Vec<u8>,
    pub outcome: Outcome,
}

/// Archive path of a path relative to the packed directory: lowercase, `\` separated
pub fn archive_path(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().to_lowercase()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\\")
}

/// Split the last extension off an archive path
fn split_extension(path: &str) -> (String, String) {
    let file_start = path.rfind('\\').map_or(0, |i| i + 1);
    match path[file_start..].rfind('.') {
        Some(dot) if dot > 0 => {
            let (stem, extension) = path.split_at(file_start + dot);
            (stem.to_owned(), extension.to_owned())
        }
        _ => (path.to_owned(), String::new()),
    }
}

/// Read `file` under `root` and convert it to an archive payload when a format knows it
pub fn pack_file(root: &Path, file: &Path, registry: &TypeRegistry) -> Result<PackedAsset> {
    let relative = file.strip_prefix(root).into_diagnostic()?;
    let data = std::fs::read(file)
        .into_diagnostic()
        .context(format!("reading {}", file.display()))?;
    let name = archive_path(relative);

    if let Some(format) = registry.formats().find_for_path(file) {
        let stem = name.len().saturating_sub(format.extension().len());
        let path = name.get(..stem).unwrap_or(&name).to_owned();
        let object = format
            .from_external(&data)
            .context(format!("parsing {}", file.display()))?;
        let data = XnbWriter::for_format(format.as_ref()).write(&object)?;
        return Ok(PackedAsset {
            path,
            extension: XNB.to_owned(),
            data,
            outcome: Outcome::converted(format.name()),
        });
    }

    let (path, extension) = split_extension(&name);
    Ok(PackedAsset {
        path,
        outcome: Outcome::passthrough(format!("no converter for {extension:?}, packed raw")),
        extension,
        data,
    })
}

/// Add `asset`, replacing entries with the same path and extension
///
/// Returns how many entries were replaced.
pub fn add_asset(pak: &mut PakArchive, asset: PackedAsset) -> usize {
    let removed = pak.remove_all(|e| {
        e.path() == asset.path && e.sniff_extension(Some(&asset.extension)) == asset.extension
    });
    if removed > 0 {
        debug!(path = %asset.path, removed, "replacing existing entries");
    }
    pak.add(PakEntry::from_bytes(asset.path, asset.data));
    removed
}

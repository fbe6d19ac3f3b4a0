use std::path::{Path, PathBuf};

use clap::Args;
use fez_pak::{PakArchive, PakEntry};
use fez_xnb::{registry, DecompressorOptions, TypeRegistry};
use miette::{Context, Result};
use tracing::info;

use crate::commands::write_output;
use crate::convert::{output_path, unpack_entry, UnpackMode};
use crate::report::{BatchReport, Outcome};

#[derive(Args)]
pub struct UnpackArgs {
    /// An input PAK file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// A target directory
    #[arg(short, long, value_name = "DIR")]
    directory: PathBuf,

    #[command(flatten)]
    options: UnpackOptions,
}

/// Flags shared by the unpacking commands
#[derive(Args)]
pub struct UnpackOptions {
    /// What to write for each entry
    #[arg(short, long, value_enum, default_value_t = UnpackMode::Raw)]
    pub mode: UnpackMode,

    /// Allow overwriting existing files
    #[arg(long, default_value_t = false)]
    pub overwrite: bool,

    /// Keep the LZX window when a frame carries explicit sizes
    #[arg(long, default_value_t = false)]
    pub no_window_reset: bool,
}

impl UnpackOptions {
    pub fn decompressor(&self) -> DecompressorOptions {
        DecompressorOptions::builder()
            .reset_on_explicit_frame(!self.no_window_reset)
            .build()
    }

    /// Unpack every entry of the archive at `file` into `directory`
    ///
    /// Only a failure to open the archive is returned; entries that fail are
    /// recorded in `report` and skipped.
    pub fn unpack_archive(
        &self,
        file: &Path,
        directory: &Path,
        report: &mut BatchReport,
    ) -> Result<()> {
        let pak = PakArchive::open(file).context(format!("path: {}", file.display()))?;
        info!("unpacking {} entries from {}", pak.len(), file.display());

        let registry = registry::global();
        let options = self.decompressor();
        for entry in pak.iter() {
            let outcome = self
                .unpack_entry(entry, directory, registry, options)
                .unwrap_or_else(|e| Outcome::failed(e));
            report.record(entry.path(), outcome);
        }
        Ok(())
    }

    fn unpack_entry(
        &self,
        entry: &PakEntry,
        directory: &Path,
        registry: &TypeRegistry,
        options: DecompressorOptions,
    ) -> Result<Outcome> {
        let converted = unpack_entry(entry, self.mode, registry, options)?;
        let path = output_path(directory, entry.path(), &converted.extension);
        write_output(&path, &converted.data, self.overwrite)?;
        Ok(converted.outcome)
    }
}

impl UnpackArgs {
    pub fn handle(&self) -> Result<()> {
        let mut report = BatchReport::new();
        self.options
            .unpack_archive(&self.file, &self.directory, &mut report)?;

        report.finish();
        report.check()
    }
}

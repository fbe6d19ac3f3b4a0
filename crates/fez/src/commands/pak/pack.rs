use std::path::PathBuf;

use clap::Args;
use fez_pak::PakArchive;
use fez_xnb::registry;
use miette::{miette, Context, IntoDiagnostic, Result};
use tracing::info;
use walkdir::WalkDir;

use crate::commands::write_output;
use crate::convert::{add_asset, pack_file};
use crate::report::{BatchReport, Outcome};

#[derive(Args)]
pub struct PackArgs {
    /// An input directory
    #[arg(short, long, value_name = "DIR")]
    directory: PathBuf,

    /// A target PAK file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// A PAK file whose entries are kept unless a packed file replaces them
    #[arg(short, long, value_name = "FILE")]
    include: Option<PathBuf>,

    /// Allow overwriting the target
    #[arg(long, default_value_t = false)]
    overwrite: bool,
}

impl PackArgs {
    pub fn handle(&self) -> Result<()> {
        let files = WalkDir::new(&self.directory)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .collect::<Vec<_>>();

        if files.is_empty() {
            return Err(miette!("directory is empty"));
        }

        let mut pak = match &self.include {
            Some(base) => {
                PakArchive::open(base).context(format!("path: {}", base.display()))?
            }
            None => PakArchive::new(),
        };

        let registry = registry::global();
        let mut report = BatchReport::new();
        let mut replaced = 0;
        for file in files {
            let name = file
                .path()
                .strip_prefix(&self.directory)
                .into_diagnostic()?
                .display()
                .to_string();

            match pack_file(&self.directory, file.path(), registry) {
                Ok(asset) => {
                    let outcome = asset.outcome.clone();
                    replaced += add_asset(&mut pak, asset);
                    report.record(name, outcome);
                }
                Err(e) => report.record(name, Outcome::failed(e)),
            }
        }

        info!(
            "writing {} entries to {} ({replaced} replaced)",
            pak.len(),
            self.file.display()
        );
        let bytes = pak.to_bytes().context("serializing pak archive")?;
        write_output(&self.file, &bytes, self.overwrite)?;

        report.finish();
        report.check()
    }
}

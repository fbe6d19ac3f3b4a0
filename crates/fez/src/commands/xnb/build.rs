use std::path::PathBuf;

use clap::Args;
use fez_xnb::{registry, XnbWriter, XNB_EXTENSION};
use miette::{miette, Context, IntoDiagnostic, Result};
use tracing::info;

use super::replace_extension;
use crate::commands::write_output;

#[derive(Args)]
pub struct BuildArgs {
    /// An input file in an external format, e.g. `puzzle.fezsong.json`
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// A target XNB file, next to the input by default
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Allow overwriting the target
    #[arg(long, default_value_t = false)]
    overwrite: bool,
}

impl BuildArgs {
    pub fn handle(&self) -> Result<()> {
        let format = registry::global()
            .formats()
            .find_for_path(&self.file)
            .ok_or(miette!("no format for {}", self.file.display()))?;

        let data = std::fs::read(&self.file)
            .into_diagnostic()
            .context(format!("path: {}", self.file.display()))?;
        let object = format
            .from_external(&data)
            .context(format!("parsing {}", self.file.display()))?;
        let xnb = XnbWriter::for_format(format.as_ref()).write(&object)?;

        let output = self.output.clone().unwrap_or_else(|| {
            replace_extension(
                &self.file,
                format.extension().len(),
                &format!(".{XNB_EXTENSION}"),
            )
        });
        info!("writing {} as {}", output.display(), format.name());
        write_output(&output, &xnb, self.overwrite)
    }
}

use std::path::PathBuf;

use clap::Args;
use fez_xnb::{registry, DecompressorOptions, XNB_EXTENSION};
use miette::{miette, Context, IntoDiagnostic, Result};
use tracing::info;

use super::replace_extension;
use crate::commands::write_output;
use crate::convert::convert_xnb;
use crate::report::Outcome;

#[derive(Args)]
pub struct ConvertArgs {
    /// An input XNB file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// A target file, next to the input with the format's extension by default
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Allow overwriting the target
    #[arg(long, default_value_t = false)]
    overwrite: bool,

    /// Keep the LZX window when a frame carries explicit sizes
    #[arg(long, default_value_t = false)]
    no_window_reset: bool,
}

impl ConvertArgs {
    pub fn handle(&self) -> Result<()> {
        let data = std::fs::read(&self.file)
            .into_diagnostic()
            .context(format!("path: {}", self.file.display()))?;

        let options = DecompressorOptions::builder()
            .reset_on_explicit_frame(!self.no_window_reset)
            .build();
        let converted = convert_xnb(&data, registry::global(), options)
            .context(format!("reading {}", self.file.display()))?;
        if let Outcome::Passthrough { reason } = &converted.outcome {
            return Err(miette!("{}: {reason}", self.file.display()));
        }

        let output = self.output.clone().unwrap_or_else(|| {
            replace_extension(&self.file, XNB_EXTENSION.len() + 1, &converted.extension)
        });
        info!("writing {}: {}", output.display(), converted.outcome);
        write_output(&output, &converted.data, self.overwrite)
    }
}

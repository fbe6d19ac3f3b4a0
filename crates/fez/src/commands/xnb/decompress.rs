use std::path::PathBuf;

use clap::Args;
use fez_xnb::compression::decompress_container_with;
use fez_xnb::DecompressorOptions;
use miette::{Context, IntoDiagnostic, Result};
use tracing::info;

use crate::commands::write_output;

#[derive(Args)]
pub struct DecompressArgs {
    /// An input XNB file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// A target XNB file
    #[arg(short, long, value_name = "FILE")]
    output: PathBuf,

    /// Allow overwriting the target
    #[arg(long, default_value_t = false)]
    overwrite: bool,

    /// Keep the LZX window when a frame carries explicit sizes
    #[arg(long, default_value_t = false)]
    no_window_reset: bool,
}

impl DecompressArgs {
    pub fn handle(&self) -> Result<()> {
        let data = std::fs::read(&self.file)
            .into_diagnostic()
            .context(format!("path: {}", self.file.display()))?;

        let options = DecompressorOptions::builder()
            .reset_on_explicit_frame(!self.no_window_reset)
            .build();
        let decompressed = decompress_container_with(&data, options)
            .context(format!("decompressing {}", self.file.display()))?;

        info!(
            "writing {} ({} -> {} bytes)",
            self.output.display(),
            data.len(),
            decompressed.len()
        );
        write_output(&self.output, &decompressed, self.overwrite)
    }
}

use std::path::PathBuf;

use clap::Args;
use fez_pak::PakArchive;
use itertools::Itertools;
use miette::{Context, Result};
use owo_colors::{OwoColorize, Stream::Stdout};

#[derive(Args)]
pub struct ListArgs {
    /// An input PAK file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,
}

impl ListArgs {
    pub fn handle(&self) -> Result<()> {
        let pak = PakArchive::open(&self.file).context(format!("path: {}", self.file.display()))?;

        for entry in pak.iter() {
            let extension = entry.sniff_extension(None);
            println!(
                "{}{} {}",
                entry.path(),
                extension.if_supports_color(Stdout, |t| t.dimmed()),
                entry.size()
            );
        }

        let extensions = pak
            .iter()
            .map(|e| e.sniff_extension(None))
            .counts()
            .into_iter()
            .sorted()
            .map(|(extension, n)| format!("{n} {extension}"))
            .join(", ");
        println!(
            "{} entries, {} bytes ({extensions})",
            pak.len(),
            pak.payload_size()
        );

        Ok(())
    }
}

use std::path::PathBuf;

use clap::Args;
use miette::{miette, Result};

use super::unpack::UnpackOptions;
use crate::report::BatchReport;

/// Archives of the game's `Content` directory
pub const GAME_ARCHIVES: [&str; 4] = ["Essentials.pak", "Music.pak", "Other.pak", "Updates.pak"];

#[derive(Args)]
pub struct UnpackGameArgs {
    /// The game's Content directory
    #[arg(short, long, value_name = "DIR")]
    directory: PathBuf,

    /// A target directory
    #[arg(short, long, value_name = "DIR")]
    output: PathBuf,

    #[command(flatten)]
    options: UnpackOptions,
}

impl UnpackGameArgs {
    pub fn handle(&self) -> Result<()> {
        let archives = GAME_ARCHIVES.map(|name| (name, self.directory.join(name)));

        if let Some((name, _)) = archives.iter().find(|(_, path)| !path.is_file()) {
            return Err(miette!(
                "{} is not FEZ's Content directory (missing {name})",
                self.directory.display()
            ));
        }

        let mut report = BatchReport::new();
        for (name, path) in &archives {
            // music entries are stored relative to the music folder
            let target = if *name == "Music.pak" {
                self.output.join("music")
            } else {
                self.output.clone()
            };
            self.options.unpack_archive(path, &target, &mut report)?;
        }

        report.finish();
        report.check()
    }
}

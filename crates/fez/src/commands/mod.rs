use std::fs::File;
use std::io::Write;
use std::path::Path;

use miette::{Context, IntoDiagnostic, Result};

pub mod pak;
pub mod xnb;

#[derive(clap::Subcommand)]
pub enum Commands {
    /// Handle PAK archives
    Pak {
        #[command(subcommand)]
        command: pak::PakCommands,
    },
    /// Handle single XNB containers
    Xnb {
        #[command(subcommand)]
        command: xnb::XnbCommands,
    },
}

impl Commands {
    pub fn handle(&self) -> miette::Result<()> {
        match self {
            Commands::Pak { command } => command.handle(),
            Commands::Xnb { command } => command.handle(),
        }
    }
}

/// Write `data` to `path`, creating parent directories
///
/// Existing files are only replaced when `overwrite` is set.
pub(crate) fn write_output(path: &Path, data: &[u8], overwrite: bool) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .into_diagnostic()
            .context(format!("creating {}", parent.display()))?;
    }

    let mut out = if !overwrite {
        File::create_new(path)
            .into_diagnostic()
            .context(format!("creating {}", path.display()))?
    } else {
        File::create(path)
            .into_diagnostic()
            .context(format!("creating {}", path.display()))?
    };

    out.write_all(data)
        .into_diagnostic()
        .context(format!("writing {}", path.display()))
}

#[cfg(test)]
mod test {
    use std::fs;

    use miette::{IntoDiagnostic, Result};
    use pretty_assertions::assert_eq;

    use super::write_output;

    #[test]
    fn existing_files_need_overwrite() -> Result<()> {
        let dir = tempfile::tempdir().into_diagnostic()?;
        let path = dir.path().join("music").join("puzzle.ogg");

        write_output(&path, b"first", false)?;
        assert!(write_output(&path, b"second", false).is_err());
        assert_eq!(fs::read(&path).into_diagnostic()?, b"first");

        write_output(&path, b"second", true)?;
        assert_eq!(fs::read(&path).into_diagnostic()?, b"second");
        Ok(())
    }
}

use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub mod build;
pub mod convert;
pub mod decompress;

#[derive(clap::Subcommand)]
pub enum XnbCommands {
    /// Rewrite an XNB container with its body decompressed
    Decompress(decompress::DecompressArgs),
    /// Convert an XNB container to its external format
    Convert(convert::ConvertArgs),
    /// Build an XNB container from an external format
    Build(build::BuildArgs),
}

impl XnbCommands {
    pub fn handle(&self) -> miette::Result<()> {
        match self {
            XnbCommands::Decompress(decompress) => decompress.handle(),
            XnbCommands::Convert(convert) => convert.handle(),
            XnbCommands::Build(build) => build.handle(),
        }
    }
}

/// `path` with its trailing `strip` bytes replaced by `extension`
fn replace_extension(path: &Path, strip: usize, extension: &str) -> PathBuf {
    let name = path.as_os_str().to_string_lossy();
    let stem = name.len().saturating_sub(strip);
    let mut out = OsString::from(name.get(..stem).unwrap_or(&name));
    out.push(extension);
    PathBuf::from(out)
}

#[cfg(test)]
mod test {
    use std::path::{Path, PathBuf};

    use pretty_assertions::assert_eq;

    use super::replace_extension;

    #[test]
    fn compound_extensions_are_replaced_whole() {
        assert_eq!(
            replace_extension(Path::new("music/puzzle.fezsong.json"), 13, ".xnb"),
            PathBuf::from("music/puzzle.xnb")
        );
        assert_eq!(
            replace_extension(Path::new("gomez.xnb"), 4, ".fezanim.json"),
            PathBuf::from("gomez.fezanim.json")
        );
    }
}

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use fez::commands::Commands;
use fez_pak::{PakArchive, PakEntry};
use miette::{IntoDiagnostic, Result};
use pretty_assertions::assert_eq;
use tracing_test::traced_test;

#[derive(Parser)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

fn run(args: &[&str]) -> Result<()> {
    let cli = Cli::try_parse_from(std::iter::once("fez").chain(args.iter().copied()))
        .into_diagnostic()?;
    cli.command.handle()
}

fn arg(path: &Path) -> &str {
    path.to_str().expect("utf-8 temp path")
}

const SONG: &str = r#"{
  "Loops": [],
  "Name": "Puzzle",
  "Tempo": 90,
  "TimeSignature": 4,
  "Notes": ["C2", "Fsharp3"],
  "AssembleChord": "G_maj",
  "RandomOrdering": false,
  "CustomOrdering": []
}"#;

const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\x0dIHDR";

fn json(bytes: &[u8]) -> Result<serde_json::Value> {
    serde_json::from_slice(bytes).into_diagnostic()
}

#[test]
#[traced_test]
fn pack_then_unpack_converts_known_assets() -> Result<()> {
    let dir = tempfile::tempdir().into_diagnostic()?;
    let input = dir.path().join("input");
    fs::create_dir_all(input.join("music")).into_diagnostic()?;
    fs::create_dir_all(input.join("other textures")).into_diagnostic()?;
    fs::write(input.join("music").join("Puzzle.fezsong.json"), SONG).into_diagnostic()?;
    fs::write(input.join("other textures").join("splash.png"), PNG).into_diagnostic()?;

    let pak = dir.path().join("updates.pak");
    run(&["pak", "pack", "--directory", arg(&input), "--file", arg(&pak)])?;

    let archive = PakArchive::open(&pak)?;
    assert_eq!(
        archive.paths().collect::<Vec<_>>(),
        vec!["music\\puzzle", "other textures\\splash"]
    );
    assert_eq!(archive.get(0)?.sniff_extension(None), ".xnb");
    assert_eq!(archive.get(1)?.data(), PNG);

    run(&["pak", "list", "--file", arg(&pak)])?;

    let output = dir.path().join("output");
    run(&[
        "pak", "unpack", "--file", arg(&pak), "--directory", arg(&output), "--mode", "converted",
    ])?;

    let song = fs::read(output.join("music").join("puzzle.fezsong.json")).into_diagnostic()?;
    assert_eq!(json(&song)?, json(SONG.as_bytes())?);
    assert_eq!(
        fs::read(output.join("other textures").join("splash.png")).into_diagnostic()?,
        PNG
    );
    assert!(logs_contain("2 files: 1 converted, 1 kept, 0 failed"));
    Ok(())
}

#[test]
fn pack_replaces_entries_of_the_included_archive() -> Result<()> {
    let dir = tempfile::tempdir().into_diagnostic()?;

    let mut base = PakArchive::new();
    base.add(PakEntry::from_bytes("music\\puzzle", b"XNBw\x05\x00old".to_vec()));
    base.add(PakEntry::from_bytes("music\\calm", b"XNBw\x05\x00calm".to_vec()));
    let base_path = dir.path().join("base.pak");
    base.save(&base_path)?;

    let input = dir.path().join("input");
    fs::create_dir_all(input.join("music")).into_diagnostic()?;
    fs::write(input.join("music").join("puzzle.fezsong.json"), SONG).into_diagnostic()?;

    let pak = dir.path().join("updates.pak");
    run(&[
        "pak", "pack", "--directory", arg(&input), "--file", arg(&pak), "--include", arg(&base_path),
    ])?;

    let archive = PakArchive::open(&pak)?;
    assert_eq!(
        archive.paths().collect::<Vec<_>>(),
        vec!["music\\calm", "music\\puzzle"]
    );
    assert_eq!(archive.get(0)?.data(), b"XNBw\x05\x00calm");
    assert!(archive.get(1)?.data().len() > 10);
    Ok(())
}

#[test]
#[traced_test]
fn unpack_reports_files_it_may_not_overwrite() -> Result<()> {
    let dir = tempfile::tempdir().into_diagnostic()?;

    let mut archive = PakArchive::new();
    archive.add(PakEntry::from_bytes("splash", PNG.to_vec()));
    let pak = dir.path().join("other.pak");
    archive.save(&pak)?;

    let output = dir.path().join("output");
    let args = ["pak", "unpack", "--file", arg(&pak), "--directory", arg(&output)];
    run(&args)?;
    assert!(run(&args).is_err());

    let mut overwrite = args.to_vec();
    overwrite.push("--overwrite");
    run(&overwrite)?;
    assert_eq!(fs::read(output.join("splash.png")).into_diagnostic()?, PNG);
    Ok(())
}

#[test]
fn xnb_build_then_convert() -> Result<()> {
    let dir = tempfile::tempdir().into_diagnostic()?;
    let song = dir.path().join("puzzle.fezsong.json");
    fs::write(&song, SONG).into_diagnostic()?;

    run(&["xnb", "build", "--file", arg(&song)])?;
    let xnb = dir.path().join("puzzle.xnb");
    assert!(fs::read(&xnb).into_diagnostic()?.starts_with(b"XNB"));

    let copy = dir.path().join("copy.xnb");
    run(&["xnb", "decompress", "--file", arg(&xnb), "--output", arg(&copy)])?;
    assert_eq!(fs::read(&copy).into_diagnostic()?, fs::read(&xnb).into_diagnostic()?);

    // converting back targets the original json
    assert!(run(&["xnb", "convert", "--file", arg(&xnb)]).is_err());
    run(&["xnb", "convert", "--file", arg(&xnb), "--overwrite"])?;
    let converted = fs::read(&song).into_diagnostic()?;
    assert_eq!(json(&converted)?, json(SONG.as_bytes())?);
    Ok(())
}

fn content_directory(root: &Path, skip: Option<&str>) -> Result<PathBuf> {
    let content = root.join("Content");
    fs::create_dir_all(&content).into_diagnostic()?;

    for name in ["Essentials", "Music", "Other", "Updates"] {
        if skip == Some(name) {
            continue;
        }
        let mut archive = PakArchive::new();
        archive.add(PakEntry::from_bytes(
            format!("{}\\splash", name.to_lowercase()),
            PNG.to_vec(),
        ));
        archive.save(content.join(format!("{name}.pak")))?;
    }
    Ok(content)
}

#[test]
fn unpack_game_requires_every_archive() -> Result<()> {
    let dir = tempfile::tempdir().into_diagnostic()?;
    let content = content_directory(dir.path(), Some("Other"))?;
    let output = dir.path().join("output");

    let error = run(&[
        "pak", "unpack-game", "--directory", arg(&content), "--output", arg(&output),
    ])
    .expect_err("Other.pak is missing");

    assert!(error.to_string().contains("missing Other.pak"), "{error}");
    assert!(!output.exists());
    Ok(())
}

#[test]
#[traced_test]
fn unpack_game_puts_music_in_its_own_folder() -> Result<()> {
    let dir = tempfile::tempdir().into_diagnostic()?;
    let content = content_directory(dir.path(), None)?;
    let output = dir.path().join("output");

    run(&[
        "pak", "unpack-game", "--directory", arg(&content), "--output", arg(&output), "--mode", "converted",
    ])?;

    for path in [
        output.join("essentials").join("splash.png"),
        output.join("music").join("music").join("splash.png"),
        output.join("other").join("splash.png"),
        output.join("updates").join("splash.png"),
    ] {
        assert_eq!(fs::read(&path).into_diagnostic()?, PNG, "{}", path.display());
    }
    assert!(logs_contain("4 files: 0 converted, 4 kept, 0 failed"));
    Ok(())
}

#[test]
fn xnb_convert_accepts_the_window_flag() -> Result<()> {
    let dir = tempfile::tempdir().into_diagnostic()?;
    let song = dir.path().join("puzzle.fezsong.json");
    fs::write(&song, SONG).into_diagnostic()?;
    run(&["xnb", "build", "--file", arg(&song)])?;

    let xnb = dir.path().join("puzzle.xnb");
    let output = dir.path().join("converted.fezsong.json");
    run(&[
        "xnb", "convert", "--file", arg(&xnb), "--output", arg(&output), "--no-window-reset",
    ])?;

    let converted = fs::read(&output).into_diagnostic()?;
    assert_eq!(json(&converted)?, json(SONG.as_bytes())?);
    Ok(())
}

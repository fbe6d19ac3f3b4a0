//! Schemas of the FEZ asset kinds understood out of the box.
//!
//! | Asset             | Primary reader                                | Extension       |
//! |-------------------|-----------------------------------------------|-----------------|
//! | `TextStorage`     | `DictionaryReader`2[[String],[Dictionary`2]]` | `.feztxt.json`  |
//! | `TrackedSong`     | `FezEngine.Readers.TrackedSongReader`         | `.fezsong.json` |
//! | `AnimatedTexture` | `FezEngine.Readers.AnimatedTextureReader`     | `.fezanim.json` |

use crate::content::generic::{ArrayContentType, ByteArrayContentType, DictionaryContentType, ListContentType};
use crate::content::primitive::{EnumContentType, PrimitiveContentType, PrimitiveKind};
use crate::content::record::RecordContentType;
use crate::content::{xna, ContentTypeRef, Tagging};
use crate::qualifier::TypeQualifier;

const READERS: &str = "FezEngine.Readers";
const STRUCTURE: &str = "FezEngine.Structure";
const CONTENT: &str = "FezEngine.Content";

pub const TEXT_STORAGE_EXTENSION: &str = ".feztxt.json";
pub const TRACKED_SONG_EXTENSION: &str = ".fezsong.json";
pub const ANIMATED_TEXTURE_EXTENSION: &str = ".fezanim.json";

#[rustfmt::skip]
const SHARD_NOTES: [&str; 25] = [
    "C2", "Csharp2", "D2", "Dsharp2", "E2", "F2", "Fsharp2", "G2", "Gsharp2", "A2", "Asharp2", "B2",
    "C3", "Csharp3", "D3", "Dsharp3", "E3", "F3", "Fsharp3", "G3", "Gsharp3", "A3", "Asharp3", "B3",
    "C4",
];

#[rustfmt::skip]
const ASSEMBLE_CHORDS: [&str; 12] = [
    "C_maj", "Csharp_maj", "D_maj", "Dsharp_maj", "E_maj", "F_maj",
    "Fsharp_maj", "G_maj", "Gsharp_maj", "A_maj", "Asharp_maj", "B_maj",
];

fn primitive(kind: PrimitiveKind) -> ContentTypeRef {
    PrimitiveContentType::shared(kind)
}

/// `Dictionary<String, Dictionary<String, String>>`: language to key to text
pub fn text_storage() -> ContentTypeRef {
    let string = primitive(PrimitiveKind::String);
    let entries =
        DictionaryContentType::shared(&string, Tagging::Tagged, &string, Tagging::Tagged);
    DictionaryContentType::shared(&string, Tagging::Tagged, &entries, Tagging::Tagged)
}

pub fn shard_notes() -> ContentTypeRef {
    EnumContentType::shared(TypeQualifier::new(STRUCTURE, "ShardNotes"), &SHARD_NOTES)
}

pub fn assemble_chords() -> ContentTypeRef {
    EnumContentType::shared(TypeQualifier::new(STRUCTURE, "AssembleChords"), &ASSEMBLE_CHORDS)
}

/// One loop of a [`tracked_song`]
pub fn song_loop() -> ContentTypeRef {
    let int = primitive(PrimitiveKind::Int32);
    let boolean = primitive(PrimitiveKind::Boolean);
    let string = primitive(PrimitiveKind::String);

    RecordContentType::new(
        TypeQualifier::new(READERS, "LoopReader"),
        TypeQualifier::new(STRUCTURE, "Loop"),
    )
    .field("Duration", &int, Tagging::Untagged)
    .field("LoopTimesFrom", &int, Tagging::Untagged)
    .field("LoopTimesTo", &int, Tagging::Untagged)
    .field("Name", &string, Tagging::Untagged)
    .field("TriggerFrom", &int, Tagging::Untagged)
    .field("TriggerTo", &int, Tagging::Untagged)
    .field("Delay", &int, Tagging::Untagged)
    .field("Night", &boolean, Tagging::Untagged)
    .field("Day", &boolean, Tagging::Untagged)
    .field("Dusk", &boolean, Tagging::Untagged)
    .field("Dawn", &boolean, Tagging::Untagged)
    .field("FractionalTime", &boolean, Tagging::Untagged)
    .field("OneAtATime", &boolean, Tagging::Untagged)
    .field("CutOffTail", &boolean, Tagging::Untagged)
    .shared()
}

fn tracked_song_parts() -> (ContentTypeRef, Vec<ContentTypeRef>) {
    let int = primitive(PrimitiveKind::Int32);
    let boolean = primitive(PrimitiveKind::Boolean);
    let string = primitive(PrimitiveKind::String);

    let song_loop = song_loop();
    let loops = ListContentType::shared(&song_loop, Tagging::Tagged);
    let shard_notes = shard_notes();
    let notes = ArrayContentType::shared(&shard_notes, Tagging::Untagged);
    let chords = assemble_chords();
    let ordering = ArrayContentType::shared(&int, Tagging::Untagged);

    let song = RecordContentType::new(
        TypeQualifier::new(READERS, "TrackedSongReader"),
        TypeQualifier::new(STRUCTURE, "TrackedSong"),
    )
    .field("Loops", &loops, Tagging::Tagged)
    .field("Name", &string, Tagging::Untagged)
    .field("Tempo", &int, Tagging::Untagged)
    .field("TimeSignature", &int, Tagging::Untagged)
    .field("Notes", &notes, Tagging::Tagged)
    .field("AssembleChord", &chords, Tagging::Tagged)
    .field("RandomOrdering", &boolean, Tagging::Untagged)
    .field("CustomOrdering", &ordering, Tagging::Tagged)
    .shared();

    let table = vec![
        song.clone(),
        loops,
        song_loop,
        notes,
        shard_notes,
        chords,
        ordering,
    ];
    (song, table)
}

/// A piece of music made of loops triggered over the day
pub fn tracked_song() -> ContentTypeRef {
    tracked_song_parts().0
}

/// One frame of an [`animated_texture`]
pub fn frame_content() -> ContentTypeRef {
    let timespan = primitive(PrimitiveKind::TimeSpan);
    let rectangle = xna::rectangle();

    RecordContentType::new(
        TypeQualifier::new(READERS, "FrameReader"),
        TypeQualifier::new(CONTENT, "FrameContent"),
    )
    .field("Duration", &timespan, Tagging::Tagged)
    .field("Rectangle", &rectangle, Tagging::Tagged)
    .shared()
}

fn animated_texture_parts() -> (ContentTypeRef, Vec<ContentTypeRef>) {
    let int = primitive(PrimitiveKind::Int32);
    let data = ByteArrayContentType::shared();
    let frame = frame_content();
    let frames = ListContentType::shared(&frame, Tagging::Tagged);

    let texture = RecordContentType::new(
        TypeQualifier::new(READERS, "AnimatedTextureReader"),
        TypeQualifier::new(CONTENT, "AnimatedTexture"),
    )
    .field("AtlasWidth", &int, Tagging::Untagged)
    .field("AtlasHeight", &int, Tagging::Untagged)
    .field("FrameWidth", &int, Tagging::Untagged)
    .field("FrameHeight", &int, Tagging::Untagged)
    .field("TextureData", &data, Tagging::Untagged)
    .field("Frames", &frames, Tagging::Tagged)
    .shared();

    let table = vec![
        texture.clone(),
        data,
        frames,
        frame,
        primitive(PrimitiveKind::TimeSpan),
        xna::rectangle(),
    ];
    (texture, table)
}

/// Sprite animation: an atlas texture plus timed frame rectangles
pub fn animated_texture() -> ContentTypeRef {
    animated_texture_parts().0
}

/// Primary handlers of every built-in asset
pub fn content_types() -> Vec<ContentTypeRef> {
    vec![text_storage(), tracked_song(), animated_texture()]
}

/// JSON formats of every built-in asset
#[cfg(feature = "serde")]
pub fn formats() -> Vec<crate::format::AssetFormatRef> {
    use std::sync::Arc;

    use crate::format::JsonFormat;

    let (song, song_table) = tracked_song_parts();
    let (texture, texture_table) = animated_texture_parts();

    vec![
        Arc::new(
            JsonFormat::builder()
                .name("TextStorage")
                .extension(TEXT_STORAGE_EXTENSION)
                .primary(text_storage())
                .build(),
        ),
        Arc::new(
            JsonFormat::builder()
                .name("TrackedSong")
                .extension(TRACKED_SONG_EXTENSION)
                .primary(song)
                .content_types(song_table)
                .build(),
        ),
        Arc::new(
            JsonFormat::builder()
                .name("AnimatedTexture")
                .extension(ANIMATED_TEXTURE_EXTENSION)
                .primary(texture)
                .content_types(texture_table)
                .build(),
        ),
    ]
}

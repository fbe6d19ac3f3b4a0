//! Extension detection from payload signatures.
//!
//! PAK paths carry no extension, so the original file type is recovered from the
//! first bytes of each payload.

/// Extension used when a payload matches no known signature and the caller gave no default
pub const DEFAULT_EXTENSION: &str = ".xnb";

struct Signature {
    extension: &'static str,
    offset: usize,
    magic: &'static [u8],
}

const SIGNATURES: &[Signature] = &[
    Signature {
        extension: ".xnb",
        offset: 0,
        magic: b"XNB",
    },
    Signature {
        extension: ".png",
        offset: 0,
        magic: &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A],
    },
    Signature {
        extension: ".jpg",
        offset: 0,
        magic: &[0xFF, 0xD8, 0xFF],
    },
    Signature {
        extension: ".gif",
        offset: 0,
        magic: b"GIF8",
    },
    Signature {
        extension: ".bmp",
        offset: 0,
        magic: b"BM",
    },
    Signature {
        extension: ".ogg",
        offset: 0,
        magic: b"OggS",
    },
    Signature {
        extension: ".wav",
        offset: 8,
        magic: b"WAVE",
    },
];

/// Returns the extension (with a leading dot) of the first signature matching `data`.
pub fn detect(data: &[u8]) -> Option<&'static str> {
    SIGNATURES
        .iter()
        .find(|s| {
            data.get(s.offset..s.offset + s.magic.len())
                .is_some_and(|head| head == s.magic)
        })
        .map(|s| s.extension)
}

/// Sniffs `data`, falling back to `default` or to [`DEFAULT_EXTENSION`].
pub fn extension_or(data: &[u8], default: Option<&str>) -> String {
    detect(data)
        .or(default)
        .unwrap_or(DEFAULT_EXTENSION)
        .to_owned()
}

#[cfg(test)]
mod test {
    use super::{detect, extension_or};

    #[test]
    fn detects_known_signatures() {
        assert_eq!(detect(b"XNBw\x05\x00"), Some(".xnb"));
        assert_eq!(detect(b"\x89PNG\r\n\x1a\n...."), Some(".png"));
        assert_eq!(detect(b"OggS\x00\x02"), Some(".ogg"));
        assert_eq!(detect(b"RIFF\x24\x08\x00\x00WAVEfmt "), Some(".wav"));
        assert_eq!(detect(b"GIF89a"), Some(".gif"));
    }

    #[test]
    fn short_payloads_do_not_match() {
        assert_eq!(detect(b""), None);
        assert_eq!(detect(b"XN"), None);
        assert_eq!(detect(b"RIFF"), None);
    }

    #[test]
    fn falls_back_to_default_then_xnb() {
        assert_eq!(extension_or(b"\x01\x02\x03", Some("unknown")), "unknown");
        assert_eq!(extension_or(b"\x01\x02\x03", None), ".xnb");
        assert_eq!(extension_or(b"OggS", Some("unknown")), ".ogg");
    }
}

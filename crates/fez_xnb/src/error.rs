//! Error types that can be emitted from this library

use miette::Diagnostic;
use thiserror::Error;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent wrapper for [`std::io::Error`]
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// Transparent wrapper for [`binrw::Error`]
    #[error(transparent)]
    BinRWError(#[from] binrw::Error),

    /// Transparent wrapper for [`std::string::FromUtf8Error`]
    #[error(transparent)]
    Utf8Error(#[from] std::string::FromUtf8Error),

    /// Transparent wrapper for [`serde_json::Error`]
    #[cfg(feature = "serde")]
    #[error(transparent)]
    JsonError(#[from] serde_json::Error),

    /// the file does not start with `XNB`
    #[error("file is not an XNB container")]
    #[diagnostic(help("XNB containers start with the bytes `58 4E 42`"))]
    InvalidMagic,

    /// only format version 5 is understood
    #[error("unsupported XNB format version {0}")]
    UnsupportedVersion(u8),

    /// input ended before a declared size was reached
    #[error("stream is truncated: {0}")]
    TruncatedStream(String),

    /// the compressed stream could not be decoded
    #[error("compressed stream is corrupt: {0}")]
    CorruptStream(String),

    /// decompressed byte count differs from the declared one
    #[error("decompressed {actual} bytes but the container declares {expected}")]
    IntegrityFailure {
        /// size from the container
        expected: usize,
        /// size produced by the decoder
        actual: usize,
    },

    /// operation is intentionally not implemented
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// bytes remained after the primary object was read
    #[error("{0} unexpected bytes after the primary object")]
    TrailingData(u64),

    /// a type string could not be parsed
    #[error("invalid type qualifier `{0}`")]
    InvalidQualifier(String),

    /// a type id does not point into the type table
    #[error("type id {id} is outside of the type table ({count} entries)")]
    UnknownTypeId {
        /// 1-based id read from the stream
        id: u32,
        /// type table length
        count: usize,
    },

    /// no handler is registered for a type
    #[error("no content type registered for `{0}`")]
    UnknownContentType(String),

    /// a value does not have the shape its handler expects
    #[error("expected a {expected} value, found {found}")]
    TypeMismatch {
        /// what the handler writes
        expected: String,
        /// what the value holds
        found: String,
    },

    /// a value is structurally valid but out of range
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// no asset format is registered for the requested extension or type
    #[error("no asset format for `{0}`")]
    NoFormat(String),
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;

use std::path::PathBuf;

use thiserror::Error;

/// Fatal export errors. Any of these aborts the export and no file is written.
#[derive(Debug, Error)]
pub enum Error {
    #[error("no projects selected: the export needs at least one record")]
    EmptySelection,

    #[error("unknown layout '{0}' (expected full, compact or text-only)")]
    UnknownLayout(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to write '{path}': {source}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid project records: {0}")]
    Json(#[from] serde_json::Error),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("failed to start async runtime: {0}")]
    Runtime(String),
}

/// Per-record image failure. Recovered inside the export: the record is
/// drawn with a placeholder block instead of its thumbnail.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    #[error("record has no image reference")]
    MissingSource,

    #[error("request for '{origin}' failed: {detail}")]
    Http { origin: String, detail: String },

    #[error("'{origin}' answered HTTP {status}")]
    Status { origin: String, status: u16 },

    #[error("request for '{origin}' timed out after {secs}s")]
    Timeout { origin: String, secs: u64 },

    #[error("malformed data URI: {0}")]
    InvalidDataUri(String),

    #[error("cannot read '{origin}': {detail}")]
    Io { origin: String, detail: String },

    #[error("cannot decode image from '{origin}': {detail}")]
    Decode { origin: String, detail: String },
}

/// A bitmap that could not be turned into an image XObject.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EmbedError {
    #[error("bitmap has zero size ({width}x{height})")]
    EmptyBitmap { width: u32, height: u32 },

    #[error("bitmap sample buffer holds {actual} bytes, expected {expected}")]
    SampleLength { expected: usize, actual: usize },

    #[error("bitmap dimensions {width}x{height} exceed the PDF limit")]
    TooLarge { width: u32, height: u32 },
}

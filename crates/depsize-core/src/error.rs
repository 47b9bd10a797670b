use std::path::PathBuf;
use thiserror::Error;

/// Core error type for depsize operations.
///
/// Backend and sizing failures never surface here; they are absorbed into
/// empty package lists and unmeasured records. What remains are the
/// conditions a caller cannot recover from on its own.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to read manifest at {path}: {source}")]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse manifest at {path}: {message}")]
    ManifestParse { path: PathBuf, message: String },

    #[error("Failed to serialize export: {0}")]
    ExportSerialize(#[from] serde_json::Error),

    #[error("Failed to write export to {path}: {source}")]
    ExportWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

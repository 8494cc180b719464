use std::path::PathBuf;
use thiserror::Error;

use crate::model::Level;

#[derive(Error, Debug)]
pub enum GeoError {
    #[error("failed to open {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decompress {path:?}: {source}")]
    Decompress {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {path:?} at line {line}: {reason}")]
    Format {
        path: PathBuf,
        line: u64,
        reason: String,
    },

    #[error("{level} {key} references {parent_level} {parent_key}, which was never linked")]
    UnresolvedParent {
        level: Level,
        key: String,
        parent_level: Level,
        parent_key: String,
    },

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid config file: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GeoError>;

//! Error types for windex operations

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum WindexError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config already exists at {}", .0.display())]
    ConfigExists(PathBuf),

    #[error("Config parse error: {0}")]
    ConfigParse(String),

    #[error("Schema version mismatch: catalog is v{found}, expected v{expected}. Remove the catalog file and run 'windex index' to rebuild it.")]
    SchemaVersionMismatch { found: i32, expected: i32 },

    #[error("Path is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),

    #[error("Indexing aborted: {0}")]
    Aborted(String),

    #[error("Timestamp formatting error: {0}")]
    TimeFormat(#[from] time::error::Format),

    #[error("Timestamp out of range: {0}")]
    TimeRange(#[from] time::error::ComponentRange),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Where in a run a recoverable per-entry failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStage {
    OpenDir,
    ReadEntry,
    Stat,
    NonUtf8,
    Lookup,
    Write,
    PruneStat,
    PruneDelete,
}

impl EntryStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenDir => "open_dir",
            Self::ReadEntry => "read_entry",
            Self::Stat => "stat",
            Self::NonUtf8 => "non_utf8",
            Self::Lookup => "lookup",
            Self::Write => "write",
            Self::PruneStat => "prune_stat",
            Self::PruneDelete => "prune_delete",
        }
    }
}

/// A recoverable failure on one path. Recorded, logged, never fatal to the run.
#[derive(Debug, Clone, Serialize)]
pub struct EntryError {
    pub path: PathBuf,
    pub stage: EntryStage,
    pub message: String,
}

impl EntryError {
    pub fn new(path: impl Into<PathBuf>, stage: EntryStage, err: impl fmt::Display) -> Self {
        let entry = Self {
            path: path.into(),
            stage,
            message: err.to_string(),
        };
        tracing::warn!(
            path = %entry.path.display(),
            stage = entry.stage.as_str(),
            "{}",
            entry.message
        );
        entry
    }
}

impl fmt::Display for EntryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}]: {}",
            self.path.display(),
            self.stage.as_str(),
            self.message
        )
    }
}

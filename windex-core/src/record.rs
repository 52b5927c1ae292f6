//! Catalog record model

use serde::Serialize;
use std::fs::Metadata;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Entry kind (stored as text in DB)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    #[serde(rename = "dir")]
    Directory,
}

impl EntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Directory => "dir",
        }
    }

    pub fn parse(val: &str) -> Option<Self> {
        match val {
            "file" => Some(Self::File),
            "dir" => Some(Self::Directory),
            _ => None,
        }
    }

    pub fn from_metadata(meta: &Metadata) -> Self {
        if meta.is_dir() {
            Self::Directory
        } else {
            Self::File
        }
    }
}

/// One catalog row. `path` is the unique key and never changes for a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    pub path: String,
    pub name: String,
    pub kind: EntryKind,
    /// Bytes; kept for directories too, where it carries whatever stat reported
    pub size: u64,
    /// Seconds since the Unix epoch (negative before it)
    pub modified_at: i64,
}

impl FileRecord {
    /// Build a record from a UTF-8 path and its stat metadata.
    pub fn from_metadata(path: &str, meta: &Metadata) -> std::io::Result<Self> {
        Ok(Self {
            path: path.to_string(),
            name: file_name(path),
            kind: EntryKind::from_metadata(meta),
            size: meta.len(),
            modified_at: unix_seconds(meta.modified()?),
        })
    }
}

/// Last path segment, or the whole path when it has none (e.g. `/`).
pub fn file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

/// Whole seconds since the epoch, truncated toward negative infinity for pre-epoch times.
pub fn unix_seconds(t: SystemTime) -> i64 {
    match t.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs() as i64,
        Err(e) => {
            let before = e.duration();
            let secs = before.as_secs() as i64;
            if before.subsec_nanos() > 0 {
                -secs - 1
            } else {
                -secs
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_kind_roundtrips_through_text() {
        for kind in [EntryKind::File, EntryKind::Directory] {
            assert_eq!(EntryKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(EntryKind::parse("symlink"), None);
    }

    #[test]
    fn test_file_name_takes_last_segment() {
        assert_eq!(file_name("/mnt/c/Users/me/notes.txt"), "notes.txt");
        assert_eq!(file_name("/mnt/c/Users"), "Users");
        assert_eq!(file_name("/"), "/");
    }

    #[test]
    fn test_unix_seconds_around_epoch() {
        assert_eq!(unix_seconds(UNIX_EPOCH), 0);
        assert_eq!(unix_seconds(UNIX_EPOCH + Duration::from_secs(100)), 100);
        assert_eq!(unix_seconds(UNIX_EPOCH - Duration::from_secs(5)), -5);
        assert_eq!(unix_seconds(UNIX_EPOCH - Duration::from_millis(1500)), -2);
    }

    #[test]
    fn test_record_from_metadata() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("hello.txt");
        std::fs::write(&path, b"hello").unwrap();

        let meta = std::fs::metadata(&path).unwrap();
        let record = FileRecord::from_metadata(path.to_str().unwrap(), &meta).unwrap();
        assert_eq!(record.name, "hello.txt");
        assert_eq!(record.kind, EntryKind::File);
        assert_eq!(record.size, 5);
        assert!(record.modified_at > 0);

        let dir_meta = std::fs::metadata(dir.path()).unwrap();
        let dir_record =
            FileRecord::from_metadata(dir.path().to_str().unwrap(), &dir_meta).unwrap();
        assert_eq!(dir_record.kind, EntryKind::Directory);
    }
}

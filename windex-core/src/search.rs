//! Catalog search: case-insensitive substring match, newest first.

use crate::catalog::{Catalog, SEARCH_LIMIT};
use crate::record::FileRecord;
use serde::Serialize;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

/// One search result, ready for display
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    #[serde(flatten)]
    pub record: FileRecord,
    /// `YYYY-MM-DD HH:MM:SS` in the display offset
    pub modified: String,
}

impl SearchHit {
    pub fn new(record: FileRecord, offset: UtcOffset) -> crate::Result<Self> {
        let modified = format_timestamp(record.modified_at, offset)?;
        Ok(Self { record, modified })
    }

    /// Human-readable block for this hit (no trailing newline)
    pub fn render(&self) -> String {
        format!(
            "Path: {}\nType: {}\nSize: {} bytes\nModified: {}",
            self.record.path,
            self.record.kind.as_str(),
            self.record.size,
            self.modified
        )
    }
}

pub struct SearchEngine<'c> {
    catalog: &'c Catalog,
    limit: usize,
    offset: UtcOffset,
}

impl<'c> SearchEngine<'c> {
    /// Engine over `catalog` with the default limit, displaying local time
    /// when the offset can be determined and UTC otherwise.
    pub fn new(catalog: &'c Catalog) -> Self {
        Self {
            catalog,
            limit: SEARCH_LIMIT,
            offset: local_offset(),
        }
    }

    /// Display timestamps in a fixed offset
    pub fn with_offset(mut self, offset: UtcOffset) -> Self {
        self.offset = offset;
        self
    }

    /// Lowercase `pattern` and return matching rows, newest first.
    ///
    /// An empty pattern matches every row, still capped by the limit.
    pub fn search(&self, pattern: &str) -> crate::Result<Vec<SearchHit>> {
        let normalized = normalize(pattern);
        let records = self.catalog.records().search(&normalized, self.limit)?;
        tracing::debug!(pattern = %normalized, hits = records.len(), "search");
        records
            .into_iter()
            .map(|r| SearchHit::new(r, self.offset))
            .collect()
    }
}

/// Query normalization applied before matching
pub fn normalize(pattern: &str) -> String {
    pattern.to_lowercase()
}

/// Local offset, falling back to UTC when the platform cannot report it safely.
pub fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}

/// Format epoch seconds as `YYYY-MM-DD HH:MM:SS` in `offset`.
///
/// Seconds outside the representable date range are an error.
pub fn format_timestamp(secs: i64, offset: UtcOffset) -> crate::Result<String> {
    let fmt = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    let dt = OffsetDateTime::from_unix_timestamp(secs)?.to_offset(offset);
    Ok(dt.format(fmt)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::EntryKind;
    use time::macros::offset;

    fn insert(catalog: &Catalog, path: &str, kind: EntryKind, size: u64, modified_at: i64) {
        catalog
            .records()
            .upsert(&FileRecord {
                path: path.to_string(),
                name: crate::record::file_name(path),
                kind,
                size,
                modified_at,
            })
            .unwrap();
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(
            format_timestamp(0, UtcOffset::UTC).unwrap(),
            "1970-01-01 00:00:00"
        );
        assert_eq!(
            format_timestamp(1_700_000_000, UtcOffset::UTC).unwrap(),
            "2023-11-14 22:13:20"
        );
        assert_eq!(
            format_timestamp(1_700_000_000, offset!(+2)).unwrap(),
            "2023-11-15 00:13:20"
        );
    }

    #[test]
    fn test_out_of_range_timestamp_is_an_error() {
        assert!(matches!(
            format_timestamp(i64::MAX, UtcOffset::UTC),
            Err(crate::WindexError::TimeRange(_))
        ));

        let catalog = Catalog::open_in_memory().unwrap();
        insert(&catalog, "/far/future", EntryKind::File, 1, i64::MAX);
        assert!(SearchEngine::new(&catalog).search("future").is_err());
    }

    #[test]
    fn test_pattern_is_lowercased() {
        let catalog = Catalog::open_in_memory().unwrap();
        insert(&catalog, "/w/Budget.XLSX", EntryKind::File, 1, 1);

        let engine = SearchEngine::new(&catalog).with_offset(UtcOffset::UTC);
        assert_eq!(engine.search("BUDGET").unwrap().len(), 1);
        assert_eq!(engine.search("budget.xlsx").unwrap().len(), 1);
    }

    #[test]
    fn test_empty_pattern_matches_everything() {
        let catalog = Catalog::open_in_memory().unwrap();
        insert(&catalog, "/a", EntryKind::File, 1, 1);
        insert(&catalog, "/b", EntryKind::Directory, 0, 2);

        let hits = SearchEngine::new(&catalog).search("").unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].record.path, "/b");
    }

    #[test]
    fn test_results_capped_at_newest_hundred() {
        let catalog = Catalog::open_in_memory().unwrap();
        for i in 0..150 {
            insert(&catalog, &format!("/logs/match_{i:03}"), EntryKind::File, 1, i);
        }
        insert(&catalog, "/logs/other", EntryKind::File, 1, 1_000);

        let hits = SearchEngine::new(&catalog).search("MATCH").unwrap();
        assert_eq!(hits.len(), SEARCH_LIMIT);
        assert_eq!(hits[0].record.modified_at, 149);
        assert_eq!(hits[99].record.modified_at, 50);
        assert!(hits
            .windows(2)
            .all(|w| w[0].record.modified_at > w[1].record.modified_at));
    }

    #[test]
    fn test_no_match_is_empty_not_error() {
        let catalog = Catalog::open_in_memory().unwrap();
        insert(&catalog, "/a", EntryKind::File, 1, 1);
        assert!(SearchEngine::new(&catalog)
            .search("zzz")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_render_block() {
        let catalog = Catalog::open_in_memory().unwrap();
        insert(&catalog, "/mnt/c/Users/me", EntryKind::Directory, 4096, 1_700_000_000);

        let hits = SearchEngine::new(&catalog)
            .with_offset(UtcOffset::UTC)
            .search("me")
            .unwrap();
        assert_eq!(
            hits[0].render(),
            "Path: /mnt/c/Users/me\nType: dir\nSize: 4096 bytes\nModified: 2023-11-14 22:13:20"
        );
    }

    #[test]
    fn test_hit_serializes_flat() {
        let catalog = Catalog::open_in_memory().unwrap();
        insert(&catalog, "/x/notes.txt", EntryKind::File, 12, 0);

        let hits = SearchEngine::new(&catalog)
            .with_offset(UtcOffset::UTC)
            .search("notes")
            .unwrap();
        let json = serde_json::to_value(&hits[0]).unwrap();
        assert_eq!(json["path"], "/x/notes.txt");
        assert_eq!(json["kind"], "file");
        assert_eq!(json["size"], 12);
        assert_eq!(json["modified"], "1970-01-01 00:00:00");
    }
}

//! Persistent file catalog backed by SQLite

use crate::error::WindexError;
use crate::record::{EntryKind, FileRecord};
use rusqlite::types::Type;
use rusqlite::Error::FromSqlConversionFailure;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

const SCHEMA_VERSION: i32 = 1;

/// Default cap on search results
pub const SEARCH_LIMIT: usize = 100;

/// Shared column list for record queries, in `record_from_row` order.
const RECORD_SELECT: &str = "path, name, kind, size, modified_at";

/// Catalog status information
#[derive(Debug, Serialize)]
pub struct CatalogStatus {
    pub entries: usize,
    pub files: usize,
    pub directories: usize,
    pub schema_version: i32,
    pub catalog_size_bytes: u64,
    pub newest_modified_at: Option<i64>,
}

/// The catalog: one table of [`FileRecord`] rows keyed by path.
pub struct Catalog {
    conn: Connection,
    db_path: Option<PathBuf>,
}

impl Catalog {
    /// Open or create the catalog file, creating its directory on demand
    pub fn open(db_path: &Path) -> crate::Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path)?;
        Self::init_schema(&conn)?;
        tracing::debug!(path = %db_path.display(), "catalog opened");

        Ok(Self {
            conn,
            db_path: Some(db_path.to_path_buf()),
        })
    }

    /// Catalog that lives only as long as the value (tests, dry runs)
    pub fn open_in_memory() -> crate::Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn,
            db_path: None,
        })
    }

    /// Initialize database schema
    fn init_schema(conn: &Connection) -> crate::Result<()> {
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA busy_timeout = 5000;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        let version: i32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version != 0 && version != SCHEMA_VERSION {
            return Err(WindexError::SchemaVersionMismatch {
                found: version,
                expected: SCHEMA_VERSION,
            });
        }

        if version == 0 {
            conn.execute_batch(
                "
                CREATE TABLE IF NOT EXISTS files (
                    id INTEGER PRIMARY KEY,
                    path TEXT UNIQUE NOT NULL,
                    name TEXT NOT NULL,
                    kind TEXT NOT NULL,
                    size INTEGER NOT NULL,
                    modified_at INTEGER NOT NULL,
                    -- Unicode-lowercased copies used by substring search
                    name_lower TEXT NOT NULL,
                    path_lower TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_files_path ON files(path);
                CREATE INDEX IF NOT EXISTS idx_files_name ON files(name);
                CREATE INDEX IF NOT EXISTS idx_files_name_lower ON files(name_lower);

                PRAGMA user_version = 1;
                ",
            )?;
        }

        Ok(())
    }

    /// Auto-committing access to the catalog rows
    pub fn records(&self) -> Records<'_> {
        Records { conn: &self.conn }
    }

    /// Begin an all-or-nothing unit of work. Dropping it without
    /// [`CatalogTransaction::commit`] rolls every write back.
    pub fn transaction(&mut self) -> crate::Result<CatalogTransaction<'_>> {
        Ok(CatalogTransaction {
            tx: self.conn.transaction()?,
        })
    }

    /// Path of the backing file, `None` for in-memory catalogs
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Get catalog status
    pub fn status(&self) -> crate::Result<CatalogStatus> {
        let (entries, directories, newest): (i64, i64, Option<i64>) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(kind = 'dir'), 0), MAX(modified_at) FROM files",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        let catalog_size_bytes = self
            .db_path
            .as_ref()
            .and_then(|p| fs::metadata(p).ok())
            .map(|m| m.len())
            .unwrap_or(0);

        Ok(CatalogStatus {
            entries: entries as usize,
            files: (entries - directories) as usize,
            directories: directories as usize,
            schema_version: SCHEMA_VERSION,
            catalog_size_bytes,
            newest_modified_at: newest,
        })
    }
}

/// A rusqlite transaction over the catalog.
pub struct CatalogTransaction<'c> {
    tx: Transaction<'c>,
}

impl CatalogTransaction<'_> {
    /// Row access inside this transaction
    pub fn records(&self) -> Records<'_> {
        Records { conn: &self.tx }
    }

    pub fn commit(self) -> crate::Result<()> {
        self.tx.commit()?;
        Ok(())
    }
}

/// Row-level operations, usable both auto-committed and inside a transaction.
#[derive(Clone, Copy)]
pub struct Records<'c> {
    conn: &'c Connection,
}

impl Records<'_> {
    /// Stored mtime for `path`, `None` if the catalog has no such row.
    pub fn lookup_modified_at(&self, path: &str) -> crate::Result<Option<i64>> {
        let mtime = self
            .conn
            .prepare_cached("SELECT modified_at FROM files WHERE path = ?")?
            .query_row(params![path], |row| row.get(0))
            .optional()?;
        Ok(mtime)
    }

    /// Full row for `path`
    pub fn get(&self, path: &str) -> crate::Result<Option<FileRecord>> {
        let record = self
            .conn
            .prepare_cached(&format!("SELECT {RECORD_SELECT} FROM files WHERE path = ?"))?
            .query_row(params![path], record_from_row)
            .optional()?;
        Ok(record)
    }

    /// Insert, or update the mutable columns when `modified_at` differs.
    ///
    /// Returns `false` when the stored row already carries the same
    /// `modified_at`, in which case nothing is written.
    pub fn upsert(&self, record: &FileRecord) -> crate::Result<bool> {
        let size = i64::try_from(record.size).unwrap_or(i64::MAX);
        let changed = self
            .conn
            .prepare_cached(
                "INSERT INTO files (path, name, kind, size, modified_at, name_lower, path_lower)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(path) DO UPDATE SET
                     name = excluded.name,
                     kind = excluded.kind,
                     size = excluded.size,
                     modified_at = excluded.modified_at,
                     name_lower = excluded.name_lower
                 WHERE files.modified_at <> excluded.modified_at",
            )?
            .execute(params![
                record.path,
                record.name,
                record.kind.as_str(),
                size,
                record.modified_at,
                record.name.to_lowercase(),
                record.path.to_lowercase(),
            ])?;
        Ok(changed > 0)
    }

    /// Remove the row for `path`. Absent rows are not an error.
    pub fn delete_by_path(&self, path: &str) -> crate::Result<bool> {
        let deleted = self
            .conn
            .prepare_cached("DELETE FROM files WHERE path = ?")?
            .execute(params![path])?;
        Ok(deleted > 0)
    }

    /// Every stored path starting with `prefix` (exact, case-sensitive).
    pub fn find_by_path_prefix(&self, prefix: &str) -> crate::Result<Vec<String>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT path FROM files WHERE substr(path, 1, length(?1)) = ?1 ORDER BY path",
        )?;
        let paths = stmt
            .query_map(params![prefix], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(paths)
    }

    /// Rows whose lowercased name or path contains `normalized` literally,
    /// newest first, ties by path, at most `limit` rows.
    pub fn search(&self, normalized: &str, limit: usize) -> crate::Result<Vec<FileRecord>> {
        let pattern = format!("%{}%", escape_like(normalized));
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut stmt = self.conn.prepare_cached(&format!(
            "SELECT {RECORD_SELECT}
             FROM files
             WHERE name_lower LIKE ?1 ESCAPE '\\' OR path_lower LIKE ?1 ESCAPE '\\'
             ORDER BY modified_at DESC, path ASC
             LIMIT ?2"
        ))?;
        let records = stmt
            .query_map(params![pattern, limit], record_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    pub fn count(&self) -> crate::Result<usize> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM files", [], |row| row.get(0))?;
        Ok(n as usize)
    }
}

/// Construct a FileRecord from a `RECORD_SELECT` row.
///
/// Values no writer produces (unknown kind, negative size) are conversion
/// errors rather than being coerced.
fn record_from_row(row: &rusqlite::Row) -> rusqlite::Result<FileRecord> {
    let kind: String = row.get(2)?;
    let kind = EntryKind::parse(&kind).ok_or_else(|| {
        FromSqlConversionFailure(2, Type::Text, format!("unknown entry kind {kind:?}").into())
    })?;
    let size: i64 = row.get(3)?;
    let size = u64::try_from(size)
        .map_err(|e| FromSqlConversionFailure(3, Type::Integer, Box::new(e)))?;
    Ok(FileRecord {
        path: row.get(0)?,
        name: row.get(1)?,
        kind,
        size,
        modified_at: row.get(4)?,
    })
}

/// Escape LIKE metacharacters so the pattern matches literally
fn escape_like(pattern: &str) -> String {
    let mut escaped = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

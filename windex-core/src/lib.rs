//! windex core - incremental filesystem catalog
//!
//! Walks a directory tree without recursion, keeps a SQLite catalog of
//! path/name/kind/size/mtime rows in sync with it (writing only entries
//! whose mtime changed and pruning entries whose file vanished), and serves
//! case-insensitive substring lookups ordered by recency.

pub mod catalog;
pub mod config;
pub mod error;
pub mod exclusion;
pub mod indexer;
pub mod record;
pub mod search;
pub mod walker;

pub use catalog::{Catalog, CatalogStatus, CatalogTransaction, Records, SEARCH_LIMIT};
pub use config::Config;
pub use error::{EntryError, EntryStage, WindexError};
pub use exclusion::{ExclusionSet, DEFAULT_EXCLUSIONS};
pub use indexer::{Decision, IndexStats, Indexer, Reconciler};
pub use record::{EntryKind, FileRecord};
pub use search::{SearchEngine, SearchHit};
pub use walker::{TreeWalker, Visitor, WalkEntry, WalkSummary};

/// Result type alias for windex operations
pub type Result<T> = std::result::Result<T, WindexError>;

//! Substring-based path exclusion

use serde::Serialize;

/// Built-in exclusions: system and recycle directories of a Windows drive.
pub const DEFAULT_EXCLUSIONS: &[&str] = &[
    "System Volume Information",
    "$RECYCLE.BIN",
    "Windows",
    "Program Files",
    "Program Files (x86)",
];

/// Ordered set of exclusion substrings.
///
/// A path is excluded when it *contains* any member anywhere, not when a
/// path segment equals it. `Windows` therefore also excludes a file named
/// `MyWindowsNotes.txt`. Callers relying on segment semantics must pass a
/// substring with separators, e.g. `/build/`.
#[derive(Debug, Clone, Serialize)]
pub struct ExclusionSet {
    patterns: Vec<String>,
}

impl Default for ExclusionSet {
    fn default() -> Self {
        Self {
            patterns: DEFAULT_EXCLUSIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ExclusionSet {
    /// A set with no members; nothing is excluded.
    pub fn empty() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }

    /// Defaults followed by `extra`, in order.
    pub fn with_additions<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::default();
        for pattern in extra {
            set.add(pattern);
        }
        set
    }

    /// Append a substring. Duplicates are kept; they are harmless.
    pub fn add(&mut self, pattern: impl Into<String>) {
        let pattern = pattern.into();
        if pattern.is_empty() {
            // "" is contained in every path and would exclude the whole tree
            tracing::warn!("ignoring empty exclusion pattern");
            return;
        }
        self.patterns.push(pattern);
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        self.patterns.iter().any(|p| path.contains(p.as_str()))
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

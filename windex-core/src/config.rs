//! Configuration for windex

use crate::WindexError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the per-user state directory under the home directory
pub const STATE_DIR: &str = ".windex";
/// Catalog file name inside [`STATE_DIR`]
pub const CATALOG_FILE: &str = ".winindex.db";
/// Config file name inside [`STATE_DIR`]
pub const CONFIG_FILE: &str = "config.toml";

/// Default configuration as TOML
pub const DEFAULT_CONFIG: &str = r#"# windex configuration

[catalog]
# Location of the catalog database (default: ~/.windex/.winindex.db)
# path = "/home/me/.windex/.winindex.db"

[index]
# Directory tree to index (default: /mnt/ when present, otherwise the system drive)
# root = "/mnt/"

[exclude]
# Substrings appended to the built-in exclusions. A path containing any of
# them anywhere (directory or file name) is skipped along with its subtree.
patterns = []
"#;

/// windex configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub exclude: ExcludeConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexConfig {
    #[serde(default)]
    pub root: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeConfig {
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl Config {
    /// Load config from a TOML file
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load config if the file exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse config from TOML string
    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| WindexError::ConfigParse(e.to_string()))
    }

    /// Write [`DEFAULT_CONFIG`] to `path`, refusing to overwrite
    pub fn write_default(path: &Path) -> crate::Result<()> {
        if path.exists() {
            return Err(WindexError::ConfigExists(path.to_path_buf()));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, DEFAULT_CONFIG)?;
        Ok(())
    }

    /// Catalog path: explicit override, then config, then `<home>/.windex/.winindex.db`
    pub fn catalog_path(&self, home: &Path, cli_override: Option<&Path>) -> PathBuf {
        cli_override
            .map(Path::to_path_buf)
            .or_else(|| self.catalog.path.clone())
            .unwrap_or_else(|| home.join(STATE_DIR).join(CATALOG_FILE))
    }

    /// Index root: explicit override, then config, then [`default_root`]
    pub fn index_root(&self, cli_override: Option<&Path>) -> PathBuf {
        cli_override
            .map(Path::to_path_buf)
            .or_else(|| self.index.root.clone())
            .unwrap_or_else(default_root)
    }
}

/// Path of the config file under `home`
pub fn default_config_path(home: &Path) -> PathBuf {
    home.join(STATE_DIR).join(CONFIG_FILE)
}

/// Auto-detected root: `/mnt/` when it exists (WSL and friends), else the system drive.
pub fn default_root() -> PathBuf {
    let mnt = Path::new("/mnt/");
    if mnt.exists() {
        return mnt.to_path_buf();
    }
    if cfg!(windows) {
        PathBuf::from("C:\\")
    } else {
        PathBuf::from("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parses() {
        let config = Config::from_toml(DEFAULT_CONFIG).unwrap();
        assert!(config.catalog.path.is_none());
        assert!(config.index.root.is_none());
        assert!(config.exclude.patterns.is_empty());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config = Config::from_toml("[exclude]\npatterns = [\"node_modules\", \".git\"]\n").unwrap();
        assert_eq!(config.exclude.patterns, vec!["node_modules", ".git"]);
        assert!(config.catalog.path.is_none());
    }

    #[test]
    fn test_invalid_toml_is_config_parse_error() {
        let err = Config::from_toml("[catalog\npath = 3").unwrap_err();
        assert!(matches!(err, WindexError::ConfigParse(_)));
    }

    #[test]
    fn test_catalog_path_precedence() {
        let home = Path::new("/home/me");
        let mut config = Config::default();
        assert_eq!(
            config.catalog_path(home, None),
            PathBuf::from("/home/me/.windex/.winindex.db")
        );

        config.catalog.path = Some(PathBuf::from("/data/cat.db"));
        assert_eq!(config.catalog_path(home, None), PathBuf::from("/data/cat.db"));
        assert_eq!(
            config.catalog_path(home, Some(Path::new("/tmp/x.db"))),
            PathBuf::from("/tmp/x.db")
        );
    }

    #[test]
    fn test_index_root_precedence() {
        let mut config = Config::default();
        config.index.root = Some(PathBuf::from("/srv"));
        assert_eq!(config.index_root(None), PathBuf::from("/srv"));
        assert_eq!(
            config.index_root(Some(Path::new("/home"))),
            PathBuf::from("/home")
        );
    }

    #[test]
    fn test_write_default_refuses_overwrite() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(STATE_DIR).join(CONFIG_FILE);
        Config::write_default(&path).unwrap();
        assert!(path.exists());

        let err = Config::write_default(&path).unwrap_err();
        assert!(matches!(err, WindexError::ConfigExists(_)));
    }
}

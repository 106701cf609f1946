//! SQLite backend configuration

use std::path::PathBuf;

/// Configuration for the SQLite connection
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    /// Database file path, or `:memory:` for an in-memory database
    pub path: PathBuf,
    /// Enable WAL journaling
    pub wal_mode: bool,
    /// Enforce foreign keys
    pub foreign_keys: bool,
    /// Busy timeout in milliseconds
    pub busy_timeout_ms: u32,
}

impl SqliteConfig {
    /// Configuration for a database at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            wal_mode: true,
            foreign_keys: true,
            busy_timeout_ms: 5_000,
        }
    }

    /// Configuration for an in-memory database (tests, scratch work)
    pub fn memory() -> Self {
        Self {
            path: PathBuf::from(":memory:"),
            // WAL is meaningless for in-memory databases
            wal_mode: false,
            foreign_keys: true,
            busy_timeout_ms: 5_000,
        }
    }

    pub(crate) fn is_memory(&self) -> bool {
        self.path.to_str() == Some(":memory:")
    }
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self::new("vitrine.db")
    }
}

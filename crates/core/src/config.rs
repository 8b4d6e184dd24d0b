//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into
//! services behind an `Arc`. Nothing in the core reads environment
//! variables during request handling; that keeps behaviour consistent
//! across multi-threaded runtimes and test harnesses.

use crate::{HospitalError, HospitalResult};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default time a connection waits on a locked database before giving up.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Where the relational store lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreLocation {
    /// A database file on disk.
    File(PathBuf),
    /// A private in-memory database. Used by tests and demos.
    InMemory,
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    store: StoreLocation,
    busy_timeout: Duration,
}

impl CoreConfig {
    /// Create a configuration backed by a database file.
    ///
    /// The path must name a file, not a directory; the file itself does not
    /// need to exist yet (the schema is bootstrapped on first open).
    pub fn with_database_file(path: impl Into<PathBuf>) -> HospitalResult<Self> {
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Err(HospitalError::Validation(vec![
                "database path cannot be empty".to_owned(),
            ]));
        }
        if path.is_dir() {
            return Err(HospitalError::Validation(vec![format!(
                "database path {} is a directory",
                path.display()
            )]));
        }
        Ok(Self {
            store: StoreLocation::File(path),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        })
    }

    /// Create a configuration backed by a private in-memory database.
    pub fn in_memory() -> Self {
        Self {
            store: StoreLocation::InMemory,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    /// Override the busy timeout applied to every connection.
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn store(&self) -> &StoreLocation {
        &self.store
    }

    pub fn store_busy_timeout(&self) -> Duration {
        self.busy_timeout
    }

    /// Returns the database file path, if file-backed.
    pub fn database_file(&self) -> Option<&Path> {
        match &self.store {
            StoreLocation::File(path) => Some(path),
            StoreLocation::InMemory => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_database_file_rejects_empty_path() {
        let err = CoreConfig::with_database_file("").expect_err("empty path should fail");
        assert!(matches!(err, HospitalError::Validation(_)));
    }

    #[test]
    fn test_with_database_file_rejects_directory() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let err = CoreConfig::with_database_file(dir.path())
            .expect_err("directory path should fail");
        assert!(matches!(err, HospitalError::Validation(_)));
    }

    #[test]
    fn test_in_memory_has_no_file() {
        let cfg = CoreConfig::in_memory();
        assert_eq!(cfg.database_file(), None);
        assert_eq!(cfg.store(), &StoreLocation::InMemory);
    }
}

//! Storage layer for doctime.
//!
//! The ledger lives in a single JSON object on disk, mapping document path to
//! whole seconds:
//!
//! ```json
//! {
//!   "notes/plan.md": 5421,
//!   "notes/todo.md": 60
//! }
//! ```
//!
//! # Durability
//!
//! Writes go to a temp file in the same directory which is then renamed over
//! the ledger, so readers see either the old or the new snapshot, never a
//! partial one. Writers also hold an exclusive lock on a sibling `.lock` file
//! so two processes never race on the rename.
//!
//! # Recovery
//!
//! A missing file is a fresh install and a file that fails to parse is
//! corruption. Both load as an empty ledger via [`LedgerFile::load`];
//! [`LedgerFile::try_load`] keeps them apart. Before falling back, `load`
//! copies a corrupt file to `<name>.corrupt` so the next save does not
//! destroy it.

mod queue;

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use dt_core::TimeLedger;
use fs2::FileExt;
use tempfile::NamedTempFile;
use thiserror::Error;

pub use queue::SaveQueue;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the ledger file failed.
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The ledger could not be serialized.
    #[error("failed to encode ledger for {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// The writer lock could not be taken.
    #[error("failed to lock {path}: {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result of reading the ledger file.
#[derive(Debug)]
pub enum LoadOutcome {
    /// The file parsed.
    Loaded(TimeLedger),
    /// No file yet.
    Missing,
    /// The file exists but is not a valid ledger.
    Corrupt(serde_json::Error),
}

/// The on-disk ledger.
#[derive(Debug, Clone)]
pub struct LedgerFile {
    path: PathBuf,
}

impl LedgerFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(suffix);
        self.path.with_file_name(name)
    }

    fn lock_path(&self) -> PathBuf {
        self.sibling(".lock")
    }

    /// Where [`LedgerFile::load`] keeps a copy of a corrupt ledger.
    pub fn corrupt_path(&self) -> PathBuf {
        self.sibling(".corrupt")
    }

    /// Reads the ledger, distinguishing a missing file from a corrupt one.
    ///
    /// Only I/O failures other than "not found" are errors.
    pub fn try_load(&self) -> Result<LoadOutcome, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(LoadOutcome::Missing),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        Ok(match serde_json::from_str(&content) {
            Ok(ledger) => LoadOutcome::Loaded(ledger),
            Err(e) => LoadOutcome::Corrupt(e),
        })
    }

    /// Reads the ledger, falling back to an empty one on any failure.
    pub fn load(&self) -> TimeLedger {
        match self.try_load() {
            Ok(LoadOutcome::Loaded(ledger)) => {
                tracing::info!(path = %self.path.display(), documents = ledger.len(), "time data loaded");
                ledger
            }
            Ok(LoadOutcome::Missing) => {
                tracing::info!(path = %self.path.display(), "no existing time-tracker data found");
                TimeLedger::new()
            }
            Ok(LoadOutcome::Corrupt(error)) => {
                let backup = self.corrupt_path();
                match fs::copy(&self.path, &backup) {
                    Ok(_) => tracing::warn!(
                        path = %self.path.display(),
                        backup = %backup.display(),
                        %error,
                        "time data is corrupt, starting empty"
                    ),
                    Err(copy_error) => tracing::warn!(
                        path = %self.path.display(),
                        %error,
                        %copy_error,
                        "time data is corrupt and could not be backed up, starting empty"
                    ),
                }
                TimeLedger::new()
            }
            Err(error) => {
                tracing::warn!(%error, "time data unreadable, starting empty");
                TimeLedger::new()
            }
        }
    }

    /// Writes the whole ledger atomically.
    pub fn save(&self, ledger: &TimeLedger) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        let content = serde_json::to_string_pretty(ledger).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(io_err)?;

        let lock_path = self.lock_path();
        let lock_file = File::create(&lock_path).map_err(|source| StoreError::Lock {
            path: lock_path.clone(),
            source,
        })?;
        lock_file
            .lock_exclusive()
            .map_err(|source| StoreError::Lock {
                path: lock_path.clone(),
                source,
            })?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
        tmp.write_all(content.as_bytes()).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| io_err(e.error))?;

        // Dropping the handle releases the lock.
        drop(lock_file);

        tracing::debug!(path = %self.path.display(), documents = ledger.len(), "time data saved");
        Ok(())
    }

    /// Saves, logging instead of returning a failure. Returns whether the
    /// write succeeded.
    pub fn save_or_log(&self, ledger: &TimeLedger) -> bool {
        match self.save(ledger) {
            Ok(()) => true,
            Err(error) => {
                tracing::error!(%error, "failed to save time data");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use dt_core::DocumentId;

    fn doc(path: &str) -> DocumentId {
        DocumentId::new(path).unwrap()
    }

    fn sample() -> TimeLedger {
        [
            (doc("notes/a.md"), 10),
            (doc("notes/sub/b.md"), 3_600),
            (doc("top.md"), 0),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn missing_file_is_distinguished() {
        let dir = tempfile::tempdir().unwrap();
        let file = LedgerFile::new(dir.path().join("time-tracker.json"));

        assert!(matches!(file.try_load().unwrap(), LoadOutcome::Missing));
        assert!(file.load().is_empty());
    }

    #[test]
    fn corrupt_file_is_distinguished() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("time-tracker.json");
        fs::write(&path, "{ not json").unwrap();
        let file = LedgerFile::new(&path);

        assert!(matches!(file.try_load().unwrap(), LoadOutcome::Corrupt(_)));
        assert!(file.load().is_empty());
    }

    #[test]
    fn corrupt_file_is_kept_aside_before_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("time-tracker.json");
        fs::write(&path, "{ not json").unwrap();
        let file = LedgerFile::new(&path);

        let ledger = file.load();
        file.save(&ledger).unwrap();

        assert_eq!(
            file.corrupt_path(),
            dir.path().join("time-tracker.json.corrupt")
        );
        assert_eq!(fs::read_to_string(file.corrupt_path()).unwrap(), "{ not json");
        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn healthy_file_leaves_no_backup() {
        let dir = tempfile::tempdir().unwrap();
        let file = LedgerFile::new(dir.path().join("time-tracker.json"));
        file.save(&sample()).unwrap();

        file.load();
        assert!(!file.corrupt_path().exists());
    }

    #[test]
    fn wrong_shape_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("time-tracker.json");
        fs::write(&path, r#"{"a.md": "ten"}"#).unwrap();

        let file = LedgerFile::new(&path);
        assert!(matches!(file.try_load().unwrap(), LoadOutcome::Corrupt(_)));
    }

    #[test]
    fn save_then_load_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let file = LedgerFile::new(dir.path().join("time-tracker.json"));

        for ledger in [TimeLedger::new(), [(doc("one.md"), 1)].into_iter().collect(), sample()] {
            file.save(&ledger).unwrap();
            assert_eq!(file.load(), ledger);
        }
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let file = LedgerFile::new(dir.path().join("nested/deeper/time-tracker.json"));

        file.save(&sample()).unwrap();
        assert_eq!(file.load(), sample());
    }

    #[test]
    fn saved_file_is_pretty_json_object() {
        let dir = tempfile::tempdir().unwrap();
        let file = LedgerFile::new(dir.path().join("time-tracker.json"));
        file.save(&[(doc("a.md"), 42)].into_iter().collect()).unwrap();

        let content = fs::read_to_string(file.path()).unwrap();
        assert_eq!(content, "{\n  \"a.md\": 42\n}");
    }

    #[test]
    fn save_overwrites_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("time-tracker.json");
        fs::write(&path, "garbage").unwrap();
        let file = LedgerFile::new(&path);

        file.save(&sample()).unwrap();
        assert!(matches!(file.try_load().unwrap(), LoadOutcome::Loaded(_)));
    }

    #[test]
    fn save_failure_is_reported_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the ledger file should be makes the rename fail.
        let path = dir.path().join("time-tracker.json");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("occupied"), "x").unwrap();
        let file = LedgerFile::new(&path);

        assert!(file.save(&sample()).is_err());
        assert!(!file.save_or_log(&sample()));
    }
}

//! JSON file-backed persistence for grafana-relay.
//!
//! A [`JsonStore`] owns one snapshot file, `<dir>/<name>.json`. Snapshots are
//! written to a sibling temp file and renamed into place, so a reader never
//! observes a partially written file.

#![forbid(unsafe_code)]

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

/// Errors raised while reading or writing a snapshot.
#[derive(Debug, Error)]
pub enum PersistError {
    /// Filesystem failure.
    #[error("io error on {path}: {source}")]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },

    /// Snapshot content could not be encoded or decoded.
    #[error("invalid snapshot {path}: {source}")]
    Json {
        /// Snapshot file.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },
}

/// Result type for persistence operations.
pub type Result<T> = std::result::Result<T, PersistError>;

/// A single JSON snapshot file inside a state directory.
#[derive(Debug, Clone)]
pub struct JsonStore {
    dir: PathBuf,
    path: PathBuf,
}

impl JsonStore {
    /// Creates a store for `<dir>/<name>.json`. Nothing is touched on disk yet.
    pub fn new(dir: &Path, name: &str) -> Self {
        Self {
            dir: dir.to_path_buf(),
            path: dir.join(format!("{name}.json")),
        }
    }

    /// Path of the snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the snapshot. A missing file yields `T::default()`; a corrupt
    /// file is an error.
    pub fn try_load<T: DeserializeOwned + Default>(&self) -> Result<T> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no snapshot on disk");
                return Ok(T::default());
            }
            Err(source) => {
                return Err(PersistError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        serde_json::from_str(&content).map_err(|source| PersistError::Json {
            path: self.path.clone(),
            source,
        })
    }

    /// Writes the snapshot atomically, creating the state directory if needed.
    pub fn save<T: Serialize>(&self, value: &T) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|source| PersistError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let json = serde_json::to_vec_pretty(value).map_err(|source| PersistError::Json {
            path: self.path.clone(),
            source,
        })?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|source| PersistError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &self.path).map_err(|source| PersistError::Io {
            path: self.path.clone(),
            source,
        })?;

        debug!(path = %self.path.display(), "snapshot written");
        Ok(())
    }
}

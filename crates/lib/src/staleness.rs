//! Per-file staleness checks.
//!
//! Each build artifact is compared against its own source only; there is no
//! dependency graph. An artifact is stale when it is missing or its timestamp
//! is strictly earlier than its source's.

use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use thiserror::Error;
use tracing::trace;

use crate::config::TimestampPolicy;

#[derive(Debug, Error)]
pub enum StalenessError {
  #[error("failed to read timestamp of {path}: {source}")]
  Metadata {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to remove stale artifact {path}: {source}")]
  Remove {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to create directory {path}: {source}")]
  CreateDir {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// A source file and the artifact generated from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaleFilePair {
  pub source: PathBuf,
  pub dest: PathBuf,
  pub source_time: SystemTime,
  /// `None` when the artifact does not exist yet.
  pub dest_time: Option<SystemTime>,
}

impl StaleFilePair {
  /// Read the timestamps of `source` and `dest`.
  pub fn inspect(source: &Path, dest: &Path, policy: TimestampPolicy) -> Result<Self, StalenessError> {
    let source_time = timestamp(source, policy)?;
    let dest_time = if dest.exists() { Some(timestamp(dest, policy)?) } else { None };
    Ok(Self {
      source: source.to_path_buf(),
      dest: dest.to_path_buf(),
      source_time,
      dest_time,
    })
  }

  /// Whether the artifact must be regenerated.
  pub fn is_stale(&self) -> bool {
    match self.dest_time {
      None => true,
      Some(dest_time) => dest_time < self.source_time,
    }
  }
}

/// Whether `dest` must be regenerated from `source`.
pub fn is_stale(source: &Path, dest: &Path, policy: TimestampPolicy) -> Result<bool, StalenessError> {
  let pair = StaleFilePair::inspect(source, dest, policy)?;
  let stale = pair.is_stale();
  trace!(source = %source.display(), dest = %dest.display(), stale, "staleness");
  Ok(stale)
}

/// Create the parent directory of `path` if needed.
pub fn ensure_parent(path: &Path) -> Result<(), StalenessError> {
  match path.parent() {
    Some(parent) if !parent.as_os_str().is_empty() => {
      std::fs::create_dir_all(parent).map_err(|source| StalenessError::CreateDir {
        path: parent.to_path_buf(),
        source,
      })
    }
    _ => Ok(()),
  }
}

/// Remove a stale artifact before it is regenerated.
///
/// Writing over an existing file keeps its original creation time, which
/// would leave it older than its source forever under
/// [`TimestampPolicy::Created`].
pub fn discard(path: &Path) -> Result<(), StalenessError> {
  match std::fs::remove_file(path) {
    Ok(()) => Ok(()),
    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
    Err(source) => Err(StalenessError::Remove {
      path: path.to_path_buf(),
      source,
    }),
  }
}

fn timestamp(path: &Path, policy: TimestampPolicy) -> Result<SystemTime, StalenessError> {
  let to_err = |source| StalenessError::Metadata {
    path: path.to_path_buf(),
    source,
  };
  let metadata = std::fs::metadata(path).map_err(to_err)?;
  match policy {
    // Not every filesystem records a birth time
    TimestampPolicy::Created => metadata.created().or_else(|_| metadata.modified()).map_err(to_err),
    TimestampPolicy::Modified => metadata.modified().map_err(to_err),
  }
}

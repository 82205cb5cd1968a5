//! Source file discovery from glob patterns.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum SourceError {
  #[error("invalid glob pattern '{pattern}': {source}")]
  InvalidPattern {
    pattern: String,
    #[source]
    source: glob::PatternError,
  },
}

/// Files under `root` matching `pattern`, sorted.
///
/// `pattern` is relative to `root`; directories are skipped and unreadable
/// entries are logged and ignored.
pub fn discover(root: &Path, pattern: &str) -> Result<Vec<PathBuf>, SourceError> {
  let escaped_root = glob::Pattern::escape(&root.to_string_lossy());
  let full_pattern = Path::new(&escaped_root).join(pattern);

  let paths = glob::glob(&full_pattern.to_string_lossy()).map_err(|source| SourceError::InvalidPattern {
    pattern: pattern.to_string(),
    source,
  })?;

  let mut files = Vec::new();
  for entry in paths {
    match entry {
      Ok(path) if path.is_file() => files.push(path),
      Ok(_) => {}
      Err(e) => warn!(error = %e, "skipping unreadable path"),
    }
  }

  files.sort();
  Ok(files)
}

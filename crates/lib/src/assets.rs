//! One-way copy of static assets into the build tree.

use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, info};

use crate::config::BuildConfig;
use crate::sources::{self, SourceError};
use crate::staleness::{self, StalenessError};
use crate::util::paths::mirror;

#[derive(Debug, Error)]
pub enum AssetError {
  #[error(transparent)]
  Source(#[from] SourceError),

  #[error(transparent)]
  Staleness(#[from] StalenessError),

  #[error("failed to copy {from} to {to}: {source}")]
  Copy {
    from: PathBuf,
    to: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// Outcome of an asset copy pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyReport {
  pub copied: Vec<PathBuf>,
  pub up_to_date: usize,
}

/// Copy every stale asset matched by the configured globs.
///
/// Files already present and up to date in the build tree are left alone;
/// files removed from the source tree are not removed from the build tree.
pub fn copy_assets(config: &BuildConfig) -> Result<CopyReport, AssetError> {
  info!("copying assets");
  let mut report = CopyReport::default();

  for pattern in &config.assets {
    for file in sources::discover(&config.source_dir, pattern)? {
      let Some(dest) = mirror(&file, &config.source_dir, &config.build_dir) else {
        continue;
      };
      staleness::ensure_parent(&dest)?;

      if !staleness::is_stale(&file, &dest, config.staleness)? {
        debug!(path = %dest.display(), "asset is up to date");
        report.up_to_date += 1;
        continue;
      }

      info!(from = %file.display(), to = %dest.display(), "copying");
      staleness::discard(&dest)?;
      std::fs::copy(&file, &dest).map_err(|source| AssetError::Copy {
        from: file.clone(),
        to: dest.clone(),
        source,
      })?;
      report.copied.push(dest);
    }
  }

  Ok(report)
}

//! Scoped change of the process working directory.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Changes the working directory and restores the previous one on drop.
///
/// The working directory is process-wide; hold the guard for as short a
/// scope as possible.
#[must_use = "the previous directory is restored when the guard is dropped"]
pub struct WorkdirGuard {
  previous: PathBuf,
}

impl WorkdirGuard {
  pub fn enter(dir: &Path) -> io::Result<Self> {
    let previous = std::env::current_dir()?;
    std::env::set_current_dir(dir)?;
    debug!(dir = %dir.display(), "entered directory");
    Ok(Self { previous })
  }
}

impl Drop for WorkdirGuard {
  fn drop(&mut self) {
    if let Err(e) = std::env::set_current_dir(&self.previous) {
      warn!(dir = %self.previous.display(), error = %e, "failed to restore working directory");
    }
  }
}

//! Discovery of the external tool binaries on `PATH`.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::platform::os::Os;

/// Application bundle path of draw.io on macOS.
const DRAWIO_MACOS_BUNDLE: &str = "/Applications/draw.io.app/Contents/MacOS";

/// Looks up tool binaries the way a shell would.
#[derive(Debug, Clone)]
pub struct ToolLocator {
  os: Os,
  path: Option<OsString>,
}

impl ToolLocator {
  /// Locator for the current host and `PATH`.
  pub fn from_env() -> Self {
    Self {
      os: Os::current(),
      path: std::env::var_os("PATH"),
    }
  }

  pub fn new(os: Os, path: Option<OsString>) -> Self {
    Self { os, path }
  }

  /// Locate a tool by its configuration name. Returns an empty string when
  /// nothing was found, which makes the first invocation fail.
  pub fn locate(&self, tool: &str) -> String {
    let found = match tool {
      "drawio" => self.drawio(),
      other => self.which(other),
    };
    debug!(tool, bin = ?found, "tool discovery");
    found.map(|p| p.to_string_lossy().into_owned()).unwrap_or_default()
  }

  fn drawio(&self) -> Option<PathBuf> {
    self
      .which("drawio")
      .or_else(|| self.which("draw.io"))
      .or_else(|| match self.os {
        Os::MacOs => find_in(Path::new(DRAWIO_MACOS_BUNDLE), "draw.io"),
        _ => None,
      })
  }

  fn which(&self, name: &str) -> Option<PathBuf> {
    let file_name = format!("{}{}", name, self.os.exe_suffix());
    let path = self.path.as_ref()?;
    std::env::split_paths(path).find_map(|dir| find_in(&dir, &file_name))
  }
}

fn find_in(dir: &Path, file_name: &str) -> Option<PathBuf> {
  let candidate = dir.join(file_name);
  is_executable(&candidate).then_some(candidate)
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
  use std::os::unix::fs::PermissionsExt;

  std::fs::metadata(path)
    .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
    .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
  path.is_file()
}

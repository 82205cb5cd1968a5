//! Host detection.
//!
//! The diagram stage has platform quirks (headless display, sandbox flag for
//! root), so the relevant facts are gathered once into a [`HostContext`] and
//! passed down instead of being detected at every call site.

pub mod os;

use os::Os;

use crate::consts::DISPLAY_ENV;

/// Facts about the host that influence how external tools are invoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostContext {
  pub os: Os,
  /// Running as the privileged (root) user.
  pub privileged: bool,
  /// Value of `DISPLAY` at startup, if any.
  pub display: Option<String>,
}

impl HostContext {
  /// Detect the current host.
  pub fn detect() -> Self {
    Self {
      os: Os::current(),
      privileged: is_elevated(),
      display: std::env::var(DISPLAY_ENV).ok().filter(|d| !d.is_empty()),
    }
  }

  /// Whether a virtual display must be provided for the diagram converter.
  pub fn needs_virtual_display(&self) -> bool {
    self.os.needs_display_server() && self.display.is_none()
  }

  /// Whether the converter must be told to run without its sandbox.
  ///
  /// Chromium-based converters refuse to start as root on Linux otherwise.
  pub fn forces_no_sandbox(&self) -> bool {
    self.os == Os::Linux && self.privileged
  }
}

/// Returns true when running with root privileges.
#[cfg(unix)]
pub fn is_elevated() -> bool {
  rustix::process::geteuid().is_root()
}

#[cfg(not(unix))]
pub fn is_elevated() -> bool {
  false
}

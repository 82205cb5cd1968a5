//! Test utilities for bookmake-lib.
//!
//! Helpers to build tool specifications and scratch source trees without
//! needing the real converters installed.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::{ToolSpec, Tools};
use crate::display::{DisplayError, ProcessTable, StopSignal};

/// A tool specification for `bin` with no arguments.
pub fn tool(name: &str, bin: &str) -> ToolSpec {
  ToolSpec {
    name: name.to_string(),
    bin: bin.to_string(),
    ..ToolSpec::default()
  }
}

/// A tool specification that runs `script` through `/bin/sh`.
#[cfg(unix)]
pub fn shell_tool(name: &str, script: &str) -> ToolSpec {
  ToolSpec {
    name: name.to_string(),
    bin: "/bin/sh".to_string(),
    args: vec!["-c".to_string(), script.to_string()],
    ..ToolSpec::default()
  }
}

/// Write an executable shell script standing in for an external tool.
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
  use std::os::unix::fs::PermissionsExt;

  let path = dir.join(name);
  std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
  let mut perms = std::fs::metadata(&path).unwrap().permissions();
  perms.set_mode(0o755);
  std::fs::set_permissions(&path, perms).unwrap();
  path
}

/// Write `content` to `root/relative`, creating parent directories.
pub fn write_file(root: &Path, relative: &str, content: &str) -> PathBuf {
  let path = root.join(relative);
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent).unwrap();
  }
  std::fs::write(&path, content).unwrap();
  path
}

/// Tools with empty binaries, for tests that never reach a converter.
pub fn missing_tools() -> Tools {
  Tools {
    drawio: tool("drawio", ""),
    pandoc: tool("pandoc", ""),
    latexmk: tool("latexmk", ""),
  }
}

/// Sleep long enough for filesystem timestamps to differ.
pub fn tick() {
  std::thread::sleep(std::time::Duration::from_millis(50));
}

/// In-memory process table. `stubborn` processes ignore termination,
/// `immortal` ones survive killing too.
#[derive(Default)]
pub struct FakeTable {
  pub running: Option<u32>,
  pub next_pid: u32,
  pub spawns: Vec<Vec<String>>,
  pub signals: Vec<(u32, StopSignal)>,
  pub stubborn: bool,
  pub immortal: bool,
  pub spawn_fails_silently: bool,
}

impl ProcessTable for FakeTable {
  fn find(&mut self, name: &str) -> Option<u32> {
    assert_eq!(name, crate::consts::XVFB_PROCESS);
    self.running
  }

  fn spawn(&mut self, program: &str, args: &[String]) -> Result<(), DisplayError> {
    let mut cmd = vec![program.to_string()];
    cmd.extend(args.iter().cloned());
    self.spawns.push(cmd);
    if !self.spawn_fails_silently {
      self.next_pid += 1;
      self.running = Some(1000 + self.next_pid);
    }
    Ok(())
  }

  fn signal(&mut self, pid: u32, signal: StopSignal) -> bool {
    self.signals.push((pid, signal));
    match signal {
      StopSignal::Terminate if !self.stubborn => self.running = None,
      StopSignal::Kill if !self.immortal => self.running = None,
      _ => {}
    }
    true
  }

  fn wait_exit(&mut self, _pid: u32, _timeout: Duration) -> bool {
    self.running.is_none()
  }
}

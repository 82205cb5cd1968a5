//! External tool execution.
//!
//! Every tool invocation goes through [`run`]: the command is executed to
//! completion inside the build directory, its output is filtered and logged,
//! and a nonzero exit code becomes a [`ToolError`].

pub mod filter;
pub mod workdir;

use std::collections::BTreeMap;
use std::path::Path;
use std::process::Command;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::ToolSpec;

pub use filter::{FilteredLines, filter_lines};
pub use workdir::WorkdirGuard;

/// Errors raised while running an external tool.
#[derive(Debug, Error)]
pub enum ToolError {
  /// The tool binary could not be discovered at startup.
  #[error("{tool} not found; install it or set tools.{tool}.bin in the configuration")]
  NotFound { tool: String },

  /// The process could not be started.
  #[error("failed to start {tool} ({bin}): {source}")]
  Spawn {
    tool: String,
    bin: String,
    #[source]
    source: std::io::Error,
  },

  /// The process ran and returned a nonzero exit code.
  #[error("{tool} failed with exit code {}", exit_code_label(.code))]
  Failed { tool: String, code: Option<i32> },
}

/// Captured result of a finished tool invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessResult {
  pub exit_code: Option<i32>,
  pub stdout: Vec<String>,
  pub stderr: Vec<String>,
}

impl ProcessResult {
  pub fn success(&self) -> bool {
    self.exit_code == Some(0)
  }
}

/// Run `spec`'s binary with `args` inside `workdir`.
///
/// `env` is added on top of the inherited environment. Output is logged
/// whether or not the tool succeeds: stdout at debug level, stderr at warning
/// level, each after the tool's suppress patterns are applied.
pub fn run(
  spec: &ToolSpec,
  args: &[String],
  workdir: &Path,
  env: &BTreeMap<String, String>,
) -> Result<ProcessResult, ToolError> {
  if spec.bin.is_empty() {
    error!(tool = %spec.name, "tool binary not found");
    return Err(ToolError::NotFound {
      tool: spec.name.clone(),
    });
  }

  debug!(tool = %spec.name, command = %display_command(&spec.bin, args), cwd = %workdir.display(), "running");

  let output = Command::new(&spec.bin)
    .args(args)
    .current_dir(workdir)
    .envs(env)
    .output()
    .map_err(|source| ToolError::Spawn {
      tool: spec.name.clone(),
      bin: spec.bin.clone(),
      source,
    })?;

  let result = ProcessResult {
    exit_code: output.status.code(),
    stdout: split_lines(&output.stdout),
    stderr: split_lines(&output.stderr),
  };

  for line in filter_lines(&result.stdout, &spec.stdout_filter) {
    debug!(tool = %spec.name, "* {}", line);
  }
  for line in filter_lines(&result.stderr, &spec.stderr_filter) {
    warn!(tool = %spec.name, "* {}", line);
  }

  if !result.success() {
    error!(tool = %spec.name, code = ?result.exit_code, "tool failed");
    return Err(ToolError::Failed {
      tool: spec.name.clone(),
      code: result.exit_code,
    });
  }

  info!(tool = %spec.name, "done");
  Ok(result)
}

fn exit_code_label(code: &Option<i32>) -> String {
  code.map_or_else(|| "none (killed by signal)".to_string(), |c| c.to_string())
}

fn split_lines(bytes: &[u8]) -> Vec<String> {
  String::from_utf8_lossy(bytes).lines().map(str::to_string).collect()
}

fn display_command(bin: &str, args: &[String]) -> String {
  std::iter::once(bin)
    .chain(args.iter().map(String::as_str))
    .collect::<Vec<_>>()
    .join(" ")
}

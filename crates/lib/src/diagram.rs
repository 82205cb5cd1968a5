//! Diagram conversion.
//!
//! Every diagram source under `source_dir` is converted into the build tree
//! by the configured converter. On headless Linux hosts the converter needs
//! an X display, which is provided by the [`DisplayService`] for the
//! duration of the stage.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::{BuildConfig, ToolSpec};
use crate::consts::{DISPLAY_ENV, NO_SANDBOX_FLAG};
use crate::display::{DisplayError, DisplayService, ProcessTable};
use crate::platform::HostContext;
use crate::process::{self, ToolError};
use crate::sources::{self, SourceError};
use crate::staleness::{self, StalenessError};
use crate::util::paths::mirror;

#[derive(Debug, Error)]
pub enum DiagramError {
  #[error(transparent)]
  Source(#[from] SourceError),

  #[error(transparent)]
  Staleness(#[from] StalenessError),

  #[error(transparent)]
  Tool(#[from] ToolError),

  #[error(transparent)]
  Display(#[from] DisplayError),
}

/// Outcome of a conversion pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionReport {
  pub converted: Vec<PathBuf>,
  pub up_to_date: usize,
}

/// Arguments for converting `source` into `dest`.
///
/// `--no-sandbox` is moved behind the positional arguments, and added when
/// the host requires it, so it appears at most once.
pub fn assemble_command(tool: &ToolSpec, source: &Path, dest: &Path, host: &HostContext) -> Vec<String> {
  let configured = tool.args.iter().any(|arg| arg == NO_SANDBOX_FLAG);

  let mut args: Vec<String> = tool.args.iter().filter(|arg| *arg != NO_SANDBOX_FLAG).cloned().collect();
  args.push("-o".to_string());
  args.push(dest.to_string_lossy().into_owned());
  args.push(source.to_string_lossy().into_owned());

  if configured || host.forces_no_sandbox() {
    args.push(NO_SANDBOX_FLAG.to_string());
  }
  args
}

/// Convert every stale diagram, or every diagram when `force` is set.
///
/// When the host has no display, a virtual one is started first and stopped
/// again afterwards if this call launched it. A conversion failure still
/// stops the display before it is returned.
pub fn convert_diagrams<T: ProcessTable>(
  config: &BuildConfig,
  host: &HostContext,
  display: &mut DisplayService<T>,
  force: bool,
) -> Result<ConversionReport, DiagramError> {
  info!(force, os = %host.os, "converting diagrams");

  let mut env = BTreeMap::new();
  let mut launched = false;
  if host.needs_virtual_display() {
    launched = display.start()?;
    env.insert(DISPLAY_ENV.to_string(), display.display().to_string());
  }

  let result = convert_all(config, host, &env, force);

  if !launched {
    return result;
  }
  match (result, display.stop()) {
    (Ok(report), Ok(())) => Ok(report),
    (Ok(_), Err(e)) => Err(e.into()),
    (Err(e), stopped) => {
      if let Err(stop_err) = stopped {
        error!(error = %stop_err, "failed to stop the virtual display after a conversion failure");
      }
      Err(e)
    }
  }
}

fn convert_all(
  config: &BuildConfig,
  host: &HostContext,
  env: &BTreeMap<String, String>,
  force: bool,
) -> Result<ConversionReport, DiagramError> {
  let tool = &config.tools.drawio;
  let mut report = ConversionReport::default();

  for pattern in &config.diagrams {
    for source in sources::discover(&config.source_dir, pattern)? {
      let Some(dest) = mirror(&tool.output_path(&source), &config.source_dir, &config.build_dir) else {
        continue;
      };

      if !force && !staleness::is_stale(&source, &dest, config.staleness)? {
        debug!(path = %dest.display(), "diagram is up to date");
        report.up_to_date += 1;
        continue;
      }

      info!(from = %source.display(), to = %dest.display(), "converting");
      staleness::ensure_parent(&dest)?;
      staleness::discard(&dest)?;
      let args = assemble_command(tool, &source, &dest, host);
      process::run(tool, &args, &config.build_dir, env)?;
      report.converted.push(dest);
    }
  }

  Ok(report)
}

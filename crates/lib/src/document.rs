//! Document conversion and typesetting.
//!
//! Thin wrappers that assemble the command lines for the document converter
//! and the typesetting engine. All of them run inside the build directory.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::info;

use crate::config::BuildConfig;
use crate::process::{self, ProcessResult, ToolError};

/// Convert the markdown file `source` into `dest`.
pub fn to_document(config: &BuildConfig, source: &Path, dest: &Path) -> Result<ProcessResult, ToolError> {
  info!(from = %source.display(), to = %dest.display(), "converting document");
  let tool = &config.tools.pandoc;
  let mut args = tool.args.clone();
  args.push("-o".to_string());
  args.push(path_arg(dest));
  args.push(path_arg(source));
  process::run(tool, &args, &config.build_dir, &BTreeMap::new())
}

/// Typeset `source`.
pub fn typeset(config: &BuildConfig, source: &Path) -> Result<ProcessResult, ToolError> {
  info!(path = %source.display(), "typesetting");
  let tool = &config.tools.latexmk;
  let mut args = tool.args.clone();
  args.push(path_arg(source));
  process::run(tool, &args, &config.build_dir, &BTreeMap::new())
}

/// Remove the intermediate files left behind by typesetting `source`.
pub fn clean(config: &BuildConfig, source: &Path) -> Result<ProcessResult, ToolError> {
  info!(path = %source.display(), "cleaning typesetting artifacts");
  let tool = &config.tools.latexmk;
  let mut args = tool.args.clone();
  args.push("-c".to_string());
  args.push(path_arg(source));
  process::run(tool, &args, &config.build_dir, &BTreeMap::new())
}

fn path_arg(path: &Path) -> String {
  path.to_string_lossy().into_owned()
}

//! Implementation of the `bookmake build` command.
//!
//! Runs the whole pipeline: assets, template, diagrams, document conversion
//! and, unless disabled, typesetting.

use std::path::Path;

use anyhow::{Context, Result};

use bookmake_lib::display::DisplayService;
use bookmake_lib::{BuildOptions, HostContext, build};

use super::{load_config, with_default_extension};
use crate::output::{format_duration, print_stat, print_success};

/// Execute the build command.
///
/// `src` defaults to a `.md` extension and `dest` defaults to `src`; the
/// rendered markdown and converted document take `dest`'s stem.
pub fn cmd_build(config_path: &Path, src: &Path, dest: Option<&Path>, keep: bool, typeset: bool) -> Result<()> {
  let config = load_config(config_path)?;
  let src = with_default_extension(src, "md");
  let dest = dest.map_or_else(|| src.clone(), Path::to_path_buf);

  let host = HostContext::detect();
  let mut display = DisplayService::system();
  let options = BuildOptions {
    typeset,
    keep_temp: keep,
  };

  let report = build(&config, &host, &mut display, &src, &dest, options).context("Build failed")?;

  println!();
  print_success("Build complete!");
  print_stat("Assets copied", &report.assets.copied.len().to_string());
  print_stat("Diagrams converted", &report.diagrams.converted.len().to_string());
  print_stat("Document", &report.document.display().to_string());
  print_stat("Duration", &format_duration(report.duration));
  Ok(())
}

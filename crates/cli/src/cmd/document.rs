//! Implementation of the `to-document`, `typeset` and `clean` commands.
//!
//! Paths are relative to the build directory, where the tools run.

use std::path::Path;

use anyhow::{Context, Result};

use bookmake_lib::document;

use super::{load_config, with_default_extension};
use crate::output::print_success;

pub fn cmd_to_document(config_path: &Path, src: &Path, dest: Option<&Path>, pdf: bool) -> Result<()> {
  let config = load_config(config_path)?;
  let src = with_default_extension(src, "md");
  let dest = match dest {
    Some(dest) => dest.to_path_buf(),
    None => src.with_extension(if pdf { "pdf" } else { "tex" }),
  };

  document::to_document(&config, &src, &dest).context("Document conversion failed")?;

  print_success(&format!("Wrote {}", config.build_dir.join(&dest).display()));
  Ok(())
}

pub fn cmd_typeset(config_path: &Path, src: &Path) -> Result<()> {
  let config = load_config(config_path)?;
  let src = with_default_extension(src, "tex");

  document::typeset(&config, &src).context("Typesetting failed")?;

  print_success(&format!("Typeset {}", src.display()));
  Ok(())
}

pub fn cmd_clean(config_path: &Path, src: &Path) -> Result<()> {
  let config = load_config(config_path)?;
  let src = with_default_extension(src, "tex");

  document::clean(&config, &src).context("Cleaning failed")?;

  print_success(&format!("Cleaned {}", src.display()));
  Ok(())
}

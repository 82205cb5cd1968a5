//! Implementation of the `bookmake render` command.

use std::path::Path;

use anyhow::{Context, Result};

use bookmake_lib::{assets, template};

use super::{load_config, with_default_extension};
use crate::output::print_success;

/// Copy assets, then render `src` into the build directory.
pub fn cmd_render(config_path: &Path, src: &Path, dest: Option<&Path>) -> Result<()> {
  let config = load_config(config_path)?;
  let src = with_default_extension(src, "md");
  let dest = dest.map_or_else(|| src.clone(), Path::to_path_buf);

  let copied = assets::copy_assets(&config).context("Failed to copy assets")?;
  let out = template::render(&config, &src, &dest).with_context(|| format!("Failed to render {}", src.display()))?;

  print_success(&format!(
    "Rendered {} ({} asset(s) copied)",
    out.display(),
    copied.copied.len()
  ));
  Ok(())
}

mod build;
mod convert;
mod document;
mod render;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use bookmake_lib::{BuildConfig, ToolLocator};

pub use build::cmd_build;
pub use convert::cmd_convert_images;
pub use document::{cmd_clean, cmd_to_document, cmd_typeset};
pub use render::cmd_render;

/// Load the configuration file, which must exist.
pub(crate) fn load_config(path: &Path) -> Result<BuildConfig> {
  if !path.is_file() {
    bail!("configuration file not found: {}", path.display());
  }
  BuildConfig::load(path, &ToolLocator::from_env())
    .with_context(|| format!("Failed to load configuration {}", path.display()))
}

/// `path`, with `extension` added when it has none.
pub(crate) fn with_default_extension(path: &Path, extension: &str) -> PathBuf {
  if path.extension().is_some() {
    path.to_path_buf()
  } else {
    path.with_extension(extension)
  }
}

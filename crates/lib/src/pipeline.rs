//! The full build: assets, template, diagrams, document, typesetting.
//!
//! Stages run strictly in order and the first failure aborts the rest.
//! Nothing produced by earlier stages is rolled back.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::info;

use crate::assets::{self, AssetError, CopyReport};
use crate::config::{BuildConfig, ConfigError};
use crate::diagram::{self, ConversionReport, DiagramError};
use crate::display::{DisplayError, DisplayService, ProcessTable};
use crate::document;
use crate::platform::HostContext;
use crate::process::ToolError;
use crate::sources::SourceError;
use crate::staleness::StalenessError;
use crate::template::{self, TemplateError};

/// Any error that can abort a build.
#[derive(Debug, Error)]
pub enum BuildError {
  #[error(transparent)]
  Config(#[from] ConfigError),

  #[error(transparent)]
  Source(#[from] SourceError),

  #[error(transparent)]
  Staleness(#[from] StalenessError),

  #[error(transparent)]
  Asset(#[from] AssetError),

  #[error(transparent)]
  Template(#[from] TemplateError),

  #[error(transparent)]
  Diagram(#[from] DiagramError),

  #[error(transparent)]
  Display(#[from] DisplayError),

  #[error(transparent)]
  Tool(#[from] ToolError),
}

/// Options for [`build`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
  /// Run the typesetting engine after document conversion.
  pub typeset: bool,
  /// Keep the typesetting engine's intermediate files.
  pub keep_temp: bool,
}

impl Default for BuildOptions {
  fn default() -> Self {
    Self {
      typeset: true,
      keep_temp: false,
    }
  }
}

/// Summary of a successful build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
  pub assets: CopyReport,
  pub diagrams: ConversionReport,
  /// Rendered markdown, inside the build directory.
  pub markdown: PathBuf,
  /// Converted document, inside the build directory.
  pub document: PathBuf,
  pub typeset: bool,
  pub duration: Duration,
}

/// Build `entry` (relative to the source directory) into `dest`.
///
/// `dest` names the outputs inside the build directory: its extension is
/// replaced by `md` for the rendered template and `tex` for the converted
/// document.
pub fn build<T: ProcessTable>(
  config: &BuildConfig,
  host: &HostContext,
  display: &mut DisplayService<T>,
  entry: &Path,
  dest: &Path,
  options: BuildOptions,
) -> Result<BuildReport, BuildError> {
  let start = Instant::now();
  let markdown = dest.with_extension("md");
  let document = dest.with_extension("tex");
  info!(entry = %entry.display(), dest = %dest.display(), typeset = options.typeset, "starting build");

  let assets = assets::copy_assets(config)?;
  template::render(config, entry, &markdown)?;
  let diagrams = diagram::convert_diagrams(config, host, display, false)?;
  document::to_document(config, &markdown, &document)?;

  if options.typeset {
    document::typeset(config, &document)?;
    if !options.keep_temp {
      document::clean(config, &document)?;
    }
  }

  let duration = start.elapsed();
  info!(?duration, "build finished");
  Ok(BuildReport {
    assets,
    diagrams,
    markdown: config.build_dir.join(&markdown),
    document: config.build_dir.join(&document),
    typeset: options.typeset,
    duration,
  })
}

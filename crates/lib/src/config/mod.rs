//! Build configuration.
//!
//! A project's `book.toml` is deep-merged over the built-in defaults, then
//! resolved once into an immutable [`BuildConfig`]: directories are made
//! absolute and tool binaries are discovered. Every stage receives the
//! resolved configuration explicitly.

mod discovery;

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::util::paths::absolutize;

pub use discovery::ToolLocator;

const DEFAULT_CONFIG: &str = include_str!("default.toml");

/// Errors that can occur while loading the configuration
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read configuration {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("invalid configuration: {0}")]
  Parse(#[from] toml::de::Error),

  #[error("tools.{0}.transform is required")]
  MissingTransform(String),
}

/// Which file timestamp decides staleness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampPolicy {
  /// File creation time, falling back to modification time where the
  /// filesystem does not record it.
  #[default]
  Created,
  Modified,
}

/// Maps a diagram source path to the path of its converted artifact.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum PathTransform {
  /// Replace the file extension, keeping the stem.
  ReplaceExtension { extension: String },
}

impl PathTransform {
  pub fn apply(&self, path: &Path) -> PathBuf {
    match self {
      PathTransform::ReplaceExtension { extension } => path.with_extension(extension),
    }
  }
}

/// A resolved external tool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolSpec {
  /// Configuration name, used in logs and errors.
  pub name: String,
  /// Binary path; empty when discovery failed.
  pub bin: String,
  pub args: Vec<String>,
  /// Substrings of stdout lines that are not worth logging.
  pub stdout_filter: Vec<String>,
  /// Substrings of stderr lines that are not worth logging.
  pub stderr_filter: Vec<String>,
  pub transform: Option<PathTransform>,
}

impl ToolSpec {
  /// Path of the artifact this tool produces from `source`.
  pub fn output_path(&self, source: &Path) -> PathBuf {
    match &self.transform {
      Some(transform) => transform.apply(source),
      None => source.to_path_buf(),
    }
  }
}

/// The external tools driven by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tools {
  /// Diagram converter.
  pub drawio: ToolSpec,
  /// Document converter.
  pub pandoc: ToolSpec,
  /// Typesetting engine.
  pub latexmk: ToolSpec,
}

/// Configuration resolved once per invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildConfig {
  pub source_dir: PathBuf,
  pub build_dir: PathBuf,
  pub staleness: TimestampPolicy,
  /// Template render context.
  pub variables: toml::Table,
  /// Globs of static files copied verbatim, relative to `source_dir`.
  pub assets: Vec<String>,
  /// Globs of diagram sources, relative to `source_dir`.
  pub diagrams: Vec<String>,
  pub tools: Tools,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
  source_dir: PathBuf,
  build_dir: PathBuf,
  #[serde(default)]
  staleness: TimestampPolicy,
  #[serde(default)]
  variables: toml::Table,
  #[serde(default)]
  preprocessor: RawPreprocessor,
  tools: RawTools,
}

#[derive(Debug, Default, Deserialize)]
struct RawPreprocessor {
  #[serde(default)]
  assets: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawTools {
  drawio: RawTool,
  pandoc: RawTool,
  latexmk: RawTool,
}

#[derive(Debug, Deserialize)]
struct RawTool {
  bin: Option<String>,
  #[serde(default)]
  args: Vec<String>,
  #[serde(default)]
  sources: Vec<String>,
  transform: Option<PathTransform>,
  #[serde(default)]
  stdout_filter: Vec<String>,
  #[serde(default)]
  stderr_filter: Vec<String>,
}

impl RawTool {
  fn resolve(self, name: &str, locator: &ToolLocator) -> ToolSpec {
    let bin = match self.bin {
      Some(bin) => bin,
      None => locator.locate(name),
    };
    ToolSpec {
      name: name.to_string(),
      bin,
      args: self.args,
      stdout_filter: self.stdout_filter,
      stderr_filter: self.stderr_filter,
      transform: self.transform,
    }
  }
}

impl BuildConfig {
  /// Load `path` over the built-in defaults.
  ///
  /// Relative directories are resolved against the directory holding the
  /// configuration file.
  pub fn load(path: &Path, locator: &ToolLocator) -> Result<Self, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    let parent = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let base_dir = dunce::canonicalize(parent).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    debug!(path = %path.display(), base = %base_dir.display(), "loading configuration");
    Self::from_toml_str(&content, &base_dir, locator)
  }

  /// Resolve a configuration from TOML text.
  pub fn from_toml_str(content: &str, base_dir: &Path, locator: &ToolLocator) -> Result<Self, ConfigError> {
    let mut merged: toml::Table = toml::from_str(DEFAULT_CONFIG)?;
    let user: toml::Table = toml::from_str(content)?;
    merge_tables(&mut merged, user);

    let raw: RawConfig = toml::Value::Table(merged).try_into()?;
    let drawio = raw.tools.drawio;
    let diagrams = drawio.sources.clone();
    if drawio.transform.is_none() {
      return Err(ConfigError::MissingTransform("drawio".to_string()));
    }

    Ok(Self {
      source_dir: absolutize(&raw.source_dir, base_dir),
      build_dir: absolutize(&raw.build_dir, base_dir),
      staleness: raw.staleness,
      variables: raw.variables,
      assets: raw.preprocessor.assets,
      diagrams,
      tools: Tools {
        drawio: drawio.resolve("drawio", locator),
        pandoc: raw.tools.pandoc.resolve("pandoc", locator),
        latexmk: raw.tools.latexmk.resolve("latexmk", locator),
      },
    })
  }
}

/// Recursively merge `overlay` into `base`. Tables are merged key by key;
/// any other value in `overlay` replaces the one in `base`.
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
  for (key, value) in overlay {
    match (base.get_mut(&key), value) {
      (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => merge_tables(existing, incoming),
      (_, value) => {
        base.insert(key, value);
      }
    }
  }
}

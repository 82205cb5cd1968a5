//! bookmake-lib: incremental document build pipeline
//!
//! Turns a tree of templated markdown sources, diagrams and static assets
//! into a typeset document by driving external tools:
//! - `assets`: one-way copy of static files into the build tree
//! - `template`: template rendering with source-relative includes
//! - `diagram`: diagram conversion, under a virtual display when headless
//! - `document`: document conversion and typesetting
//! - `pipeline`: the stages above, in order
//!
//! Every stage only regenerates artifacts that are older than their source.

pub mod assets;
pub mod config;
pub mod consts;
pub mod diagram;
pub mod display;
pub mod document;
pub mod pipeline;
pub mod platform;
pub mod process;
pub mod sources;
pub mod staleness;
pub mod template;
pub mod util;

pub use config::{BuildConfig, ToolLocator};
pub use pipeline::{BuildError, BuildOptions, BuildReport, build};
pub use platform::HostContext;

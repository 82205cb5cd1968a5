mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use bookmake_lib::consts::{APP_NAME, CONFIG_FILE};

use crate::output::print_error;

#[derive(Parser)]
#[command(name = APP_NAME)]
#[command(author, version, about = "Incremental document builder", long_about = None)]
struct Cli {
  /// Show debug output, including the output of external tools
  #[arg(long, global = true, conflicts_with = "quiet")]
  debug: bool,

  /// Only show warnings and errors
  #[arg(long, global = true)]
  quiet: bool,

  /// Configuration file
  #[arg(short, long, global = true, default_value = CONFIG_FILE)]
  config: PathBuf,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Copy assets and render a template into the build directory
  Render {
    /// Template, relative to the source directory (default extension: .md)
    src: PathBuf,
    /// Output, relative to the build directory (default: same as src)
    dest: Option<PathBuf>,
  },

  /// Convert diagrams into the build directory
  ConvertImages {
    /// Convert every diagram, even up-to-date ones
    #[arg(long)]
    force: bool,
  },

  /// Convert a markdown document with the document converter
  ToDocument {
    /// Markdown file, relative to the build directory (default extension: .md)
    src: PathBuf,
    /// Output file (default: src with a .tex extension)
    dest: Option<PathBuf>,
    /// Default the output extension to .pdf instead of .tex
    #[arg(long)]
    pdf: bool,
  },

  /// Typeset a document
  Typeset {
    /// Document, relative to the build directory (default extension: .tex)
    src: PathBuf,
  },

  /// Remove the intermediate files of a typeset document
  Clean {
    /// Document, relative to the build directory (default extension: .tex)
    src: PathBuf,
  },

  /// Run the whole pipeline
  Build {
    /// Entry template, relative to the source directory (default extension: .md)
    src: PathBuf,
    /// Output name, relative to the build directory (default: same as src)
    dest: Option<PathBuf>,
    /// Keep intermediate typesetting files
    #[arg(long)]
    keep: bool,
    /// Stop after document conversion
    #[arg(long)]
    no_typeset: bool,
  },
}

fn main() -> ExitCode {
  let cli = Cli::parse();

  let level = if cli.debug {
    "debug"
  } else if cli.quiet {
    "warn"
  } else {
    "info"
  };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let result = match cli.command {
    Commands::Render { src, dest } => cmd::cmd_render(&cli.config, &src, dest.as_deref()),
    Commands::ConvertImages { force } => cmd::cmd_convert_images(&cli.config, force),
    Commands::ToDocument { src, dest, pdf } => cmd::cmd_to_document(&cli.config, &src, dest.as_deref(), pdf),
    Commands::Typeset { src } => cmd::cmd_typeset(&cli.config, &src),
    Commands::Clean { src } => cmd::cmd_clean(&cli.config, &src),
    Commands::Build {
      src,
      dest,
      keep,
      no_typeset,
    } => cmd::cmd_build(&cli.config, &src, dest.as_deref(), keep, !no_typeset),
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      print_error(&format!("{:#}", e));
      ExitCode::FAILURE
    }
  }
}

//! Shared test helpers for CLI integration tests.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Stand-in diagram converter: writes its `-o` argument.
const DRAWIO: &str = r#"while [ $# -gt 0 ]; do
  case "$1" in
    -o) out="$2"; shift 2 ;;
    *) shift ;;
  esac
done
echo drawio >> "$BOOKMAKE_TEST_LOG"
echo pdf > "$out""#;

/// Stand-in document converter: `-o DEST SRC`.
const PANDOC: &str = r#"echo "pandoc $*" >> "$BOOKMAKE_TEST_LOG"
[ "$1" = "-o" ] || exit 9
[ -f "$3" ] || exit 9
cp "$3" "$2""#;

/// Stand-in typesetting engine.
const LATEXMK: &str = r#"echo "latexmk $*" >> "$BOOKMAKE_TEST_LOG"
for last; do :; done
[ -f "$last" ] || exit 9"#;

/// Isolated project directory with stand-in tools.
///
/// The tools log each call to `calls.log` in the project root.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  /// A project whose tools all succeed.
  pub fn new() -> Self {
    let env = Self {
      temp: TempDir::new().unwrap(),
    };
    env.write_script("bin/drawio", DRAWIO);
    env.write_script("bin/pandoc", PANDOC);
    env.write_script("bin/latexmk", LATEXMK);
    env.write_config("");
    env
  }

  pub fn root(&self) -> &Path {
    self.temp.path()
  }

  pub fn build_path(&self, relative: &str) -> PathBuf {
    self.root().join("build").join(relative)
  }

  /// Write `book.toml` with the stand-in tools plus `extra`.
  pub fn write_config(&self, extra: &str) {
    let bin = self.root().join("bin");
    let content = format!(
      r#"{extra}

[tools.drawio]
bin = "{drawio}"

[tools.pandoc]
bin = "{pandoc}"
args = []

[tools.latexmk]
bin = "{latexmk}"
args = []
"#,
      drawio = bin.join("drawio").display(),
      pandoc = bin.join("pandoc").display(),
      latexmk = bin.join("latexmk").display(),
    );
    self.write_file("book.toml", &content);
  }

  /// Write a file relative to the project root.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.root().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  /// Replace a stand-in tool.
  pub fn write_script(&self, relative_path: &str, body: &str) {
    use std::os::unix::fs::PermissionsExt;

    self.write_file(relative_path, &format!("#!/bin/sh\n{}\n", body));
    let path = self.root().join(relative_path);
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
  }

  /// Tool calls recorded so far.
  pub fn calls(&self) -> Vec<String> {
    std::fs::read_to_string(self.root().join("calls.log"))
      .unwrap_or_default()
      .lines()
      .map(str::to_string)
      .collect()
  }

  /// Get a pre-configured Command for the bookmake binary.
  ///
  /// Runs in the project root with `DISPLAY` set so no virtual display is
  /// started.
  pub fn bookmake_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("bookmake");
    cmd.current_dir(self.root());
    cmd.env("DISPLAY", ":0");
    cmd.env("BOOKMAKE_TEST_LOG", self.root().join("calls.log"));
    cmd.env_remove("RUST_LOG");
    cmd
  }
}

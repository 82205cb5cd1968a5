use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn render_copies_assets_and_renders() {
  let env = TestEnv::new();
  env.write_config("[variables]\ntitle = \"Hello\"");
  env.write_file("src/intro.md", "{{ title }}");
  env.write_file("src/logo.png", "png");

  env
    .bookmake_cmd()
    .args(["render", "intro"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Rendered"));

  assert_eq!(std::fs::read_to_string(env.build_path("intro.md")).unwrap(), "Hello");
  assert!(env.build_path("logo.png").exists());
  assert!(env.calls().is_empty());
}

#[test]
fn convert_images_honours_force() {
  let env = TestEnv::new();
  env.write_file("src/a.drawio", "<mxfile/>");
  env.write_file("src/sub/b.drawio", "<mxfile/>");

  env.bookmake_cmd().arg("convert-images").assert().success();
  env
    .bookmake_cmd()
    .arg("convert-images")
    .assert()
    .success()
    .stdout(predicate::str::contains("up to date"));
  assert_eq!(env.calls().len(), 2);

  env.bookmake_cmd().args(["convert-images", "--force"]).assert().success();
  assert_eq!(env.calls().len(), 4);
  assert!(env.build_path("sub/b.pdf").exists());
}

#[test]
fn to_document_defaults_to_tex() {
  let env = TestEnv::new();
  env.write_file("build/book.md", "# Book");

  env.bookmake_cmd().args(["to-document", "book"]).assert().success();

  assert_eq!(env.calls(), vec!["pandoc -o book.tex book.md"]);
}

#[test]
fn to_document_pdf_flag_changes_default_extension() {
  let env = TestEnv::new();
  env.write_file("build/book.md", "# Book");

  env.bookmake_cmd().args(["to-document", "book", "--pdf"]).assert().success();

  assert_eq!(env.calls(), vec!["pandoc -o book.pdf book.md"]);
  assert!(env.build_path("book.pdf").exists());
}

#[test]
fn typeset_and_clean_default_to_tex() {
  let env = TestEnv::new();
  env.write_file("build/book.tex", "\\documentclass{book}");

  env.bookmake_cmd().args(["typeset", "book"]).assert().success();
  env.bookmake_cmd().args(["clean", "book"]).assert().success();

  assert_eq!(env.calls(), vec!["latexmk book.tex", "latexmk -c book.tex"]);
}

#[test]
fn tool_noise_is_hidden_unless_debugging() {
  let env = TestEnv::new();
  env.write_file("build/book.tex", "\\documentclass{book}");
  env.write_script(
    "bin/latexmk",
    "echo \"latexmk $*\" >> \"$BOOKMAKE_TEST_LOG\"\necho 'Latexmk: all targets up-to-date'",
  );

  env
    .bookmake_cmd()
    .args(["typeset", "book"])
    .assert()
    .success()
    .stderr(predicate::str::contains("all targets up-to-date").not());

  env
    .bookmake_cmd()
    .args(["--debug", "typeset", "book"])
    .assert()
    .success()
    .stderr(predicate::str::contains("all targets up-to-date"));
}

#[test]
fn custom_config_path() {
  let env = TestEnv::new();
  std::fs::rename(env.root().join("book.toml"), env.root().join("other.toml")).unwrap();
  env.write_file("build/book.tex", "");

  env
    .bookmake_cmd()
    .args(["-c", "other.toml", "typeset", "book"])
    .assert()
    .success();
}

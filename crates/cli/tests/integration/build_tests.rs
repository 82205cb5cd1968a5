use predicates::prelude::*;

use super::common::TestEnv;

fn book(env: &TestEnv) {
  env.write_config("[variables]\ntitle = \"Hello\"");
  env.write_file(
    "src/book.md",
    "# {{ title }}\n\n{% include \"chapters/one.md\" %}\n",
  );
  env.write_file(
    "src/chapters/one.md",
    "![Flow]({{ \"img/flow.drawio\" | drawio2pdf }})\n",
  );
  env.write_file("src/chapters/img/flow.drawio", "<mxfile/>");
  env.write_file("src/chapters/img/photo.png", "png");
}

/// Diagram converter that fails unless assets and markdown are already in place.
const ORDERED_DRAWIO: &str = r#"[ -f book.md ] && [ -f chapters/img/photo.png ] || exit 9
while [ $# -gt 0 ]; do
  case "$1" in
    -o) out="$2"; shift 2 ;;
    *) shift ;;
  esac
done
echo drawio >> "$BOOKMAKE_TEST_LOG"
echo pdf > "$out""#;

#[test]
fn build_runs_every_stage_in_order() {
  let env = TestEnv::new();
  book(&env);
  env.write_script("bin/drawio", ORDERED_DRAWIO);

  env
    .bookmake_cmd()
    .args(["build", "book"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Build complete"));

  assert_eq!(
    env.calls(),
    vec![
      "drawio",
      "pandoc -o book.tex book.md",
      "latexmk book.tex",
      "latexmk -c book.tex",
    ]
  );
  assert!(env.build_path("chapters/img/photo.png").exists());
  assert!(env.build_path("chapters/img/flow.pdf").exists());

  let markdown = std::fs::read_to_string(env.build_path("book.md")).unwrap();
  assert!(markdown.contains("# Hello"));
  assert!(markdown.contains("chapters/img/flow.pdf"));
  assert!(!markdown.contains("{{"));

  let modified = |p: &str| std::fs::metadata(env.build_path(p)).unwrap().modified().unwrap();
  assert!(modified("chapters/img/photo.png") <= modified("book.md"));
  assert!(modified("book.md") <= modified("chapters/img/flow.pdf"));
}

#[test]
fn build_with_keep_skips_cleaning() {
  let env = TestEnv::new();
  book(&env);

  env.bookmake_cmd().args(["build", "book", "--keep"]).assert().success();

  assert!(!env.calls().iter().any(|c| c.contains("-c")));
}

#[test]
fn build_without_typesetting() {
  let env = TestEnv::new();
  book(&env);

  env.bookmake_cmd().args(["build", "book", "--no-typeset"]).assert().success();

  assert!(env.calls().iter().all(|c| !c.starts_with("latexmk")));
  assert!(env.build_path("book.tex").exists());
}

#[test]
fn build_into_another_name() {
  let env = TestEnv::new();
  book(&env);

  env
    .bookmake_cmd()
    .args(["build", "book.md", "final", "--no-typeset"])
    .assert()
    .success();

  assert!(env.build_path("final.md").exists());
  assert!(env.build_path("final.tex").exists());
}

#[test]
fn second_build_skips_up_to_date_artifacts() {
  let env = TestEnv::new();
  book(&env);

  env.bookmake_cmd().args(["build", "book"]).assert().success();
  env.bookmake_cmd().args(["build", "book"]).assert().success();

  let conversions = env.calls().iter().filter(|c| *c == "drawio").count();
  assert_eq!(conversions, 1);
}

#[test]
fn document_failure_stops_before_typesetting() {
  let env = TestEnv::new();
  book(&env);
  env.write_script("bin/pandoc", "echo 'pandoc: broken input' >&2\nexit 4");

  env
    .bookmake_cmd()
    .args(["build", "book"])
    .assert()
    .code(1)
    .stderr(predicate::str::contains("pandoc failed with exit code 4"))
    .stderr(predicate::str::contains("broken input"));

  assert!(env.calls().iter().all(|c| !c.starts_with("latexmk")));
}

#[test]
fn undefined_variable_fails_the_build() {
  let env = TestEnv::new();
  env.write_file("src/book.md", "{{ nowhere }}");

  env
    .bookmake_cmd()
    .args(["build", "book"])
    .assert()
    .code(1)
    .stderr(predicate::str::contains("Build failed"));

  assert!(env.calls().is_empty());
}

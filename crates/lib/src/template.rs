//! Template rendering.
//!
//! The entry template and everything it pulls in through `include`,
//! `extends` or `import` are loaded from the source tree. References are
//! relative to the directory of the template that makes them, so a chapter
//! in `chapters/` can include `sections/intro.md` next to it. Loading
//! rewrites each reference to its name relative to the source root before
//! the templates are handed to Tera.
//!
//! Templates get one extra filter, `drawio2pdf`, which maps a diagram source
//! path to the artifact the diagram stage will produce for it, relative to
//! the source root:
//!
//! ```text
//! ![Flow]({{ "img/flow.drawio" | drawio2pdf }})
//! ```

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{Captures, Regex};
use tera::{Context, Tera, Value};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{BuildConfig, PathTransform};
use crate::process::WorkdirGuard;
use crate::staleness::{self, StalenessError};
use crate::util::paths::normalize_path;

const DIAGRAM_FILTER: &str = "drawio2pdf";

/// Start of a `{{`, `{%` or `{#` span.
static SPAN_OPEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{[{%#]").expect("valid regex"));

/// `{% include ... %}`, `{% extends ... %}` and `{% import ... %}` tags.
static REFERENCE_TAG: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^\{%-?\s*(?:include|extends|import)\s").expect("valid regex"));

static RAW_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\{%-?\s*raw\s*-?%\}$").expect("valid regex"));
static ENDRAW_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{%-?\s*endraw\s*-?%\}").expect("valid regex"));

static STRING_LITERAL: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r#""([^"]*)"|'([^']*)'|`([^`]*)`"#).expect("valid regex"));

/// `| drawio2pdf`, optionally followed by an argument list.
static DIAGRAM_FILTER_CALL: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\|\s*drawio2pdf\b(\s*\()?(\s*\))?").expect("valid regex"));

#[derive(Debug, Error)]
pub enum TemplateError {
  #[error("failed to enter source directory {path}: {source}")]
  SourceDir {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("template {name} not found{}", referenced_by(.parent))]
  NotFound {
    name: String,
    parent: Option<String>,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse templates")]
  Parse(#[source] tera::Error),

  #[error("failed to render {name}")]
  Render {
    name: String,
    #[source]
    source: tera::Error,
  },

  #[error("invalid template variables")]
  Context(#[source] tera::Error),

  #[error(transparent)]
  Staleness(#[from] StalenessError),

  #[error("failed to write {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

fn referenced_by(parent: &Option<String>) -> String {
  parent.as_ref().map(|p| format!(" (referenced by {})", p)).unwrap_or_default()
}

/// Render `entry` (relative to the source directory) into
/// `build_dir/output`. Returns the written path.
pub fn render(config: &BuildConfig, entry: &Path, output: &Path) -> Result<PathBuf, TemplateError> {
  let entry_name = template_name(entry, &config.source_dir);
  info!(template = %entry_name, "rendering");

  let rendered = {
    let _cwd = WorkdirGuard::enter(&config.source_dir).map_err(|source| TemplateError::SourceDir {
      path: config.source_dir.clone(),
      source,
    })?;
    render_in_cwd(config, &entry_name)?
  };

  let dest = config.build_dir.join(output);
  staleness::ensure_parent(&dest)?;
  info!(path = %dest.display(), "writing");
  std::fs::write(&dest, rendered).map_err(|source| TemplateError::Write {
    path: dest.clone(),
    source,
  })?;
  Ok(dest)
}

fn render_in_cwd(config: &BuildConfig, entry_name: &str) -> Result<String, TemplateError> {
  let templates = load_templates(entry_name)?;

  let mut tera = Tera::default();
  tera
    .add_raw_templates(templates.into_iter().collect::<Vec<_>>())
    .map_err(TemplateError::Parse)?;
  tera.register_filter(
    DIAGRAM_FILTER,
    DiagramFilter {
      transform: config.tools.drawio.transform.clone(),
    },
  );

  let context = Context::from_serialize(&config.variables).map_err(TemplateError::Context)?;
  tera.render(entry_name, &context).map_err(|source| TemplateError::Render {
    name: entry_name.to_string(),
    source,
  })
}

/// Read the entry template and, transitively, every template it references.
///
/// Names are relative to the current directory.
fn load_templates(entry_name: &str) -> Result<BTreeMap<String, String>, TemplateError> {
  let mut loaded = BTreeMap::new();
  let mut queue = VecDeque::from([(Reference::required(entry_name), None::<String>)]);

  while let Some((reference, parent)) = queue.pop_front() {
    let Reference { name, optional } = reference;
    if loaded.contains_key(&name) {
      continue;
    }
    let raw = match std::fs::read_to_string(&name) {
      Ok(raw) => raw,
      Err(e) if optional && e.kind() == std::io::ErrorKind::NotFound => {
        debug!(template = %name, "optional template missing");
        continue;
      }
      Err(source) => {
        return Err(TemplateError::NotFound {
          name,
          parent,
          source,
        });
      }
    };

    let (text, references) = resolve_references(&name, &raw);
    debug!(template = %name, references = references.len(), "loaded template");
    for reference in references {
      queue.push_back((reference, Some(name.clone())));
    }
    loaded.insert(name, text);
  }

  Ok(loaded)
}

/// A template named by an `include`, `extends` or `import` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Reference {
  name: String,
  /// Set by `ignore missing`.
  optional: bool,
}

impl Reference {
  fn required(name: &str) -> Self {
    Self {
      name: name.to_string(),
      optional: false,
    }
  }
}

/// Rewrite template references and filter calls in `source` for a template
/// named `name`. Returns the rewritten text and the referenced templates.
///
/// Only `{% ... %}` tags and `{{ ... }}` expressions are rewritten. Plain
/// text, `{# ... #}` comments and `{% raw %}` blocks pass through untouched.
fn resolve_references(name: &str, source: &str) -> (String, Vec<Reference>) {
  let base = template_dir(name);
  let mut text = String::with_capacity(source.len());
  let mut references = Vec::new();
  let mut rest = source;

  while let Some(open) = SPAN_OPEN.find(rest) {
    text.push_str(&rest[..open.start()]);
    let span = &rest[open.start()..];
    let (end, is_code) = match open.as_str() {
      "{#" => (span.find("#}").map_or(span.len(), |i| i + 2), false),
      "{{" => (span_end(span, "}}"), true),
      _ => {
        let end = span_end(span, "%}");
        if RAW_TAG.is_match(&span[..end]) {
          let raw_end = ENDRAW_TAG.find(&span[end..]).map_or(span.len(), |m| end + m.end());
          (raw_end, false)
        } else {
          (end, true)
        }
      }
    };

    let (chunk, tail) = span.split_at(end);
    if is_code {
      text.push_str(&rewrite_span(name, &base, chunk, &mut references));
    } else {
      text.push_str(chunk);
    }
    rest = tail;
  }
  text.push_str(rest);

  (text, references)
}

/// Byte offset just past the `close` delimiter ending `span`, skipping string
/// literals. An unterminated span runs to the end of the text and is left for
/// Tera to reject.
fn span_end(span: &str, close: &str) -> usize {
  let mut quote = None;
  for (i, c) in span.char_indices().skip(2) {
    match quote {
      Some(q) if c == q => quote = None,
      Some(_) => {}
      None if matches!(c, '"' | '\'' | '`') => quote = Some(c),
      None if span[i..].starts_with(close) => return i + close.len(),
      None => {}
    }
  }
  span.len()
}

/// Rewrite one tag or expression.
fn rewrite_span(name: &str, base: &str, span: &str, references: &mut Vec<Reference>) -> String {
  let span = if REFERENCE_TAG.is_match(span) {
    let optional = span.contains("ignore missing");
    STRING_LITERAL
      .replace_all(span, |lit: &Captures| {
        let (quote, reference) = match (lit.get(1), lit.get(2), lit.get(3)) {
          (Some(m), _, _) => ('"', m.as_str()),
          (_, Some(m), _) => ('\'', m.as_str()),
          (_, _, Some(m)) => ('`', m.as_str()),
          _ => return lit[0].to_string(),
        };
        let resolved = join_template(name, reference);
        references.push(Reference {
          name: resolved.clone(),
          optional,
        });
        format!("{quote}{resolved}{quote}")
      })
      .into_owned()
  } else {
    span.to_string()
  };

  let base_arg = format!("base={}", tera_string(base));
  let rewrite_filter = |code: &str| {
    DIAGRAM_FILTER_CALL
      .replace_all(code, |call: &Captures| match (call.get(1), call.get(2)) {
        (Some(_), Some(_)) => format!("| {DIAGRAM_FILTER}({base_arg})"),
        (Some(_), None) => format!("| {DIAGRAM_FILTER}({base_arg}, "),
        // A closing paren without an opening one belongs to the enclosing expression
        (None, close) => format!("| {DIAGRAM_FILTER}({base_arg}){}", close.map_or("", |m| m.as_str())),
      })
      .into_owned()
  };

  let mut rewritten = String::with_capacity(span.len());
  let mut last = 0;
  for lit in STRING_LITERAL.find_iter(&span) {
    rewritten.push_str(&rewrite_filter(&span[last..lit.start()]));
    rewritten.push_str(lit.as_str());
    last = lit.end();
  }
  rewritten.push_str(&rewrite_filter(&span[last..]));
  rewritten
}

/// Quote `s` as a Tera string literal. Tera literals have no escapes, so the
/// delimiter is chosen among the three it accepts.
fn tera_string(s: &str) -> String {
  let quote = ['"', '\'', '`'].into_iter().find(|q| !s.contains(*q)).unwrap_or('"');
  format!("{quote}{s}{quote}")
}

/// Name of `reference` as seen from the template `parent`.
fn join_template(parent: &str, reference: &str) -> String {
  if let Some(rooted) = reference.strip_prefix('/') {
    return to_template_name(&normalize_path(Path::new(rooted)));
  }
  to_template_name(&normalize_path(&Path::new(&template_dir(parent)).join(reference)))
}

fn template_dir(name: &str) -> String {
  Path::new(name)
    .parent()
    .map(to_template_name)
    .unwrap_or_default()
}

/// Name of the entry template relative to the source directory.
fn template_name(entry: &Path, source_dir: &Path) -> String {
  let relative = entry.strip_prefix(source_dir).unwrap_or(entry);
  to_template_name(&normalize_path(relative))
}

fn to_template_name(path: &Path) -> String {
  path
    .components()
    .map(|c| c.as_os_str().to_string_lossy())
    .collect::<Vec<_>>()
    .join("/")
}

/// The `drawio2pdf` filter.
struct DiagramFilter {
  transform: Option<PathTransform>,
}

impl tera::Filter for DiagramFilter {
  fn filter(&self, value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let source = value
      .as_str()
      .ok_or_else(|| tera::Error::msg(format!("{DIAGRAM_FILTER} expects a path string, got {value}")))?;
    let base = args.get("base").and_then(Value::as_str).unwrap_or("");

    let path = Path::new(source);
    let converted = match &self.transform {
      Some(transform) => transform.apply(path),
      None => path.to_path_buf(),
    };
    Ok(Value::String(to_template_name(&Path::new(base).join(converted))))
  }
}

//! Noise filtering for captured tool output.

use std::collections::HashSet;

/// Lazily filter captured output lines.
///
/// Empty lines, lines already yielded by this iterator and lines containing
/// any of the `suppress` patterns are dropped. Order is preserved.
pub fn filter_lines<'a, I, S>(lines: I, suppress: &'a [S]) -> FilteredLines<'a, I::IntoIter, S>
where
  I: IntoIterator,
  I::Item: AsRef<str>,
  S: AsRef<str>,
{
  FilteredLines {
    lines: lines.into_iter(),
    suppress,
    seen: HashSet::new(),
  }
}

/// Iterator returned by [`filter_lines`].
pub struct FilteredLines<'a, I, S> {
  lines: I,
  suppress: &'a [S],
  seen: HashSet<String>,
}

impl<I, S> Iterator for FilteredLines<'_, I, S>
where
  I: Iterator,
  I::Item: AsRef<str>,
  S: AsRef<str>,
{
  type Item = String;

  fn next(&mut self) -> Option<String> {
    for line in self.lines.by_ref() {
      let line = line.as_ref();
      if line.is_empty() || self.seen.contains(line) {
        continue;
      }
      if self.suppress.iter().any(|p| line.contains(p.as_ref())) {
        continue;
      }
      self.seen.insert(line.to_string());
      return Some(line.to_string());
    }
    None
  }
}

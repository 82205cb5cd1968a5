//! Path helpers shared by the stages.

use std::path::{Component, Path, PathBuf};

/// Normalize a path by resolving `.` and `..` components without requiring the path to exist
pub fn normalize_path(path: &Path) -> PathBuf {
  let mut components = Vec::new();

  for component in path.components() {
    match component {
      Component::ParentDir => {
        // Pop the last normal component; keep leading `..` of relative paths
        match components.last() {
          Some(Component::Normal(_)) => {
            components.pop();
          }
          Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
          _ => components.push(component),
        }
      }
      Component::CurDir => {}
      other => components.push(other),
    }
  }

  components.iter().collect()
}

/// Map `file` under `from_root` to the same relative location under `to_root`.
///
/// Returns `None` when `file` does not live under `from_root`.
pub fn mirror(file: &Path, from_root: &Path, to_root: &Path) -> Option<PathBuf> {
  file.strip_prefix(from_root).ok().map(|rel| to_root.join(rel))
}

/// Resolve `path` against `base` unless it is already absolute.
pub fn absolutize(path: &Path, base: &Path) -> PathBuf {
  if path.is_absolute() {
    normalize_path(path)
  } else {
    normalize_path(&base.join(path))
  }
}

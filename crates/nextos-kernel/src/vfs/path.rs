/*!
Slash-separated absolute paths as stored in node records.

Stored paths are canonical: they start with `/`, have no empty, `.` or `..`
segments and no trailing slash (except the root itself).
*/

use crate::types::{KernelError, KernelResult};

pub const ROOT: &str = "/";

/// Last segment of a path, or the whole path when it has none (the root).
pub fn name_of(path: &str) -> &str {
  path
    .split('/')
    .filter(|s| !s.is_empty())
    .next_back()
    .unwrap_or(path)
}

/// Path of the containing directory. `None` for the root.
pub fn parent_of(path: &str) -> Option<&str> {
  if path == ROOT {
    return None;
  }
  let trimmed = path.trim_end_matches('/');
  match trimmed.rfind('/') {
    Some(0) => Some(ROOT),
    Some(i) => trimmed.get(..i),
    None => None,
  }
}

/// Append a segment to a directory path.
pub fn join(dir: &str, name: &str) -> String {
  if dir == ROOT {
    format!("/{name}")
  } else {
    format!("{dir}/{name}")
  }
}

/// Check that a path is canonical.
pub fn validate(path: &str) -> KernelResult<()> {
  if path == ROOT {
    return Ok(());
  }
  let Some(rest) = path.strip_prefix('/') else {
    return Err(KernelError::invalid_path(path));
  };
  let canonical = rest
    .split('/')
    .all(|seg| !seg.is_empty() && seg != "." && seg != "..");
  if canonical {
    Ok(())
  } else {
    Err(KernelError::invalid_path(path))
  }
}

/// Resolve `input` against the directory `cwd` into a canonical path.
///
/// Absolute inputs ignore `cwd`. `.` segments are dropped and `..` pops a
/// segment (never above the root).
pub fn resolve(cwd: &str, input: &str) -> String {
  let mut segments: Vec<&str> = if input.starts_with('/') {
    Vec::new()
  } else {
    cwd.split('/').filter(|s| !s.is_empty()).collect()
  };

  for seg in input.split('/') {
    match seg {
      "" | "." => {}
      ".." => {
        segments.pop();
      }
      other => segments.push(other),
    }
  }

  if segments.is_empty() {
    ROOT.to_string()
  } else {
    format!("/{}", segments.join("/"))
  }
}

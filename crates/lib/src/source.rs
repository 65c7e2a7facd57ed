//! Discovery of Go entry-point directories.

use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::util::glob;

/// Directories under `root` holding a `package main`, in sorted order.
///
/// Hidden, `_`-prefixed and `testdata` directories are skipped, as are
/// directories whose name matches one of `excludes`.
pub fn find_main_dirs<S: AsRef<str>>(root: &Path, excludes: &[S]) -> io::Result<Vec<PathBuf>> {
  let mut found = BTreeSet::new();
  let walker = WalkDir::new(root)
    .sort_by_file_name()
    .into_iter()
    .filter_entry(|entry| entry.depth() == 0 || !is_skipped(entry, excludes));

  for entry in walker {
    let entry = entry?;
    if !entry.file_type().is_file() || !is_source_file(entry.path()) {
      continue;
    }
    let Some(dir) = entry.path().parent() else {
      continue;
    };
    if found.contains(dir) {
      continue;
    }
    let bytes = match std::fs::read(entry.path()) {
      Ok(bytes) => bytes,
      Err(e) => {
        debug!(path = %entry.path().display(), error = %e, "skipping unreadable source file");
        continue;
      }
    };
    if declares_main(&String::from_utf8_lossy(&bytes)) {
      debug!(dir = %dir.display(), "found entry point");
      found.insert(dir.to_path_buf());
    }
  }
  Ok(found.into_iter().collect())
}

fn is_skipped<S: AsRef<str>>(entry: &DirEntry, excludes: &[S]) -> bool {
  if !entry.file_type().is_dir() {
    return false;
  }
  let name = entry.file_name().to_string_lossy();
  name.starts_with('.') || name.starts_with('_') || name == "testdata" || glob::matches_any(excludes, &name)
}

fn is_source_file(path: &Path) -> bool {
  let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
    return false;
  };
  name.ends_with(".go") && !name.ends_with("_test.go") && !name.starts_with('.') && !name.starts_with('_')
}

/// True if the package clause of a Go source file names `main`.
pub fn declares_main(source: &str) -> bool {
  let mut in_block_comment = false;
  for line in source.lines() {
    let mut line = line.trim();
    if in_block_comment {
      match line.find("*/") {
        Some(end) => {
          in_block_comment = false;
          line = line[end + 2..].trim();
        }
        None => continue,
      }
    }
    if line.starts_with("/*") {
      match line.find("*/") {
        Some(end) => line = line[end + 2..].trim(),
        None => {
          in_block_comment = true;
          continue;
        }
      }
    }
    if line.is_empty() || line.starts_with("//") {
      continue;
    }
    let mut tokens = line.split_whitespace();
    return tokens.next() == Some("package") && tokens.next().map(|t| t.trim_end_matches(';')) == Some("main");
  }
  false
}

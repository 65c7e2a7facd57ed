//! Copying of resource files (README, LICENSE, ...) next to the binaries.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::{COPY_RESOURCES, Task, TaskError, TaskParams};
use crate::util::glob;

pub fn task() -> Task {
  Task::new(
    COPY_RESOURCES,
    "Copy resources into each platform's output directory.",
    run,
  )
}

/// Regular files directly in `dir` whose name matches `include` and not `exclude`.
pub fn find_resources(dir: &Path, include: &str, exclude: &str) -> std::io::Result<Vec<PathBuf>> {
  let include = glob::parse_list(include);
  let exclude = glob::parse_list(exclude);

  let mut found = Vec::new();
  for entry in std::fs::read_dir(dir)? {
    let entry = entry?;
    if !entry.file_type()?.is_file() {
      continue;
    }
    let name = entry.file_name().to_string_lossy().into_owned();
    if glob::matches_any(&include, &name) && !glob::matches_any(&exclude, &name) {
      found.push(entry.path());
    }
  }
  found.sort();
  Ok(found)
}

pub fn run(params: &TaskParams) -> Result<(), TaskError> {
  let resources = find_resources(
    &params.working_dir,
    &params.settings.resources_include,
    &params.settings.resources_exclude,
  )?;
  if resources.is_empty() {
    debug!("no resources to copy");
    return Ok(());
  }

  for &platform in &params.platforms {
    let dir = params.platform_dir(platform);
    std::fs::create_dir_all(&dir)?;
    for resource in &resources {
      if let Some(name) = resource.file_name() {
        std::fs::copy(resource, dir.join(name))?;
      }
    }
    info!(platform = %platform, count = resources.len(), "copied resources");
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::platform::{Platform, arch::Arch, os::Os};
  use crate::settings::{RESOURCES_EXCLUDE_DEFAULT, RESOURCES_INCLUDE_DEFAULT};
  use crate::util::testutil::{settings_with, task_params};
  use serde_json::json;
  use tempfile::TempDir;

  fn populate(dir: &Path) {
    for name in ["README.md", "LICENSE", "INSTALL.txt", "main.go", "notes.txt", "README.go"] {
      std::fs::write(dir.join(name), name).unwrap();
    }
    std::fs::create_dir(dir.join("README.d")).unwrap();
  }

  #[test]
  fn default_patterns_select_docs() {
    let temp = TempDir::new().unwrap();
    populate(temp.path());

    let found = find_resources(temp.path(), RESOURCES_INCLUDE_DEFAULT, RESOURCES_EXCLUDE_DEFAULT).unwrap();

    let names: Vec<_> = found
      .iter()
      .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
      .collect();
    assert_eq!(names, vec!["INSTALL.txt", "LICENSE", "README.md"]);
  }

  #[test]
  fn resources_are_copied_per_platform() {
    let temp = TempDir::new().unwrap();
    populate(temp.path());
    let linux = Platform::new(Os::Linux, Arch::Amd64);
    let windows = Platform::new(Os::Windows, Arch::X86);
    let mut settings = settings_with("1.0", json!({}));
    settings.fill_defaults();
    let params = task_params(temp.path(), vec![linux, windows], settings);

    run(&params).unwrap();

    for platform in [linux, windows] {
      let dir = params.platform_dir(platform);
      assert_eq!(std::fs::read_to_string(dir.join("LICENSE")).unwrap(), "LICENSE");
      assert!(!dir.join("main.go").exists());
    }
  }
}

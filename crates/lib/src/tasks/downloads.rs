//! Markdown page linking every artifact of the current version.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{DOWNLOADS_PAGE, Task, TaskError, TaskParams};
use crate::settings::{TaskOptions, options_map};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadsOptions {
  /// Page file name, written to `<outputRoot>/<version>`.
  pub filename: String,
  #[serde(flatten)]
  pub extra: TaskOptions,
}

impl Default for DownloadsOptions {
  fn default() -> Self {
    Self {
      filename: "downloads.md".to_string(),
      extra: TaskOptions::new(),
    }
  }
}

pub fn task() -> Task {
  Task::new(DOWNLOADS_PAGE, "Generate a downloads page.", run).with_defaults(options_map::<DownloadsOptions>())
}

fn visible_entries(dir: &Path) -> std::io::Result<Vec<(String, bool)>> {
  let mut entries = Vec::new();
  for entry in std::fs::read_dir(dir)? {
    let entry = entry?;
    let name = entry.file_name().to_string_lossy().into_owned();
    if !name.starts_with('.') {
      entries.push((name, entry.file_type()?.is_dir()));
    }
  }
  entries.sort();
  Ok(entries)
}

/// Render the page for `version_dir`, leaving out `page_name` itself.
pub fn render(app_name: &str, version: &str, version_dir: &Path, page_name: &str) -> std::io::Result<String> {
  let mut page = format!("{} downloads ({})\n------------\n\n", app_name, version);

  let entries = visible_entries(version_dir)?;
  for (name, _) in entries.iter().filter(|(name, is_dir)| !is_dir && name != page_name) {
    page.push_str(&format!(" * [{}]({})\n", name, name));
  }

  for (dir, _) in entries.iter().filter(|(_, is_dir)| *is_dir) {
    page.push_str(&format!("\n### {}\n\n", dir));
    for (name, is_dir) in visible_entries(&version_dir.join(dir))? {
      if !is_dir {
        page.push_str(&format!(" * [{}]({}/{})\n", name, dir, name));
      }
    }
  }
  Ok(page)
}

pub fn run(params: &TaskParams) -> Result<(), TaskError> {
  let options: DownloadsOptions = params.settings.task_options(DOWNLOADS_PAGE)?;
  let version_dir = params.version_dir();
  std::fs::create_dir_all(&version_dir)?;

  let page = render(&params.app_name, &params.version(), &version_dir, &options.filename)?;
  let path = version_dir.join(&options.filename);
  std::fs::write(&path, page)?;
  info!(page = %path.display(), "wrote downloads page");
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::testutil::{settings_with, task_params};
  use serde_json::json;
  use tempfile::TempDir;

  #[test]
  fn page_links_archives_and_platform_files() {
    let temp = TempDir::new().unwrap();
    let params = task_params(temp.path(), vec![], settings_with("1.0", json!({})));
    let version_dir = params.version_dir();
    std::fs::create_dir_all(version_dir.join("linux_amd64")).unwrap();
    std::fs::create_dir_all(version_dir.join(".xcpack-temp")).unwrap();
    std::fs::write(version_dir.join("app_1.0_amd64.deb"), b"deb").unwrap();
    std::fs::write(version_dir.join("linux_amd64/app"), b"bin").unwrap();

    run(&params).unwrap();

    let page = std::fs::read_to_string(version_dir.join("downloads.md")).unwrap();
    assert!(page.starts_with("app downloads (1.0)\n"));
    assert!(page.contains(" * [app_1.0_amd64.deb](app_1.0_amd64.deb)\n"));
    assert!(page.contains("### linux_amd64\n"));
    assert!(page.contains(" * [app](linux_amd64/app)\n"));
    assert!(!page.contains("xcpack-temp"));
    assert!(!page.contains("[downloads.md]"));
  }

  #[test]
  fn render_lays_out_header_files_then_sections() {
    let temp = TempDir::new().unwrap();
    std::fs::create_dir_all(temp.path().join("darwin_arm64")).unwrap();
    std::fs::write(temp.path().join("darwin_arm64/tool"), b"bin").unwrap();
    std::fs::write(temp.path().join("tool_1.0_darwin_arm64.zip"), b"zip").unwrap();
    std::fs::write(temp.path().join("downloads.md"), b"old").unwrap();

    let page = render("tool", "1.0", temp.path(), "downloads.md").unwrap();

    assert_eq!(
      page,
      concat!(
        "tool downloads (1.0)\n",
        "------------\n\n",
        " * [tool_1.0_darwin_arm64.zip](tool_1.0_darwin_arm64.zip)\n",
        "\n### darwin_arm64\n\n",
        " * [tool](darwin_arm64/tool)\n",
      )
    );
  }

  #[test]
  fn page_name_is_configurable() {
    let temp = TempDir::new().unwrap();
    let params = task_params(
      temp.path(),
      vec![],
      settings_with("2.0", json!({ "downloads-page": { "filename": "index.md" } })),
    );

    run(&params).unwrap();

    assert!(params.version_dir().join("index.md").is_file());
  }
}

//! Per-platform distribution archives: `.tar.gz` for linux, `.zip` elsewhere.

use std::path::PathBuf;

use tracing::{debug, info};

use super::{ARCHIVE_TAR_GZ, ARCHIVE_ZIP, Task, TaskError, TaskParams};
use crate::archive::{self, ArchiveError, ArchiveItem};
use crate::platform::Platform;
use crate::platform::os::Os;

/// Archive base name, also the top-level directory inside the archive.
pub fn archive_stem(params: &TaskParams, platform: Platform) -> String {
  format!("{}_{}_{}", params.app_name, params.version(), platform.dir_name())
}

pub fn zip_task() -> Task {
  Task::new(
    ARCHIVE_ZIP,
    "Create a zip archive of each non-linux platform's output directory.",
    |params| {
      run(params, "zip", |platform| platform.os != Os::Linux, archive::write_zip)
    },
  )
}

pub fn tar_gz_task() -> Task {
  Task::new(
    ARCHIVE_TAR_GZ,
    "Create a tar.gz archive of each linux platform's output directory.",
    |params| {
      run(params, "tar.gz", |platform| platform.os == Os::Linux, archive::write_tar_gz)
    },
  )
}

/// Files of the platform directory, placed under the archive's top-level directory.
fn platform_items(params: &TaskParams, platform: Platform) -> std::io::Result<Vec<ArchiveItem>> {
  let dir = params.platform_dir(platform);
  let stem = archive_stem(params, platform);
  let mut items = Vec::new();
  for entry in std::fs::read_dir(&dir)? {
    let entry = entry?;
    if entry.file_type()?.is_file() {
      let name = entry.file_name().to_string_lossy().into_owned();
      items.push(ArchiveItem::new(entry.path(), format!("{}/{}", stem, name)));
    }
  }
  items.sort_by(|a, b| a.archive_path.cmp(&b.archive_path));
  Ok(items)
}

fn run(
  params: &TaskParams,
  extension: &str,
  applies: impl Fn(Platform) -> bool,
  write: impl Fn(&std::path::Path, &[ArchiveItem]) -> Result<(), ArchiveError>,
) -> Result<(), TaskError> {
  for &platform in params.platforms.iter().filter(|p| applies(**p)) {
    if !params.platform_dir(platform).is_dir() {
      debug!(platform = %platform, "no output directory, skipping archive");
      continue;
    }
    let items = platform_items(params, platform)?;
    let path: PathBuf = params
      .version_dir()
      .join(format!("{}.{}", archive_stem(params, platform), extension));
    write(&path, &items)?;
    info!(platform = %platform, archive = %path.display(), files = items.len(), "created archive");
  }
  Ok(())
}

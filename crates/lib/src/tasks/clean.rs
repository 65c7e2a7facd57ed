//! Removal of build outputs.

use std::io::ErrorKind;

use tracing::{debug, info};

use super::{CLEAN_DESTINATION, REMOVE_BIN, Task, TaskError, TaskParams};

pub fn clean_destination_task() -> Task {
  Task::new(
    CLEAN_DESTINATION,
    "Delete the output directory for this version of the artifact.",
    clean_destination,
  )
}

pub fn remove_bin_task() -> Task {
  Task::new(
    REMOVE_BIN,
    "Delete binaries. Normally runs after archiving to reduce the size of the output dir.",
    remove_bin,
  )
}

/// Remove `<outputRoot>/<version>`. A missing directory is not an error.
pub fn clean_destination(params: &TaskParams) -> Result<(), TaskError> {
  let dir = params.version_dir();
  match std::fs::remove_dir_all(&dir) {
    Ok(()) => {
      info!(dir = %dir.display(), "removed output directory");
      Ok(())
    }
    Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
    Err(e) => Err(e.into()),
  }
}

/// Remove every built binary, then each platform directory left empty.
pub fn remove_bin(params: &TaskParams) -> Result<(), TaskError> {
  for &platform in &params.platforms {
    for main_dir in &params.main_dirs {
      let bin = params.bin_path(platform, main_dir);
      match std::fs::remove_file(&bin) {
        Ok(()) => debug!(bin = %bin.display(), "removed binary"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
      }
    }

    let dir = params.platform_dir(platform);
    let is_empty = std::fs::read_dir(&dir)
      .map(|mut entries| entries.next().is_none())
      .unwrap_or(false);
    if is_empty {
      std::fs::remove_dir(&dir)?;
      debug!(dir = %dir.display(), "removed empty platform directory");
    }
  }
  Ok(())
}

//! macOS code signing. Only darwin hosts can sign, and only darwin binaries.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{CODESIGN, Task, TaskError, TaskParams};
use crate::exec;
use crate::platform::Platform;
use crate::platform::os::Os;
use crate::settings::{TaskOptions, options_map};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodesignOptions {
  /// Signing identity passed to `codesign -s`.
  pub id: String,
  #[serde(flatten)]
  pub extra: TaskOptions,
}

pub fn task() -> Task {
  Task::new(
    CODESIGN,
    "sign code for Mac. Only Mac hosts are supported for this task.",
    run,
  )
  .with_defaults(options_map::<CodesignOptions>())
}

/// Whether a binary for `target` can be signed on `host`.
pub fn can_sign(host: Option<Platform>, target: Platform) -> bool {
  target.os == Os::Darwin && host.is_some_and(|host| host.os == Os::Darwin)
}

pub fn run(params: &TaskParams) -> Result<(), TaskError> {
  let options: CodesignOptions = params.settings.task_options(CODESIGN)?;
  if options.id.is_empty() {
    debug!("no signing identity configured");
    return Ok(());
  }

  let host = Platform::current();
  for &platform in &params.platforms {
    if !can_sign(host, platform) {
      continue;
    }
    for main_dir in &params.main_dirs {
      let bin = params.bin_path(platform, main_dir);
      let args = vec!["-s".to_string(), options.id.clone(), bin.to_string_lossy().into_owned()];
      exec::run_program("codesign", &args, &params.working_dir)?;
      info!(id = %options.id, bin = %bin.display(), "signed");
    }
  }
  Ok(())
}

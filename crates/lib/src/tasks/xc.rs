//! Cross compilation of every entry point for every target platform.

use std::path::Path;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{Task, TaskError, TaskParams, XC, exe_name};
use crate::exec::{BinaryVerifier, Compiler, ExecError};
use crate::platform::Platform;
use crate::platform::arch::Arch;
use crate::platform::os::Os;
use crate::settings::{TaskOptions, options_map};
use crate::toolchain::{self, ToolchainValidator};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct XcOptions {
  /// ARM sub-variant for linux/arm targets; empty leaves the toolchain default.
  #[serde(rename = "GOARM")]
  pub goarm: String,
  pub validate_toolchain: bool,
  pub verify_exe: bool,
  pub auto_rebuild_toolchain: bool,
  #[serde(flatten)]
  pub extra: TaskOptions,
}

impl Default for XcOptions {
  fn default() -> Self {
    Self {
      goarm: String::new(),
      validate_toolchain: true,
      verify_exe: true,
      auto_rebuild_toolchain: true,
      extra: TaskOptions::new(),
    }
  }
}

pub fn task(compiler: Rc<dyn Compiler>, verifier: Rc<dyn BinaryVerifier>) -> Task {
  Task::new(
    XC,
    "Cross compile. Builds executables for other platforms.",
    move |params| run(params, compiler.as_ref(), verifier.as_ref()),
  )
  .with_defaults(options_map::<XcOptions>())
}

/// `GOOS`/`GOARCH` overrides for `platform`, plus `GOARM` for linux/arm when set.
pub fn target_env(platform: Platform, goarm: &str) -> Vec<(String, String)> {
  let mut env = platform.env();
  if platform.os == Os::Linux && platform.arch == Arch::Arm && !goarm.is_empty() {
    env.push(("GOARM".to_string(), goarm.to_string()));
  }
  env
}

pub fn run(params: &TaskParams, compiler: &dyn Compiler, verifier: &dyn BinaryVerifier) -> Result<(), TaskError> {
  if params.platforms.is_empty() {
    return Err(TaskError::NoPlatforms);
  }
  let options: XcOptions = params.settings.task_options(XC)?;
  info!(main_dirs = ?params.main_dirs, platforms = params.platforms.len(), "cross compiling");

  let mut built = 0;
  for &platform in &params.platforms {
    if options.validate_toolchain {
      validate_toolchain(params, platform, &options, compiler)?;
    }

    for main_dir in &params.main_dirs {
      let bin = params.bin_path(platform, main_dir);
      std::fs::create_dir_all(params.platform_dir(platform))?;
      build(params, platform, main_dir, &bin, &options, compiler).map_err(|source| TaskError::Compile {
        platform,
        entry: exe_name(main_dir),
        succeeded: built,
        source,
      })?;
      built += 1;

      if options.verify_exe {
        verifier.verify(&bin, platform).map_err(|source| TaskError::Verify {
          platform,
          path: bin.clone(),
          source,
        })?;
      }
    }
  }

  info!(built, "cross compile finished");
  Ok(())
}

fn validate_toolchain(
  params: &TaskParams,
  platform: Platform,
  options: &XcOptions,
  compiler: &dyn Compiler,
) -> Result<(), TaskError> {
  let Some(go_root) = toolchain::resolve_go_root(&params.settings.go_root) else {
    warn!(platform = %platform, "GOROOT unknown, skipping toolchain validation");
    return Ok(());
  };
  ToolchainValidator::new(go_root, compiler).ensure(platform, &options.goarm, options.auto_rebuild_toolchain)?;
  Ok(())
}

fn build(
  params: &TaskParams,
  platform: Platform,
  main_dir: &Path,
  bin: &Path,
  options: &XcOptions,
  compiler: &dyn Compiler,
) -> Result<(), ExecError> {
  info!(exe = %exe_name(main_dir), platform = %platform, "building");

  let args = vec!["-o".to_string(), bin.to_string_lossy().into_owned(), ".".to_string()];
  compiler.invoke(
    main_dir,
    "build",
    &args,
    &target_env(platform, &options.goarm),
    &params.settings,
  )
}

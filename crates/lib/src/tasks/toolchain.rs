//! Rebuilding the cross-compile toolchain for every target platform.

use std::rc::Rc;

use tracing::info;

use super::xc::XcOptions;
use super::{TOOLCHAIN, Task, TaskError, TaskParams, XC};
use crate::exec::Compiler;
use crate::toolchain::{self, ToolchainError, ToolchainValidator};

pub fn task(compiler: Rc<dyn Compiler>) -> Task {
  Task::new(
    TOOLCHAIN,
    "Build toolchain. Make sure to run this each time you update go source.",
    move |params| run(params, compiler.as_ref()),
  )
}

pub fn run(params: &TaskParams, compiler: &dyn Compiler) -> Result<(), TaskError> {
  if params.platforms.is_empty() {
    return Err(TaskError::NoPlatforms);
  }
  let go_root = toolchain::resolve_go_root(&params.settings.go_root).ok_or(ToolchainError::UnknownGoRoot)?;
  let xc: XcOptions = params.settings.task_options(XC)?;
  let validator = ToolchainValidator::new(go_root, compiler);

  for &platform in &params.platforms {
    info!(platform = %platform, "building toolchain");
    validator.rebuild(platform, &xc.goarm)?;
  }
  Ok(())
}

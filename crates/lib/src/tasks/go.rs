//! Thin wrappers over `go` subcommands.

use std::rc::Rc;

use tracing::info;

use super::{GO_CLEAN, GO_FMT, GO_INSTALL, GO_TEST, GO_VET, Task, TaskError, TaskParams};
use crate::exec::Compiler;

const ALL_PACKAGES: &str = "./...";

/// Run `go <subcommand> ./...` in the working directory.
fn run_all_packages(params: &TaskParams, compiler: &dyn Compiler, subcommand: &str) -> Result<(), TaskError> {
  info!(subcommand, dir = %params.working_dir.display(), "running go over all packages");
  compiler.invoke(
    &params.working_dir,
    subcommand,
    &[ALL_PACKAGES.to_string()],
    &[],
    &params.settings,
  )?;
  Ok(())
}

fn all_packages_task(name: &str, description: &str, subcommand: &'static str, compiler: Rc<dyn Compiler>) -> Task {
  Task::new(name, description, move |params| {
    run_all_packages(params, compiler.as_ref(), subcommand)
  })
}

pub fn clean_task(compiler: Rc<dyn Compiler>) -> Task {
  all_packages_task(GO_CLEAN, "runs `go clean`.", "clean", compiler)
}

pub fn vet_task(compiler: Rc<dyn Compiler>) -> Task {
  all_packages_task(GO_VET, "runs `go vet` on all packages.", "vet", compiler)
}

pub fn test_task(compiler: Rc<dyn Compiler>) -> Task {
  all_packages_task(GO_TEST, "runs `go test` on all packages.", "test", compiler)
}

pub fn fmt_task(compiler: Rc<dyn Compiler>) -> Task {
  all_packages_task(GO_FMT, "runs `go fmt` on all packages.", "fmt", compiler)
}

/// `go install` for the host platform in every entry-point directory.
pub fn install_task(compiler: Rc<dyn Compiler>) -> Task {
  Task::new(
    GO_INSTALL,
    "runs `go install` for each entry point. Installs a version consistent with the cross-compiled binaries.",
    move |params| {
      for main_dir in &params.main_dirs {
        info!(dir = %main_dir.display(), "installing");
        compiler.invoke(main_dir, "install", &[], &[], &params.settings)?;
      }
      Ok(())
    },
  )
}

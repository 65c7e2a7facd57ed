//! Tasks are named units of work run in sequence by the [`pipeline`].
//!
//! Each task has a description, a runner and a map of default options that is
//! merged into the user's settings before the pipeline starts. The built-in
//! tasks are registered explicitly by [`builtin_registry`]; collaborators such
//! as the compiler are injected there.

pub mod alias;
pub mod archive;
pub mod clean;
pub mod codesign;
pub mod downloads;
pub mod go;
pub mod pipeline;
pub mod pkg_build;
pub mod registry;
pub mod resources;
pub mod toolchain;
pub mod xc;

use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use thiserror::Error;

use crate::archive::ArchiveError;
use crate::exec::{BinaryVerifier, Compiler, ExecError, VerifyError};
use crate::paths;
use crate::platform::Platform;
use crate::settings::{Settings, SettingsError, TaskOptions};
use crate::toolchain::ToolchainError;

pub use pipeline::{Pipeline, PipelineError, PipelineReport, TaskState};
pub use registry::TaskRegistry;

pub const TOOLCHAIN: &str = "toolchain";
pub const CLEAN_DESTINATION: &str = "clean-destination";
pub const GO_CLEAN: &str = "go-clean";
pub const GO_VET: &str = "go-vet";
pub const GO_TEST: &str = "go-test";
pub const GO_FMT: &str = "go-fmt";
pub const GO_INSTALL: &str = "go-install";
pub const XC: &str = "xc";
pub const CODESIGN: &str = "codesign";
pub const COPY_RESOURCES: &str = "copy-resources";
pub const ARCHIVE_ZIP: &str = "archive-zip";
pub const ARCHIVE_TAR_GZ: &str = "archive-tar-gz";
pub const REMOVE_BIN: &str = "rmbin";
pub const DOWNLOADS_PAGE: &str = "downloads-page";
pub const PKG_BUILD: &str = "pkg-build";

/// Errors a task runner can return. Any of them stops the pipeline.
#[derive(Debug, Error)]
pub enum TaskError {
  #[error("no valid platforms specified")]
  NoPlatforms,

  #[error(transparent)]
  Settings(#[from] SettingsError),

  #[error(transparent)]
  Toolchain(#[from] ToolchainError),

  #[error("compiling {entry} for {platform} failed ({succeeded} binaries built before): {source}")]
  Compile {
    platform: Platform,
    entry: String,
    succeeded: usize,
    #[source]
    source: ExecError,
  },

  #[error("{} is not a valid {platform} binary: {source}", path.display())]
  Verify {
    platform: Platform,
    path: PathBuf,
    #[source]
    source: VerifyError,
  },

  #[error("packaging for {platform} failed: {source}")]
  Package {
    platform: Platform,
    #[source]
    source: pkg_build::PackageError,
  },

  #[error(transparent)]
  Archive(#[from] ArchiveError),

  #[error(transparent)]
  Exec(#[from] ExecError),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

/// Parameters shared by every task of one pipeline run.
#[derive(Debug, Clone)]
pub struct TaskParams {
  pub platforms: Vec<Platform>,
  /// Entry-point directories, each building to one executable.
  pub main_dirs: Vec<PathBuf>,
  pub app_name: String,
  pub working_dir: PathBuf,
  pub out_dest_root: PathBuf,
  pub settings: Settings,
}

impl TaskParams {
  pub fn version(&self) -> String {
    self.settings.full_version_name()
  }

  /// `<outputRoot>/<version>`
  pub fn version_dir(&self) -> PathBuf {
    self.out_dest_root.join(self.version())
  }

  /// `<outputRoot>/<version>/<os>_<arch>`
  pub fn platform_dir(&self, platform: Platform) -> PathBuf {
    self.version_dir().join(platform.dir_name())
  }

  /// Absolute path of the executable built from `main_dir` for `platform`.
  pub fn bin_path(&self, platform: Platform, main_dir: &Path) -> PathBuf {
    self
      .out_dest_root
      .join(paths::relative_bin(platform, &exe_name(main_dir), &self.version()))
  }
}

/// Executable name for an entry-point directory.
pub fn exe_name(main_dir: &Path) -> String {
  main_dir
    .file_name()
    .map(|name| name.to_string_lossy().into_owned())
    .unwrap_or_else(|| "main".to_string())
}

pub type TaskRunner = Box<dyn Fn(&TaskParams) -> Result<(), TaskError>>;

/// A named unit of work with default options.
pub struct Task {
  pub name: String,
  pub description: String,
  pub defaults: TaskOptions,
  runner: TaskRunner,
}

impl Task {
  pub fn new(
    name: impl Into<String>,
    description: impl Into<String>,
    runner: impl Fn(&TaskParams) -> Result<(), TaskError> + 'static,
  ) -> Self {
    Self {
      name: name.into(),
      description: description.into(),
      defaults: TaskOptions::new(),
      runner: Box::new(runner),
    }
  }

  pub fn with_defaults(mut self, defaults: TaskOptions) -> Self {
    self.defaults = defaults;
    self
  }

  pub fn run(&self, params: &TaskParams) -> Result<(), TaskError> {
    (self.runner)(params)
  }
}

impl fmt::Debug for Task {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Task")
      .field("name", &self.name)
      .field("description", &self.description)
      .field("defaults", &self.defaults)
      .finish_non_exhaustive()
  }
}

/// Registry holding every built-in task, wired to the given collaborators.
pub fn builtin_registry(compiler: Rc<dyn Compiler>, verifier: Rc<dyn BinaryVerifier>) -> TaskRegistry {
  let mut registry = TaskRegistry::new();
  registry.register(toolchain::task(compiler.clone()));
  registry.register(clean::clean_destination_task());
  registry.register(clean::remove_bin_task());
  registry.register(go::clean_task(compiler.clone()));
  registry.register(go::vet_task(compiler.clone()));
  registry.register(go::test_task(compiler.clone()));
  registry.register(go::fmt_task(compiler.clone()));
  registry.register(go::install_task(compiler.clone()));
  registry.register(xc::task(compiler, verifier));
  registry.register(codesign::task());
  registry.register(resources::task());
  registry.register(archive::zip_task());
  registry.register(archive::tar_gz_task());
  registry.register(downloads::task());
  registry.register(pkg_build::task());
  registry
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::platform::{arch::Arch, os::Os};
  use crate::tasks::alias::Aliases;
  use crate::util::testutil::{AcceptingVerifier, RecordingCompiler};

  #[test]
  fn builtin_registry_covers_every_alias_member() {
    let registry = builtin_registry(Rc::new(RecordingCompiler::default()), Rc::new(AcceptingVerifier));
    let aliases = Aliases::builtin();
    for (alias, members) in aliases.iter() {
      for member in members {
        assert!(registry.contains(member), "alias '{}' names unregistered task '{}'", alias, member);
      }
    }
    assert_eq!(registry.len(), 15);
  }

  #[test]
  fn bin_path_follows_output_layout() {
    let params = TaskParams {
      platforms: vec![],
      main_dirs: vec![],
      app_name: "app".to_string(),
      working_dir: PathBuf::from("/src/app"),
      out_dest_root: PathBuf::from("out"),
      settings: Settings {
        package_version: "v1.0".to_string(),
        ..Default::default()
      },
    };

    assert_eq!(
      params.bin_path(Platform::new(Os::Linux, Arch::Amd64), Path::new("/src/app/cmd/tool")),
      PathBuf::from("out/v1.0/linux_amd64/tool")
    );
    assert_eq!(
      params.bin_path(Platform::new(Os::Windows, Arch::X86), Path::new("/src/app")),
      PathBuf::from("out/v1.0/windows_386/app.exe")
    );
  }
}

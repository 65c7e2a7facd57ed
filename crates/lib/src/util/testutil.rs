//! Test doubles for the process seams and helpers for fake toolchain trees.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use crate::ar::{ArMember, encode};
use crate::exec::{BinaryVerifier, Compiler, ExecError, VerifyError};
use crate::platform::Platform;
use crate::settings::Settings;
use crate::tasks::TaskParams;
use crate::toolchain::PKGDEF_MEMBER;

/// One recorded `Compiler::invoke` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
  pub dir: PathBuf,
  pub subcommand: String,
  pub args: Vec<String>,
  pub env: Vec<(String, String)>,
}

impl Invocation {
  pub fn env_var(&self, key: &str) -> Option<&str> {
    self.env.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
  }
}

/// Compiler double that records calls and writes placeholder binaries for `build -o`.
#[derive(Debug, Default)]
pub struct RecordingCompiler {
  calls: RefCell<Vec<Invocation>>,
  rebuilds: RefCell<Vec<Vec<(String, String)>>>,
  version: Option<String>,
  failing: Vec<String>,
  fail_after: Option<usize>,
  fail_toolchain_build: bool,
}

impl RecordingCompiler {
  pub fn with_version(version: &str) -> Self {
    Self {
      version: Some(version.to_string()),
      ..Default::default()
    }
  }

  /// Make every invocation of `subcommand` fail.
  pub fn failing_on(mut self, subcommand: &str) -> Self {
    self.failing.push(subcommand.to_string());
    self
  }

  /// Make `build` fail once `count` builds have succeeded.
  pub fn failing_after_builds(mut self, count: usize) -> Self {
    self.fail_after = Some(count);
    self
  }

  pub fn failing_version(mut self) -> Self {
    self.version = None;
    self
  }

  pub fn failing_toolchain_build(mut self) -> Self {
    self.fail_toolchain_build = true;
    self
  }

  pub fn calls(&self) -> Vec<Invocation> {
    self.calls.borrow().clone()
  }

  pub fn subcommands(&self) -> Vec<String> {
    self.calls.borrow().iter().map(|c| c.subcommand.clone()).collect()
  }

  pub fn rebuilds(&self) -> Vec<Vec<(String, String)>> {
    self.rebuilds.borrow().clone()
  }

  fn builds(&self) -> usize {
    self.calls.borrow().iter().filter(|c| c.subcommand == "build").count()
  }
}

fn failed() -> ExecError {
  ExecError::Failed {
    program: "go".to_string(),
    code: Some(1),
  }
}

impl Compiler for RecordingCompiler {
  fn invoke(
    &self,
    dir: &Path,
    subcommand: &str,
    args: &[String],
    env: &[(String, String)],
    _settings: &Settings,
  ) -> Result<(), ExecError> {
    if subcommand == "build" && self.fail_after.is_some_and(|limit| self.builds() >= limit) {
      return Err(failed());
    }
    self.calls.borrow_mut().push(Invocation {
      dir: dir.to_path_buf(),
      subcommand: subcommand.to_string(),
      args: args.to_vec(),
      env: env.to_vec(),
    });
    if self.failing.iter().any(|s| s == subcommand) {
      return Err(failed());
    }
    if subcommand == "build"
      && let Some(pos) = args.iter().position(|a| a == "-o")
      && let Some(out) = args.get(pos + 1)
    {
      let out = Path::new(out);
      if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ExecError::Spawn {
          program: "go".to_string(),
          source,
        })?;
      }
      std::fs::write(out, b"fake binary").map_err(|source| ExecError::Spawn {
        program: "go".to_string(),
        source,
      })?;
    }
    Ok(())
  }

  fn version(&self, _go_root: &Path) -> Result<String, ExecError> {
    self.version.clone().ok_or_else(failed)
  }

  fn build_toolchain(&self, _go_root: &Path, env: &[(String, String)]) -> Result<(), ExecError> {
    self.rebuilds.borrow_mut().push(env.to_vec());
    if self.fail_toolchain_build { Err(failed()) } else { Ok(()) }
  }
}

/// Verifier that accepts every binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptingVerifier;

impl BinaryVerifier for AcceptingVerifier {
  fn verify(&self, _path: &Path, _platform: Platform) -> Result<(), VerifyError> {
    Ok(())
  }
}

/// Verifier that rejects every binary as the wrong format.
#[derive(Debug, Default, Clone, Copy)]
pub struct RejectingVerifier;

impl BinaryVerifier for RejectingVerifier {
  fn verify(&self, _path: &Path, _platform: Platform) -> Result<(), VerifyError> {
    Err(VerifyError::WrongFormat {
      expected: "ELF",
      found: "text".to_string(),
    })
  }
}

/// A `runtime.a` image whose `__.PKGDEF` is stamped with `version`.
pub fn runtime_archive(platform: Platform, version: &str) -> Vec<u8> {
  let pkgdef = format!(
    "go object {} {} {} X:none\nimport\n$$\npackage runtime\n",
    platform.os, platform.arch, version
  );
  encode(&[
    ArMember::new(PKGDEF_MEMBER, pkgdef.into_bytes()),
    ArMember::new("_go_.6", b"object code".to_vec()),
  ])
  .unwrap()
}

/// Lay out a toolchain for `platform` under `root`: the `go` binary and, when
/// `version` is given, a stamped runtime library.
pub fn fake_go_root(root: &Path, platform: Platform, version: Option<&str>) {
  let exe = format!("go{}", platform.os.exe_suffix());
  let bin = if platform.is_host() {
    root.join("bin").join(exe)
  } else {
    root.join("bin").join(platform.dir_name()).join(exe)
  };
  std::fs::create_dir_all(bin.parent().unwrap()).unwrap();
  std::fs::write(&bin, b"").unwrap();

  if let Some(version) = version {
    let pkg = root.join("pkg").join(platform.dir_name());
    std::fs::create_dir_all(&pkg).unwrap();
    std::fs::write(pkg.join("runtime.a"), runtime_archive(platform, version)).unwrap();
  }
}

/// Settings with the given version and per-task option JSON.
pub fn settings_with(version: &str, task_settings: serde_json::Value) -> Settings {
  let mut settings = Settings {
    package_version: version.to_string(),
    ..Default::default()
  };
  if let serde_json::Value::Object(tasks) = task_settings {
    for (task, options) in tasks {
      if let serde_json::Value::Object(options) = options {
        settings.task_settings.insert(task, options);
      }
    }
  }
  settings
}

/// Parameters for an app at `<root>/app` with outputs under `<root>/out`.
pub fn task_params(root: &Path, platforms: Vec<Platform>, settings: Settings) -> TaskParams {
  TaskParams {
    platforms,
    main_dirs: vec![root.join("app")],
    app_name: "app".to_string(),
    working_dir: root.to_path_buf(),
    out_dest_root: root.join("out"),
    settings,
  }
}

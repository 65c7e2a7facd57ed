//! External process seams: the Go compiler and binary verification.
//!
//! Tasks never spawn the compiler directly; they go through [`Compiler`], so
//! tests can substitute a recording double.

pub mod verify;

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::SystemTime;

use thiserror::Error;
use tracing::{debug, info};

use crate::settings::Settings;

pub use verify::{BinaryVerifier, ObjectVerifier, VerifyError};

#[derive(Debug, Error)]
pub enum ExecError {
  #[error("failed to spawn '{program}': {source}")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },

  #[error("'{program}' exited with {}", code.map(|c| c.to_string()).unwrap_or_else(|| "a signal".to_string()))]
  Failed { program: String, code: Option<i32> },

  #[error("unexpected output from '{program}': {output}")]
  UnexpectedOutput { program: String, output: String },
}

/// The Go toolchain, as seen by tasks.
pub trait Compiler {
  /// Run `go <subcommand> [flags] args` in `dir` with extra `env` overrides.
  ///
  /// For `build` and `install`, link flags, tags and extra arguments from
  /// `settings.buildSettings` are inserted before `args`.
  fn invoke(
    &self,
    dir: &Path,
    subcommand: &str,
    args: &[String],
    env: &[(String, String)],
    settings: &Settings,
  ) -> Result<(), ExecError>;

  /// The version token reported by `<go_root>/bin/go version`, e.g. `go1.2`.
  fn version(&self, go_root: &Path) -> Result<String, ExecError>;

  /// Rebuild the toolchain under `go_root` for the platform described by `env`.
  fn build_toolchain(&self, go_root: &Path, env: &[(String, String)]) -> Result<(), ExecError>;
}

/// [`Compiler`] backed by the real `go` executable.
#[derive(Debug, Default, Clone)]
pub struct GoCommand;

impl GoCommand {
  pub fn new() -> Self {
    Self
  }
}

/// Path of the `go` executable under `go_root`, or plain `go` from `PATH`.
pub fn go_binary(go_root: &Path) -> PathBuf {
  if go_root.as_os_str().is_empty() {
    return PathBuf::from("go");
  }
  let name = if cfg!(windows) { "go.exe" } else { "go" };
  go_root.join("bin").join(name)
}

/// Compiler flags derived from the build settings, for `build` and `install`.
pub fn build_flags(settings: &Settings) -> Vec<String> {
  let build = settings.build_settings();
  let mut flags = Vec::new();

  if !build.ld_flags_x_vars.is_empty() {
    let version = settings.full_version_name();
    let now = humantime::format_rfc3339_seconds(SystemTime::now()).to_string();
    let vars: Vec<String> = build
      .ld_flags_x_vars
      .iter()
      .map(|(source, target)| {
        let value = match source.as_str() {
          "TimeNow" => now.as_str(),
          "Version" => version.as_str(),
          literal => literal,
        };
        format!("-X {}={}", target, value)
      })
      .collect();
    flags.push("-ldflags".to_string());
    flags.push(vars.join(" "));
  }
  if !build.tags.is_empty() {
    flags.push("-tags".to_string());
    flags.push(build.tags.clone());
  }
  flags.extend(build.extra_args.iter().cloned());
  flags
}

impl Compiler for GoCommand {
  fn invoke(
    &self,
    dir: &Path,
    subcommand: &str,
    args: &[String],
    env: &[(String, String)],
    settings: &Settings,
  ) -> Result<(), ExecError> {
    let go_root = PathBuf::from(&settings.go_root);
    let go = go_binary(&go_root);

    let mut command = Command::new(&go);
    command.arg(subcommand).current_dir(dir);
    if matches!(subcommand, "build" | "install") {
      command.args(build_flags(settings));
    }
    command.args(args);
    if !settings.go_root.is_empty() {
      command.env("GOROOT", &go_root);
    }
    command.envs(env.iter().map(|(k, v)| (k, v)));

    info!(go = %go.display(), subcommand, dir = %dir.display(), env = ?env, "invoking compiler");
    run(command, &go.display().to_string())
  }

  fn version(&self, go_root: &Path) -> Result<String, ExecError> {
    let go = go_binary(go_root);
    let program = go.display().to_string();
    let output = Command::new(&go)
      .arg("version")
      .output()
      .map_err(|source| ExecError::Spawn {
        program: program.clone(),
        source,
      })?;
    if !output.status.success() {
      return Err(ExecError::Failed {
        program,
        code: output.status.code(),
      });
    }
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    parse_version_output(&stdout).ok_or(ExecError::UnexpectedOutput { program, output: stdout })
  }

  fn build_toolchain(&self, go_root: &Path, env: &[(String, String)]) -> Result<(), ExecError> {
    let src = go_root.join("src");
    let mut command = if cfg!(windows) {
      let mut command = Command::new("cmd.exe");
      command.arg("/C").arg(src.join("make.bat")).arg("--no-clean");
      command
    } else {
      let mut command = Command::new(src.join("make.bash"));
      command.arg("--no-clean");
      command
    };
    command
      .current_dir(&src)
      .env("GOROOT", go_root)
      .envs(env.iter().map(|(k, v)| (k, v)));

    info!(go_root = %go_root.display(), env = ?env, "rebuilding toolchain");
    run(command, "make.bash")
  }
}

/// Version token of `go version` output, the third space-separated field.
pub fn parse_version_output(output: &str) -> Option<String> {
  output.split(' ').nth(2).map(|token| token.trim().to_string())
}

/// Query `go env GOROOT` from the `go` on `PATH`.
pub fn query_go_root() -> Result<PathBuf, ExecError> {
  let output = Command::new("go")
    .args(["env", "GOROOT"])
    .output()
    .map_err(|source| ExecError::Spawn {
      program: "go".to_string(),
      source,
    })?;
  if !output.status.success() {
    return Err(ExecError::Failed {
      program: "go".to_string(),
      code: output.status.code(),
    });
  }
  Ok(PathBuf::from(String::from_utf8_lossy(&output.stdout).trim()))
}

/// Run an arbitrary program to completion, inheriting stdio.
pub fn run_program(program: &str, args: &[String], dir: &Path) -> Result<(), ExecError> {
  let mut command = Command::new(program);
  command.args(args).current_dir(dir);
  info!(program, args = ?args, "running");
  run(command, program)
}

fn run(mut command: Command, program: &str) -> Result<(), ExecError> {
  debug!(command = ?command, "spawning process");
  let status = command.status().map_err(|source| ExecError::Spawn {
    program: program.to_string(),
    source,
  })?;
  if !status.success() {
    return Err(ExecError::Failed {
      program: program.to_string(),
      code: status.code(),
    });
  }
  Ok(())
}

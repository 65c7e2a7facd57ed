//! Cross-toolchain validation.
//!
//! Before compiling for a platform, the toolchain under `GOROOT` is checked:
//! 1. The platform's `go` binary must exist
//! 2. The compiled runtime library `pkg/<os>_<arch>/runtime.a` is opened as an
//!    ar archive, and the version stamped into its `__.PKGDEF` member is
//!    compared with `go version`
//!
//! A version mismatch is a hard failure. Anything that prevents the comparison
//! (missing library, malformed archive, unexpected header, failed version
//! query) only makes the result [`Validation::Inconclusive`].

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{info, warn};

use crate::ar::ArReader;
use crate::exec::{Compiler, ExecError};
use crate::platform::Platform;
use crate::platform::arch::Arch;
use crate::platform::os::Os;

/// Archive member holding the package definition header.
pub const PKGDEF_MEMBER: &str = "__.PKGDEF";

/// Bytes of `__.PKGDEF` inspected for the version stamp.
const PKGDEF_PREFIX_LEN: usize = 50;

#[derive(Debug, Error)]
pub enum ToolchainError {
  #[error("GOROOT is not set and `go env GOROOT` failed")]
  UnknownGoRoot,

  #[error("toolchain binary {} does not exist", path.display())]
  MissingBinary { path: PathBuf },

  #[error("static library version '{library}' does not match `go version` '{compiler}'")]
  VersionMismatch { library: String, compiler: String },

  #[error("rebuilding toolchain for {platform} failed: {source}")]
  RebuildFailed {
    platform: Platform,
    #[source]
    source: ExecError,
  },

  #[error("toolchain for {platform} still invalid after rebuild: {source}")]
  StillInvalid {
    platform: Platform,
    #[source]
    source: Box<ToolchainError>,
  },
}

/// Outcome of a validation that did not fail hard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
  /// Library and compiler report the same version.
  Verified { version: String },
  /// The comparison could not be made.
  Inconclusive { reason: String },
}

/// Validates the toolchain under one `GOROOT`.
pub struct ToolchainValidator<'a> {
  go_root: PathBuf,
  compiler: &'a dyn Compiler,
}

impl<'a> ToolchainValidator<'a> {
  pub fn new(go_root: impl Into<PathBuf>, compiler: &'a dyn Compiler) -> Self {
    Self {
      go_root: go_root.into(),
      compiler,
    }
  }

  /// `<goroot>/bin/<os>_<arch>/go`, or `<goroot>/bin/go` for the host.
  pub fn binary_path(&self, platform: Platform) -> PathBuf {
    let name = format!("go{}", platform.os.exe_suffix());
    if platform.is_host() {
      self.go_root.join("bin").join(name)
    } else {
      self.go_root.join("bin").join(platform.dir_name()).join(name)
    }
  }

  /// `<goroot>/pkg/<os>_<arch>/runtime.a`
  pub fn runtime_library(&self, platform: Platform) -> PathBuf {
    self.go_root.join("pkg").join(platform.dir_name()).join("runtime.a")
  }

  /// Validate the toolchain for `platform`.
  pub fn validate(&self, platform: Platform) -> Result<Validation, ToolchainError> {
    let binary = self.binary_path(platform);
    if !binary.exists() {
      return Err(ToolchainError::MissingBinary { path: binary });
    }

    let library = match self.library_version(platform) {
      Ok(version) => version,
      Err(reason) => return Ok(inconclusive(platform, reason)),
    };
    let compiler = match self.compiler.version(&self.go_root) {
      Ok(version) => version,
      Err(e) => return Ok(inconclusive(platform, format!("`go version` failed: {}", e))),
    };

    if library != compiler {
      return Err(ToolchainError::VersionMismatch { library, compiler });
    }
    info!(
      platform = %platform,
      version = %library,
      "toolchain version verified against go executable"
    );
    Ok(Validation::Verified { version: library })
  }

  /// Validate, rebuilding once and re-validating when `auto_rebuild` is set.
  pub fn ensure(&self, platform: Platform, goarm: &str, auto_rebuild: bool) -> Result<Validation, ToolchainError> {
    let err = match self.validate(platform) {
      Ok(validation) => return Ok(validation),
      Err(err) => err,
    };
    if !auto_rebuild {
      return Err(err);
    }

    warn!(platform = %platform, error = %err, "toolchain not ready, rebuilding");
    self.rebuild(platform, goarm)?;
    self.validate(platform).map_err(|source| ToolchainError::StillInvalid {
      platform,
      source: Box::new(source),
    })
  }

  /// Rebuild the toolchain for `platform`.
  pub fn rebuild(&self, platform: Platform, goarm: &str) -> Result<(), ToolchainError> {
    let mut env = platform.env();
    if platform.os == Os::Linux && platform.arch == Arch::Arm && !goarm.is_empty() {
      env.push(("GOARM".to_string(), goarm.to_string()));
    }
    self
      .compiler
      .build_toolchain(&self.go_root, &env)
      .map_err(|source| ToolchainError::RebuildFailed { platform, source })
  }

  /// Version stamped into the platform's runtime library.
  fn library_version(&self, platform: Platform) -> Result<String, String> {
    let path = self.runtime_library(platform);
    let file = File::open(&path).map_err(|e| format!("cannot open {}: {}", path.display(), e))?;
    let mut reader = ArReader::new(BufReader::new(file)).map_err(|e| format!("{}: {}", path.display(), e))?;

    loop {
      let header = reader
        .next_header()
        .map_err(|e| format!("{}: {}", path.display(), e))?
        .ok_or_else(|| format!("{} has no {} member", path.display(), PKGDEF_MEMBER))?;
      if header.name != PKGDEF_MEMBER {
        continue;
      }

      let first_line = reader
        .read_string(PKGDEF_PREFIX_LEN)
        .map_err(|e| format!("failed to read {}: {}", PKGDEF_MEMBER, e))?;
      return parse_pkgdef(&first_line, platform).ok_or_else(|| {
        format!(
          "first line of {} does not match 'go object {} {} '",
          PKGDEF_MEMBER, platform.os, platform.arch
        )
      });
    }
  }
}

fn inconclusive(platform: Platform, reason: String) -> Validation {
  warn!(platform = %platform, reason = %reason, "could not validate toolchain version");
  Validation::Inconclusive { reason }
}

/// Extract the version from a `go object <os> <arch> <version> ...` line.
pub fn parse_pkgdef(first_line: &str, platform: Platform) -> Option<String> {
  let expected = format!("go object {} {} ", platform.os, platform.arch);
  if !first_line.starts_with(&expected) {
    return None;
  }
  first_line
    .split(' ')
    .nth(4)
    .map(|token| token.trim_end_matches(['\n', '\0']).to_string())
    .filter(|token| !token.is_empty())
}

/// Toolchain root: the configured value, or `go env GOROOT`.
pub fn resolve_go_root(configured: &str) -> Option<PathBuf> {
  if !configured.is_empty() {
    return Some(PathBuf::from(configured));
  }
  match crate::exec::query_go_root() {
    Ok(path) if !path.as_os_str().is_empty() => Some(path),
    Ok(_) => None,
    Err(e) => {
      warn!(error = %e, "could not determine GOROOT");
      None
    }
  }
}

//! Debian binary packages for linux targets.
//!
//! A `.deb` is an ar archive of three members, in order: `debian-binary`
//! (format version), `control.tar.gz` (the control record) and `data.tar.gz`
//! (the installed files).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::xc::XcOptions;
use super::{PKG_BUILD, Task, TaskError, TaskParams, XC, exe_name};
use crate::ar::{ArError, ArWriter};
use crate::archive::{self, ArchiveError, ArchiveItem};
use crate::platform::Platform;
use crate::platform::arch::Arch;
use crate::platform::os::Os;
use crate::settings::{TaskOptions, options_map};

/// Staging directory, relative to `<outputRoot>/<version>`.
pub const STAGING_DIR: &str = ".xcpack-temp";

const DEBIAN_BINARY: &str = "debian-binary";
const CONTROL_ARCHIVE: &str = "control.tar.gz";
const DATA_ARCHIVE: &str = "data.tar.gz";

#[derive(Debug, Error)]
pub enum PackageError {
  #[error("failed to write {}: {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error(transparent)]
  Archive(#[from] ArchiveError),

  #[error("failed to assemble package: {0}")]
  Ar(#[from] ArError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PkgBuildOptions {
  /// Generic package metadata (`maintainer`, `description`).
  pub metadata: TaskOptions,
  /// Extra control fields, emitted verbatim when non-empty.
  #[serde(rename = "metadata-deb")]
  pub metadata_deb: TaskOptions,
  /// Remove the staging directory afterwards.
  pub rmtemp: bool,
  /// Debian architecture for arm targets; derived from `GOARM` when empty.
  pub armarch: String,
  #[serde(flatten)]
  pub extra: TaskOptions,
}

impl Default for PkgBuildOptions {
  fn default() -> Self {
    Self {
      metadata: object(json!({ "maintainer": "unknown" })),
      metadata_deb: object(json!({ "Depends": "" })),
      rmtemp: true,
      armarch: String::new(),
      extra: TaskOptions::new(),
    }
  }
}

fn object(value: Value) -> TaskOptions {
  match value {
    Value::Object(map) => map,
    _ => TaskOptions::new(),
  }
}

/// Text form of a metadata value; `null` is empty.
fn metadata_text(value: &Value) -> String {
  match value {
    Value::String(s) => s.clone(),
    Value::Null => String::new(),
    other => other.to_string(),
  }
}

impl PkgBuildOptions {
  fn metadata_value(&self, key: &str) -> Option<String> {
    self.metadata.get(key).map(metadata_text)
  }
}

/// Debian architecture name for `arch`. `arm_name` is used for arm.
pub fn deb_arch(arch: Arch, arm_name: &str) -> &str {
  match arch {
    Arch::X86 => "i386",
    Arch::Amd64 => "amd64",
    Arch::Arm => arm_name,
    _ => "all",
  }
}

/// Debian arm flavour: the explicit `armarch`, else `armel` for `GOARM=5`, else `armhf`.
pub fn arm_arch_name(armarch: &str, goarm: &str) -> String {
  if !armarch.is_empty() {
    armarch.to_string()
  } else if goarm == "5" {
    "armel".to_string()
  } else {
    "armhf".to_string()
  }
}

/// Everything needed to assemble one package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageManifest {
  /// Control record fields, in output order.
  pub control: Vec<(String, String)>,
  /// Payload files and their installed paths.
  pub entries: Vec<ArchiveItem>,
}

impl PackageManifest {
  /// Manifest for `platform`, covering every entry point's binary.
  pub fn for_platform(params: &TaskParams, platform: Platform, options: &PkgBuildOptions, arch_name: &str) -> Self {
    let mut control = vec![
      ("Package".to_string(), params.app_name.clone()),
      ("Priority".to_string(), "Extra".to_string()),
    ];
    let maintainer = options.metadata_value("maintainer").unwrap_or_else(|| "?".to_string());
    if !maintainer.is_empty() {
      control.push(("Maintainer".to_string(), maintainer));
    }
    control.push(("Version".to_string(), params.version()));
    control.push(("Architecture".to_string(), arch_name.to_string()));
    for (key, value) in &options.metadata_deb {
      let value = metadata_text(value);
      if !value.is_empty() {
        control.push((key.clone(), value));
      }
    }
    let description = options
      .metadata_value("description")
      .unwrap_or_else(|| "?".to_string());
    control.push(("Description".to_string(), description));

    let entries = params
      .main_dirs
      .iter()
      .map(|main_dir| {
        let bin = params.bin_path(platform, main_dir);
        ArchiveItem::new(bin, format!("usr/bin/{}", exe_name(main_dir)))
      })
      .collect();

    Self { control, entries }
  }

  /// The `control` file: one `Key: value` line per field.
  pub fn control_file(&self) -> String {
    self
      .control
      .iter()
      .map(|(key, value)| format!("{}: {}\n", key, value))
      .collect()
  }
}

pub fn task() -> Task {
  Task::new(
    PKG_BUILD,
    "Build a binary package. Currently only supports .deb format for Debian/Ubuntu Linux.",
    run,
  )
  .with_defaults(options_map::<PkgBuildOptions>())
}

pub fn run(params: &TaskParams) -> Result<(), TaskError> {
  let options: PkgBuildOptions = params.settings.task_options(PKG_BUILD)?;
  let xc: XcOptions = params.settings.task_options(XC)?;
  let arm_name = arm_arch_name(&options.armarch, &xc.goarm);

  for &platform in &params.platforms {
    if platform.os != Os::Linux {
      debug!(platform = %platform, "no package format for platform, skipping");
      continue;
    }
    let path = build_deb(params, platform, &options, &arm_name)
      .map_err(|source| TaskError::Package { platform, source })?;
    info!(platform = %platform, package = %path.display(), "built debian package");
  }
  Ok(())
}

/// Build the `.deb` for `platform`, returning its path.
pub fn build_deb(
  params: &TaskParams,
  platform: Platform,
  options: &PkgBuildOptions,
  arm_name: &str,
) -> Result<PathBuf, PackageError> {
  let deb_dir = params.version_dir();
  let staging = deb_dir.join(STAGING_DIR);

  let result = assemble(params, platform, options, arm_name, &deb_dir, &staging);
  if options.rmtemp
    && staging.exists()
    && let Err(e) = std::fs::remove_dir_all(&staging)
  {
    warn!(path = %staging.display(), error = %e, "failed to remove staging directory");
  }
  result
}

fn assemble(
  params: &TaskParams,
  platform: Platform,
  options: &PkgBuildOptions,
  arm_name: &str,
  deb_dir: &Path,
  staging: &Path,
) -> Result<PathBuf, PackageError> {
  create_dir(staging)?;
  let arch_name = deb_arch(platform.arch, arm_name);
  let manifest = PackageManifest::for_platform(params, platform, options, arch_name);

  write_file(&staging.join(DEBIAN_BINARY), b"2.0\n")?;

  let control_text = manifest.control_file();
  if params.settings.verbose {
    info!(control = %control_text, "control file");
  }
  let control = staging.join("control");
  write_file(&control, control_text.as_bytes())?;
  archive::write_tar_gz(&staging.join(CONTROL_ARCHIVE), &[ArchiveItem::new(&control, "control")])?;
  archive::write_tar_gz(&staging.join(DATA_ARCHIVE), &manifest.entries)?;

  let target = deb_dir.join(format!("{}_{}_{}.deb", params.app_name, params.version(), arch_name));
  let mut writer = ArWriter::create(&target)?;
  for member in [DEBIAN_BINARY, CONTROL_ARCHIVE, DATA_ARCHIVE] {
    writer.append_file(member, &staging.join(member))?;
  }
  writer.finish()?;
  Ok(target)
}

fn create_dir(path: &Path) -> Result<(), PackageError> {
  std::fs::create_dir_all(path).map_err(|source| PackageError::Io {
    path: path.to_path_buf(),
    source,
  })
}

fn write_file(path: &Path, contents: &[u8]) -> Result<(), PackageError> {
  std::fs::write(path, contents).map_err(|source| PackageError::Io {
    path: path.to_path_buf(),
    source,
  })
}

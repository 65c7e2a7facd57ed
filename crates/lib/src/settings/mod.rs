//! Build settings.
//!
//! Settings are read from `.xcpack.json` in the working directory, with
//! `.xcpack.local.json` deep-merged on top for machine-specific overrides.
//! Per-task options live under `taskSettings` as loosely typed JSON maps;
//! each task deserializes its own typed view with [`Settings::task_options`].

pub mod merge;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

pub use merge::{merge_defaults, merge_task_defaults};

/// Option map of a single task.
pub type TaskOptions = serde_json::Map<String, Value>;

pub const CONFIG_FILE: &str = ".xcpack.json";
pub const LOCAL_CONFIG_FILE: &str = ".xcpack.local.json";

pub const RESOURCES_INCLUDE_DEFAULT: &str = "INSTALL*,README*,LICENSE*";
pub const RESOURCES_EXCLUDE_DEFAULT: &str = "*.go";
pub const PACKAGE_VERSION_DEFAULT: &str = "snapshot";

#[derive(Debug, Error)]
pub enum SettingsError {
  #[error("failed to read {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("failed to write {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("invalid settings: {0}")]
  Invalid(#[from] serde_json::Error),

  #[error("invalid options for task '{task}': {source}")]
  TaskOptions {
    task: String,
    #[source]
    source: serde_json::Error,
  },
}

/// Flags passed to the compiler for `build` and `install`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildSettings {
  /// Variables set at link time, keyed by value source (`Version`, `TimeNow`
  /// or a literal) with the fully qualified Go variable as value.
  pub ld_flags_x_vars: BTreeMap<String, String>,
  /// Build tags passed with `-tags`.
  pub tags: String,
  /// Extra arguments appended verbatim.
  pub extra_args: Vec<String>,
}

impl BuildSettings {
  pub fn with_defaults() -> Self {
    Self {
      ld_flags_x_vars: BTreeMap::from([
        ("TimeNow".to_string(), "main.BUILD_DATE".to_string()),
        ("Version".to_string(), "main.VERSION".to_string()),
      ]),
      ..Default::default()
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
  /// Tasks (or aliases) to run.
  pub tasks: Vec<String>,
  /// Tasks (or aliases) removed after resolution.
  pub tasks_exclude: Vec<String>,
  /// Tasks (or aliases) appended to `tasks`.
  pub tasks_append: Vec<String>,
  /// Tasks (or aliases) prepended to `tasks`.
  pub tasks_prepend: Vec<String>,
  pub task_settings: BTreeMap<String, TaskOptions>,

  /// Output root override. Relative paths are resolved against the working directory.
  pub artifacts_dest: String,
  pub package_version: String,
  pub prerelease_info: String,

  /// Comma separated globs of resources shipped next to the binaries.
  pub resources_include: String,
  pub resources_exclude: String,
  /// Comma separated globs of directories never treated as entry points.
  pub main_dirs_exclude: String,

  /// Toolchain root (`GOROOT`).
  pub go_root: String,
  pub build_settings: Option<BuildSettings>,

  pub verbose: bool,
}

impl Settings {
  /// Load settings for `dir`, layering the local config over the shared one.
  ///
  /// Missing files are not an error; the result is then all defaults.
  pub fn load(dir: &Path) -> Result<Self, SettingsError> {
    Self::load_layers(dir, &[CONFIG_FILE, LOCAL_CONFIG_FILE])
  }

  /// Load only the shared config of `dir`, ignoring machine-local overrides.
  pub fn load_shared(dir: &Path) -> Result<Self, SettingsError> {
    Self::load_layers(dir, &[CONFIG_FILE])
  }

  fn load_layers(dir: &Path, names: &[&str]) -> Result<Self, SettingsError> {
    let mut merged = Value::Object(Default::default());
    for name in names {
      let path = dir.join(name);
      if !path.exists() {
        continue;
      }
      debug!(path = %path.display(), "loading settings");
      let text = std::fs::read_to_string(&path).map_err(|source| SettingsError::Read {
        path: path.clone(),
        source,
      })?;
      let value: Value = serde_json::from_str(&text).map_err(|source| SettingsError::Parse { path, source })?;
      overlay(&mut merged, value);
    }
    Ok(serde_json::from_value(merged)?)
  }

  /// Write these settings as pretty-printed JSON.
  pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
    let json = serde_json::to_string_pretty(self)?;
    std::fs::write(path, json + "\n").map_err(|source| SettingsError::Write {
      path: path.to_path_buf(),
      source,
    })
  }

  /// Install global defaults for any field left empty.
  pub fn fill_defaults(&mut self) {
    if self.resources_include.is_empty() {
      self.resources_include = RESOURCES_INCLUDE_DEFAULT.to_string();
    }
    if self.resources_exclude.is_empty() {
      self.resources_exclude = RESOURCES_EXCLUDE_DEFAULT.to_string();
    }
    if self.package_version.is_empty() {
      self.package_version = PACKAGE_VERSION_DEFAULT.to_string();
    }
    if self.build_settings.is_none() {
      self.build_settings = Some(BuildSettings::with_defaults());
    }
    if self.go_root.is_empty()
      && let Ok(go_root) = std::env::var("GOROOT")
      && !go_root.is_empty()
    {
      info!(go_root = %go_root, "defaulting goRoot to $GOROOT");
      self.go_root = go_root;
    }
  }

  /// Version string used in output paths and package names.
  pub fn full_version_name(&self) -> String {
    if self.prerelease_info.is_empty() {
      self.package_version.clone()
    } else {
      format!("{}-{}", self.package_version, self.prerelease_info)
    }
  }

  /// Raw option value for `task`.
  pub fn task_setting(&self, task: &str, key: &str) -> Option<&Value> {
    self.task_settings.get(task)?.get(key)
  }

  /// Deserialize the options of `task` into its typed representation.
  ///
  /// A task without an entry gets `T::default()`.
  pub fn task_options<T: DeserializeOwned + Default>(&self, task: &str) -> Result<T, SettingsError> {
    match self.task_settings.get(task) {
      None => Ok(T::default()),
      Some(options) => {
        serde_json::from_value(Value::Object(options.clone())).map_err(|source| SettingsError::TaskOptions {
          task: task.to_string(),
          source,
        })
      }
    }
  }

  pub fn build_settings(&self) -> BuildSettings {
    self.build_settings.clone().unwrap_or_else(BuildSettings::with_defaults)
  }
}

/// Deep-merge `overlay` into `base`; objects merge key by key, anything else replaces.
fn overlay(base: &mut Value, overlay_value: Value) {
  match (base, overlay_value) {
    (Value::Object(base), Value::Object(top)) => {
      for (key, value) in top {
        match base.get_mut(&key) {
          Some(existing) => overlay(existing, value),
          None => {
            base.insert(key, value);
          }
        }
      }
    }
    (base, value) => *base = value,
  }
}

/// Serialize a typed options struct into its default option map.
pub fn options_map<T: Serialize + Default>() -> TaskOptions {
  match serde_json::to_value(T::default()) {
    Ok(Value::Object(map)) => map,
    _ => TaskOptions::new(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;
  use serial_test::serial;
  use tempfile::TempDir;

  #[derive(Debug, Default, Deserialize, PartialEq)]
  #[serde(rename_all = "camelCase", default)]
  struct DemoOptions {
    verify_exe: bool,
    #[serde(flatten)]
    extra: TaskOptions,
  }

  #[test]
  fn load_without_files_yields_defaults() {
    let temp = TempDir::new().unwrap();
    assert_eq!(Settings::load(temp.path()).unwrap(), Settings::default());
  }

  #[test]
  fn local_config_is_layered_over_shared_config() {
    let temp = TempDir::new().unwrap();
    std::fs::write(
      temp.path().join(CONFIG_FILE),
      json!({
        "packageVersion": "1.0",
        "tasks": ["xc"],
        "taskSettings": { "xc": { "GOARM": "6", "verifyExe": true } }
      })
      .to_string(),
    )
    .unwrap();
    std::fs::write(
      temp.path().join(LOCAL_CONFIG_FILE),
      json!({ "taskSettings": { "xc": { "GOARM": "5" } } }).to_string(),
    )
    .unwrap();

    let settings = Settings::load(temp.path()).unwrap();

    assert_eq!(settings.package_version, "1.0");
    assert_eq!(settings.tasks, vec!["xc"]);
    assert_eq!(settings.task_setting("xc", "GOARM"), Some(&json!("5")));
    assert_eq!(settings.task_setting("xc", "verifyExe"), Some(&json!(true)));
  }

  #[test]
  fn shared_load_ignores_local_config() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join(CONFIG_FILE), json!({ "packageVersion": "1.0" }).to_string()).unwrap();
    std::fs::write(
      temp.path().join(LOCAL_CONFIG_FILE),
      json!({ "packageVersion": "9.9", "goRoot": "/home/me/go" }).to_string(),
    )
    .unwrap();

    let settings = Settings::load_shared(temp.path()).unwrap();

    assert_eq!(settings.package_version, "1.0");
    assert!(settings.go_root.is_empty());
  }

  #[test]
  fn malformed_config_reports_path() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join(CONFIG_FILE), "{ not json").unwrap();
    let err = Settings::load(temp.path()).unwrap_err();
    assert!(matches!(err, SettingsError::Parse { .. }));
    assert!(err.to_string().contains(CONFIG_FILE));
  }

  #[test]
  fn save_then_load_preserves_settings() {
    let temp = TempDir::new().unwrap();
    let mut settings = Settings {
      package_version: "2.1".to_string(),
      tasks_exclude: vec!["go-test".to_string()],
      ..Default::default()
    };
    settings.fill_defaults();
    settings.save(&temp.path().join(CONFIG_FILE)).unwrap();

    assert_eq!(Settings::load(temp.path()).unwrap(), settings);
  }

  #[test]
  #[serial]
  fn fill_defaults_keeps_existing_values() {
    temp_env::with_var("GOROOT", Some("/opt/go"), || {
      let mut settings = Settings {
        package_version: "0.9".to_string(),
        go_root: "/usr/local/go".to_string(),
        ..Default::default()
      };
      settings.fill_defaults();

      assert_eq!(settings.package_version, "0.9");
      assert_eq!(settings.go_root, "/usr/local/go");
      assert_eq!(settings.resources_include, RESOURCES_INCLUDE_DEFAULT);
      assert_eq!(settings.resources_exclude, RESOURCES_EXCLUDE_DEFAULT);
    });
  }

  #[test]
  #[serial]
  fn fill_defaults_reads_goroot_from_environment() {
    temp_env::with_var("GOROOT", Some("/opt/go"), || {
      let mut settings = Settings::default();
      settings.fill_defaults();
      assert_eq!(settings.go_root, "/opt/go");
      assert_eq!(settings.package_version, PACKAGE_VERSION_DEFAULT);
    });
  }

  #[test]
  fn full_version_name_appends_prerelease() {
    let mut settings = Settings {
      package_version: "1.2.0".to_string(),
      ..Default::default()
    };
    assert_eq!(settings.full_version_name(), "1.2.0");
    settings.prerelease_info = "rc1".to_string();
    assert_eq!(settings.full_version_name(), "1.2.0-rc1");
  }

  #[test]
  fn task_options_keep_unknown_keys() {
    let mut settings = Settings::default();
    settings.task_settings.insert(
      "xc".to_string(),
      json!({ "verifyExe": true, "futureFlag": 3 }).as_object().unwrap().clone(),
    );

    let options: DemoOptions = settings.task_options("xc").unwrap();
    assert!(options.verify_exe);
    assert_eq!(options.extra.get("futureFlag"), Some(&json!(3)));

    let missing: DemoOptions = settings.task_options("nope").unwrap();
    assert_eq!(missing, DemoOptions::default());
  }

  #[test]
  fn task_options_report_type_errors() {
    let mut settings = Settings::default();
    settings.task_settings.insert(
      "xc".to_string(),
      json!({ "verifyExe": "yes" }).as_object().unwrap().clone(),
    );
    let result: Result<DemoOptions, _> = settings.task_options("xc");
    assert!(matches!(result, Err(SettingsError::TaskOptions { .. })));
  }
}

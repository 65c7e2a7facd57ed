use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;
use tracing::debug;

use xcpack_lib::platform;
use xcpack_lib::settings::{Settings, merge_task_defaults};
use xcpack_lib::tasks::alias::Aliases;
use xcpack_lib::tasks::{Pipeline, PipelineError, XC};

use super::registry;
use crate::output::{format_duration, print_error, print_stat, print_success};

#[derive(Debug, Args)]
pub struct RunArgs {
  /// Tasks or aliases to run, replacing the configured task list
  pub tasks: Vec<String>,

  /// Project working directory
  #[arg(long, default_value = ".")]
  pub wd: PathBuf,

  /// Output root for artifacts
  #[arg(short, long)]
  pub dest: Option<String>,

  /// Comma separated target operating systems
  #[arg(long, env = "GOOS", default_value = "")]
  pub os: String,

  /// Comma separated target architectures
  #[arg(long, env = "GOARCH", default_value = "")]
  pub arch: String,

  /// ARM version for linux/arm builds
  #[arg(long, env = "GOARM")]
  pub goarm: Option<String>,

  /// Toolchain root
  #[arg(long)]
  pub goroot: Option<String>,

  /// Package version
  #[arg(long = "pv")]
  pub package_version: Option<String>,

  /// Pre-release suffix appended to the package version
  #[arg(long = "pr")]
  pub prerelease_info: Option<String>,

  /// Tasks appended to the task list
  #[arg(long, value_delimiter = ',')]
  pub tasks_plus: Vec<String>,

  /// Tasks removed from the resolved task list
  #[arg(long, value_delimiter = ',')]
  pub tasks_minus: Vec<String>,

  /// Tasks prepended to the task list
  #[arg(long, value_delimiter = ',')]
  pub tasks_prepend: Vec<String>,
}

impl RunArgs {
  /// Layer the command-line overrides over file settings.
  fn apply(self, settings: &mut Settings, verbose: bool) {
    if !self.tasks.is_empty() {
      settings.tasks = self.tasks;
    }
    settings.tasks_append.extend(self.tasks_plus);
    settings.tasks_exclude.extend(self.tasks_minus);
    if !self.tasks_prepend.is_empty() {
      let mut prepend = self.tasks_prepend;
      prepend.append(&mut settings.tasks_prepend);
      settings.tasks_prepend = prepend;
    }
    if let Some(dest) = self.dest {
      settings.artifacts_dest = dest;
    }
    if let Some(version) = self.package_version {
      settings.package_version = version;
    }
    if let Some(prerelease) = self.prerelease_info {
      settings.prerelease_info = prerelease;
    }
    if let Some(goroot) = self.goroot {
      settings.go_root = goroot;
    }
    if let Some(goarm) = self.goarm {
      settings
        .task_settings
        .entry(XC.to_string())
        .or_default()
        .insert("GOARM".to_string(), Value::String(goarm));
    }
    settings.verbose |= verbose;
  }
}

pub fn cmd_run(args: RunArgs, verbose: bool) -> Result<()> {
  let start = Instant::now();

  let working_dir = dunce::canonicalize(&args.wd)
    .with_context(|| format!("Working directory not found: {}", args.wd.display()))?;
  let mut settings = Settings::load(&working_dir).context("Failed to load settings")?;
  let platforms = platform::select(&args.os, &args.arch).context("Failed to select target platforms")?;
  debug!(working_dir = %working_dir.display(), platforms = platforms.len(), "loaded settings");
  args.apply(&mut settings, verbose);

  let registry = registry();
  let aliases = Aliases::builtin();
  merge_task_defaults(&mut settings, &registry, &aliases);
  settings.fill_defaults();
  let version = settings.full_version_name();

  match Pipeline::new(&registry, &aliases).run(&working_dir, platforms, settings) {
    Ok(report) => {
      println!();
      print_success(&format!("Finished {} task(s) for version {}", report.tasks.len(), version));
      print_stat("Tasks", &report.succeeded().join(", "));
      print_stat("Duration", &format_duration(start.elapsed()));
      Ok(())
    }
    Err(PipelineError::TaskFailed { task, report, source }) => {
      println!();
      print_error(&format!("Task '{}' failed", task));
      print_stat("Completed", &report.succeeded().join(", "));
      print_stat("Skipped", &report.skipped().join(", "));
      print_stat("Duration", &format_duration(start.elapsed()));
      Err(source).with_context(|| format!("Task '{}' failed", task))
    }
    Err(err) => Err(err.into()),
  }
}

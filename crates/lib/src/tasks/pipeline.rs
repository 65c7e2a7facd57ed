//! Sequential, fail-fast execution of resolved tasks.
//!
//! The pipeline:
//! 1. Resolves `tasksPrepend + tasks + tasksAppend` through the alias table
//! 2. Removes excluded tasks by resolved name (so excluding an alias removes
//!    every task it expands to)
//! 3. Checks that every remaining name is a registered task, before running any
//! 4. Runs each task in order with the shared [`TaskParams`], stopping at the
//!    first failure

use std::collections::HashSet;
use std::path::Path;

use thiserror::Error;
use tracing::{error, info, info_span, warn};

use super::alias::Aliases;
use super::{TOOLCHAIN, TaskError, TaskParams, TaskRegistry};
use crate::paths;
use crate::platform::Platform;
use crate::settings::Settings;
use crate::source;
use crate::util::glob;

/// Lifecycle of one task within a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
  Pending,
  Running,
  Success,
  Failed,
}

/// Per-task outcome of a pipeline run, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
  pub tasks: Vec<(String, TaskState)>,
}

impl PipelineReport {
  fn new(names: &[String]) -> Self {
    Self {
      tasks: names.iter().map(|name| (name.clone(), TaskState::Pending)).collect(),
    }
  }

  fn set(&mut self, index: usize, state: TaskState) {
    if let Some(entry) = self.tasks.get_mut(index) {
      entry.1 = state;
    }
  }

  /// Names of tasks that finished successfully.
  pub fn succeeded(&self) -> Vec<&str> {
    self.with_state(TaskState::Success)
  }

  /// Names of tasks that never started.
  pub fn skipped(&self) -> Vec<&str> {
    self.with_state(TaskState::Pending)
  }

  pub fn is_success(&self) -> bool {
    self.tasks.iter().all(|(_, state)| *state == TaskState::Success)
  }

  fn with_state(&self, wanted: TaskState) -> Vec<&str> {
    self
      .tasks
      .iter()
      .filter(|(_, state)| *state == wanted)
      .map(|(name, _)| name.as_str())
      .collect()
  }
}

#[derive(Debug, Error)]
pub enum PipelineError {
  /// A resolved name is not a registered task. Nothing has run.
  #[error("task '{name}' does not exist")]
  UnknownTask { name: String },

  /// A task failed; later tasks were skipped.
  #[error("task '{task}' failed: {source}")]
  TaskFailed {
    task: String,
    report: PipelineReport,
    #[source]
    source: TaskError,
  },
}

/// Runs tasks from a registry, resolving names through an alias table.
pub struct Pipeline<'a> {
  registry: &'a TaskRegistry,
  aliases: &'a Aliases,
}

impl<'a> Pipeline<'a> {
  pub fn new(registry: &'a TaskRegistry, aliases: &'a Aliases) -> Self {
    Self { registry, aliases }
  }

  /// Ordered task names to run for `settings`, after alias expansion and exclusion.
  pub fn resolve(&self, settings: &Settings) -> Vec<String> {
    let exclusions: HashSet<String> = self.aliases.resolve(&settings.tasks_exclude).into_iter().collect();

    let mut all = self.aliases.resolve(&settings.tasks_prepend);
    all.extend(self.aliases.resolve(&settings.tasks));
    all.extend(self.aliases.resolve(&settings.tasks_append));

    all.retain(|name| !exclusions.contains(name));
    all
  }

  /// Check that every name is a registered task.
  pub fn validate(&self, tasks: &[String]) -> Result<(), PipelineError> {
    for name in tasks {
      if self.registry.contains(name) {
        continue;
      }
      if name.starts_with('.') || Path::new(name).exists() {
        warn!(
          task = %name,
          "'{}' looks like a directory, not a task; pass the working directory with --wd",
          name
        );
      }
      error!(task = %name, "task does not exist");
      return Err(PipelineError::UnknownTask { name: name.clone() });
    }
    Ok(())
  }

  /// Resolve, validate and run the configured tasks for `working_dir`.
  pub fn run(
    &self,
    working_dir: &Path,
    platforms: Vec<Platform>,
    settings: Settings,
  ) -> Result<PipelineReport, PipelineError> {
    let tasks = self.resolve(&settings);
    self.validate(&tasks)?;

    let app_name = paths::app_name(working_dir);
    let out_dest_root = paths::out_dest_root(&app_name, &settings.artifacts_dest, working_dir);

    let main_dirs = if tasks.len() == 1 && tasks[0] == TOOLCHAIN {
      info!("toolchain task only, not searching for entry-point directories");
      Vec::new()
    } else {
      let excludes = glob::parse_list(&settings.main_dirs_exclude);
      match source::find_main_dirs(working_dir, &excludes) {
        Ok(found) if !found.is_empty() => {
          info!(count = found.len(), dirs = ?found, "found entry-point directories");
          found
        }
        Ok(_) => {
          warn!("could not find any entry-point directories, using the working directory");
          vec![working_dir.to_path_buf()]
        }
        Err(e) => {
          warn!(error = %e, "entry-point discovery failed, using the working directory");
          vec![working_dir.to_path_buf()]
        }
      }
    };

    let params = TaskParams {
      platforms,
      main_dirs,
      app_name,
      working_dir: working_dir.to_path_buf(),
      out_dest_root,
      settings,
    };
    self.execute(&tasks, &params)
  }

  /// Run `tasks` in order with `params`, stopping at the first failure.
  pub fn execute(&self, tasks: &[String], params: &TaskParams) -> Result<PipelineReport, PipelineError> {
    self.validate(tasks)?;
    info!(tasks = ?tasks, "running tasks");

    let mut report = PipelineReport::new(tasks);
    for (index, name) in tasks.iter().enumerate() {
      let task = self
        .registry
        .get(name)
        .ok_or_else(|| PipelineError::UnknownTask { name: name.clone() })?;

      let span = info_span!("task", name = %name);
      let _guard = span.enter();

      report.set(index, TaskState::Running);
      match task.run(params) {
        Ok(()) => {
          report.set(index, TaskState::Success);
          info!("task succeeded");
        }
        Err(source) => {
          report.set(index, TaskState::Failed);
          error!(error = %source, "stopping after task failure");
          return Err(PipelineError::TaskFailed {
            task: name.clone(),
            report,
            source,
          });
        }
      }
    }
    Ok(report)
  }
}

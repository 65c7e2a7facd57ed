//! Merging of registered task defaults into user settings.
//!
//! The merge only ever adds: a task without an entry receives its whole
//! default map, and a task with an entry receives each default key it is
//! missing. Present values are never replaced, and nested maps are copied
//! wholesale only when their key is absent.

use std::collections::BTreeMap;

use tracing::debug;

use super::{Settings, TaskOptions};
use crate::tasks::TaskRegistry;
use crate::tasks::alias::Aliases;

/// Fill `task_settings` with the given per-task defaults without overwriting anything.
pub fn merge_defaults<'a>(
  task_settings: &mut BTreeMap<String, TaskOptions>,
  defaults: impl IntoIterator<Item = (&'a str, &'a TaskOptions)>,
) {
  for (task, task_defaults) in defaults {
    if task_defaults.is_empty() {
      continue;
    }
    match task_settings.get_mut(task) {
      None => {
        debug!(task, "installing default task settings");
        task_settings.insert(task.to_string(), task_defaults.clone());
      }
      Some(existing) => {
        for (key, value) in task_defaults {
          if !existing.contains_key(key) {
            existing.insert(key.clone(), value.clone());
          }
        }
      }
    }
  }
}

/// Fill the default task list and every registered task's default options.
pub fn merge_task_defaults(settings: &mut Settings, registry: &TaskRegistry, aliases: &Aliases) {
  if settings.tasks.is_empty() {
    settings.tasks = aliases.default_tasks();
  }
  merge_defaults(
    &mut settings.task_settings,
    registry.iter().map(|task| (task.name.as_str(), &task.defaults)),
  );
}

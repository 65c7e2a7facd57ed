use std::collections::BTreeMap;

use tracing::warn;

use super::Task;

/// Tasks available to the pipeline, keyed by unique name.
#[derive(Debug, Default)]
pub struct TaskRegistry {
  tasks: BTreeMap<String, Task>,
}

impl TaskRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a task. A task with the same name is replaced (last wins) and returned.
  pub fn register(&mut self, task: Task) -> Option<Task> {
    let replaced = self.tasks.insert(task.name.clone(), task);
    if let Some(previous) = &replaced {
      warn!(task = %previous.name, "task registered twice, replacing earlier registration");
    }
    replaced
  }

  pub fn get(&self, name: &str) -> Option<&Task> {
    self.tasks.get(name)
  }

  pub fn contains(&self, name: &str) -> bool {
    self.tasks.contains_key(name)
  }

  /// Registered tasks in name order.
  pub fn iter(&self) -> impl Iterator<Item = &Task> {
    self.tasks.values()
  }

  pub fn len(&self) -> usize {
    self.tasks.len()
  }

  pub fn is_empty(&self) -> bool {
    self.tasks.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::tasks::TaskError;

  #[test]
  fn last_registration_wins() {
    let mut registry = TaskRegistry::new();
    assert!(registry.register(Task::new("xc", "first", |_| Ok(()))).is_none());

    let replaced = registry.register(Task::new("xc", "second", |_| Err(TaskError::NoPlatforms)));

    assert_eq!(replaced.unwrap().description, "first");
    assert_eq!(registry.get("xc").unwrap().description, "second");
    assert_eq!(registry.len(), 1);
  }

  #[test]
  fn iteration_is_sorted_by_name() {
    let mut registry = TaskRegistry::new();
    for name in ["xc", "go-vet", "pkg-build"] {
      registry.register(Task::new(name, "", |_| Ok(())));
    }
    let names: Vec<_> = registry.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["go-vet", "pkg-build", "xc"]);
  }
}

use std::collections::BTreeMap;

use anyhow::Result;
use owo_colors::{OwoColorize, Stream};
use serde::Serialize;

use xcpack_lib::settings::TaskOptions;
use xcpack_lib::tasks::alias::Aliases;

use super::registry;
use crate::output::{OutputFormat, print_json};

#[derive(Serialize)]
struct TaskJson {
  name: String,
  description: String,
  defaults: TaskOptions,
}

#[derive(Serialize)]
struct TasksJson {
  tasks: Vec<TaskJson>,
  aliases: BTreeMap<String, Vec<String>>,
}

pub fn cmd_tasks(output: OutputFormat) -> Result<()> {
  let registry = registry();
  let aliases = Aliases::builtin();

  if output.is_json() {
    let tasks = registry
      .iter()
      .map(|task| TaskJson {
        name: task.name.clone(),
        description: task.description.clone(),
        defaults: task.defaults.clone(),
      })
      .collect();
    let aliases = aliases
      .iter()
      .map(|(name, members)| (name.to_string(), members.to_vec()))
      .collect();
    return print_json(&TasksJson { tasks, aliases });
  }

  let width = registry.iter().map(|task| task.name.len()).max().unwrap_or(0);
  println!("{}", "Tasks".if_supports_color(Stream::Stdout, |s| s.bold()));
  for task in registry.iter() {
    println!(
      "  {:width$}  {}",
      task.name.if_supports_color(Stream::Stdout, |s| s.cyan()),
      task.description,
      width = width
    );
  }

  println!();
  println!("{}", "Aliases".if_supports_color(Stream::Stdout, |s| s.bold()));
  for (name, members) in aliases.iter() {
    println!(
      "  {:width$}  {}",
      name.if_supports_color(Stream::Stdout, |s| s.cyan()),
      members.join(", "),
      width = width
    );
  }
  Ok(())
}

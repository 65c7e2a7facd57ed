use std::path::Path;

use anyhow::{Context, Result};

use xcpack_lib::settings::{CONFIG_FILE, Settings, merge_task_defaults};
use xcpack_lib::tasks::alias::Aliases;

use super::registry;
use crate::output::{print_stat, print_success};

pub fn cmd_config(wd: &Path) -> Result<()> {
  let working_dir =
    dunce::canonicalize(wd).with_context(|| format!("Working directory not found: {}", wd.display()))?;
  let mut settings = Settings::load_shared(&working_dir).context("Failed to load settings")?;

  // goRoot is machine specific; only keep it when the file already set it.
  let go_root = settings.go_root.clone();
  merge_task_defaults(&mut settings, &registry(), &Aliases::builtin());
  settings.fill_defaults();
  settings.go_root = go_root;

  let path = working_dir.join(CONFIG_FILE);
  settings.save(&path).context("Failed to write settings")?;

  print_success("Settings written");
  print_stat("Path", &path.display().to_string());
  print_stat("Tasks", &settings.tasks.join(", "));
  Ok(())
}

mod config;
mod platforms;
mod run;
mod tasks;

use std::rc::Rc;

use xcpack_lib::exec::{GoCommand, ObjectVerifier};
use xcpack_lib::tasks::{TaskRegistry, builtin_registry};

pub use config::cmd_config;
pub use platforms::cmd_platforms;
pub use run::{RunArgs, cmd_run};
pub use tasks::cmd_tasks;

/// Registry wired to the real compiler and binary verifier.
fn registry() -> TaskRegistry {
  builtin_registry(Rc::new(GoCommand::new()), Rc::new(ObjectVerifier))
}

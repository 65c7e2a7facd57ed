//! xcpack-lib: cross-compile and package Go programs for many platforms.
//!
//! This crate provides the engine behind the `xcpack` CLI:
//! - `tasks`: named build steps, aliases and the fail-fast pipeline that runs them
//! - `settings`: the JSON settings tree and the merge of per-task defaults
//! - `ar`: the Unix archive container, used by toolchain checks and `.deb` packages
//! - `toolchain`: validation of the installed cross-compile toolchain
//! - `exec`: the compiler and binary-verification seams

pub mod ar;
pub mod archive;
pub mod exec;
pub mod paths;
pub mod platform;
pub mod settings;
pub mod source;
pub mod tasks;
pub mod toolchain;
pub mod util;

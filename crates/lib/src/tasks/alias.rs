//! Task aliases: fixed, named groups of tasks.
//!
//! Expansion is one level deep. A name inside an alias's member list is never
//! expanded again, even when it is itself an alias name.

use std::collections::BTreeMap;

use super::{
  ARCHIVE_TAR_GZ, ARCHIVE_ZIP, CLEAN_DESTINATION, CODESIGN, COPY_RESOURCES, DOWNLOADS_PAGE, GO_CLEAN, GO_FMT,
  GO_INSTALL, GO_TEST, GO_VET, PKG_BUILD, REMOVE_BIN, TOOLCHAIN, XC,
};

pub const CLEAN: &str = "clean";
pub const VALIDATE: &str = "validate";
pub const COMPILE: &str = "compile";
pub const PACKAGE: &str = "package";
pub const ARCHIVE: &str = "archive";
pub const DEFAULT: &str = "default";
pub const ALL: &str = "all";

const CLEAN_TASKS: &[&str] = &[GO_CLEAN, CLEAN_DESTINATION];
const VALIDATE_TASKS: &[&str] = &[GO_VET, GO_TEST];
const COMPILE_TASKS: &[&str] = &[GO_INSTALL, XC, CODESIGN, COPY_RESOURCES];
const ARCHIVE_TASKS: &[&str] = &[ARCHIVE_ZIP, ARCHIVE_TAR_GZ];
const PACKAGE_TASKS: &[&str] = &[ARCHIVE_ZIP, ARCHIVE_TAR_GZ, PKG_BUILD, REMOVE_BIN, DOWNLOADS_PAGE];
const OTHER_TASKS: &[&str] = &[TOOLCHAIN, GO_FMT];

/// Alias table, name → ordered member task names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aliases {
  entries: BTreeMap<String, Vec<String>>,
}

impl Aliases {
  /// Build an alias table from explicit entries.
  pub fn new<N, M>(entries: impl IntoIterator<Item = (N, Vec<M>)>) -> Self
  where
    N: Into<String>,
    M: Into<String>,
  {
    Self {
      entries: entries
        .into_iter()
        .map(|(name, members)| (name.into(), members.into_iter().map(Into::into).collect()))
        .collect(),
    }
  }

  /// The built-in aliases.
  pub fn builtin() -> Self {
    let default: Vec<&str> = [VALIDATE_TASKS, COMPILE_TASKS, PACKAGE_TASKS].concat();
    let all: Vec<&str> = [OTHER_TASKS, default.as_slice()].concat();

    Self::new([
      (CLEAN, CLEAN_TASKS.to_vec()),
      (VALIDATE, VALIDATE_TASKS.to_vec()),
      (COMPILE, COMPILE_TASKS.to_vec()),
      (ARCHIVE, ARCHIVE_TASKS.to_vec()),
      (PACKAGE, PACKAGE_TASKS.to_vec()),
      (DEFAULT, default),
      (ALL, all),
    ])
  }

  pub fn get(&self, name: &str) -> Option<&[String]> {
    self.entries.get(name).map(Vec::as_slice)
  }

  pub fn is_alias(&self, name: &str) -> bool {
    self.entries.contains_key(name)
  }

  /// Aliases in name order.
  pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
    self.entries.iter().map(|(name, members)| (name.as_str(), members.as_slice()))
  }

  /// Members of the `default` alias.
  pub fn default_tasks(&self) -> Vec<String> {
    self.get(DEFAULT).map(<[String]>::to_vec).unwrap_or_default()
  }

  /// Replace each alias name by its members, keeping order and duplicates.
  pub fn resolve<S: AsRef<str>>(&self, names: &[S]) -> Vec<String> {
    let mut resolved = Vec::with_capacity(names.len());
    for name in names {
      let name = name.as_ref();
      match self.get(name) {
        Some(members) => resolved.extend(members.iter().cloned()),
        None => resolved.push(name.to_string()),
      }
    }
    resolved
  }
}

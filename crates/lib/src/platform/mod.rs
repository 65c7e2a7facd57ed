pub mod arch;
pub mod os;

use std::fmt;
use std::str::FromStr;

use arch::Arch;
use os::Os;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlatformError {
  #[error("unknown operating system: {0}")]
  UnknownOs(String),

  #[error("unknown architecture: {0}")]
  UnknownArch(String),

  #[error("invalid platform '{0}', expected <os>_<arch>")]
  Malformed(String),

  #[error("no supported platform matches os '{os}' and arch '{arch}'")]
  NoMatch { os: String, arch: String },
}

/// A cross-compile target: operating system plus architecture (e.g. "linux_amd64")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Platform {
  pub os: Os,
  pub arch: Arch,
}

/// Platforms the toolchain can target, in the order they are built.
pub const SUPPORTED: &[Platform] = &[
  Platform::new(Os::Darwin, Arch::X86),
  Platform::new(Os::Darwin, Arch::Amd64),
  Platform::new(Os::Darwin, Arch::Arm64),
  Platform::new(Os::Linux, Arch::X86),
  Platform::new(Os::Linux, Arch::Amd64),
  Platform::new(Os::Linux, Arch::Arm),
  Platform::new(Os::Linux, Arch::Arm64),
  Platform::new(Os::FreeBsd, Arch::X86),
  Platform::new(Os::FreeBsd, Arch::Amd64),
  Platform::new(Os::FreeBsd, Arch::Arm),
  Platform::new(Os::NetBsd, Arch::X86),
  Platform::new(Os::NetBsd, Arch::Amd64),
  Platform::new(Os::NetBsd, Arch::Arm),
  Platform::new(Os::OpenBsd, Arch::X86),
  Platform::new(Os::OpenBsd, Arch::Amd64),
  Platform::new(Os::Windows, Arch::X86),
  Platform::new(Os::Windows, Arch::Amd64),
  Platform::new(Os::Windows, Arch::Arm64),
];

impl Platform {
  pub const fn new(os: Os, arch: Arch) -> Self {
    Self { os, arch }
  }

  /// Detect the host platform at runtime
  ///
  /// Returns `None` if the OS or architecture is not supported
  pub fn current() -> Option<Self> {
    Some(Self {
      os: Os::current()?,
      arch: Arch::current()?,
    })
  }

  /// Directory name used for this platform's artifacts (e.g. "linux_amd64")
  pub fn dir_name(&self) -> String {
    format!("{}_{}", self.os, self.arch)
  }

  /// `GOOS`/`GOARCH` overrides selecting this platform
  pub fn env(&self) -> Vec<(String, String)> {
    vec![
      ("GOOS".to_string(), self.os.as_str().to_string()),
      ("GOARCH".to_string(), self.arch.as_str().to_string()),
    ]
  }

  pub fn is_host(&self) -> bool {
    Platform::current() == Some(*self)
  }
}

impl fmt::Display for Platform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.dir_name())
  }
}

impl FromStr for Platform {
  type Err = PlatformError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let (os, arch) = s
      .split_once(['_', '/'])
      .ok_or_else(|| PlatformError::Malformed(s.to_string()))?;
    Ok(Self::new(os.parse()?, arch.parse()?))
  }
}

fn split_list(list: &str) -> impl Iterator<Item = &str> {
  list.split([',', ' ']).map(str::trim).filter(|s| !s.is_empty())
}

/// Select target platforms from the supported set.
///
/// `os_list` and `arch_list` are comma or space separated filters; an empty
/// filter matches everything.
pub fn select(os_list: &str, arch_list: &str) -> Result<Vec<Platform>, PlatformError> {
  let oses = split_list(os_list).map(Os::from_str).collect::<Result<Vec<_>, _>>()?;
  let arches = split_list(arch_list)
    .map(Arch::from_str)
    .collect::<Result<Vec<_>, _>>()?;

  let selected: Vec<Platform> = SUPPORTED
    .iter()
    .filter(|p| oses.is_empty() || oses.contains(&p.os))
    .filter(|p| arches.is_empty() || arches.contains(&p.arch))
    .copied()
    .collect();

  if selected.is_empty() {
    return Err(PlatformError::NoMatch {
      os: os_list.to_string(),
      arch: arch_list.to_string(),
    });
  }
  Ok(selected)
}

use std::fmt;
use std::str::FromStr;

use super::PlatformError;

/// Target operating systems understood by the Go toolchain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Os {
  Linux,
  Darwin,
  Windows,
  FreeBsd,
  NetBsd,
  OpenBsd,
}

impl Os {
  /// Detect the host operating system at runtime
  pub fn current() -> Option<Self> {
    match std::env::consts::OS {
      "linux" => Some(Self::Linux),
      "macos" => Some(Self::Darwin),
      "windows" => Some(Self::Windows),
      "freebsd" => Some(Self::FreeBsd),
      "netbsd" => Some(Self::NetBsd),
      "openbsd" => Some(Self::OpenBsd),
      _ => None,
    }
  }

  /// Returns the `GOOS` identifier for this OS
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Linux => "linux",
      Self::Darwin => "darwin",
      Self::Windows => "windows",
      Self::FreeBsd => "freebsd",
      Self::NetBsd => "netbsd",
      Self::OpenBsd => "openbsd",
    }
  }

  /// Suffix appended to executables built for this OS
  pub fn exe_suffix(&self) -> &'static str {
    match self {
      Self::Windows => ".exe",
      _ => "",
    }
  }
}

impl fmt::Display for Os {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl FromStr for Os {
  type Err = PlatformError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "linux" => Ok(Self::Linux),
      "darwin" | "macos" => Ok(Self::Darwin),
      "windows" => Ok(Self::Windows),
      "freebsd" => Ok(Self::FreeBsd),
      "netbsd" => Ok(Self::NetBsd),
      "openbsd" => Ok(Self::OpenBsd),
      other => Err(PlatformError::UnknownOs(other.to_string())),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn macos_uses_darwin_identifier() {
    assert_eq!(Os::Darwin.as_str(), "darwin");
    assert_eq!("macos".parse::<Os>().unwrap(), Os::Darwin);
  }

  #[test]
  fn only_windows_has_exe_suffix() {
    assert_eq!(Os::Windows.exe_suffix(), ".exe");
    assert_eq!(Os::Linux.exe_suffix(), "");
  }

  #[test]
  fn unknown_os_is_rejected() {
    assert!("plan9".parse::<Os>().is_err());
  }
}

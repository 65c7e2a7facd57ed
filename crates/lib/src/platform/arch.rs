use std::fmt;
use std::str::FromStr;

use super::PlatformError;

/// CPU architecture families understood by the Go toolchain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Arch {
  /// 32-bit x86, `GOARCH=386`
  X86,
  Amd64,
  Arm,
  Arm64,
}

impl Arch {
  /// Detect the host CPU architecture at runtime
  pub fn current() -> Option<Self> {
    match std::env::consts::ARCH {
      "x86" => Some(Self::X86),
      "x86_64" => Some(Self::Amd64),
      "arm" => Some(Self::Arm),
      "aarch64" => Some(Self::Arm64),
      _ => None,
    }
  }

  /// Returns the `GOARCH` identifier for this architecture
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::X86 => "386",
      Self::Amd64 => "amd64",
      Self::Arm => "arm",
      Self::Arm64 => "arm64",
    }
  }
}

impl fmt::Display for Arch {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl FromStr for Arch {
  type Err = PlatformError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "386" | "x86" | "i386" => Ok(Self::X86),
      "amd64" | "x86_64" => Ok(Self::Amd64),
      "arm" => Ok(Self::Arm),
      "arm64" | "aarch64" => Ok(Self::Arm64),
      other => Err(PlatformError::UnknownArch(other.to_string())),
    }
  }
}

//! Checks that a compiled executable targets the expected platform.

use std::path::Path;

use goblin::Object;
use goblin::elf::header::{EM_386, EM_AARCH64, EM_ARM, EM_X86_64};
use goblin::mach::Mach;
use goblin::mach::cputype::{CPU_TYPE_ARM, CPU_TYPE_ARM64, CPU_TYPE_X86, CPU_TYPE_X86_64};
use goblin::pe::header::{COFF_MACHINE_ARM64, COFF_MACHINE_ARMNT, COFF_MACHINE_X86, COFF_MACHINE_X86_64};
use thiserror::Error;
use tracing::debug;

use crate::platform::Platform;
use crate::platform::arch::Arch;
use crate::platform::os::Os;

#[derive(Debug, Error)]
pub enum VerifyError {
  #[error("failed to read binary: {0}")]
  Io(#[from] std::io::Error),

  #[error("failed to parse binary: {0}")]
  Parse(#[from] goblin::error::Error),

  #[error("expected a {expected} executable, found {found}")]
  WrongFormat { expected: &'static str, found: String },

  #[error("expected machine type for {expected}, found {found:#x}")]
  WrongArch { expected: Arch, found: u32 },
}

/// Inspects a produced executable.
pub trait BinaryVerifier {
  fn verify(&self, path: &Path, platform: Platform) -> Result<(), VerifyError>;
}

/// [`BinaryVerifier`] that parses ELF, PE and Mach-O headers.
#[derive(Debug, Default, Clone)]
pub struct ObjectVerifier;

impl BinaryVerifier for ObjectVerifier {
  fn verify(&self, path: &Path, platform: Platform) -> Result<(), VerifyError> {
    let bytes = std::fs::read(path)?;
    verify_bytes(&bytes, platform)?;
    debug!(path = %path.display(), platform = %platform, "binary format verified");
    Ok(())
  }
}

fn expected_format(os: Os) -> &'static str {
  match os {
    Os::Windows => "PE",
    Os::Darwin => "Mach-O",
    _ => "ELF",
  }
}

fn elf_machine(arch: Arch) -> u16 {
  match arch {
    Arch::X86 => EM_386,
    Arch::Amd64 => EM_X86_64,
    Arch::Arm => EM_ARM,
    Arch::Arm64 => EM_AARCH64,
  }
}

fn pe_machine(arch: Arch) -> u16 {
  match arch {
    Arch::X86 => COFF_MACHINE_X86,
    Arch::Amd64 => COFF_MACHINE_X86_64,
    Arch::Arm => COFF_MACHINE_ARMNT,
    Arch::Arm64 => COFF_MACHINE_ARM64,
  }
}

fn mach_cputype(arch: Arch) -> u32 {
  match arch {
    Arch::X86 => CPU_TYPE_X86,
    Arch::Amd64 => CPU_TYPE_X86_64,
    Arch::Arm => CPU_TYPE_ARM,
    Arch::Arm64 => CPU_TYPE_ARM64,
  }
}

/// Verify an in-memory executable image.
pub fn verify_bytes(bytes: &[u8], platform: Platform) -> Result<(), VerifyError> {
  let expected = expected_format(platform.os);
  let wrong_arch = |found: u32| VerifyError::WrongArch {
    expected: platform.arch,
    found,
  };

  match (platform.os, Object::parse(bytes)?) {
    (Os::Windows, Object::PE(pe)) => {
      let machine = pe.header.coff_header.machine;
      if machine != pe_machine(platform.arch) {
        return Err(wrong_arch(machine.into()));
      }
    }
    (Os::Darwin, Object::Mach(Mach::Binary(macho))) => {
      if macho.header.cputype != mach_cputype(platform.arch) {
        return Err(wrong_arch(macho.header.cputype));
      }
    }
    (Os::Darwin, Object::Mach(Mach::Fat(fat))) => {
      let wanted = mach_cputype(platform.arch);
      let arches = fat.arches()?;
      if !arches.iter().any(|arch| arch.cputype == wanted) {
        return Err(wrong_arch(arches.first().map(|arch| arch.cputype).unwrap_or_default()));
      }
    }
    (Os::Windows | Os::Darwin, other) => {
      return Err(VerifyError::WrongFormat {
        expected,
        found: describe(&other).to_string(),
      });
    }
    (_, Object::Elf(elf)) => {
      if elf.header.e_machine != elf_machine(platform.arch) {
        return Err(wrong_arch(elf.header.e_machine.into()));
      }
    }
    (_, other) => {
      return Err(VerifyError::WrongFormat {
        expected,
        found: describe(&other).to_string(),
      });
    }
  }
  Ok(())
}

fn describe(object: &Object<'_>) -> &'static str {
  match object {
    Object::Elf(_) => "ELF",
    Object::PE(_) => "PE",
    Object::Mach(_) => "Mach-O",
    Object::Archive(_) => "archive",
    _ => "unknown format",
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn current_executable_matches_host() {
    let Some(host) = Platform::current() else {
      return;
    };
    let exe = std::env::current_exe().unwrap();
    ObjectVerifier.verify(&exe, host).unwrap();
  }

  #[test]
  fn current_executable_rejects_other_arch() {
    let Some(host) = Platform::current() else {
      return;
    };
    let other = if host.arch == Arch::Amd64 { Arch::Arm } else { Arch::Amd64 };
    let exe = std::env::current_exe().unwrap();

    let err = ObjectVerifier.verify(&exe, Platform::new(host.os, other)).unwrap_err();
    assert!(matches!(err, VerifyError::WrongArch { .. }));
  }

  #[test]
  fn current_executable_rejects_other_format() {
    let Some(host) = Platform::current() else {
      return;
    };
    let other = if host.os == Os::Windows { Os::Linux } else { Os::Windows };
    let exe = std::env::current_exe().unwrap();

    let err = ObjectVerifier.verify(&exe, Platform::new(other, host.arch)).unwrap_err();
    assert!(matches!(err, VerifyError::WrongFormat { .. }));
  }

  #[test]
  fn text_file_is_rejected() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("app");
    std::fs::write(&path, "#!/bin/sh\necho not really a binary\n").unwrap();

    assert!(ObjectVerifier.verify(&path, Platform::new(Os::Linux, Arch::Amd64)).is_err());
  }

  #[test]
  fn missing_file_is_io_error() {
    let temp = TempDir::new().unwrap();
    let err = ObjectVerifier
      .verify(&temp.path().join("missing"), Platform::new(Os::Linux, Arch::Amd64))
      .unwrap_err();
    assert!(matches!(err, VerifyError::Io(_)));
  }
}

//! Naming and location of build outputs.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::platform::Platform;

/// Application name: the final component of the (canonical) working directory.
pub fn app_name(working_dir: &Path) -> String {
  let resolved = dunce::canonicalize(working_dir).unwrap_or_else(|_| working_dir.to_path_buf());
  resolved
    .file_name()
    .map(|name| name.to_string_lossy().into_owned())
    .unwrap_or_else(|| "app".to_string())
}

/// Root directory for all artifacts of `app_name`.
///
/// An explicit `dest_override` wins, resolved against `working_dir` when
/// relative. Otherwise artifacts go to `$GOPATH/bin/<app>-xc` (first `GOPATH`
/// entry), falling back to `<working_dir>/<app>-xc`.
pub fn out_dest_root(app_name: &str, dest_override: &str, working_dir: &Path) -> PathBuf {
  if !dest_override.is_empty() {
    let dest = Path::new(dest_override);
    return if dest.is_absolute() {
      dest.to_path_buf()
    } else {
      working_dir.join(dest)
    };
  }

  let dir_name = format!("{}-xc", app_name);
  let gopath = std::env::var_os("GOPATH").and_then(|value| std::env::split_paths(&value).next());
  match gopath {
    Some(gopath) if !gopath.as_os_str().is_empty() => {
      debug!(gopath = %gopath.display(), "using GOPATH for output root");
      gopath.join("bin").join(dir_name)
    }
    _ => working_dir.join(dir_name),
  }
}

/// `<version>/<os>_<arch>/<name>[.exe]`, relative to the output root.
pub fn relative_bin(platform: Platform, name: &str, version: &str) -> PathBuf {
  PathBuf::from(version)
    .join(platform.dir_name())
    .join(format!("{}{}", name, platform.os.exe_suffix()))
}

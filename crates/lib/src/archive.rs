//! Writing `.tar.gz` and `.zip` archives from a list of files.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;
use thiserror::Error;
use tracing::debug;
use zip::write::SimpleFileOptions;

#[derive(Debug, Error)]
pub enum ArchiveError {
  #[error("failed to write archive {}: {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to write zip archive {}: {source}", path.display())]
  Zip {
    path: PathBuf,
    #[source]
    source: zip::result::ZipError,
  },
}

/// A file on disk and the path it takes inside an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveItem {
  pub fs_path: PathBuf,
  pub archive_path: String,
}

impl ArchiveItem {
  pub fn new(fs_path: impl Into<PathBuf>, archive_path: impl Into<String>) -> Self {
    Self {
      fs_path: fs_path.into(),
      archive_path: archive_path.into(),
    }
  }

  /// Archive path without any leading `/`.
  fn entry_name(&self) -> &str {
    self.archive_path.trim_start_matches('/')
  }
}

/// Write a gzip-compressed tar archive holding `items`.
pub fn write_tar_gz(path: &Path, items: &[ArchiveItem]) -> Result<(), ArchiveError> {
  let io_err = |source| ArchiveError::Io {
    path: path.to_path_buf(),
    source,
  };

  let file = File::create(path).map_err(io_err)?;
  let encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
  let mut builder = tar::Builder::new(encoder);
  builder.mode(tar::HeaderMode::Deterministic);

  for item in items {
    debug!(file = %item.fs_path.display(), entry = item.entry_name(), "adding to tar");
    builder
      .append_path_with_name(&item.fs_path, item.entry_name())
      .map_err(io_err)?;
  }

  let encoder = builder.into_inner().map_err(io_err)?;
  let mut writer = encoder.finish().map_err(io_err)?;
  writer.flush().map_err(io_err)
}

/// Write a deflate-compressed zip archive holding `items`.
pub fn write_zip(path: &Path, items: &[ArchiveItem]) -> Result<(), ArchiveError> {
  let io_err = |source| ArchiveError::Io {
    path: path.to_path_buf(),
    source,
  };
  let zip_err = |source| ArchiveError::Zip {
    path: path.to_path_buf(),
    source,
  };

  let file = File::create(path).map_err(io_err)?;
  let mut writer = zip::ZipWriter::new(BufWriter::new(file));
  let options = SimpleFileOptions::default()
    .compression_method(zip::CompressionMethod::Deflated)
    .unix_permissions(0o755);

  for item in items {
    debug!(file = %item.fs_path.display(), entry = item.entry_name(), "adding to zip");
    writer.start_file(item.entry_name(), options).map_err(zip_err)?;
    let mut source = File::open(&item.fs_path).map_err(io_err)?;
    io::copy(&mut source, &mut writer).map_err(io_err)?;
  }

  let mut inner = writer.finish().map_err(zip_err)?;
  inner.flush().map_err(io_err)
}

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::time::UNIX_EPOCH;

use super::{
  ArError, ArHeader, GID_LEN, GLOBAL_MAGIC, HEADER_LEN, HEADER_TERMINATOR, MODE_LEN, MTIME_LEN, NAME_LEN, SIZE_LEN,
  UID_LEN,
};

/// Writes an `ar` archive member by member.
pub struct ArWriter<W: Write> {
  inner: W,
}

impl<W: Write> ArWriter<W> {
  /// Start a new archive, emitting the global header.
  pub fn new(mut inner: W) -> Result<Self, ArError> {
    inner.write_all(GLOBAL_MAGIC)?;
    Ok(Self { inner })
  }

  /// Append a member. `header.size` must match the content length.
  pub fn append(&mut self, header: &ArHeader, data: &[u8]) -> Result<(), ArError> {
    if header.size != data.len() as u64 {
      return Err(ArError::SizeMismatch {
        declared: header.size,
        actual: data.len() as u64,
      });
    }
    self.inner.write_all(&encode_header(header)?)?;
    self.inner.write_all(data)?;
    if data.len() % 2 == 1 {
      self.inner.write_all(b"\n")?;
    }
    Ok(())
  }

  /// Append the file at `path` under `name`, taking its mtime from the filesystem.
  pub fn append_file(&mut self, name: &str, path: &Path) -> Result<(), ArError> {
    let data = std::fs::read(path)?;
    let mtime = std::fs::metadata(path)?
      .modified()
      .ok()
      .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
      .map(|d| d.as_secs())
      .unwrap_or(0);
    let header = ArHeader::new(name, data.len() as u64).with_mtime(mtime);
    self.append(&header, &data)
  }

  pub fn into_inner(self) -> W {
    self.inner
  }
}

impl ArWriter<File> {
  /// Create (or truncate) an archive file at `path`.
  pub fn create(path: &Path) -> Result<Self, ArError> {
    Self::new(File::create(path)?)
  }

  /// Flush and sync the archive to disk.
  pub fn finish(mut self) -> Result<(), ArError> {
    self.inner.flush()?;
    self.inner.sync_all()?;
    Ok(())
  }
}

fn encode_header(header: &ArHeader) -> Result<[u8; HEADER_LEN], ArError> {
  if header.name.len() > NAME_LEN {
    return Err(ArError::NameTooLong(header.name.clone()));
  }
  if header.name.ends_with(' ') || !header.name.bytes().all(|b| b.is_ascii_graphic() || b == b' ') {
    return Err(ArError::InvalidName(header.name.clone()));
  }

  let mut buf = Vec::with_capacity(HEADER_LEN);
  pad_field(&mut buf, header.name.as_bytes(), NAME_LEN);
  number_field(&mut buf, "mtime", header.mtime, header.mtime.to_string(), MTIME_LEN)?;
  number_field(&mut buf, "uid", header.uid.into(), header.uid.to_string(), UID_LEN)?;
  number_field(&mut buf, "gid", header.gid.into(), header.gid.to_string(), GID_LEN)?;
  number_field(&mut buf, "mode", header.mode.into(), format!("{:o}", header.mode), MODE_LEN)?;
  number_field(&mut buf, "size", header.size, header.size.to_string(), SIZE_LEN)?;
  buf.extend_from_slice(HEADER_TERMINATOR);

  buf
    .try_into()
    .map_err(|_| io::Error::other("member header has the wrong length").into())
}

fn number_field(
  buf: &mut Vec<u8>,
  field: &'static str,
  value: u64,
  text: String,
  width: usize,
) -> Result<(), ArError> {
  if text.len() > width {
    return Err(ArError::FieldOverflow { field, value, width });
  }
  pad_field(buf, text.as_bytes(), width);
  Ok(())
}

fn pad_field(buf: &mut Vec<u8>, value: &[u8], width: usize) {
  buf.extend_from_slice(value);
  buf.resize(buf.len() + width - value.len(), b' ');
}

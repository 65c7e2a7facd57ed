//! Unix `ar` container archives.
//!
//! The format is a global magic string followed by members. Each member is a
//! fixed 60-byte ASCII header and its content, padded to an even offset:
//!
//! | field      | width | encoding |
//! |------------|-------|----------|
//! | name       | 16    | text     |
//! | mtime      | 12    | decimal  |
//! | uid        | 6     | decimal  |
//! | gid        | 6     | decimal  |
//! | mode       | 8     | octal    |
//! | size       | 10    | decimal  |
//! | terminator | 2     | "`\n"    |
//!
//! Go toolchains ship their compiled packages (`runtime.a`) in this format and
//! Debian packages are `ar` archives of three members.

mod reader;
mod writer;

use thiserror::Error;

pub use reader::{ArReader, Members};
pub use writer::ArWriter;

/// Global header at the start of every archive.
pub const GLOBAL_MAGIC: &[u8; 8] = b"!<arch>\n";

/// Size of a member header in bytes.
pub const HEADER_LEN: usize = 60;

/// Terminator closing every member header.
pub const HEADER_TERMINATOR: &[u8; 2] = b"`\n";

pub(crate) const NAME_LEN: usize = 16;
pub(crate) const MTIME_LEN: usize = 12;
pub(crate) const UID_LEN: usize = 6;
pub(crate) const GID_LEN: usize = 6;
pub(crate) const MODE_LEN: usize = 8;
pub(crate) const SIZE_LEN: usize = 10;

#[derive(Debug, Error)]
pub enum ArError {
  #[error("not an ar archive: bad global header")]
  BadMagic,

  #[error("truncated member header ({0} of 60 bytes)")]
  TruncatedHeader(usize),

  #[error("member header is missing its terminator")]
  BadTerminator,

  #[error("invalid {field} field in member header: {value:?}")]
  InvalidField { field: &'static str, value: String },

  #[error("member name '{0}' is longer than 16 bytes")]
  NameTooLong(String),

  #[error("member name {0:?} must be printable ASCII without trailing spaces")]
  InvalidName(String),

  #[error("value {value} does not fit the {width}-byte {field} field")]
  FieldOverflow {
    field: &'static str,
    value: u64,
    width: usize,
  },

  #[error("member content is {actual} bytes but the header declares {declared}")]
  SizeMismatch { declared: u64, actual: u64 },

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

/// Metadata of one archive member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArHeader {
  pub name: String,
  pub mtime: u64,
  pub uid: u32,
  pub gid: u32,
  pub mode: u32,
  pub size: u64,
}

impl ArHeader {
  /// Header for a regular file owned by root with mode 0644.
  pub fn new(name: impl Into<String>, size: u64) -> Self {
    Self {
      name: name.into(),
      mtime: 0,
      uid: 0,
      gid: 0,
      mode: 0o100644,
      size,
    }
  }

  pub fn with_mtime(mut self, mtime: u64) -> Self {
    self.mtime = mtime;
    self
  }
}

/// A fully read archive member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArMember {
  pub header: ArHeader,
  pub data: Vec<u8>,
}

impl ArMember {
  pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
    Self {
      header: ArHeader::new(name, data.len() as u64),
      data,
    }
  }
}

/// Encode a member sequence into a complete archive.
pub fn encode(members: &[ArMember]) -> Result<Vec<u8>, ArError> {
  let mut writer = ArWriter::new(Vec::new())?;
  for member in members {
    writer.append(&member.header, &member.data)?;
  }
  Ok(writer.into_inner())
}

/// Decode every member of an in-memory archive.
pub fn decode(bytes: &[u8]) -> Result<Vec<ArMember>, ArError> {
  ArReader::new(std::io::Cursor::new(bytes))?.members().collect()
}

use std::io::{self, Read, Seek, SeekFrom};

use super::{
  ArError, ArHeader, ArMember, GID_LEN, GLOBAL_MAGIC, HEADER_LEN, HEADER_TERMINATOR, MODE_LEN, MTIME_LEN, NAME_LEN,
  SIZE_LEN, UID_LEN,
};

/// Streaming reader over the members of an `ar` archive.
///
/// After [`next_header`](Self::next_header) returns a member, the reader
/// itself implements [`Read`] bounded to that member's content. Any unread
/// content is skipped on the next call.
pub struct ArReader<R> {
  inner: R,
  remaining: u64,
  pad: u64,
  /// Bytes consumed since the end of the global header.
  consumed: u64,
}

impl<R: Read> ArReader<R> {
  /// Wrap `inner`, consuming and checking the global header.
  pub fn new(mut inner: R) -> Result<Self, ArError> {
    let mut magic = [0u8; 8];
    let n = read_full(&mut inner, &mut magic)?;
    if n != magic.len() || &magic != GLOBAL_MAGIC {
      return Err(ArError::BadMagic);
    }
    Ok(Self {
      inner,
      remaining: 0,
      pad: 0,
      consumed: 0,
    })
  }

  /// Advance to the next member, returning `None` at the end of the archive.
  pub fn next_header(&mut self) -> Result<Option<ArHeader>, ArError> {
    self.skip_rest()?;

    let mut buf = [0u8; HEADER_LEN];
    let n = read_full(&mut self.inner, &mut buf)?;
    self.consumed += n as u64;
    if n == 0 {
      return Ok(None);
    }
    if n < HEADER_LEN {
      return Err(ArError::TruncatedHeader(n));
    }

    let header = parse_header(&buf)?;
    self.remaining = header.size;
    self.pad = header.size % 2;
    Ok(Some(header))
  }

  /// Read at most `max` bytes of the current member as (lossy) UTF-8 text.
  pub fn read_string(&mut self, max: usize) -> Result<String, ArError> {
    let mut buf = Vec::with_capacity(max);
    self.by_ref().take(max as u64).read_to_end(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
  }

  /// Consume this reader into an iterator of complete members.
  pub fn members(self) -> Members<R> {
    Members {
      reader: self,
      done: false,
    }
  }

  pub fn into_inner(self) -> R {
    self.inner
  }

  fn read_content(&mut self, size: u64) -> Result<Vec<u8>, ArError> {
    let mut data = Vec::new();
    self.read_to_end(&mut data)?;
    if data.len() as u64 != size {
      return Err(ArError::SizeMismatch {
        declared: size,
        actual: data.len() as u64,
      });
    }
    Ok(data)
  }

  fn skip_rest(&mut self) -> Result<(), ArError> {
    if self.remaining > 0 {
      let remaining = self.remaining;
      let skipped = io::copy(&mut (&mut self.inner).take(remaining), &mut io::sink())?;
      self.consumed += skipped;
      if skipped < remaining {
        return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
      }
      self.remaining = 0;
    }
    if self.pad > 0 {
      // Some writers omit the pad byte after the final member.
      let mut pad = [0u8; 1];
      self.consumed += read_full(&mut self.inner, &mut pad)? as u64;
      self.pad = 0;
    }
    Ok(())
  }
}

impl<R: Read + Seek> ArReader<R> {
  /// Return to the first member, wherever the archive starts in the stream.
  pub fn rewind(&mut self) -> Result<(), ArError> {
    let back = i64::try_from(self.consumed).map_err(io::Error::other)?;
    self.inner.seek(SeekFrom::Current(-back))?;
    self.remaining = 0;
    self.pad = 0;
    self.consumed = 0;
    Ok(())
  }
}

impl<R: Read> Read for ArReader<R> {
  fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
    if self.remaining == 0 || buf.is_empty() {
      return Ok(0);
    }
    let max = buf.len().min(usize::try_from(self.remaining).unwrap_or(usize::MAX));
    let n = self.inner.read(&mut buf[..max])?;
    self.remaining -= n as u64;
    self.consumed += n as u64;
    Ok(n)
  }
}

/// Iterator over complete archive members.
///
/// The sequence is finite; it ends after the last member or the first error.
/// When the source is seekable it can be restarted with [`Members::rewind`].
pub struct Members<R> {
  reader: ArReader<R>,
  done: bool,
}

impl<R: Read + Seek> Members<R> {
  pub fn rewind(&mut self) -> Result<(), ArError> {
    self.reader.rewind()?;
    self.done = false;
    Ok(())
  }
}

impl<R: Read> Iterator for Members<R> {
  type Item = Result<ArMember, ArError>;

  fn next(&mut self) -> Option<Self::Item> {
    if self.done {
      return None;
    }
    let result = match self.reader.next_header() {
      Ok(None) => None,
      Ok(Some(header)) => Some(
        self
          .reader
          .read_content(header.size)
          .map(|data| ArMember { header, data }),
      ),
      Err(e) => Some(Err(e)),
    };
    if !matches!(result, Some(Ok(_))) {
      self.done = true;
    }
    result
  }
}

fn parse_header(buf: &[u8; HEADER_LEN]) -> Result<ArHeader, ArError> {
  if &buf[HEADER_LEN - HEADER_TERMINATOR.len()..] != HEADER_TERMINATOR {
    return Err(ArError::BadTerminator);
  }

  let mut offset = 0;
  let [name, mtime, uid, gid, mode, size] = [NAME_LEN, MTIME_LEN, UID_LEN, GID_LEN, MODE_LEN, SIZE_LEN].map(|len| {
    let range = offset..offset + len;
    offset += len;
    range
  });

  let name = String::from_utf8_lossy(&buf[name]).trim_end_matches(' ').to_string();
  let mtime = parse_number(&buf[mtime], "mtime", 10)?;
  let uid = parse_number(&buf[uid], "uid", 10)?;
  let gid = parse_number(&buf[gid], "gid", 10)?;
  let mode = parse_number(&buf[mode], "mode", 8)?;
  let size = parse_number(&buf[size], "size", 10)?;

  Ok(ArHeader {
    name,
    mtime,
    uid: narrow(uid, "uid")?,
    gid: narrow(gid, "gid")?,
    mode: narrow(mode, "mode")?,
    size,
  })
}

fn parse_number(raw: &[u8], field: &'static str, radix: u32) -> Result<u64, ArError> {
  let invalid = || ArError::InvalidField {
    field,
    value: String::from_utf8_lossy(raw).into_owned(),
  };
  let text = std::str::from_utf8(raw).map_err(|_| invalid())?.trim();
  if text.is_empty() {
    return Ok(0);
  }
  u64::from_str_radix(text, radix).map_err(|_| invalid())
}

fn narrow(value: u64, field: &'static str) -> Result<u32, ArError> {
  u32::try_from(value).map_err(|_| ArError::InvalidField {
    field,
    value: value.to_string(),
  })
}

/// Fill `buf` as far as the source allows, returning the number of bytes read.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
  let mut filled = 0;
  while filled < buf.len() {
    match reader.read(&mut buf[filled..]) {
      Ok(0) => break,
      Ok(n) => filled += n,
      Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
      Err(e) => return Err(e),
    }
  }
  Ok(filled)
}

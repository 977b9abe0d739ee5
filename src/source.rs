//! Where the parsers get their bytes from.
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::util;

/// Opens files named inside other files, e.g. the `.mtl` libraries named by
/// `mtllib`. Paths arrive already resolved against the referring file's
/// base path.
pub trait ResourceLoader {
  /// Returns the full contents of `path`.
  fn load(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// Reads straight from disk.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileSystem;

impl ResourceLoader for FileSystem {
  fn load(&self, path: &Path) -> io::Result<Vec<u8>> {
    fs::read(path)
  }
}

/// Serves files from memory, keyed by their resolved path.
impl ResourceLoader for HashMap<PathBuf, Vec<u8>> {
  fn load(&self, path: &Path) -> io::Result<Vec<u8>> {
    self.get(path).cloned().ok_or_else(|| {
      io::Error::new(
        io::ErrorKind::NotFound,
        format!("no resource named `{}`", path.display()),
      )
    })
  }
}

impl<L: ResourceLoader + ?Sized> ResourceLoader for &L {
  fn load(&self, path: &Path) -> io::Result<Vec<u8>> {
    (**self).load(path)
  }
}

/// A named, fully buffered input with a read position.
#[derive(Clone, Debug)]
pub struct Source {
  filename: String,
  data: Vec<u8>,
  position: usize,
}

impl Source {
  /// Wraps bytes that are already in memory.
  pub fn new<S: Into<String>>(filename: S, data: Vec<u8>) -> Source {
    Source {
      filename: filename.into(),
      data,
      position: 0,
    }
  }

  /// Reads `path` through `loader`.
  pub fn load<L: ResourceLoader>(loader: &L, path: &Path) -> Result<Source, Error> {
    let data = loader.load(path).map_err(|source| Error::Io {
      path: path.to_path_buf(),
      source,
    })?;
    Ok(Source::new(path.to_string_lossy(), data))
  }

  /// Reads `path` from disk.
  pub fn open<P: AsRef<Path>>(path: P) -> Result<Source, Error> {
    Source::load(&FileSystem, path.as_ref())
  }

  /// The name used in diagnostics.
  pub fn filename(&self) -> &str {
    &self.filename
  }

  /// The directory relative to which names inside this source resolve.
  pub fn directory(&self) -> PathBuf {
    util::parent(Path::new(&self.filename))
  }

  /// The whole buffer, including bytes before the read position.
  pub fn data(&self) -> &[u8] {
    &self.data
  }

  /// Offset of the first unread byte.
  pub fn position(&self) -> usize {
    self.position
  }

  /// Moves the read position, clamped to the buffer length.
  pub fn set_position(&mut self, position: usize) {
    self.position = position.min(self.data.len());
  }

  /// The unread part of the buffer.
  pub fn remaining(&self) -> &[u8] {
    &self.data[self.position..]
  }
}

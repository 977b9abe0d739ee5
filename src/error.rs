use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::lex::ParseError;

/// Everything that can stop a parse.
///
/// Parsing is not transactional: after any of these the parser's output
/// is partially filled and should not be used.
#[derive(Debug, Error)]
pub enum Error {
  /// Malformed content in an `.obj` or `.mtl` file.
  #[error(transparent)]
  Parse(#[from] ParseError),
  /// A file, typically one named by `mtllib`, could not be read.
  #[error("failed to read `{}`: {source}", .path.display())]
  Io {
    /// The resolved path that was opened.
    path: PathBuf,
    /// The underlying failure.
    #[source]
    source: io::Error,
  },
  /// The input is larger than the 4GB the parser can address.
  #[error("cannot parse {len} bytes of input, the limit is 4GB")]
  InputTooLarge {
    /// Size of the rejected input in bytes.
    len: usize,
  },
}

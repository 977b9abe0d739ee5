//! Byte cursor and hand-rolled numeral scanning for the `.obj` reader.
//!
//! Geometry files are dominated by numbers, so integers and floats are
//! accumulated digit by digit straight out of the buffer instead of being
//! sliced into tokens and handed to a general purpose parser.

/// What the scanner wanted when it hit something else.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ScanError {
  pub(crate) expected: &'static str,
  pub(crate) found: Option<u8>,
}

impl ScanError {
  pub(crate) fn describe(&self) -> String {
    match self.found {
      None => format!("Expected {} but got end of input.", self.expected),
      Some(b'\n') | Some(b'\r') => format!("Expected {} but got end of line.", self.expected),
      Some(c) => format!("Expected {} but got `{}`.", self.expected, c.escape_ascii()),
    }
  }
}

/// Fraction digits past this many no longer change an `f32`.
const MAX_FRACTION_MAGNITUDE: u64 = 1_000_000_000_000_000_000;

#[derive(Clone, Debug)]
pub(crate) struct Cursor<'a> {
  buffer: &'a [u8],
  position: usize,
  line_number: usize,
}

impl<'a> Cursor<'a> {
  pub(crate) fn new(buffer: &'a [u8]) -> Cursor<'a> {
    Cursor {
      buffer,
      position: 0,
      line_number: 1,
    }
  }

  /// Line of the next unread character, starting from 1.
  #[inline]
  pub(crate) fn line_number(&self) -> usize {
    self.line_number
  }

  #[inline]
  pub(crate) fn is_at_end(&self) -> bool {
    self.position >= self.buffer.len()
  }

  #[inline]
  pub(crate) fn peek(&self) -> Option<u8> {
    self.buffer.get(self.position).copied()
  }

  #[inline]
  pub(crate) fn consume(&mut self) {
    self.position += 1;
  }

  #[inline]
  pub(crate) fn advance(&mut self, n: usize) {
    self.position = (self.position + n).min(self.buffer.len());
  }

  #[inline]
  pub(crate) fn starts_with(&self, prefix: &[u8]) -> bool {
    self.buffer[self.position.min(self.buffer.len())..].starts_with(prefix)
  }

  /// True for a space or tab under the cursor, never for a newline.
  #[inline]
  pub(crate) fn at_space(&self) -> bool {
    matches!(self.peek(), Some(b' ') | Some(b'\t'))
  }

  fn peek_digit(&self) -> Option<u8> {
    match self.peek() {
      Some(c) if c.is_ascii_digit() => Some(c - b'0'),
      _ => None,
    }
  }

  /// Consumes one `\n`, `\r`, `\r\n` or `\n\r` and counts a single line.
  fn consume_newline(&mut self, c: u8) {
    self.consume();
    self.line_number += 1;
    if let Some(next) = self.peek() {
      if next != c && (next == b'\r' || next == b'\n') {
        self.consume();
      }
    }
  }

  /// Skips spaces, tabs, comments and newlines. Leaves the cursor on the
  /// first significant character and returns true if a line ending was
  /// crossed or the end of input was reached.
  pub(crate) fn skip_whitespace(&mut self) -> bool {
    let mut changed_lines = false;

    while let Some(c) = self.peek() {
      match c {
        b'\n' | b'\r' => {
          self.consume_newline(c);
          changed_lines = true;
        }
        b' ' | b'\t' => self.consume(),
        // The newline ending the comment is picked up on the next pass.
        b'#' => self.skip_line(),
        _ => return changed_lines,
      }
    }

    true
  }

  /// Skips spaces and tabs only.
  pub(crate) fn skip_spaces(&mut self) {
    while self.at_space() {
      self.consume();
    }
  }

  /// Moves to the end of the line without consuming the newline.
  pub(crate) fn skip_line(&mut self) {
    while let Some(c) = self.peek() {
      if c == b'\r' || c == b'\n' {
        break;
      }
      self.consume();
    }
  }

  /// Returns the rest of the line, leaving the newline unread.
  pub(crate) fn read_until_newline(&mut self) -> &'a [u8] {
    let start = self.position.min(self.buffer.len());
    self.skip_line();
    &self.buffer[start..self.position]
  }

  fn read_sign(&mut self) -> bool {
    match self.peek() {
      Some(b'-') => {
        self.consume();
        true
      }
      Some(b'+') => {
        self.consume();
        false
      }
      _ => false,
    }
  }

  fn read_unsigned(&mut self) -> Result<u64, ScanError> {
    let mut value = match self.peek_digit() {
      Some(d) => u64::from(d),
      None => {
        return Err(ScanError {
          expected: "a digit",
          found: self.peek(),
        })
      }
    };
    self.consume();

    while let Some(d) = self.peek_digit() {
      value = value
        .checked_mul(10)
        .and_then(|v| v.checked_add(u64::from(d)))
        .ok_or(ScanError {
          expected: "an integer that fits in 64 bits",
          found: Some(d + b'0'),
        })?;
      self.consume();
    }

    Ok(value)
  }

  /// Reads `[+-]digits`. The cursor is left on the first character that is
  /// not part of the numeral.
  pub(crate) fn read_int(&mut self) -> Result<i64, ScanError> {
    let negative = self.read_sign();
    let magnitude = self.read_unsigned()?;
    let value = i64::try_from(magnitude).map_err(|_| ScanError {
      expected: "an integer that fits in 64 bits",
      found: self.peek(),
    })?;
    Ok(if negative { -value } else { value })
  }

  /// Reads `[+-]digits[.digits][(e|E)[+-]digits]`. At least one digit must
  /// appear before the exponent.
  pub(crate) fn read_float(&mut self) -> Result<f32, ScanError> {
    let negative = self.read_sign();
    let mut digits = 0usize;
    let mut value = 0f64;

    while let Some(d) = self.peek_digit() {
      value = value * 10.0 + f64::from(d);
      digits += 1;
      self.consume();
    }

    if self.peek() == Some(b'.') {
      self.consume();

      let mut fraction = 0u64;
      let mut magnitude = 1u64;
      while let Some(d) = self.peek_digit() {
        if magnitude < MAX_FRACTION_MAGNITUDE {
          fraction = fraction * 10 + u64::from(d);
          magnitude *= 10;
        }
        digits += 1;
        self.consume();
      }

      value += fraction as f64 / magnitude as f64;
    }

    if digits == 0 {
      return Err(ScanError {
        expected: "a number",
        found: self.peek(),
      });
    }

    if let Some(b'e') | Some(b'E') = self.peek() {
      self.consume();
      let exponent = self.read_int()?.clamp(-400, 400) as i32;
      value *= 10f64.powi(exponent);
    }

    let value = if negative { -value } else { value };
    Ok(value as f32)
  }
}

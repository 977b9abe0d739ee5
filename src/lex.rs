//! A small line-aware tokenizer for `.mtl` files, plus the error type shared
//! by both parsers.
use thiserror::Error;

/// A malformed line in an `.obj` or `.mtl` file.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{filename}:{line_number}: {message}")]
pub struct ParseError {
  /// The file being parsed, as given to the parser.
  pub filename: String,
  /// The line the error was found on, starting from 1.
  pub line_number: usize,
  /// What the parser expected to find.
  pub message: String,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Token<'a> {
  Symbol(&'a str),
  Number(&'a str),
  Newline,
  End,
}

impl<'a> Token<'a> {
  fn describe(&self) -> String {
    match *self {
      Token::Symbol(s) | Token::Number(s) => format!("`{}`", s),
      Token::Newline => "end of line".to_owned(),
      Token::End => "end of input".to_owned(),
    }
  }
}

/// Splits input into whitespace separated words, `#` comments and newline
/// tokens. `\r\n` and `\n\r` pairs produce one newline.
#[derive(Clone, Debug)]
pub(crate) struct Lexer<'a> {
  input: &'a str,
  filename: &'a str,
  position: usize,
  line_number: usize,
}

fn looks_numeric(word: &str) -> bool {
  let bytes = word.as_bytes();
  let bytes = match bytes.first() {
    Some(b'+') | Some(b'-') => &bytes[1..],
    _ => bytes,
  };
  let bytes = match bytes.first() {
    Some(b'.') => &bytes[1..],
    _ => bytes,
  };
  bytes.first().map_or(false, u8::is_ascii_digit)
}

impl<'a> Lexer<'a> {
  pub(crate) fn new(input: &'a str, filename: &'a str) -> Lexer<'a> {
    Lexer {
      input,
      filename,
      position: 0,
      line_number: 1,
    }
  }

  pub(crate) fn line_number(&self) -> usize {
    self.line_number
  }

  pub(crate) fn filename(&self) -> &'a str {
    self.filename
  }

  pub(crate) fn error_raw(&self, message: String) -> ParseError {
    ParseError {
      filename: self.filename.to_owned(),
      line_number: self.line_number,
      message,
    }
  }

  pub(crate) fn error<A, E>(&self, message: E) -> Result<A, ParseError>
  where
    E: Into<String>,
  {
    Err(self.error_raw(message.into()))
  }

  pub(crate) fn next_token(&mut self) -> Token<'a> {
    let bytes = self.input.as_bytes();

    loop {
      match bytes.get(self.position) {
        None => return Token::End,
        Some(b' ') | Some(b'\t') => self.position += 1,
        Some(b'#') => {
          while let Some(&c) = bytes.get(self.position) {
            if c == b'\r' || c == b'\n' {
              break;
            }
            self.position += 1;
          }
        }
        Some(&c) if c == b'\r' || c == b'\n' => {
          self.position += 1;
          self.line_number += 1;
          if let Some(&next) = bytes.get(self.position) {
            if next != c && (next == b'\r' || next == b'\n') {
              self.position += 1;
            }
          }
          return Token::Newline;
        }
        Some(_) => break,
      }
    }

    let start = self.position;
    while let Some(&c) = bytes.get(self.position) {
      if matches!(c, b' ' | b'\t' | b'\r' | b'\n') {
        break;
      }
      self.position += 1;
    }

    let word = &self.input[start..self.position];
    if looks_numeric(word) {
      Token::Number(word)
    } else {
      Token::Symbol(word)
    }
  }

  pub(crate) fn peek(&self) -> Token<'a> {
    self.clone().next_token()
  }

  pub(crate) fn read_symbol(&mut self) -> Result<&'a str, ParseError> {
    match self.next_token() {
      Token::Symbol(s) => Ok(s),
      t => self.error(format!("Expected a symbol but got {}.", t.describe())),
    }
  }

  pub(crate) fn read_number(&mut self) -> Result<f32, ParseError> {
    match self.next_token() {
      Token::Number(s) => {
        lexical::parse(s).map_err(|_| self.error_raw(format!("Expected f32 but got `{}`.", s)))
      }
      t => self.error(format!("Expected a number but got {}.", t.describe())),
    }
  }

  pub(crate) fn read_integer(&mut self) -> Result<i32, ParseError> {
    match self.next_token() {
      Token::Number(s) => {
        lexical::parse(s).map_err(|_| self.error_raw(format!("Expected i32 but got `{}`.", s)))
      }
      t => self.error(format!("Expected an integer but got {}.", t.describe())),
    }
  }

  /// Everything up to the next line ending, which is left unread. Comment
  /// characters are kept, so names and paths may contain `#`.
  pub(crate) fn read_until_newline(&mut self) -> &'a str {
    let start = self.position;
    let rest = &self.input[start..];
    let len = rest.find(|c: char| c == '\r' || c == '\n').unwrap_or(rest.len());
    self.position += len;
    &rest[..len]
  }

  /// Discards tokens through the end of the current line.
  pub(crate) fn skip_line(&mut self) {
    loop {
      match self.next_token() {
        Token::Newline | Token::End => break,
        _ => {}
      }
    }
  }
}

#[test]
fn test_tokens() {
  let mut lexer = Lexer::new("Kd 1 -0.5 .25 # trailing\r\n\nmap_Kd -bm x", "t.mtl");
  assert_eq!(lexer.next_token(), Token::Symbol("Kd"));
  assert_eq!(lexer.next_token(), Token::Number("1"));
  assert_eq!(lexer.next_token(), Token::Number("-0.5"));
  assert_eq!(lexer.next_token(), Token::Number(".25"));
  assert_eq!(lexer.next_token(), Token::Newline);
  assert_eq!(lexer.line_number(), 2);
  assert_eq!(lexer.next_token(), Token::Newline);
  assert_eq!(lexer.line_number(), 3);
  assert_eq!(lexer.peek(), Token::Symbol("map_Kd"));
  assert_eq!(lexer.next_token(), Token::Symbol("map_Kd"));
  assert_eq!(lexer.next_token(), Token::Symbol("-bm"));
  assert_eq!(lexer.next_token(), Token::Symbol("x"));
  assert_eq!(lexer.next_token(), Token::End);
  assert_eq!(lexer.next_token(), Token::End);
}

#[test]
fn test_read_number() {
  let mut lexer = Lexer::new("0.5 2 abc 1.2.3", "t.mtl");
  assert_eq!(lexer.read_number(), Ok(0.5));
  assert_eq!(lexer.read_integer(), Ok(2));

  let err = lexer.read_number().unwrap_err();
  assert_eq!(err.filename, "t.mtl");
  assert_eq!(err.line_number, 1);
  assert_eq!(err.message, "Expected a number but got `abc`.");

  assert!(lexer.read_number().is_err());
}

#[test]
fn test_read_until_newline() {
  let mut lexer = Lexer::new("newmtl  my material # not a comment \nKa", "t.mtl");
  assert_eq!(lexer.read_symbol(), Ok("newmtl"));
  assert_eq!(lexer.read_until_newline(), "  my material # not a comment ");
  assert_eq!(lexer.next_token(), Token::Newline);
  assert_eq!(lexer.read_symbol(), Ok("Ka"));
}

#[test]
fn test_parse_error_display() {
  let err = ParseError {
    filename: "scene.obj".to_owned(),
    line_number: 12,
    message: "Expected a digit but got `x`.".to_owned(),
  };
  assert_eq!(err.to_string(), "scene.obj:12: Expected a digit but got `x`.");
}

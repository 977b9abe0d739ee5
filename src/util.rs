use std::cmp::Ordering;
use std::path::{Path, PathBuf};

pub(crate) trait OrderingExt {
  /// Chains a second comparison, only evaluated when `self` is `Equal`.
  fn lexico<F: FnOnce() -> Ordering>(self, f: F) -> Ordering;
}

impl OrderingExt for Ordering {
  #[inline]
  fn lexico<F: FnOnce() -> Ordering>(self, f: F) -> Ordering {
    match self {
      Ordering::Equal => f(),
      o => o,
    }
  }
}

pub(crate) fn fuzzy_cmp(a: f32, b: f32, delta: f32) -> Ordering {
  if (a - b).abs() <= delta {
    Ordering::Equal
  } else if a < b {
    Ordering::Less
  } else {
    Ordering::Greater
  }
}

/// Resolves `name` against `base`. An empty base leaves the name untouched.
pub(crate) fn concat(base: &Path, name: &str) -> PathBuf {
  if base.as_os_str().is_empty() {
    PathBuf::from(name)
  } else {
    base.join(name)
  }
}

/// The directory containing `path`, or the empty path.
pub(crate) fn parent(path: &Path) -> PathBuf {
  path.parent().map(Path::to_path_buf).unwrap_or_default()
}

/// Texture references are library-relative even when written `/foo.png`.
pub(crate) fn remove_leading_slash(s: &str) -> &str {
  match s.as_bytes().first() {
    Some(b'/') | Some(b'\\') => &s[1..],
    _ => s,
  }
}

#[test]
fn test_lexico() {
  assert_eq!(Ordering::Equal.lexico(|| Ordering::Less), Ordering::Less);
  assert_eq!(Ordering::Greater.lexico(|| Ordering::Less), Ordering::Greater);
}

#[test]
fn test_fuzzy_cmp() {
  assert_eq!(fuzzy_cmp(1.0, 1.000001, 0.00001), Ordering::Equal);
  assert_eq!(fuzzy_cmp(1.0, 2.0, 0.00001), Ordering::Less);
  assert_eq!(fuzzy_cmp(2.0, 1.0, 0.00001), Ordering::Greater);
}

#[test]
fn test_concat() {
  assert_eq!(concat(Path::new(""), "a.mtl"), PathBuf::from("a.mtl"));
  assert_eq!(concat(Path::new("models"), "a.mtl"), Path::new("models").join("a.mtl"));
  assert_eq!(parent(Path::new("models/a.mtl")), PathBuf::from("models"));
  assert_eq!(parent(Path::new("a.mtl")), PathBuf::from(""));
}

#[test]
fn test_remove_leading_slash() {
  assert_eq!(remove_leading_slash("/tex/a.png"), "tex/a.png");
  assert_eq!(remove_leading_slash("\\a.png"), "a.png");
  assert_eq!(remove_leading_slash("a.png"), "a.png");
  assert_eq!(remove_leading_slash(""), "");
}

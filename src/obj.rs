//! A parser for Wavefront's `.obj` file format for storing 3D meshes.
//!
//! Geometry files routinely run to hundreds of megabytes, so this does not
//! tokenize. A small automaton classifies each line from its first bytes and
//! the numbers are scanned straight out of the buffer.
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::{debug, trace};
use smallvec::SmallVec;

use crate::context::Context;
use crate::error::Error;
use crate::lex::ParseError;
use crate::mtl::{Material, MaterialKey, MaterialLibrary};
use crate::scan::{Cursor, ScanError};
use crate::source::{FileSystem, ResourceLoader, Source};
use crate::util::{self, fuzzy_cmp, OrderingExt};

/// Inputs longer than this are rejected before parsing starts.
pub const MAX_INPUT_LEN: usize = u32::MAX as usize;

/// A position or a normal.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, Default)]
pub struct Vector3 {
  pub x: f32,
  pub y: f32,
  pub z: f32,
}

/// A texture coordinate. `(0, 0)` is the lower-left corner of the image.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, Default)]
pub struct Vector2 {
  pub x: f32,
  pub y: f32,
}

impl Vector3 {
  /// A vector from its components.
  pub const fn new(x: f32, y: f32, z: f32) -> Vector3 {
    Vector3 { x, y, z }
  }
}

impl Vector2 {
  /// A vector from its components.
  pub const fn new(x: f32, y: f32) -> Vector2 {
    Vector2 { x, y }
  }
}

impl PartialEq for Vector3 {
  fn eq(&self, other: &Vector3) -> bool {
    self.partial_cmp(other) == Some(Ordering::Equal)
  }
}

impl PartialOrd for Vector3 {
  fn partial_cmp(&self, other: &Vector3) -> Option<Ordering> {
    Some(
      fuzzy_cmp(self.x, other.x, 0.00001)
        .lexico(|| fuzzy_cmp(self.y, other.y, 0.00001))
        .lexico(|| fuzzy_cmp(self.z, other.z, 0.00001)),
    )
  }
}

impl PartialEq for Vector2 {
  fn eq(&self, other: &Vector2) -> bool {
    self.partial_cmp(other) == Some(Ordering::Equal)
  }
}

impl PartialOrd for Vector2 {
  fn partial_cmp(&self, other: &Vector2) -> Option<Ordering> {
    Some(fuzzy_cmp(self.x, other.x, 0.00001).lexico(|| fuzzy_cmp(self.y, other.y, 0.00001)))
  }
}

/// One corner of a face. OBJ indexes every attribute separately, so each
/// array gets its own 0-based index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Index {
  /// Into `vertices`.
  pub vertex: usize,
  /// Into `tex_coords0`, and `tex_coords1` when that is filled.
  pub tex_coord: Option<usize>,
  /// Into `normals`.
  pub normal: Option<usize>,
}

impl Index {
  /// A corner with only a position.
  pub const fn vertex(vertex: usize) -> Index {
    Index {
      vertex,
      tex_coord: None,
      normal: None,
    }
  }
}

/// A polygon of any size. Five corners are stored inline since nearly every
/// face is a triangle or a quad.
pub type Face = SmallVec<[Index; 5]>;

/// Turns an index as written in the file into a 0-based one. Positive
/// indices count from 1, zero and negative ones count back from `len`, the
/// size of the array when the face was read. `None` if a relative index
/// reaches before the start of the array.
pub fn resolve_index(raw: i64, len: usize) -> Option<usize> {
  if raw > 0 {
    usize::try_from(raw - 1).ok()
  } else {
    let back = usize::try_from(raw.unsigned_abs()).ok()?;
    len.checked_sub(back)
  }
}

/// The faces of one group that share a material.
#[derive(Clone, Debug, PartialEq)]
pub struct Mesh {
  /// Key into the parser's material library.
  pub material: MaterialKey,
  /// Faces in file order.
  pub faces: Vec<Face>,
}

/// A set of faces named by a `g` line, split up by material.
#[derive(Clone, Debug, PartialEq)]
pub struct Group {
  /// The name given to `g`, or `default`.
  pub name: String,
  meshes: Vec<Mesh>,
  mesh_table: HashMap<MaterialKey, usize>,
}

impl Group {
  pub(crate) fn new(name: String) -> Group {
    Group {
      name,
      meshes: Vec::new(),
      mesh_table: HashMap::new(),
    }
  }

  /// Meshes in the order their materials were first used in this group.
  pub fn meshes(&self) -> &[Mesh] {
    &self.meshes
  }

  /// The mesh holding this group's faces for `material`.
  pub fn mesh(&self, material: MaterialKey) -> Option<&Mesh> {
    self.mesh_table.get(&material).map(|&i| &self.meshes[i])
  }

  /// Total number of faces across all meshes.
  pub fn face_count(&self) -> usize {
    self.meshes.iter().map(|m| m.faces.len()).sum()
  }

  pub(crate) fn mesh_index(&mut self, material: MaterialKey) -> usize {
    if let Some(&i) = self.mesh_table.get(&material) {
      return i;
    }
    self.meshes.push(Mesh {
      material,
      faces: Vec::new(),
    });
    let i = self.meshes.len() - 1;
    self.mesh_table.insert(material, i);
    i
  }

  pub(crate) fn push_face(&mut self, mesh: usize, face: Face) {
    self.meshes[mesh].faces.push(face);
  }
}

/// How to fill the second texture coordinate channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TexCoord1Mode {
  /// Leave `tex_coords1` empty.
  None,
  /// Decode a third `vt` component packed on a 2048 x 2048 grid.
  UnpackFromTexCoord0Z,
  /// Read a third and fourth `vt` component as the second channel.
  TexCoord0ZW,
}

impl Default for TexCoord1Mode {
  fn default() -> TexCoord1Mode {
    TexCoord1Mode::None
  }
}

/// Knobs for [`ObjParser`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ObjOptions {
  /// Source of the second texture coordinate channel.
  pub tex_coord1_mode: TexCoord1Mode,
  /// Log a progress line every this many lines. Zero disables it.
  pub progress_interval: usize,
}

impl Default for ObjOptions {
  fn default() -> ObjOptions {
    ObjOptions {
      tex_coord1_mode: TexCoord1Mode::None,
      progress_interval: 100_000,
    }
  }
}

const PACK_GRID: f32 = 2048.0;

fn unpack_tex_coord1(w: f32) -> Vector2 {
  let high = (w / (2.0 * PACK_GRID)).floor();
  Vector2 {
    x: high / PACK_GRID,
    y: (w - 2.0 * PACK_GRID * high) / PACK_GRID,
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Command {
  MtlLib,
  Group,
  UseMtl,
  Vertex,
  TexCoord,
  Normal,
  Face,
  Unknown,
}

fn followed_by_space(cursor: &Cursor<'_>, command: Command) -> Command {
  if cursor.at_space() {
    command
  } else {
    Command::Unknown
  }
}

fn keyword(cursor: &mut Cursor<'_>, name: &[u8], command: Command) -> Command {
  if cursor.starts_with(name) {
    cursor.advance(name.len());
    followed_by_space(cursor, command)
  } else {
    Command::Unknown
  }
}

/// Classifies the line under the cursor, leaving the cursor just past the
/// command name. A name must be followed by a space or tab, so `vx` and
/// `group` are not mistaken for `v` and `g`.
fn read_command(cursor: &mut Cursor<'_>) -> Command {
  let c = match cursor.peek() {
    Some(c) => c,
    None => return Command::Unknown,
  };

  match c {
    b'f' => {
      cursor.consume();
      followed_by_space(cursor, Command::Face)
    }
    b'g' => {
      cursor.consume();
      followed_by_space(cursor, Command::Group)
    }
    b'v' => {
      cursor.consume();
      match cursor.peek() {
        Some(b' ') | Some(b'\t') => Command::Vertex,
        Some(b'n') => {
          cursor.consume();
          followed_by_space(cursor, Command::Normal)
        }
        Some(b't') => {
          cursor.consume();
          followed_by_space(cursor, Command::TexCoord)
        }
        _ => Command::Unknown,
      }
    }
    b'm' => keyword(cursor, b"mtllib", Command::MtlLib),
    b'u' => keyword(cursor, b"usemtl", Command::UseMtl),
    _ => Command::Unknown,
  }
}

fn check_input_len(len: usize) -> Result<(), Error> {
  if len > MAX_INPUT_LEN {
    Err(Error::InputTooLarge { len })
  } else {
    Ok(())
  }
}

/// Parses `.obj` files and the `.mtl` libraries they name.
///
/// Every parse starts from scratch, so a parser can be reused. After a
/// successful parse the results are read through the accessors; after a
/// failed one they are incomplete and should be discarded.
///
/// Only `v`, `vt`, `vn`, `f`, `g`, `usemtl` and `mtllib` are interpreted.
/// A fourth homogeneous vertex component is dropped. Faces are kept as
/// written: no triangulation, no topology checks, no vertex welding.
pub struct ObjParser<L = FileSystem> {
  loader: L,
  filename: String,
  base_path: PathBuf,
  line_count: usize,
  material_libraries: Vec<String>,
  context: Context,
}

impl ObjParser<FileSystem> {
  /// A parser that opens material libraries from disk.
  pub fn new() -> ObjParser<FileSystem> {
    ObjParser::with_loader(FileSystem)
  }
}

impl Default for ObjParser<FileSystem> {
  fn default() -> ObjParser<FileSystem> {
    ObjParser::new()
  }
}

impl<L: ResourceLoader> ObjParser<L> {
  /// A parser that opens material libraries through `loader`.
  pub fn with_loader(loader: L) -> ObjParser<L> {
    ObjParser {
      loader,
      filename: String::new(),
      base_path: PathBuf::new(),
      line_count: 0,
      material_libraries: Vec::new(),
      context: Context::new(),
    }
  }

  /// Parses geometry held in memory. `mtllib` names resolve against
  /// `base_path`.
  pub fn parse(&mut self, input: &[u8], base_path: &Path, options: &ObjOptions) -> Result<(), Error> {
    self.parse_named("<input>", input, base_path, options)
  }

  /// Parses the unread part of `source`. Without a `base_path`, `mtllib`
  /// names resolve against the directory the source lives in.
  pub fn parse_source(
    &mut self,
    source: &Source,
    options: &ObjOptions,
    base_path: Option<&Path>,
  ) -> Result<(), Error> {
    let base_path = base_path.map_or_else(|| source.directory(), Path::to_path_buf);
    self.parse_named(source.filename(), source.remaining(), &base_path, options)
  }

  /// Opens `path` through the loader and parses it.
  pub fn parse_file<P: AsRef<Path>>(&mut self, path: P, options: &ObjOptions) -> Result<(), Error> {
    let source = Source::load(&self.loader, path.as_ref())?;
    self.parse_source(&source, options, None)
  }

  fn parse_named(
    &mut self,
    filename: &str,
    input: &[u8],
    base_path: &Path,
    options: &ObjOptions,
  ) -> Result<(), Error> {
    check_input_len(input.len())?;

    self.filename = filename.to_owned();
    self.base_path = base_path.to_path_buf();
    self.material_libraries.clear();
    self.context.clear();

    let mut cursor = Cursor::new(input);
    let result = self.parse_commands(&mut cursor, options);
    self.line_count = cursor.line_number();
    result
  }

  fn parse_commands(&mut self, cursor: &mut Cursor<'_>, options: &ObjOptions) -> Result<(), Error> {
    let interval = options.progress_interval;
    let mut next_report = interval;

    while !cursor.is_at_end() {
      cursor.skip_whitespace();
      let command = read_command(cursor);
      self.process_command(cursor, command, options)?;

      if interval > 0 && cursor.line_number() >= next_report {
        debug!("parsing {} at line {}", self.filename, cursor.line_number());
        next_report = (cursor.line_number() / interval + 1) * interval;
      }
    }

    debug!(
      "parsed {}: {} vertices, {} normals, {} texture coordinates, {} groups",
      self.filename,
      self.context.vertices.len(),
      self.context.normals.len(),
      self.context.tex_coords0.len(),
      self.context.groups.len()
    );
    Ok(())
  }

  fn process_command(
    &mut self,
    cursor: &mut Cursor<'_>,
    command: Command,
    options: &ObjOptions,
  ) -> Result<(), Error> {
    match command {
      Command::Vertex => {
        cursor.skip_spaces();
        let v = self.read_vector3(cursor)?;
        self.context.vertices.push(v);
        // Drops an optional w component.
        cursor.skip_line();
      }
      Command::TexCoord => {
        cursor.skip_spaces();
        let t0 = self.read_vector2(cursor)?;
        let t1 = match options.tex_coord1_mode {
          TexCoord1Mode::None => None,
          TexCoord1Mode::UnpackFromTexCoord0Z => {
            cursor.skip_spaces();
            Some(unpack_tex_coord1(self.read_float(cursor)?))
          }
          TexCoord1Mode::TexCoord0ZW => {
            cursor.skip_spaces();
            Some(self.read_vector2(cursor)?)
          }
        };
        self.context.add_tex_coord(t0, t1);
        cursor.skip_line();
      }
      Command::Normal => {
        cursor.skip_spaces();
        let n = self.read_vector3(cursor)?;
        self.context.normals.push(n);
        cursor.skip_line();
      }
      // Faces consume their own line ending.
      Command::Face => self.read_face(cursor)?,
      Command::Group => {
        let name = self.read_name(cursor)?;
        self.context.set_group(name);
        cursor.skip_line();
      }
      Command::UseMtl => {
        let name = self.read_name(cursor)?;
        self.context.set_material(&name);
        cursor.skip_line();
      }
      Command::MtlLib => {
        let name = self.read_name(cursor)?;
        self.load_material_library(name)?;
        cursor.skip_line();
      }
      Command::Unknown => {
        trace!("{}:{}: skipping line", self.filename, cursor.line_number());
        cursor.skip_line();
      }
    }
    Ok(())
  }

  /// Replaces the active material table with the contents of `name`.
  fn load_material_library(&mut self, name: String) -> Result<(), Error> {
    let path = util::concat(&self.base_path, &name);
    self.material_libraries.push(name);

    let source = Source::load(&self.loader, &path)?;
    self.context.library.parse_source(&source, None)
  }

  fn read_face(&mut self, cursor: &mut Cursor<'_>) -> Result<(), Error> {
    // Relative indices count back from the arrays as they are right now.
    let vertex_count = self.context.vertices.len();
    let tex_coord_count = self.context.tex_coords0.len();
    let normal_count = self.context.normals.len();

    let mut face = Face::new();
    let mut done = cursor.skip_whitespace();
    while !done {
      let mut index = Index::vertex(self.read_index(cursor, vertex_count, "vertex")?);

      if cursor.peek() == Some(b'/') {
        cursor.consume();

        match cursor.peek() {
          Some(b'/') | None => {}
          Some(_) => {
            index.tex_coord = Some(self.read_index(cursor, tex_coord_count, "texture coordinate")?);
          }
        }

        if cursor.peek() == Some(b'/') {
          cursor.consume();
          index.normal = Some(self.read_index(cursor, normal_count, "normal")?);
        }
      }

      face.push(index);
      done = cursor.skip_whitespace();
    }

    self.context.add_face(face);
    Ok(())
  }

  fn error_raw(&self, line_number: usize, message: String) -> Error {
    Error::Parse(ParseError {
      filename: self.filename.clone(),
      line_number,
      message,
    })
  }

  fn scan_error(&self, cursor: &Cursor<'_>, e: ScanError) -> Error {
    self.error_raw(cursor.line_number(), e.describe())
  }

  fn read_float(&self, cursor: &mut Cursor<'_>) -> Result<f32, Error> {
    cursor.read_float().map_err(|e| self.scan_error(cursor, e))
  }

  fn read_vector3(&self, cursor: &mut Cursor<'_>) -> Result<Vector3, Error> {
    let x = self.read_float(cursor)?;
    cursor.skip_spaces();
    let y = self.read_float(cursor)?;
    cursor.skip_spaces();
    let z = self.read_float(cursor)?;
    Ok(Vector3 { x, y, z })
  }

  fn read_vector2(&self, cursor: &mut Cursor<'_>) -> Result<Vector2, Error> {
    let x = self.read_float(cursor)?;
    cursor.skip_spaces();
    let y = self.read_float(cursor)?;
    Ok(Vector2 { x, y })
  }

  fn read_index(&self, cursor: &mut Cursor<'_>, len: usize, what: &str) -> Result<usize, Error> {
    let raw = cursor.read_int().map_err(|e| self.scan_error(cursor, e))?;
    resolve_index(raw, len).ok_or_else(|| {
      self.error_raw(
        cursor.line_number(),
        format!("Relative {} index {} is out of range, only {} read so far.", what, raw, len),
      )
    })
  }

  /// The rest of the line with surrounding whitespace trimmed. It must not
  /// be empty.
  fn read_name(&self, cursor: &mut Cursor<'_>) -> Result<String, Error> {
    let line_number = cursor.line_number();
    if cursor.skip_whitespace() {
      return Err(self.error_raw(
        line_number,
        "Expected a group or file name on this line.".to_owned(),
      ));
    }
    Ok(String::from_utf8_lossy(cursor.read_until_newline()).trim().to_owned())
  }

  /// Vertex positions in file order.
  pub fn vertices(&self) -> &[Vector3] {
    &self.context.vertices
  }

  /// Vertex normals in file order.
  pub fn normals(&self) -> &[Vector3] {
    &self.context.normals
  }

  /// The first two components of every `vt`.
  pub fn tex_coords0(&self) -> &[Vector2] {
    &self.context.tex_coords0
  }

  /// The second texture coordinate channel, filled according to
  /// [`ObjOptions::tex_coord1_mode`]. Empty in [`TexCoord1Mode::None`].
  pub fn tex_coords1(&self) -> &[Vector2] {
    &self.context.tex_coords1
  }

  /// Groups in the order they were first named.
  pub fn groups(&self) -> &[Group] {
    &self.context.groups
  }

  /// Looks a group up by name.
  pub fn group(&self, name: &str) -> Option<&Group> {
    self.context.group(name)
  }

  /// Every `mtllib` argument, as written, in file order.
  pub fn material_libraries(&self) -> &[String] {
    &self.material_libraries
  }

  /// The active material library: the one named by the last `mtllib`.
  pub fn material_library(&self) -> &MaterialLibrary {
    &self.context.library
  }

  /// The material a mesh was built with. This stays valid even when a later
  /// `mtllib` rebound the material's name.
  pub fn material(&self, key: MaterialKey) -> Option<&Material> {
    self.context.library.material(key)
  }

  /// The line the parser stopped on, starting from 1.
  pub fn line_count(&self) -> usize {
    self.line_count
  }
}

/// Parses an in-memory `.obj` file with default options. Any `mtllib` is
/// looked up relative to the working directory.
pub fn parse<S: AsRef<[u8]>>(input: S) -> Result<ObjParser, Error> {
  let mut parser = ObjParser::new();
  parser.parse(input.as_ref(), Path::new(""), &ObjOptions::default())?;
  Ok(parser)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::mtl::{Color3, DEFAULT_MATERIAL};
  use approx::assert_relative_eq;
  use proptest::prelude::*;

  fn memory(files: &[(&str, &str)]) -> HashMap<PathBuf, Vec<u8>> {
    files
      .iter()
      .map(|&(name, text)| (PathBuf::from(name), text.as_bytes().to_vec()))
      .collect()
  }

  fn faces(parser: &ObjParser<impl ResourceLoader>, group: &str) -> Vec<Vec<Index>> {
    parser
      .group(group)
      .unwrap()
      .meshes()
      .iter()
      .flat_map(|m| m.faces.iter().map(|f| f.to_vec()))
      .collect()
  }

  fn parse_err(input: &str) -> ParseError {
    match parse(input) {
      Err(Error::Parse(e)) => e,
      Err(e) => panic!("expected a parse error, got {}", e),
      Ok(_) => panic!("expected a parse error"),
    }
  }

  fn triangle() -> Vec<Index> {
    vec![Index::vertex(0), Index::vertex(1), Index::vertex(2)]
  }

  #[test]
  fn test_read_command() {
    for &(input, command) in &[
      ("v 1", Command::Vertex),
      ("v\t1", Command::Vertex),
      ("vn 1", Command::Normal),
      ("vt 1", Command::TexCoord),
      ("f 1", Command::Face),
      ("g x", Command::Group),
      ("mtllib a", Command::MtlLib),
      ("usemtl a", Command::UseMtl),
      ("vx 1", Command::Unknown),
      ("vnx 1", Command::Unknown),
      ("vp 1", Command::Unknown),
      ("group x", Command::Unknown),
      ("mtllibs a", Command::Unknown),
      ("usemt", Command::Unknown),
      ("o cube", Command::Unknown),
      ("s off", Command::Unknown),
      ("f", Command::Unknown),
      ("", Command::Unknown),
    ] {
      let mut cursor = Cursor::new(input.as_bytes());
      assert_eq!(read_command(&mut cursor), command, "{:?}", input);
    }
  }

  #[test]
  fn test_resolve_index() {
    assert_eq!(resolve_index(1, 0), Some(0));
    assert_eq!(resolve_index(3, 3), Some(2));
    assert_eq!(resolve_index(-1, 3), Some(2));
    assert_eq!(resolve_index(-3, 3), Some(0));
    assert_eq!(resolve_index(0, 3), Some(3));
    assert_eq!(resolve_index(-4, 3), None);
  }

  #[test]
  fn test_minimal_triangle() {
    let parser = parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();

    assert_eq!(
      parser.vertices(),
      &[
        Vector3::new(0.0, 0.0, 0.0),
        Vector3::new(1.0, 0.0, 0.0),
        Vector3::new(0.0, 1.0, 0.0),
      ]
    );
    assert_eq!(parser.groups().len(), 1);

    let group = parser.group("default").unwrap();
    assert_eq!(group.meshes().len(), 1);

    let mesh = &group.meshes()[0];
    let default = parser.material_library().get(DEFAULT_MATERIAL).unwrap();
    assert_eq!(mesh.material, default);
    assert_eq!(mesh.faces.len(), 1);
    assert_eq!(mesh.faces[0].to_vec(), triangle());
    assert_eq!(parser.line_count(), 5);
  }

  #[test]
  fn test_negative_indices() {
    let parser = parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n").unwrap();
    assert_eq!(faces(&parser, "default"), vec![triangle()]);
  }

  #[test]
  fn test_relative_indices_use_sizes_at_the_face() {
    let parser = parse(
      r#"
v 0 0 0
v 1 0 0
v 0 1 0
f -3 -2 -1
v 1 1 0
f -3 -2 -1
"#,
    )
    .unwrap();

    assert_eq!(
      faces(&parser, "default"),
      vec![
        triangle(),
        vec![Index::vertex(1), Index::vertex(2), Index::vertex(3)]
      ]
    );
  }

  #[test]
  fn test_index_forms() {
    let parser = parse(
      r#"
v 0 0 0
v 1 0 0
v 0 1 0
v 1 1 0
vt 0 0
vt 1 0
vt 0 1
vn 0 0 1
f 1/1/1 2/2/1 3/3/1
f 1//1 2//1 3//1
f 1/1 2/2 3/3 4/-1
"#,
    )
    .unwrap();

    let all = faces(&parser, "default");
    assert_eq!(all.len(), 3);
    assert_eq!(
      all[0][1],
      Index {
        vertex: 1,
        tex_coord: Some(1),
        normal: Some(0)
      }
    );
    assert_eq!(
      all[1][2],
      Index {
        vertex: 2,
        tex_coord: None,
        normal: Some(0)
      }
    );
    assert_eq!(all[2].len(), 4);
    assert_eq!(
      all[2][3],
      Index {
        vertex: 3,
        tex_coord: Some(2),
        normal: None
      }
    );
  }

  #[test]
  fn test_vertex_data() {
    let parser = parse(
      "v 1.5 -2 3e2 1.0\r\nvn 0 0 -1\r\nvt 0.25 0.75 0.5\r\nvt\t1 1\r\n",
    )
    .unwrap();

    assert_eq!(parser.vertices(), &[Vector3::new(1.5, -2.0, 300.0)]);
    assert_eq!(parser.normals(), &[Vector3::new(0.0, 0.0, -1.0)]);
    assert_eq!(
      parser.tex_coords0(),
      &[Vector2::new(0.25, 0.75), Vector2::new(1.0, 1.0)]
    );
    assert!(parser.tex_coords1().is_empty());
    assert_eq!(parser.line_count(), 5);
  }

  #[test]
  fn test_tex_coord1_modes() {
    let input = b"vt 0.5 0.5 13312\nvt 0 1 4096.0\n";
    let mut parser = ObjParser::new();
    let options = ObjOptions {
      tex_coord1_mode: TexCoord1Mode::UnpackFromTexCoord0Z,
      ..ObjOptions::default()
    };
    parser.parse(input, Path::new(""), &options).unwrap();

    assert_eq!(parser.tex_coords0().len(), 2);
    let t1 = parser.tex_coords1();
    assert_eq!(t1.len(), 2);
    assert_relative_eq!(t1[0].x, 3.0 / 2048.0);
    assert_relative_eq!(t1[0].y, 0.5);
    assert_relative_eq!(t1[1].x, 1.0 / 2048.0);
    assert_relative_eq!(t1[1].y, 0.0);

    let options = ObjOptions {
      tex_coord1_mode: TexCoord1Mode::TexCoord0ZW,
      ..ObjOptions::default()
    };
    parser
      .parse(b"vt 0.1 0.2 0.3 0.4\n", Path::new(""), &options)
      .unwrap();
    assert_eq!(parser.tex_coords0(), &[Vector2::new(0.1, 0.2)]);
    assert_eq!(parser.tex_coords1(), &[Vector2::new(0.3, 0.4)]);
  }

  #[test]
  fn test_groups() {
    let parser = parse(
      r#"
v 0 0 0
v 1 0 0
v 0 1 0
f 1 2 3
g  left side
f 1 2 3
g right
f 3 2 1
g left side
f 1 3 2
"#,
    )
    .unwrap();

    let names: Vec<&str> = parser.groups().iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, vec!["default", "left side", "right"]);
    assert_eq!(parser.group("default").unwrap().face_count(), 1);
    assert_eq!(parser.group("left side").unwrap().face_count(), 2);
    assert_eq!(parser.group("right").unwrap().face_count(), 1);
    assert_eq!(
      faces(&parser, "right"),
      vec![vec![Index::vertex(2), Index::vertex(1), Index::vertex(0)]]
    );
  }

  #[test]
  fn test_material_switch_creates_meshes() {
    let files = memory(&[("lib.mtl", "newmtl A\nKd 1 0 0\nnewmtl B\nKd 0 0 1\n")]);
    let mut parser = ObjParser::with_loader(files);
    parser
      .parse(
        b"mtllib lib.mtl\nv 0 0 0\nv 1 0 0\nv 0 1 0\nusemtl A\nf 1 2 3\nusemtl B\nf 3 2 1\nusemtl A\nf 1 3 2\n",
        Path::new(""),
        &ObjOptions::default(),
      )
      .unwrap();

    assert_eq!(parser.material_libraries(), &["lib.mtl".to_owned()]);
    let a = parser.material_library().get("A").unwrap();
    let b = parser.material_library().get("B").unwrap();

    let group = parser.group("default").unwrap();
    assert_eq!(group.meshes().len(), 2);
    assert_eq!(group.mesh(a).unwrap().faces.len(), 2);
    assert_eq!(group.mesh(b).unwrap().faces.len(), 1);
    assert_eq!(parser.material(a).unwrap().diffuse, Color3::new(1.0, 0.0, 0.0));
  }

  #[test]
  fn test_group_switch_keeps_material() {
    let files = memory(&[("lib.mtl", "newmtl A\n")]);
    let mut parser = ObjParser::with_loader(files);
    parser
      .parse(
        b"mtllib lib.mtl\nv 0 0 0\nusemtl A\ng one\nf 1 1 1\ng two\nf 1 1 1\n",
        Path::new(""),
        &ObjOptions::default(),
      )
      .unwrap();

    let a = parser.material_library().get("A").unwrap();
    for name in &["one", "two"] {
      let group = parser.group(name).unwrap();
      assert_eq!(group.meshes().len(), 1);
      assert_eq!(group.mesh(a).unwrap().faces.len(), 1);
    }
  }

  #[test]
  fn test_missing_material_is_synthesized() {
    let parser = parse("v 0 0 0\nusemtl nowhere\nf 1 1 1\nusemtl nowhere\nf 1 1 1\n").unwrap();
    let key = parser.material_library().get("nowhere").unwrap();
    assert_eq!(parser.material(key).unwrap().name, "nowhere");

    let group = parser.group("default").unwrap();
    assert_eq!(group.meshes().len(), 1);
    assert_eq!(group.mesh(key).unwrap().faces.len(), 2);
  }

  #[test]
  fn test_repeated_mtllib_replaces_table() {
    let files = memory(&[
      ("a.mtl", "newmtl A\n"),
      ("b.mtl", "newmtl B\n"),
    ]);
    let mut parser = ObjParser::with_loader(files);
    parser
      .parse(
        b"mtllib a.mtl\nv 0 0 0\nusemtl A\nf 1 1 1\nmtllib b.mtl\nf 1 1 1\n",
        Path::new(""),
        &ObjOptions::default(),
      )
      .unwrap();

    assert_eq!(
      parser.material_libraries(),
      &["a.mtl".to_owned(), "b.mtl".to_owned()]
    );
    let library = parser.material_library();
    assert!(library.get("A").is_none());
    assert!(library.get("B").is_some());

    // Faces after the second mtllib still use the material selected before it.
    let group = parser.group("default").unwrap();
    assert_eq!(group.meshes().len(), 1);
    let mesh = &group.meshes()[0];
    assert_eq!(mesh.faces.len(), 2);
    assert_eq!(parser.material(mesh.material).unwrap().name, "A");
  }

  #[test]
  fn test_mtllib_resolves_against_base_path() {
    let base = Path::new("models");
    let files: HashMap<PathBuf, Vec<u8>> =
      vec![(base.join("scene.mtl"), b"newmtl A\n".to_vec())].into_iter().collect();
    let mut parser = ObjParser::with_loader(files);
    parser
      .parse(b"mtllib scene.mtl\n", base, &ObjOptions::default())
      .unwrap();

    let a = parser.material_library().by_name("A").unwrap();
    assert_eq!(a.base_path, base.to_path_buf());
  }

  #[test]
  fn test_missing_mtllib_is_an_io_error() {
    let mut parser = ObjParser::with_loader(memory(&[]));
    match parser.parse(b"mtllib gone.mtl\n", Path::new(""), &ObjOptions::default()) {
      Err(Error::Io { path, .. }) => assert_eq!(path, PathBuf::from("gone.mtl")),
      other => panic!("expected an io error, got {:?}", other.err()),
    }
  }

  #[test]
  fn test_comments_and_unknown_lines() {
    let parser = parse(
      r#"# Blender v2.69 (sub 0) OBJ File: ''
o Cube.001
v 0 0 0 # trailing
   # indented comment
v 1 0 0
vp 0.5
v 0 1 0
s off
f 1 2 3 # a triangle
l 1 2
"#,
    )
    .unwrap();

    assert_eq!(parser.vertices().len(), 3);
    assert_eq!(faces(&parser, "default"), vec![triangle()]);
  }

  #[test]
  fn test_face_at_end_of_input() {
    let parser = parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3").unwrap();
    assert_eq!(faces(&parser, "default"), vec![triangle()]);
  }

  #[test]
  fn test_ngon() {
    let parser = parse("v 0 0 0\nf 1 1 1 1 1 1 1\n").unwrap();
    let all = faces(&parser, "default");
    assert_eq!(all[0].len(), 7);
  }

  #[test]
  fn test_malformed_number() {
    let err = parse_err("v 0 0 0\nv 1 x 0\n");
    assert_eq!(err.filename, "<input>");
    assert_eq!(err.line_number, 2);
    assert_eq!(err.message, "Expected a number but got `x`.");

    let err = parse_err("v 0 0\n");
    assert_eq!(err.line_number, 1);
    assert_eq!(err.message, "Expected a number but got end of line.");

    let err = parse_err("v 0 0 0\n\nf 1 a 1\n");
    assert_eq!(err.line_number, 3);
    assert_eq!(err.message, "Expected a digit but got `a`.");
  }

  #[test]
  fn test_relative_index_out_of_range() {
    let err = parse_err("v 0 0 0\nf -1 -2 -1\n");
    assert_eq!(err.line_number, 2);
    assert_eq!(err.message, "Relative vertex index -2 is out of range, only 1 read so far.");
  }

  #[test]
  fn test_group_needs_a_name() {
    let err = parse_err("g \nv 0 0 0\n");
    assert_eq!(err.line_number, 1);
    assert_eq!(err.message, "Expected a group or file name on this line.");
  }

  #[test]
  fn test_reuse_clears_previous_results() {
    let mut parser = ObjParser::new();
    let options = ObjOptions::default();
    parser
      .parse(b"v 0 0 0\ng a\nf 1 1 1\n", Path::new(""), &options)
      .unwrap();
    parser.parse(b"v 1 1 1\nv 2 2 2\n", Path::new(""), &options).unwrap();

    assert_eq!(parser.vertices().len(), 2);
    assert!(parser.groups().is_empty());
    assert!(parser.group("a").is_none());
    assert_eq!(parser.material_library().len(), 1);
  }

  #[test]
  fn test_parse_source_skips_consumed_bytes() {
    let mut source = Source::new("dir/cube.obj", b"garbage\nv 1 2 3\n".to_vec());
    source.set_position(8);

    let mut parser = ObjParser::new();
    parser
      .parse_source(&source, &ObjOptions::default(), None)
      .unwrap();
    assert_eq!(parser.vertices(), &[Vector3::new(1.0, 2.0, 3.0)]);
  }

  #[cfg(target_pointer_width = "64")]
  #[test]
  fn test_oversized_input_is_rejected() {
    assert!(check_input_len(MAX_INPUT_LEN).is_ok());
    match check_input_len(MAX_INPUT_LEN + 1) {
      Err(Error::InputTooLarge { len }) => assert_eq!(len, MAX_INPUT_LEN + 1),
      other => panic!("unexpected {:?}", other),
    }
  }

  #[test]
  fn test_unpack_tex_coord1() {
    let t = unpack_tex_coord1(2.0 * 2048.0 * 5.0 + 256.0);
    assert_relative_eq!(t.x, 5.0 / 2048.0);
    assert_relative_eq!(t.y, 0.125);
  }

  proptest! {
    #[test]
    fn prop_positive_index_round_trips(p in 1i64..1_000_000, len in 0usize..1_000_000) {
      let resolved = resolve_index(p, len).unwrap();
      prop_assert_eq!(resolved as i64 + 1, p);
    }

    #[test]
    fn prop_negative_index_counts_back(k in 1usize..1000, extra in 0usize..1000) {
      let len = k + extra;
      prop_assert_eq!(resolve_index(-(k as i64), len), Some(len - k));
    }

    #[test]
    fn prop_crlf_matches_lf(lines in proptest::collection::vec(prop_oneof![
      Just("v 1 2 3"),
      Just("vn 0 0 1"),
      Just("# note"),
      Just("g g1"),
      Just(""),
    ], 0..40)) {
      let lf = lines.join("\n");
      let crlf = lines.join("\r\n");
      let a = parse(&lf).unwrap();
      let b = parse(&crlf).unwrap();
      prop_assert_eq!(a.line_count(), b.line_count());
      prop_assert_eq!(a.line_count(), lines.len().max(1));
    }
  }
}

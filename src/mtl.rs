//! A parser for Wavefront's `.mtl` material libraries.
//!
//! Texture maps are recorded as path strings relative to the material's
//! `base_path`; nothing here opens or decodes images.
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::{debug, trace, warn};
use slotmap::{new_key_type, SlotMap};

use crate::error::Error;
use crate::lex::{Lexer, ParseError, Token};
use crate::source::Source;
use crate::util;

/// Name of the material every library starts with.
pub const DEFAULT_MATERIAL: &str = "default";

new_key_type! {
  /// Identity of a material. Meshes are keyed by this, so two materials with
  /// identical properties are still distinct.
  pub struct MaterialKey;
}

/// An RGB triple, nominally on the range 0-1.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color3 {
  pub r: f32,
  pub g: f32,
  pub b: f32,
}

impl Color3 {
  /// A color from its components.
  pub const fn new(r: f32, g: f32, b: f32) -> Color3 {
    Color3 { r, g, b }
  }

  /// A gray with every component set to `v`.
  pub const fn splat(v: f32) -> Color3 {
    Color3 { r: v, g: v, b: v }
  }
}

/// Specular color of a library material with no `Ks` and no `map_Ks`.
pub const DEFAULT_SPECULAR: Color3 = Color3::splat(0.8);

/// Specular color of a library material with a `map_Ks` and no `Ks`.
pub const MAPPED_SPECULAR: Color3 = Color3::splat(1.0);

/// One `newmtl` block.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
  /// The name given to `newmtl`.
  pub name: String,
  /// Directory relative to which the texture paths resolve.
  pub base_path: PathBuf,

  /// `Ka`
  pub ambient: Color3,
  /// `map_Ka`
  pub ambient_map: Option<String>,

  /// `Kd`
  pub diffuse: Color3,
  /// `map_Kd`
  pub diffuse_map: Option<String>,

  /// `Ks`. `None` until resolved: a library material ends up with
  /// [`MAPPED_SPECULAR`] if it has a `map_Ks`, [`DEFAULT_SPECULAR`]
  /// otherwise. Materials that were never defined by a library stay `None`.
  pub specular: Option<Color3>,
  /// `map_Ks`
  pub specular_map: Option<String>,

  /// `Ns`, the specular exponent on the range 0-1000.
  pub shininess: f32,

  /// `map_bump`, `bump` or `map_Bump`.
  pub bump_map: Option<String>,
  /// Set with `-mm <bias> <gain>`.
  pub bump_bias: f32,
  /// Set with `-mm <bias> <gain>` or `-bm <gain>`.
  pub bump_gain: f32,

  /// `d`, where 1 is opaque.
  pub opacity: f32,
  /// `map_d` or `map_D`.
  pub opacity_map: Option<String>,

  /// `Tr`, the fraction of light transmitted.
  pub transparency: f32,

  /// `Tf`, one minus transmission as 3DS Max writes it.
  pub transmission_filter: Color3,

  /// `Ke`
  pub emissive: Color3,
  /// `map_Ke`
  pub emissive_map: Option<String>,

  /// `illum`, on the range 0-10.
  pub illumination_model: i32,

  /// `Ni`
  pub index_of_refraction: f32,

  /// `lightmap`, a non-standard extension.
  pub lightmap: Option<String>,
}

impl Default for Material {
  fn default() -> Material {
    Material {
      name: String::new(),
      base_path: PathBuf::new(),
      ambient: Color3::splat(1.0),
      ambient_map: None,
      diffuse: Color3::splat(1.0),
      diffuse_map: None,
      specular: None,
      specular_map: None,
      shininess: 10.0,
      bump_map: None,
      bump_bias: 0.0,
      bump_gain: 1.0,
      opacity: 1.0,
      opacity_map: None,
      transparency: 0.0,
      transmission_filter: Color3::splat(1.0),
      emissive: Color3::splat(0.0),
      emissive_map: None,
      illumination_model: 2,
      index_of_refraction: 1.0,
      lightmap: None,
    }
  }
}

impl Material {
  fn named(name: &str) -> Material {
    Material {
      name: name.to_owned(),
      ..Material::default()
    }
  }
}

/// The materials of one `.mtl` file, addressable by name and by key.
///
/// Parsing replaces the name table but never drops a material, so keys
/// handed out by an earlier parse keep pointing at the same material.
#[derive(Clone, Debug)]
pub struct MaterialLibrary {
  materials: SlotMap<MaterialKey, Material>,
  table: HashMap<String, MaterialKey>,
  current: Option<MaterialKey>,
  base_path: PathBuf,
}

impl Default for MaterialLibrary {
  fn default() -> MaterialLibrary {
    MaterialLibrary::new()
  }
}

fn read_color(lexer: &mut Lexer<'_>) -> Result<Color3, ParseError> {
  let r = lexer.read_number()?;
  let g = lexer.read_number()?;
  let b = lexer.read_number()?;
  Ok(Color3 { r, g, b })
}

fn read_path(lexer: &mut Lexer<'_>) -> Option<String> {
  let path = util::remove_leading_slash(lexer.read_until_newline().trim());
  if path.is_empty() {
    None
  } else {
    Some(path.to_owned())
  }
}

impl MaterialLibrary {
  /// A library holding only the default material.
  pub fn new() -> MaterialLibrary {
    let mut library = MaterialLibrary {
      materials: SlotMap::with_key(),
      table: HashMap::new(),
      current: None,
      base_path: PathBuf::new(),
    };
    library.reset();
    library
  }

  /// Drops every material, including ones still referenced by key.
  pub(crate) fn clear(&mut self) {
    self.materials.clear();
    self.reset();
  }

  fn reset(&mut self) {
    self.table.clear();
    self.current = None;
    let key = self.materials.insert(Material::named(DEFAULT_MATERIAL));
    self.table.insert(DEFAULT_MATERIAL.to_owned(), key);
  }

  /// Looks a material up by name.
  pub fn get(&self, name: &str) -> Option<MaterialKey> {
    self.table.get(name).copied()
  }

  /// The material behind `key`, whether or not its name is still bound.
  pub fn material(&self, key: MaterialKey) -> Option<&Material> {
    self.materials.get(key)
  }

  /// Looks a material up by name, returning the material itself.
  pub fn by_name(&self, name: &str) -> Option<&Material> {
    self.get(name).and_then(|key| self.material(key))
  }

  /// Named materials, in no particular order.
  pub fn iter(&self) -> impl Iterator<Item = (&str, &Material)> + '_ {
    self
      .table
      .iter()
      .filter_map(move |(name, &key)| self.materials.get(key).map(|m| (name.as_str(), m)))
  }

  /// Number of named materials, the default one included.
  pub fn len(&self) -> usize {
    self.table.len()
  }

  /// Never true in practice, since the default material is always there.
  pub fn is_empty(&self) -> bool {
    self.table.is_empty()
  }

  /// Resolves `name`, registering a fresh material under it if the library
  /// has never heard of it.
  pub(crate) fn get_or_create(&mut self, name: &str) -> MaterialKey {
    if let Some(key) = self.get(name) {
      return key;
    }
    warn!("missing material `{}` used, substituting a default one", name);
    let key = self.materials.insert(Material::named(name));
    self.table.insert(name.to_owned(), key);
    key
  }

  /// Parses the text of an `.mtl` file. The name table is reset to just the
  /// default material first. `filename` is only used in diagnostics.
  pub fn parse_str(
    &mut self,
    input: &str,
    filename: &str,
    base_path: &Path,
  ) -> Result<(), ParseError> {
    self.base_path = base_path.to_path_buf();
    let mut lexer = Lexer::new(input, filename);
    self.parse_lexer(&mut lexer)
  }

  /// Parses the unread part of `source`. Without a `base_path`, texture
  /// paths resolve against the directory the source lives in.
  pub fn parse_source(&mut self, source: &Source, base_path: Option<&Path>) -> Result<(), Error> {
    let base_path = base_path.map_or_else(|| source.directory(), Path::to_path_buf);
    let text = String::from_utf8_lossy(source.remaining());
    self.parse_str(&text, source.filename(), &base_path)?;
    Ok(())
  }

  /// Reads and parses an `.mtl` file from disk.
  pub fn parse_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), Error> {
    let source = Source::open(path)?;
    self.parse_source(&source, None)
  }

  fn parse_lexer(&mut self, lexer: &mut Lexer<'_>) -> Result<(), ParseError> {
    self.reset();

    loop {
      while lexer.peek() == Token::Newline {
        lexer.next_token();
      }
      if lexer.peek() == Token::End {
        break;
      }

      let command = lexer.read_symbol()?;
      self.process_command(lexer, command)?;

      // Whatever the command left on its line is ignored.
      lexer.skip_line();
    }

    self.finish_material();

    debug!(
      "parsed {} materials from {} ({} lines)",
      self.table.len(),
      lexer.filename(),
      lexer.line_number()
    );
    Ok(())
  }

  /// Settles the specular color of the material being defined. Runs when
  /// the next `newmtl` starts and at the end of the file.
  fn finish_material(&mut self) {
    if let Some(material) = self.current.and_then(|key| self.materials.get_mut(key)) {
      if material.specular.is_none() {
        material.specular = Some(DEFAULT_SPECULAR);
      }
    }
  }

  fn process_command(&mut self, lexer: &mut Lexer<'_>, command: &str) -> Result<(), ParseError> {
    if command == "newmtl" {
      self.finish_material();

      let name = lexer.read_until_newline().trim().to_owned();
      let key = self.materials.insert(Material {
        name: name.clone(),
        base_path: self.base_path.clone(),
        ..Material::default()
      });
      self.table.insert(name, key);
      self.current = Some(key);
      return Ok(());
    }

    let material = match self.current.and_then(|key| self.materials.get_mut(key)) {
      Some(material) => material,
      None => {
        warn!(
          "{}:{}: `{}` before any `newmtl`, ignoring it",
          lexer.filename(),
          lexer.line_number(),
          command
        );
        return Ok(());
      }
    };

    match command {
      "d" => {
        if lexer.peek() == Token::Symbol("-halo") {
          lexer.next_token();
        }
        material.opacity = lexer.read_number()?;
      }
      "Tr" => material.transparency = lexer.read_number()?,
      "Ns" => material.shininess = lexer.read_number()?,
      "Ni" => material.index_of_refraction = lexer.read_number()?,
      "Ka" => material.ambient = read_color(lexer)?,
      "Kd" => material.diffuse = read_color(lexer)?,
      "Ks" => material.specular = Some(read_color(lexer)?),
      "Ke" => material.emissive = read_color(lexer)?,
      "Tf" => material.transmission_filter = read_color(lexer)?,
      "illum" => material.illumination_model = lexer.read_integer()?,
      "map_Ka" => material.ambient_map = read_path(lexer),
      "map_Kd" => material.diffuse_map = read_path(lexer),
      "map_Ke" => material.emissive_map = read_path(lexer),
      "map_d" | "map_D" => material.opacity_map = read_path(lexer),
      "lightmap" => material.lightmap = read_path(lexer),
      "map_Ks" => {
        material.specular_map = read_path(lexer);
        if material.specular.is_none() {
          material.specular = Some(MAPPED_SPECULAR);
        }
      }
      "map_bump" | "bump" | "map_Bump" => {
        if let Token::Symbol(option) = lexer.peek() {
          if option.len() > 1 && option.starts_with('-') {
            lexer.next_token();
            match option {
              "-mm" => {
                material.bump_bias = lexer.read_number()?;
                material.bump_gain = lexer.read_number()?;
              }
              "-bm" => material.bump_gain = lexer.read_number()?,
              _ => warn!(
                "{}:{}: ignoring bump map option `{}`",
                lexer.filename(),
                lexer.line_number(),
                option
              ),
            }
          }
        }
        material.bump_map = read_path(lexer);
      }
      _ => trace!("ignoring `{}` in {}", command, lexer.filename()),
    }

    Ok(())
  }
}

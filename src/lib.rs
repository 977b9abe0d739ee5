//! Parsers for wavefront's `.obj` geometry and `.mtl` material library
//! formats, building a scene of vertex arrays and per-group, per-material
//! meshes.
//!
//! ```no_run
//! use std::path::Path;
//! use wavefront_scene::{ObjOptions, ObjParser};
//!
//! # fn main() -> Result<(), wavefront_scene::Error> {
//! let mut parser = ObjParser::new();
//! parser.parse_file(Path::new("models/sponza.obj"), &ObjOptions::default())?;
//! for group in parser.groups() {
//!   for mesh in group.meshes() {
//!     let material = parser.material(mesh.material).unwrap();
//!     println!("{} / {}: {} faces", group.name, material.name, mesh.faces.len());
//!   }
//! }
//! # Ok(())
//! # }
//! ```
#![crate_type = "lib"]
#![deny(missing_docs)]
#![deny(unreachable_pub)]

pub use error::Error;
pub use lex::ParseError;
pub use obj::{parse, ObjOptions, ObjParser, TexCoord1Mode};
pub use source::{FileSystem, ResourceLoader, Source};

mod context;
mod error;
mod lex;
mod scan;
mod source;
mod util;

pub mod mtl;
pub mod obj;

use std::collections::HashMap;

use crate::mtl::{MaterialKey, MaterialLibrary, DEFAULT_MATERIAL};
use crate::obj::{Face, Group, Vector2, Vector3};

/// Name of the group faces land in before any `g` line.
pub(crate) const DEFAULT_GROUP: &str = "default";

/// Everything an `.obj` parse builds, plus the "current" group, material and
/// mesh that `g` and `usemtl` steer.
pub(crate) struct Context {
  pub(crate) vertices: Vec<Vector3>,
  pub(crate) normals: Vec<Vector3>,
  pub(crate) tex_coords0: Vec<Vector2>,
  pub(crate) tex_coords1: Vec<Vector2>,

  pub(crate) groups: Vec<Group>,
  group_table: HashMap<String, usize>,

  pub(crate) library: MaterialLibrary,

  current_group: Option<usize>,
  current_material: Option<MaterialKey>,
  // Mesh inside `current_group` for `current_material`.
  current_mesh: Option<usize>,
}

impl Context {
  pub(crate) fn new() -> Self {
    Context {
      vertices: vec![],
      normals: vec![],
      tex_coords0: vec![],
      tex_coords1: vec![],
      groups: vec![],
      group_table: HashMap::new(),
      library: MaterialLibrary::new(),
      current_group: None,
      current_material: None,
      current_mesh: None,
    }
  }

  pub(crate) fn clear(&mut self) {
    self.vertices.clear();
    self.normals.clear();
    self.tex_coords0.clear();
    self.tex_coords1.clear();
    self.groups.clear();
    self.group_table.clear();
    self.library.clear();
    self.current_group = None;
    self.current_material = None;
    self.current_mesh = None;
  }

  pub(crate) fn group(&self, name: &str) -> Option<&Group> {
    self.group_table.get(name).map(|&i| &self.groups[i])
  }

  fn group_index(&mut self, name: String) -> usize {
    if let Some(&i) = self.group_table.get(&name) {
      return i;
    }
    self.groups.push(Group::new(name.clone()));
    let i = self.groups.len() - 1;
    self.group_table.insert(name, i);
    i
  }

  pub(crate) fn add_tex_coord(&mut self, t0: Vector2, t1: Option<Vector2>) {
    self.tex_coords0.push(t0);
    if let Some(t1) = t1 {
      self.tex_coords1.push(t1);
    }
  }

  /// Makes `name` the current group. The material carries over; the mesh is
  /// looked up again on the next face.
  pub(crate) fn set_group(&mut self, name: String) {
    self.current_group = Some(self.group_index(name));
    self.current_mesh = None;
  }

  pub(crate) fn set_material(&mut self, name: &str) {
    self.current_material = Some(self.library.get_or_create(name));
    self.current_mesh = None;
  }

  /// Resolves the current group and mesh, creating the default group and
  /// binding the default material if nothing was selected yet.
  fn current_mesh(&mut self) -> (usize, usize) {
    let material = match self.current_material {
      Some(material) => material,
      None => {
        let material = self.library.get_or_create(DEFAULT_MATERIAL);
        self.current_material = Some(material);
        material
      }
    };

    let group = match self.current_group {
      Some(group) => group,
      None => {
        let group = self.group_index(DEFAULT_GROUP.to_owned());
        self.current_group = Some(group);
        self.current_mesh = None;
        group
      }
    };

    let mesh = match self.current_mesh {
      Some(mesh) => mesh,
      None => {
        let mesh = self.groups[group].mesh_index(material);
        self.current_mesh = Some(mesh);
        mesh
      }
    };

    (group, mesh)
  }

  pub(crate) fn add_face(&mut self, face: Face) {
    let (group, mesh) = self.current_mesh();
    self.groups[group].push_face(mesh, face);
  }
}

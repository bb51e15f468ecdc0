//! Host scene mutation surface

use crate::light::LightData;
use crate::material::MaterialData;
use quarry_core::{CollectionId, MaterialId, MeshId, ObjectId, Result, Transform};
use quarry_import::PolygonMesh;

/// What an object carries
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectData {
    Mesh(MeshId),
    Light(LightData),
    /// Places every object of a collection
    CollectionInstance(CollectionId),
    Empty,
}

/// The scene graph the importer populates.
///
/// Meshes and materials are looked up by name; names are unique per kind.
pub trait SceneHost {
    fn create_collection(&mut self, name: &str) -> Result<CollectionId>;
    fn find_collection(&self, name: &str) -> Option<CollectionId>;

    fn create_mesh(&mut self, mesh: PolygonMesh) -> Result<MeshId>;
    fn find_mesh(&self, name: &str) -> Option<MeshId>;
    /// Material slot names of a mesh, in slot order
    fn mesh_slots(&self, mesh: MeshId) -> Vec<String>;

    fn create_material(&mut self, material: MaterialData) -> Result<MaterialId>;

    fn create_object(&mut self, name: &str, data: ObjectData) -> Result<ObjectId>;
    fn link(&mut self, object: ObjectId, collection: CollectionId) -> Result<()>;
    fn set_transform(&mut self, object: ObjectId, transform: Transform) -> Result<()>;
    fn set_parent(&mut self, child: ObjectId, parent: ObjectId) -> Result<()>;
    fn assign_material(&mut self, mesh: MeshId, slot: usize, material: MaterialId) -> Result<()>;

    /// Drop meshes and materials nothing refers to. Returns how many went.
    fn remove_unused(&mut self) -> usize;
}

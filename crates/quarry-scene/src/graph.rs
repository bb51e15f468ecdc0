//! In-memory scene graph

use crate::host::{ObjectData, SceneHost};
use crate::material::MaterialData;
use quarry_core::{CollectionId, MaterialId, MeshId, ObjectId, QuarryError, Result, Transform};
use quarry_import::PolygonMesh;
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq)]
pub struct CollectionNode {
    pub name: String,
    pub objects: Vec<ObjectId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectNode {
    pub name: String,
    pub data: ObjectData,
    pub transform: Transform,
    pub parent: Option<ObjectId>,
}

#[derive(Debug, Clone)]
struct MeshEntry {
    mesh: PolygonMesh,
    materials: Vec<Option<MaterialId>>,
}

/// Counts describing a populated scene
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SceneSummary {
    pub collections: usize,
    pub objects: usize,
    pub mesh_objects: usize,
    pub instances: usize,
    pub lights: usize,
    pub meshes: usize,
    pub materials: usize,
    pub vertices: usize,
    pub polygons: usize,
}

/// A [`SceneHost`] that keeps everything in memory.
///
/// Handles index into slot vectors and stay valid for the graph's lifetime;
/// removed meshes and materials leave an empty slot behind.
#[derive(Debug, Default)]
pub struct SceneGraph {
    collections: Vec<CollectionNode>,
    objects: Vec<ObjectNode>,
    meshes: Vec<Option<MeshEntry>>,
    materials: Vec<Option<MaterialData>>,
}

/// `name`, or `name.001`, `name.002`, ... if taken
fn unique_name(name: &str, mut taken: impl FnMut(&str) -> bool) -> String {
    if !taken(name) {
        return name.to_string();
    }
    (1u32..)
        .map(|n| format!("{}.{:03}", name, n))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| name.to_string())
}

fn unknown(kind: &str, raw: u32) -> QuarryError {
    QuarryError::UnknownHandle(format!("{} {}", kind, raw))
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collection(&self, id: CollectionId) -> Option<&CollectionNode> {
        self.collections.get(id.index())
    }

    pub fn objects_in(&self, id: CollectionId) -> &[ObjectId] {
        self.collection(id)
            .map(|c| c.objects.as_slice())
            .unwrap_or(&[])
    }

    pub fn object(&self, id: ObjectId) -> Option<&ObjectNode> {
        self.objects.get(id.index())
    }

    /// First object with this name
    pub fn object_by_name(&self, name: &str) -> Option<ObjectId> {
        self.objects_named(name).into_iter().next()
    }

    pub fn objects_named(&self, name: &str) -> Vec<ObjectId> {
        self.object_ids()
            .filter(|id| self.objects[id.index()].name == name)
            .collect()
    }

    pub fn children(&self, parent: ObjectId) -> Vec<ObjectId> {
        self.object_ids()
            .filter(|id| self.objects[id.index()].parent == Some(parent))
            .collect()
    }

    pub fn object_ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        (0..self.objects.len() as u32).map(ObjectId::from_raw)
    }

    pub fn mesh(&self, id: MeshId) -> Option<&PolygonMesh> {
        self.mesh_entry(id).map(|entry| &entry.mesh)
    }

    /// Material assigned to each slot of a mesh
    pub fn mesh_materials(&self, id: MeshId) -> &[Option<MaterialId>] {
        self.mesh_entry(id)
            .map(|entry| entry.materials.as_slice())
            .unwrap_or(&[])
    }

    pub fn material(&self, id: MaterialId) -> Option<&MaterialData> {
        self.materials.get(id.index()).and_then(Option::as_ref)
    }

    pub fn find_material(&self, name: &str) -> Option<MaterialId> {
        self.materials
            .iter()
            .position(|m| m.as_ref().is_some_and(|m| m.name == name))
            .map(|i| MaterialId::from_raw(i as u32))
    }

    /// Mesh an object displays, if it is a mesh object
    pub fn object_mesh(&self, id: ObjectId) -> Option<MeshId> {
        match self.object(id)?.data {
            ObjectData::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.iter().flatten().count()
    }

    pub fn material_count(&self) -> usize {
        self.materials.iter().flatten().count()
    }

    pub fn summary(&self) -> SceneSummary {
        let mut summary = SceneSummary {
            collections: self.collections.len(),
            objects: self.objects.len(),
            meshes: self.mesh_count(),
            materials: self.material_count(),
            ..Default::default()
        };
        for object in &self.objects {
            match object.data {
                ObjectData::Mesh(_) => summary.mesh_objects += 1,
                ObjectData::Light(_) => summary.lights += 1,
                ObjectData::CollectionInstance(_) => summary.instances += 1,
                ObjectData::Empty => {}
            }
        }
        for entry in self.meshes.iter().flatten() {
            summary.vertices += entry.mesh.vertex_count();
            summary.polygons += entry.mesh.polygon_count();
        }
        summary
    }

    fn mesh_entry(&self, id: MeshId) -> Option<&MeshEntry> {
        self.meshes.get(id.index()).and_then(Option::as_ref)
    }

    fn object_mut(&mut self, id: ObjectId) -> Result<&mut ObjectNode> {
        self.objects
            .get_mut(id.index())
            .ok_or_else(|| unknown("object", id.raw()))
    }
}

impl SceneHost for SceneGraph {
    fn create_collection(&mut self, name: &str) -> Result<CollectionId> {
        let name = unique_name(name, |n| self.collections.iter().any(|c| c.name == n));
        let id = CollectionId::from_raw(self.collections.len() as u32);
        self.collections.push(CollectionNode {
            name,
            objects: Vec::new(),
        });
        Ok(id)
    }

    fn find_collection(&self, name: &str) -> Option<CollectionId> {
        self.collections
            .iter()
            .position(|c| c.name == name)
            .map(|i| CollectionId::from_raw(i as u32))
    }

    fn create_mesh(&mut self, mut mesh: PolygonMesh) -> Result<MeshId> {
        mesh.name = unique_name(&mesh.name, |n| {
            self.meshes.iter().flatten().any(|e| e.mesh.name == n)
        });
        let id = MeshId::from_raw(self.meshes.len() as u32);
        let materials = vec![None; mesh.material_slots.len()];
        self.meshes.push(Some(MeshEntry { mesh, materials }));
        Ok(id)
    }

    fn find_mesh(&self, name: &str) -> Option<MeshId> {
        self.meshes
            .iter()
            .position(|e| e.as_ref().is_some_and(|e| e.mesh.name == name))
            .map(|i| MeshId::from_raw(i as u32))
    }

    fn mesh_slots(&self, mesh: MeshId) -> Vec<String> {
        self.mesh(mesh)
            .map(|m| m.material_slots.clone())
            .unwrap_or_default()
    }

    fn create_material(&mut self, mut material: MaterialData) -> Result<MaterialId> {
        material.name = unique_name(&material.name, |n| self.find_material(n).is_some());
        let id = MaterialId::from_raw(self.materials.len() as u32);
        self.materials.push(Some(material));
        Ok(id)
    }

    fn create_object(&mut self, name: &str, data: ObjectData) -> Result<ObjectId> {
        match &data {
            ObjectData::Mesh(mesh) if self.mesh_entry(*mesh).is_none() => {
                return Err(unknown("mesh", mesh.raw()));
            }
            ObjectData::CollectionInstance(c) if self.collection(*c).is_none() => {
                return Err(unknown("collection", c.raw()));
            }
            _ => {}
        }
        let id = ObjectId::from_raw(self.objects.len() as u32);
        self.objects.push(ObjectNode {
            name: name.to_string(),
            data,
            transform: Transform::IDENTITY,
            parent: None,
        });
        Ok(id)
    }

    fn link(&mut self, object: ObjectId, collection: CollectionId) -> Result<()> {
        if self.object(object).is_none() {
            return Err(unknown("object", object.raw()));
        }
        let node = self
            .collections
            .get_mut(collection.index())
            .ok_or_else(|| unknown("collection", collection.raw()))?;
        if !node.objects.contains(&object) {
            node.objects.push(object);
        }
        Ok(())
    }

    fn set_transform(&mut self, object: ObjectId, transform: Transform) -> Result<()> {
        self.object_mut(object)?.transform = transform;
        Ok(())
    }

    fn set_parent(&mut self, child: ObjectId, parent: ObjectId) -> Result<()> {
        if self.object(parent).is_none() {
            return Err(unknown("object", parent.raw()));
        }
        self.object_mut(child)?.parent = Some(parent);
        Ok(())
    }

    fn assign_material(&mut self, mesh: MeshId, slot: usize, material: MaterialId) -> Result<()> {
        if self.material(material).is_none() {
            return Err(unknown("material", material.raw()));
        }
        let entry = self
            .meshes
            .get_mut(mesh.index())
            .and_then(Option::as_mut)
            .ok_or_else(|| unknown("mesh", mesh.raw()))?;
        let Some(assigned) = entry.materials.get_mut(slot) else {
            return Err(QuarryError::MaterialError(format!(
                "mesh {} has no slot {}",
                entry.mesh.name, slot
            )));
        };
        *assigned = Some(material);
        Ok(())
    }

    fn remove_unused(&mut self) -> usize {
        let used_meshes: HashSet<MeshId> = self
            .objects
            .iter()
            .filter_map(|o| match o.data {
                ObjectData::Mesh(mesh) => Some(mesh),
                _ => None,
            })
            .collect();

        let mut removed = 0;
        for (i, slot) in self.meshes.iter_mut().enumerate() {
            if slot.is_some() && !used_meshes.contains(&MeshId::from_raw(i as u32)) {
                *slot = None;
                removed += 1;
            }
        }

        let used_materials: HashSet<MaterialId> = self
            .meshes
            .iter()
            .flatten()
            .flat_map(|e| e.materials.iter().flatten().copied())
            .collect();
        for (i, slot) in self.materials.iter_mut().enumerate() {
            if slot.is_some() && !used_materials.contains(&MaterialId::from_raw(i as u32)) {
                *slot = None;
                removed += 1;
            }
        }

        if removed > 0 {
            tracing::debug!(removed, "removed unused scene data");
        }
        removed
    }
}

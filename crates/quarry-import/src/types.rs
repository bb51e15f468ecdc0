//! Raw PSK records and reconstructed mesh types

use quarry_core::{QuarryError, Result};
use serde::Serialize;
use std::collections::BTreeMap;

/// A (point, UV, material) corner record. Several wedges may share a point
/// where UV seams or material borders split it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wedge {
    pub point_index: u32,
    pub u: f32,
    pub v: f32,
    pub material_index: u32,
}

/// A triangle over three wedges
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Face {
    pub wedge_indices: [u32; 3],
    pub material_index: u8,
    pub aux_material_index: u8,
    pub smoothing_groups: i32,
}

/// A material slot as stored in the mesh file
#[derive(Debug, Clone, PartialEq)]
pub struct PskMaterial {
    pub name: String,
    pub texture_index: i32,
    pub poly_flags: i32,
    pub aux_material: i32,
    pub aux_flags: i32,
    pub lod_bias: i32,
    pub lod_style: i32,
}

/// A reference skeleton bone
#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    pub name: String,
    pub flags: i32,
    pub children_count: i32,
    pub parent_index: i32,
    /// Local rotation [x, y, z, w]
    pub rotation: [f32; 4],
    pub location: [f32; 3],
    pub length: f32,
    pub size: [f32; 3],
}

impl Bone {
    /// Parent bone index, `None` for a root.
    ///
    /// Exporters encode the root either as `-1` or as bone 0 pointing at
    /// itself; both read as a root here.
    pub fn parent(&self, own_index: usize) -> Option<usize> {
        if self.parent_index < 0 || (own_index == 0 && self.parent_index == 0) {
            None
        } else {
            Some(self.parent_index as usize)
        }
    }
}

/// One skin weight record
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weight {
    pub weight: f32,
    pub point_index: i32,
    pub bone_index: i32,
}

/// Everything decoded from one PSK file, before topology reconstruction
#[derive(Debug, Clone, Default)]
pub struct MeshAsset {
    pub points: Vec<[f32; 3]>,
    pub wedges: Vec<Wedge>,
    pub faces: Vec<Face>,
    pub materials: Vec<PskMaterial>,
    pub bones: Vec<Bone>,
    pub weights: Vec<Weight>,
    /// One array per channel, in encounter order
    pub extra_uvs: Vec<Vec<[f32; 2]>>,
    /// One color per wedge
    pub vertex_colors: Vec<[u8; 4]>,
    /// One normal per point
    pub vertex_normals: Vec<[f32; 3]>,
}

impl MeshAsset {
    pub fn has_extra_uvs(&self) -> bool {
        !self.extra_uvs.is_empty()
    }

    pub fn has_vertex_colors(&self) -> bool {
        !self.vertex_colors.is_empty()
    }

    pub fn has_vertex_normals(&self) -> bool {
        !self.vertex_normals.is_empty()
    }

    /// Check every cross-reference between records
    pub fn validate(&self) -> Result<()> {
        for (i, wedge) in self.wedges.iter().enumerate() {
            if wedge.point_index as usize >= self.points.len() {
                return Err(QuarryError::CorruptMeshData(format!(
                    "wedge {} references point {} of {}",
                    i,
                    wedge.point_index,
                    self.points.len()
                )));
            }
        }

        for (i, face) in self.faces.iter().enumerate() {
            if let Some(w) = face
                .wedge_indices
                .iter()
                .find(|&&w| w as usize >= self.wedges.len())
            {
                return Err(QuarryError::CorruptMeshData(format!(
                    "face {} references wedge {} of {}",
                    i,
                    w,
                    self.wedges.len()
                )));
            }
        }

        for (i, bone) in self.bones.iter().enumerate() {
            let valid = bone.parent_index == -1
                || (i == 0 && bone.parent_index == 0)
                || (bone.parent_index >= 0 && (bone.parent_index as usize) < i);
            if !valid {
                return Err(QuarryError::CorruptMeshData(format!(
                    "bone {} ({}) has parent {}, expected -1 or an earlier bone",
                    i, bone.name, bone.parent_index
                )));
            }
        }

        for (i, weight) in self.weights.iter().enumerate() {
            let point_ok =
                weight.point_index >= 0 && (weight.point_index as usize) < self.points.len();
            let bone_ok = weight.bone_index >= 0 && (weight.bone_index as usize) < self.bones.len();
            if !point_ok || !bone_ok {
                return Err(QuarryError::CorruptMeshData(format!(
                    "weight {} references point {} / bone {} ({} points, {} bones)",
                    i,
                    weight.point_index,
                    weight.bone_index,
                    self.points.len(),
                    self.bones.len()
                )));
            }
        }

        Ok(())
    }
}

/// A triangle of the reconstructed mesh
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Polygon {
    pub vertices: [u32; 3],
    pub material_slot: u32,
    pub smooth: bool,
}

/// Per-corner UV coordinates, three entries per polygon
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UvLayer {
    pub name: String,
    pub data: Vec<[f32; 2]>,
}

/// Per-corner RGBA colors, three entries per polygon
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorLayer {
    pub name: String,
    pub data: Vec<[f32; 4]>,
}

/// Skin weights for one bone, keyed by vertex index
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VertexGroup {
    pub name: String,
    pub bone_index: usize,
    pub weights: BTreeMap<u32, f32>,
}

/// A renderable polygon mesh with per-corner attributes and skin bindings
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PolygonMesh {
    pub name: String,
    pub vertices: Vec<[f32; 3]>,
    pub polygons: Vec<Polygon>,
    pub uv_layers: Vec<UvLayer>,
    pub color_layer: Option<ColorLayer>,
    /// One custom normal per vertex
    pub custom_normals: Option<Vec<[f32; 3]>>,
    /// Slot names, indexed by `Polygon::material_slot`
    pub material_slots: Vec<String>,
    pub vertex_groups: Vec<VertexGroup>,
}

impl PolygonMesh {
    /// A mesh with no geometry
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// An axis-aligned cube centered on the origin, `size` units wide
    pub fn cube(name: impl Into<String>, size: f32) -> Self {
        let h = size / 2.0;
        let vertices = vec![
            [-h, -h, -h],
            [h, -h, -h],
            [h, h, -h],
            [-h, h, -h],
            [-h, -h, h],
            [h, -h, h],
            [h, h, h],
            [-h, h, h],
        ];
        let quads: [[u32; 4]; 6] = [
            [0, 3, 2, 1],
            [4, 5, 6, 7],
            [0, 1, 5, 4],
            [1, 2, 6, 5],
            [2, 3, 7, 6],
            [3, 0, 4, 7],
        ];
        let polygons = quads
            .iter()
            .flat_map(|q| [[q[0], q[1], q[2]], [q[0], q[2], q[3]]])
            .map(|vertices| Polygon {
                vertices,
                material_slot: 0,
                smooth: false,
            })
            .collect();

        Self {
            name: name.into(),
            vertices,
            polygons,
            ..Default::default()
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn polygon_count(&self) -> usize {
        self.polygons.len()
    }

    pub fn corner_count(&self) -> usize {
        self.polygons.len() * 3
    }

    pub fn uv_layer(&self, name: &str) -> Option<&UvLayer> {
        self.uv_layers.iter().find(|l| l.name == name)
    }

    pub fn vertex_group(&self, name: &str) -> Option<&VertexGroup> {
        self.vertex_groups.iter().find(|g| g.name == name)
    }

    pub fn bounds(&self) -> Option<MeshBounds> {
        MeshBounds::from_positions(&self.vertices)
    }
}

/// Axis-aligned bounding box computed from vertex positions
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MeshBounds {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl MeshBounds {
    /// Compute bounds from a set of vertex positions
    pub fn from_positions(positions: &[[f32; 3]]) -> Option<Self> {
        let (first, rest) = positions.split_first()?;
        let mut min = *first;
        let mut max = *first;
        for p in rest {
            for i in 0..3 {
                min[i] = min[i].min(p[i]);
                max[i] = max[i].max(p[i]);
            }
        }
        Some(Self { min, max })
    }

    /// Size along each axis
    pub fn size(&self) -> [f32; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }
}

impl std::fmt::Display for MeshBounds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = self.size();
        write!(
            f,
            "{:.2} x {:.2} x {:.2} (min [{:.2}, {:.2}, {:.2}], max [{:.2}, {:.2}, {:.2}])",
            s[0], s[1], s[2],
            self.min[0], self.min[1], self.min[2],
            self.max[0], self.max[1], self.max[2],
        )
    }
}

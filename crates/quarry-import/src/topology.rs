//! Topology reconstruction from a decoded PSK asset
//!
//! PSK stores geometry as a wedge soup: faces index wedges and wedges index
//! points. The builder keeps one mesh vertex per point and moves everything
//! that varies per wedge (UVs, colors) onto polygon corners.

use crate::color::rgb_to_srgb;
use crate::types::{ColorLayer, MeshAsset, Polygon, PolygonMesh, UvLayer, VertexGroup};
use quarry_core::{QuarryError, Result, Warning};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Source units are centimeters; the target scene uses meters
pub const UNIT_SCALE: f32 = 0.01;

/// Name of the primary UV layer
pub const PRIMARY_UV_LAYER: &str = "VTXW0000";

/// Name of the vertex color layer
pub const COLOR_LAYER: &str = "VERTEXCOLOR";

/// How stored vertex colors are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VertexColorSpace {
    /// Apply the sRGB transfer curve to RGB
    #[default]
    Srgb,
    /// Use the stored values as-is
    Linear,
}

/// Knobs for [`build_topology`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    /// Multiply positions by [`UNIT_SCALE`]
    pub scale_down: bool,
    pub import_extra_uvs: bool,
    pub import_vertex_colors: bool,
    pub vertex_color_space: VertexColorSpace,
    pub import_vertex_normals: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            scale_down: true,
            import_extra_uvs: true,
            import_vertex_colors: true,
            vertex_color_space: VertexColorSpace::Srgb,
            import_vertex_normals: true,
        }
    }
}

/// A reconstructed mesh plus the data-integrity warnings raised building it
#[derive(Debug, Clone)]
pub struct BuiltTopology {
    pub mesh: PolygonMesh,
    pub warnings: Vec<Warning>,
}

/// Reconstruct a polygon mesh from a raw asset.
///
/// All cross-references are checked before anything is built; a bad index
/// fails the whole mesh with `CorruptMeshData`. Degenerate faces and
/// conflicting vertex colors are tolerated and reported as warnings.
pub fn build_topology(
    name: &str,
    asset: &MeshAsset,
    options: &BuildOptions,
) -> Result<BuiltTopology> {
    asset.validate()?;
    check_attribute_lengths(asset, options)?;

    let scale = if options.scale_down { UNIT_SCALE } else { 1.0 };
    let vertices = asset
        .points
        .iter()
        .map(|p| [p[0] * scale, p[1] * scale, p[2] * scale])
        .collect();

    // Corners are taken in reverse wedge order to flip the winding
    let mut corner_wedges: Vec<[usize; 3]> = Vec::with_capacity(asset.faces.len());
    let mut polygons = Vec::with_capacity(asset.faces.len());
    let mut degenerate = 0usize;
    for face in &asset.faces {
        let [a, b, c] = face.wedge_indices;
        let wedges = [c as usize, b as usize, a as usize];
        let points = wedges.map(|w| asset.wedges[w].point_index);
        if points[0] == points[1] || points[1] == points[2] || points[0] == points[2] {
            degenerate += 1;
            continue;
        }
        corner_wedges.push(wedges);
        polygons.push(Polygon {
            vertices: points,
            material_slot: face.material_index as u32,
            smooth: false,
        });
    }

    let mut warnings = Vec::new();
    if degenerate > 0 {
        warnings.push(Warning::DegenerateFaces(degenerate));
    }

    let mut uv_layers = vec![UvLayer {
        name: PRIMARY_UV_LAYER.to_string(),
        data: corner_wedges
            .iter()
            .flatten()
            .map(|&w| {
                let wedge = &asset.wedges[w];
                [wedge.u, 1.0 - wedge.v]
            })
            .collect(),
    }];

    if options.import_extra_uvs && asset.has_extra_uvs() {
        uv_layers.extend(build_extra_uvs(asset, &corner_wedges));
    }

    let color_layer = if options.import_vertex_colors && asset.has_vertex_colors() {
        let (layer, ambiguous) = build_color_layer(asset, &polygons, options.vertex_color_space);
        if ambiguous > 0 {
            warnings.push(Warning::AmbiguousVertexColors(ambiguous));
        }
        Some(layer)
    } else {
        None
    };

    let custom_normals = if options.import_vertex_normals && asset.has_vertex_normals() {
        for polygon in &mut polygons {
            polygon.smooth = true;
        }
        Some(asset.vertex_normals.clone())
    } else {
        None
    };

    let mesh = PolygonMesh {
        name: name.to_string(),
        vertices,
        polygons,
        uv_layers,
        color_layer,
        custom_normals,
        material_slots: asset.materials.iter().map(|m| m.name.clone()).collect(),
        vertex_groups: build_vertex_groups(asset),
    };

    tracing::debug!(
        mesh = name,
        vertices = mesh.vertex_count(),
        polygons = mesh.polygon_count(),
        degenerate,
        "built topology"
    );

    Ok(BuiltTopology { mesh, warnings })
}

fn check_attribute_lengths(asset: &MeshAsset, options: &BuildOptions) -> Result<()> {
    if options.import_extra_uvs {
        for (channel, uvs) in asset.extra_uvs.iter().enumerate() {
            if uvs.len() != asset.wedges.len() {
                return Err(QuarryError::CorruptMeshData(format!(
                    "extra UV channel {} has {} entries for {} wedges",
                    channel,
                    uvs.len(),
                    asset.wedges.len()
                )));
            }
        }
    }
    if options.import_vertex_colors
        && asset.has_vertex_colors()
        && asset.vertex_colors.len() != asset.wedges.len()
    {
        return Err(QuarryError::CorruptMeshData(format!(
            "{} vertex colors for {} wedges",
            asset.vertex_colors.len(),
            asset.wedges.len()
        )));
    }
    if options.import_vertex_normals
        && asset.has_vertex_normals()
        && asset.vertex_normals.len() != asset.points.len()
    {
        return Err(QuarryError::CorruptMeshData(format!(
            "{} vertex normals for {} points",
            asset.vertex_normals.len(),
            asset.points.len()
        )));
    }
    Ok(())
}

/// Extra channels are addressed as one flat buffer, each channel starting
/// `wedge_count` entries after the previous one.
fn build_extra_uvs(asset: &MeshAsset, corner_wedges: &[[usize; 3]]) -> Vec<UvLayer> {
    let flat: Vec<[f32; 2]> = asset.extra_uvs.iter().flatten().copied().collect();
    let wedge_count = asset.wedges.len();

    (0..asset.extra_uvs.len())
        .map(|channel| {
            let base = channel * wedge_count;
            let data = corner_wedges
                .iter()
                .flatten()
                .map(|&w| {
                    let [u, v] = flat[base + w];
                    [u, 1.0 - v]
                })
                .collect();
            UvLayer {
                name: format!("EXTRAUV{}", channel),
                data,
            }
        })
        .collect()
}

/// Colors are stored per wedge but applied per point: the first wedge to
/// touch a point decides its color. Returns the layer and how many distinct
/// points received conflicting colors.
fn build_color_layer(
    asset: &MeshAsset,
    polygons: &[Polygon],
    space: VertexColorSpace,
) -> (ColorLayer, usize) {
    let mut per_point: Vec<Option<[f32; 4]>> = vec![None; asset.points.len()];
    let mut ambiguous = BTreeSet::new();

    for (wedge, rgba) in asset.wedges.iter().zip(&asset.vertex_colors) {
        let color = rgba.map(|c| c as f32 / 255.0);
        let slot = &mut per_point[wedge.point_index as usize];
        match slot {
            Some(existing) if *existing != color => {
                ambiguous.insert(wedge.point_index);
            }
            _ => *slot = Some(color),
        }
    }

    let resolved: Vec<[f32; 4]> = per_point
        .into_iter()
        .map(|color| match color {
            Some([r, g, b, a]) => match space {
                VertexColorSpace::Srgb => [rgb_to_srgb(r), rgb_to_srgb(g), rgb_to_srgb(b), a],
                VertexColorSpace::Linear => [r, g, b, a],
            },
            None => [1.0; 4],
        })
        .collect();

    let data = polygons
        .iter()
        .flat_map(|p| p.vertices)
        .map(|v| resolved[v as usize])
        .collect();

    (
        ColorLayer {
            name: COLOR_LAYER.to_string(),
            data,
        },
        ambiguous.len(),
    )
}

/// One group per bone that carries any weight, in bone order. Repeated
/// (point, bone) records add up.
fn build_vertex_groups(asset: &MeshAsset) -> Vec<VertexGroup> {
    let mut groups: BTreeMap<usize, VertexGroup> = BTreeMap::new();
    for weight in &asset.weights {
        let bone_index = weight.bone_index as usize;
        let group = groups.entry(bone_index).or_insert_with(|| VertexGroup {
            name: asset.bones[bone_index].name.clone(),
            bone_index,
            weights: BTreeMap::new(),
        });
        *group.weights.entry(weight.point_index as u32).or_insert(0.0) += weight.weight;
    }
    groups.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::psk_import::decode_psk;
    use crate::types::Weight;
    use crate::writer::{self, bone, face, wedge, PskWriter};

    fn build(bytes: &[u8]) -> BuiltTopology {
        let asset = decode_psk(bytes).unwrap();
        build_topology("SM_Test", &asset, &BuildOptions::default()).unwrap()
    }

    /// Two triangles sharing an edge, plus a third face that collapses
    fn quad_with_degenerate() -> PskWriter {
        let mut writer = PskWriter::new();
        writer
            .points(&[
                [0.0, 0.0, 0.0],
                [100.0, 0.0, 0.0],
                [100.0, 100.0, 0.0],
                [0.0, 100.0, 0.0],
            ])
            .wedges16(&[
                wedge(0, 0.0, 0.0, 0),
                wedge(1, 1.0, 0.0, 0),
                wedge(2, 1.0, 1.0, 0),
                wedge(3, 0.0, 1.0, 1),
                wedge(0, 0.5, 0.5, 1),
            ])
            .faces16(&[
                face([0, 1, 2], 0),
                face([0, 2, 3], 1),
                face([0, 4, 1], 0),
            ])
            .materials(&["M_A", "M_B"]);
        writer
    }

    #[test]
    fn test_counts_and_scale() {
        let built = build(&writer::triangle().to_bytes());
        assert_eq!(built.mesh.vertex_count(), 3);
        assert_eq!(built.mesh.polygon_count(), 1);
        assert_eq!(built.mesh.vertices[1], [1.0, 0.0, 0.0]);
        assert!(built.warnings.is_empty());
    }

    #[test]
    fn test_unscaled_positions() {
        let asset = decode_psk(&writer::triangle().to_bytes()).unwrap();
        let options = BuildOptions {
            scale_down: false,
            ..Default::default()
        };
        let built = build_topology("SM_Test", &asset, &options).unwrap();
        assert_eq!(built.mesh.vertices[1], [100.0, 0.0, 0.0]);
    }

    #[test]
    fn test_reverse_winding() {
        let built = build(&writer::triangle().to_bytes());
        assert_eq!(built.mesh.polygons[0].vertices, [2, 1, 0]);
    }

    #[test]
    fn test_degenerate_faces_skipped() {
        let built = build(&quad_with_degenerate().to_bytes());
        assert_eq!(built.mesh.polygon_count(), 2);
        assert_eq!(built.mesh.polygons[1].material_slot, 1);
        assert_eq!(built.warnings, vec![Warning::DegenerateFaces(1)]);
        // UV data only covers surviving faces
        assert_eq!(built.mesh.uv_layers[0].data.len(), 6);
        assert_eq!(built.mesh.corner_count(), 6);
    }

    #[test]
    fn test_mixed_degenerate_faces_counted() {
        let mut writer = PskWriter::new();
        writer
            .points(&[
                [0.0, 0.0, 0.0],
                [100.0, 0.0, 0.0],
                [100.0, 100.0, 0.0],
                [0.0, 100.0, 0.0],
            ])
            .wedges16(&[
                wedge(0, 0.0, 0.0, 0),
                wedge(1, 1.0, 0.0, 0),
                wedge(2, 1.0, 1.0, 0),
                wedge(3, 0.0, 1.0, 0),
                wedge(0, 0.5, 0.5, 0),
            ])
            .faces16(&[
                face([0, 1, 2], 0),
                // same wedge twice
                face([1, 1, 2], 0),
                // wedges 0 and 4 are distinct but share point 0
                face([0, 4, 1], 0),
                face([3, 3, 3], 0),
                face([0, 2, 3], 0),
                face([4, 1, 2], 0),
            ])
            .materials(&["M_A"]);
        let built = build(&writer.to_bytes());

        assert_eq!(built.warnings, vec![Warning::DegenerateFaces(3)]);
        assert_eq!(built.mesh.polygon_count(), 3);
        assert_eq!(built.mesh.polygons[2].vertices, [2, 1, 0]);
        assert_eq!(built.mesh.corner_count(), 9);
        assert_eq!(built.mesh.uv_layers[0].data.len(), built.mesh.corner_count());
        // surviving corners keep their own wedge UVs
        assert_eq!(built.mesh.uv_layers[0].data[8], [0.5, 0.5]);
    }

    #[test]
    fn test_uv_v_flip() {
        let built = build(&writer::triangle().to_bytes());
        let uvs = &built.mesh.uv_layer(PRIMARY_UV_LAYER).unwrap().data;
        // Corners are wedges 2, 1, 0
        assert_eq!(uvs[0], [0.0, 0.0]);
        assert_eq!(uvs[1], [1.0, 1.0]);
        assert_eq!(uvs[2], [0.0, 1.0]);
    }

    #[test]
    fn test_extra_uv_channels() {
        let bytes = writer::triangle()
            .extra_uvs(0, &[[0.1, 0.0], [0.2, 0.0], [0.3, 0.0]])
            .extra_uvs(1, &[[0.7, 0.25], [0.8, 0.25], [0.9, 0.25]])
            .to_bytes();
        let built = build(&bytes);
        assert_eq!(built.mesh.uv_layers.len(), 3);
        let ch0 = &built.mesh.uv_layer("EXTRAUV0").unwrap().data;
        let ch1 = &built.mesh.uv_layer("EXTRAUV1").unwrap().data;
        assert_eq!(ch0[0], [0.3, 1.0]);
        assert_eq!(ch1[0], [0.9, 0.75]);
        assert_eq!(ch1[2], [0.7, 0.75]);
    }

    #[test]
    fn test_short_extra_uv_channel_is_corrupt() {
        let bytes = writer::triangle()
            .extra_uvs(0, &[[0.1, 0.0], [0.2, 0.0]])
            .to_bytes();
        let asset = decode_psk(&bytes).unwrap();
        assert!(matches!(
            build_topology("SM_Test", &asset, &BuildOptions::default()),
            Err(QuarryError::CorruptMeshData(_))
        ));

        let skip = BuildOptions {
            import_extra_uvs: false,
            ..Default::default()
        };
        assert!(build_topology("SM_Test", &asset, &skip).is_ok());
    }

    #[test]
    fn test_first_color_wins_and_ambiguity_counted() {
        let mut writer = quad_with_degenerate();
        // Wedge 4 revisits point 0 with a different color
        writer.vertex_colors(&[
            [255, 0, 0, 255],
            [0, 255, 0, 255],
            [0, 0, 255, 255],
            [255, 255, 255, 255],
            [0, 0, 0, 255],
        ]);
        let asset = decode_psk(&writer.to_bytes()).unwrap();
        let options = BuildOptions {
            vertex_color_space: VertexColorSpace::Linear,
            ..Default::default()
        };
        let built = build_topology("SM_Test", &asset, &options).unwrap();

        assert!(built.warnings.contains(&Warning::AmbiguousVertexColors(1)));
        let colors = &built.mesh.color_layer.as_ref().unwrap().data;
        // First polygon corners are points 2, 1, 0
        assert_eq!(colors[2], [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(colors[0], [0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_srgb_curve_applied() {
        let bytes = writer::triangle()
            .vertex_colors(&[[128, 128, 128, 128]; 3])
            .to_bytes();
        let built = build(&bytes);
        let c = built.mesh.color_layer.unwrap().data[0];
        let linear = 128.0 / 255.0;
        assert!((c[0] - rgb_to_srgb(linear)).abs() < 1e-6);
        // Alpha is left linear
        assert!((c[3] - linear).abs() < 1e-6);
    }

    #[test]
    fn test_normals_mark_smooth() {
        let bytes = writer::triangle().normals(&[[0.0, 0.0, 1.0]; 3]).to_bytes();
        let built = build(&bytes);
        assert!(built.mesh.polygons.iter().all(|p| p.smooth));
        assert_eq!(built.mesh.custom_normals.unwrap().len(), 3);

        let flat = build(&writer::triangle().to_bytes());
        assert!(flat.mesh.polygons.iter().all(|p| !p.smooth));
    }

    #[test]
    fn test_weights_accumulate() {
        let bytes = writer::triangle()
            .bones(&[bone("Root", -1), bone("Arm", 0), bone("Hand", 1)])
            .weights(&[
                Weight {
                    weight: 0.3,
                    point_index: 1,
                    bone_index: 2,
                },
                Weight {
                    weight: 0.4,
                    point_index: 1,
                    bone_index: 2,
                },
                Weight {
                    weight: 1.0,
                    point_index: 0,
                    bone_index: 0,
                },
            ])
            .to_bytes();
        let built = build(&bytes);

        let names: Vec<&str> = built
            .mesh
            .vertex_groups
            .iter()
            .map(|g| g.name.as_str())
            .collect();
        assert_eq!(names, vec!["Root", "Hand"]);
        let hand = built.mesh.vertex_group("Hand").unwrap();
        assert!((hand.weights[&1] - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_bad_face_index_fails_whole_mesh() {
        let bytes = PskWriter::new()
            .points(&[[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]])
            .wedges16(&[wedge(0, 0.0, 0.0, 0), wedge(1, 0.0, 0.0, 0)])
            .faces16(&[face([0, 1, 2], 0)])
            .to_bytes();
        let asset = decode_psk(&bytes).unwrap();
        assert!(matches!(
            build_topology("SM_Test", &asset, &BuildOptions::default()),
            Err(QuarryError::CorruptMeshData(_))
        ));
    }

    #[test]
    fn test_options_from_toml() {
        let options: BuildOptions = toml::from_str(
            r#"
            scale_down = false
            vertex_color_space = "linear"
            "#,
        )
        .unwrap();
        assert!(!options.scale_down);
        assert_eq!(options.vertex_color_space, VertexColorSpace::Linear);
        assert!(options.import_extra_uvs);
    }
}

//! PSK mesh decoder

use crate::cursor::{ReadFieldsExt, RecordCursor};
use crate::layout::{FaceLayout, SectionKind, WedgeLayout};
use crate::section::{ByteSection, SectionScanner};
use crate::types::{Bone, Face, MeshAsset, PskMaterial, Weight, Wedge};
use byteorder::{LittleEndian, ReadBytesExt};
use quarry_core::{ContentHash, QuarryError, Result};
use serde::Serialize;
use std::io::{self, Read};
use std::path::Path;

/// Width of material and bone name fields
const NAME_SIZE: usize = 64;

/// Decode a PSK file from disk, returning the raw asset and the hash of its bytes
pub fn read_psk<P: AsRef<Path>>(path: P) -> Result<(MeshAsset, ContentHash)> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let hash = ContentHash::from_bytes(&bytes);
    let asset = decode_psk(&bytes)?;

    tracing::debug!(
        path = %path.display(),
        points = asset.points.len(),
        wedges = asset.wedges.len(),
        faces = asset.faces.len(),
        "decoded mesh"
    );
    Ok((asset, hash))
}

/// Decode an in-memory PSK stream.
///
/// Sections are dispatched by tag; any tag outside the schema table, or a
/// stride that does not match the tag's record layout, fails the decode.
pub fn decode_psk(data: &[u8]) -> Result<MeshAsset> {
    let mut asset = MeshAsset::default();

    for section in SectionScanner::new(data) {
        let section = section?;
        let tag = section.tag.name();
        let kind = SectionKind::classify(&tag).ok_or_else(|| QuarryError::UnrecognizedSection {
            tag: tag.clone(),
            offset: section.offset,
        })?;

        if let Some(expected) = kind.fixed_stride() {
            if section.stride != expected {
                return Err(QuarryError::UnexpectedStride {
                    tag,
                    expected,
                    found: section.stride,
                });
            }
        }

        match kind {
            SectionKind::Header => {}
            SectionKind::Points => {
                let points = read_records(&section, |r| r.read_vec3())?;
                asset.points.extend(points);
            }
            SectionKind::Wedges => {
                let layout = WedgeLayout::select(section.stride, asset.points.len())?;
                let wedges = read_records(&section, |r| read_wedge(r, layout))?;
                asset.wedges.extend(wedges);
            }
            SectionKind::Faces => {
                let layout = FaceLayout::select(section.stride)?;
                let faces = read_records(&section, |r| read_face(r, layout))?;
                asset.faces.extend(faces);
            }
            SectionKind::Materials => {
                asset.materials.extend(read_records(&section, read_material)?);
            }
            SectionKind::Bones => {
                asset.bones.extend(read_records(&section, read_bone)?);
            }
            SectionKind::Weights => {
                asset.weights.extend(read_records(&section, read_weight)?);
            }
            SectionKind::VertexColors => {
                let colors = read_records(&section, |r| {
                    let mut rgba = [0u8; 4];
                    r.read_exact(&mut rgba)?;
                    Ok(rgba)
                })?;
                asset.vertex_colors.extend(colors);
            }
            SectionKind::ExtraUvs => {
                let channel = read_records(&section, |r| r.read_vec2())?;
                asset.extra_uvs.push(channel);
            }
            SectionKind::VertexNormals => {
                asset.vertex_normals.extend(read_records(&section, |r| r.read_vec3())?);
            }
        }
    }

    Ok(asset)
}

/// One line of a structural dump of a PSK stream
#[derive(Debug, Clone, Serialize)]
pub struct SectionSummary {
    pub tag: String,
    /// `None` for tags outside the schema table
    pub kind: Option<SectionKind>,
    pub offset: usize,
    pub stride: u32,
    pub count: u32,
}

/// List the sections of a stream without decoding records.
///
/// Unknown tags are reported rather than rejected; framing errors still fail.
pub fn scan_sections(data: &[u8]) -> Result<Vec<SectionSummary>> {
    SectionScanner::new(data)
        .map(|section| {
            let section = section?;
            let tag = section.tag.name();
            Ok(SectionSummary {
                kind: SectionKind::classify(&tag),
                tag,
                offset: section.offset,
                stride: section.stride,
                count: section.count,
            })
        })
        .collect()
}

fn read_records<'a, T>(
    section: &ByteSection<'a>,
    mut read: impl FnMut(&mut RecordCursor<'a>) -> io::Result<T>,
) -> Result<Vec<T>> {
    let mut out = Vec::with_capacity(section.count as usize);
    for (index, mut record) in section.records().enumerate() {
        let value = read(&mut record).map_err(|e| {
            QuarryError::CorruptMeshData(format!(
                "{} record {} at offset {}: {}",
                section.tag, index, section.offset, e
            ))
        })?;
        out.push(value);
    }
    Ok(out)
}

fn read_wedge(r: &mut RecordCursor<'_>, layout: WedgeLayout) -> io::Result<Wedge> {
    match layout {
        WedgeLayout::Narrow => {
            let point_index = r.read_u16::<LittleEndian>()? as u32;
            r.read_i16::<LittleEndian>()?;
            let u = r.read_f32::<LittleEndian>()?;
            let v = r.read_f32::<LittleEndian>()?;
            let material_index = r.read_u8()? as u32;
            Ok(Wedge {
                point_index,
                u,
                v,
                material_index,
            })
        }
        WedgeLayout::Wide => Ok(Wedge {
            point_index: r.read_u32::<LittleEndian>()?,
            u: r.read_f32::<LittleEndian>()?,
            v: r.read_f32::<LittleEndian>()?,
            material_index: r.read_u32::<LittleEndian>()?,
        }),
    }
}

fn read_face(r: &mut RecordCursor<'_>, layout: FaceLayout) -> io::Result<Face> {
    let wedge_indices = match layout {
        FaceLayout::Narrow => [
            r.read_u16::<LittleEndian>()? as u32,
            r.read_u16::<LittleEndian>()? as u32,
            r.read_u16::<LittleEndian>()? as u32,
        ],
        FaceLayout::Wide => [
            r.read_u32::<LittleEndian>()?,
            r.read_u32::<LittleEndian>()?,
            r.read_u32::<LittleEndian>()?,
        ],
    };
    Ok(Face {
        wedge_indices,
        material_index: r.read_u8()?,
        aux_material_index: r.read_u8()?,
        smoothing_groups: r.read_i32::<LittleEndian>()?,
    })
}

fn read_material(r: &mut RecordCursor<'_>) -> io::Result<PskMaterial> {
    let name = String::from_utf8_lossy(&r.read_padded(NAME_SIZE)?).into_owned();
    Ok(PskMaterial {
        name,
        texture_index: r.read_i32::<LittleEndian>()?,
        poly_flags: r.read_i32::<LittleEndian>()?,
        aux_material: r.read_i32::<LittleEndian>()?,
        aux_flags: r.read_i32::<LittleEndian>()?,
        lod_bias: r.read_i32::<LittleEndian>()?,
        lod_style: r.read_i32::<LittleEndian>()?,
    })
}

fn read_bone(r: &mut RecordCursor<'_>) -> io::Result<Bone> {
    // Bone names are single-byte Latin-1
    let name = r.read_padded(NAME_SIZE)?.iter().map(|&b| b as char).collect();
    Ok(Bone {
        name,
        flags: r.read_i32::<LittleEndian>()?,
        children_count: r.read_i32::<LittleEndian>()?,
        parent_index: r.read_i32::<LittleEndian>()?,
        rotation: [
            r.read_f32::<LittleEndian>()?,
            r.read_f32::<LittleEndian>()?,
            r.read_f32::<LittleEndian>()?,
            r.read_f32::<LittleEndian>()?,
        ],
        location: r.read_vec3()?,
        length: r.read_f32::<LittleEndian>()?,
        size: r.read_vec3()?,
    })
}

fn read_weight(r: &mut RecordCursor<'_>) -> io::Result<Weight> {
    Ok(Weight {
        weight: r.read_f32::<LittleEndian>()?,
        point_index: r.read_i32::<LittleEndian>()?,
        bone_index: r.read_i32::<LittleEndian>()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::{self, bone, face, wedge, PskWriter};

    #[test]
    fn test_decode_triangle() {
        let asset = decode_psk(&writer::triangle().to_bytes()).unwrap();
        assert_eq!(asset.points.len(), 3);
        assert_eq!(asset.points[1], [100.0, 0.0, 0.0]);
        assert_eq!(asset.wedges.len(), 3);
        assert_eq!(asset.wedges[2].v, 1.0);
        assert_eq!(asset.faces.len(), 1);
        assert_eq!(asset.faces[0].wedge_indices, [0, 1, 2]);
        assert_eq!(asset.materials[0].name, "M_Default");
        assert!(!asset.has_extra_uvs());
    }

    #[test]
    fn test_empty_stream_is_empty_asset() {
        let asset = decode_psk(&[]).unwrap();
        assert!(asset.points.is_empty());
        assert!(asset.faces.is_empty());
    }

    #[test]
    fn test_header_only_stream() {
        let asset = decode_psk(&PskWriter::new().to_bytes()).unwrap();
        assert!(asset.wedges.is_empty());
    }

    #[test]
    fn test_wide_faces_are_packed() {
        let bytes = PskWriter::new()
            .points(&[[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]])
            .wedges16(&[
                wedge(0, 0.0, 0.0, 0),
                wedge(1, 0.0, 0.0, 0),
                wedge(2, 0.0, 0.0, 0),
            ])
            .faces32(&[face([2, 1, 0], 3)])
            .to_bytes();
        let asset = decode_psk(&bytes).unwrap();
        assert_eq!(asset.faces[0].wedge_indices, [2, 1, 0]);
        assert_eq!(asset.faces[0].material_index, 3);
    }

    #[test]
    fn test_wide_wedges_for_large_point_counts() {
        let points = vec![[0.0f32; 3]; 70_000];
        let bytes = PskWriter::new()
            .points(&points)
            .wedges32(&[wedge(69_999, 0.5, 0.25, 2)])
            .to_bytes();
        let asset = decode_psk(&bytes).unwrap();
        assert_eq!(asset.wedges[0].point_index, 69_999);
        assert_eq!(asset.wedges[0].material_index, 2);
    }

    #[test]
    fn test_repeated_sections_accumulate() {
        let bytes = PskWriter::new()
            .points(&[[0.0; 3], [1.0, 0.0, 0.0]])
            .wedges16(&[wedge(0, 0.0, 0.0, 0)])
            .materials(&["M_First"])
            .points(&[[0.0, 1.0, 0.0]])
            .wedges16(&[wedge(1, 1.0, 0.0, 1), wedge(2, 0.0, 1.0, 1)])
            .materials(&["M_Second"])
            .to_bytes();
        let asset = decode_psk(&bytes).unwrap();
        assert_eq!(asset.points.len(), 3);
        assert_eq!(asset.points[2], [0.0, 1.0, 0.0]);
        assert_eq!(asset.wedges.len(), 3);
        assert_eq!(asset.wedges[2].point_index, 2);
        assert_eq!(asset.materials.len(), 2);
        assert_eq!(asset.materials[0].name, "M_First");
        assert_eq!(asset.materials[1].name, "M_Second");
    }

    #[test]
    fn test_unknown_tag_fails() {
        let bytes = PskWriter::new()
            .section("MORPHTARGET", 4, 1, &[0; 4])
            .to_bytes();
        match decode_psk(&bytes) {
            Err(QuarryError::UnrecognizedSection { tag, offset }) => {
                assert_eq!(tag, "MORPHTARGET");
                assert_eq!(offset, 32);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_bad_wedge_stride() {
        let bytes = PskWriter::new()
            .section("VTXW0000", 12, 1, &[0; 12])
            .to_bytes();
        assert!(matches!(
            decode_psk(&bytes),
            Err(QuarryError::UnrecognizedWedgeFormat(12))
        ));
    }

    #[test]
    fn test_bad_face_stride() {
        let bytes = PskWriter::new()
            .section("FACE0000", 14, 1, &[0; 14])
            .to_bytes();
        assert!(matches!(
            decode_psk(&bytes),
            Err(QuarryError::UnrecognizedFaceFormat(14))
        ));
    }

    #[test]
    fn test_fixed_stride_mismatch() {
        let bytes = PskWriter::new()
            .section("PNTS0000", 16, 1, &[0; 16])
            .to_bytes();
        assert!(matches!(
            decode_psk(&bytes),
            Err(QuarryError::UnexpectedStride {
                expected: 12,
                found: 16,
                ..
            })
        ));
    }

    #[test]
    fn test_truncated_section_fails() {
        let mut bytes = writer::triangle().to_bytes();
        bytes.truncate(bytes.len() - 1);
        assert!(matches!(
            decode_psk(&bytes),
            Err(QuarryError::TruncatedPayload { .. })
        ));
    }

    #[test]
    fn test_extra_uv_channels_in_order() {
        let bytes = writer::triangle()
            .extra_uvs(0, &[[0.1, 0.1]; 3])
            .extra_uvs(1, &[[0.2, 0.2]; 3])
            .to_bytes();
        let asset = decode_psk(&bytes).unwrap();
        assert_eq!(asset.extra_uvs.len(), 2);
        assert_eq!(asset.extra_uvs[0][0], [0.1, 0.1]);
        assert_eq!(asset.extra_uvs[1][2], [0.2, 0.2]);
    }

    #[test]
    fn test_skin_sections() {
        let bytes = writer::triangle()
            .bones(&[bone("Root", 0), bone("Épaule", 0)])
            .weights(&[Weight {
                weight: 0.5,
                point_index: 1,
                bone_index: 1,
            }])
            .to_bytes();
        let asset = decode_psk(&bytes).unwrap();
        assert_eq!(asset.bones[1].name, "Épaule");
        assert_eq!(asset.bones[0].parent(0), None);
        assert_eq!(asset.weights[0].bone_index, 1);
        asset.validate().unwrap();
    }

    #[test]
    fn test_colors_and_normals() {
        let bytes = writer::triangle()
            .vertex_colors(&[[255, 0, 0, 255]; 3])
            .normals(&[[0.0, 0.0, 1.0]; 3])
            .to_bytes();
        let asset = decode_psk(&bytes).unwrap();
        assert_eq!(asset.vertex_colors[0], [255, 0, 0, 255]);
        assert_eq!(asset.vertex_normals[2], [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_scan_reports_unknown_tags() {
        let bytes = writer::triangle()
            .section("MORPHTARGET", 4, 1, &[0; 4])
            .to_bytes();
        let summary = scan_sections(&bytes).unwrap();
        assert_eq!(summary.len(), 6);
        assert_eq!(summary[1].kind, Some(SectionKind::Points));
        assert_eq!(summary[5].tag, "MORPHTARGET");
        assert_eq!(summary[5].kind, None);
    }

    #[test]
    fn test_read_psk_from_disk() {
        let dir = std::env::temp_dir().join(format!("quarry_psk_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("SM_Tri.psk");
        let bytes = writer::triangle().to_bytes();
        std::fs::write(&path, &bytes).unwrap();

        let (asset, hash) = read_psk(&path).unwrap();
        assert_eq!(asset.faces.len(), 1);
        assert_eq!(hash, ContentHash::from_bytes(&bytes));

        let _ = std::fs::remove_dir_all(&dir);
    }
}

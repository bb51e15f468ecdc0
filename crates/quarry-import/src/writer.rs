//! Synthetic PSK writer for building fixtures in tests

use crate::section::{SectionTag, FORMAT_FLAGS};
use crate::types::{Bone, Face, Weight, Wedge};
use byteorder::{LittleEndian, WriteBytesExt};
use std::io::{self, Write};

/// Width of material and bone name fields
const NAME_SIZE: usize = 64;

/// Appends sections to an in-memory PSK stream.
///
/// ```ignore
/// let bytes = PskWriter::new()
///     .points(&[[0.0, 0.0, 0.0]])
///     .materials(&["M_Stone"])
///     .to_bytes();
/// ```
#[derive(Debug, Clone)]
pub struct PskWriter {
    bytes: Vec<u8>,
}

impl Default for PskWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl PskWriter {
    /// Start a stream with the `ACTRHEAD` marker section
    pub fn new() -> Self {
        let mut writer = Self { bytes: Vec::new() };
        writer.section("ACTRHEAD", 0, 0, &[]);
        writer
    }

    /// Append a section verbatim. `payload` is not checked against
    /// `stride * count`, so malformed streams can be produced on purpose.
    pub fn section(&mut self, tag: &str, stride: u32, count: u32, payload: &[u8]) -> &mut Self {
        let header = encode(|w| {
            w.write_all(SectionTag::from_name(tag).as_bytes())?;
            w.write_i32::<LittleEndian>(FORMAT_FLAGS)?;
            w.write_u32::<LittleEndian>(stride)?;
            w.write_u32::<LittleEndian>(count)
        });
        self.bytes.extend_from_slice(&header);
        self.bytes.extend_from_slice(payload);
        self
    }

    pub fn points(&mut self, points: &[[f32; 3]]) -> &mut Self {
        let payload = encode(|w| points.iter().try_for_each(|p| write_vec3(w, *p)));
        self.section("PNTS0000", 12, points.len() as u32, &payload)
    }

    /// Wedges in the 16-bit point index layout
    pub fn wedges16(&mut self, wedges: &[Wedge]) -> &mut Self {
        let payload = encode(|w| {
            for wedge in wedges {
                w.write_u16::<LittleEndian>(wedge.point_index as u16)?;
                w.write_i16::<LittleEndian>(0)?;
                w.write_f32::<LittleEndian>(wedge.u)?;
                w.write_f32::<LittleEndian>(wedge.v)?;
                w.write_u8(wedge.material_index as u8)?;
                w.write_u8(0)?;
                w.write_i16::<LittleEndian>(0)?;
            }
            Ok(())
        });
        self.section("VTXW0000", 16, wedges.len() as u32, &payload)
    }

    /// Wedges in the 32-bit point index layout
    pub fn wedges32(&mut self, wedges: &[Wedge]) -> &mut Self {
        let payload = encode(|w| {
            for wedge in wedges {
                w.write_u32::<LittleEndian>(wedge.point_index)?;
                w.write_f32::<LittleEndian>(wedge.u)?;
                w.write_f32::<LittleEndian>(wedge.v)?;
                w.write_u32::<LittleEndian>(wedge.material_index)?;
            }
            Ok(())
        });
        self.section("VTXW0000", 16, wedges.len() as u32, &payload)
    }

    /// Faces with 16-bit wedge indices under `FACE0000`
    pub fn faces16(&mut self, faces: &[Face]) -> &mut Self {
        let payload = encode(|w| {
            for f in faces {
                for index in f.wedge_indices {
                    w.write_u16::<LittleEndian>(index as u16)?;
                }
                write_face_tail(w, f)?;
            }
            Ok(())
        });
        self.section("FACE0000", 12, faces.len() as u32, &payload)
    }

    /// Packed faces with 32-bit wedge indices under `FACE3200`
    pub fn faces32(&mut self, faces: &[Face]) -> &mut Self {
        let payload = encode(|w| {
            for f in faces {
                for index in f.wedge_indices {
                    w.write_u32::<LittleEndian>(index)?;
                }
                write_face_tail(w, f)?;
            }
            Ok(())
        });
        self.section("FACE3200", 18, faces.len() as u32, &payload)
    }

    pub fn materials(&mut self, names: &[&str]) -> &mut Self {
        let payload = encode(|w| {
            for name in names {
                write_name(w, name.as_bytes())?;
                for _ in 0..6 {
                    w.write_i32::<LittleEndian>(0)?;
                }
            }
            Ok(())
        });
        self.section("MATT0000", 88, names.len() as u32, &payload)
    }

    /// Bones; names are written as Latin-1 where possible
    pub fn bones(&mut self, bones: &[Bone]) -> &mut Self {
        let payload = encode(|w| {
            for b in bones {
                let latin1: Vec<u8> = b
                    .name
                    .chars()
                    .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
                    .collect();
                write_name(w, &latin1)?;
                w.write_i32::<LittleEndian>(b.flags)?;
                w.write_i32::<LittleEndian>(b.children_count)?;
                w.write_i32::<LittleEndian>(b.parent_index)?;
                for c in b.rotation {
                    w.write_f32::<LittleEndian>(c)?;
                }
                write_vec3(w, b.location)?;
                w.write_f32::<LittleEndian>(b.length)?;
                write_vec3(w, b.size)?;
            }
            Ok(())
        });
        self.section("REFSKELT", 120, bones.len() as u32, &payload)
    }

    pub fn weights(&mut self, weights: &[Weight]) -> &mut Self {
        let payload = encode(|w| {
            for weight in weights {
                w.write_f32::<LittleEndian>(weight.weight)?;
                w.write_i32::<LittleEndian>(weight.point_index)?;
                w.write_i32::<LittleEndian>(weight.bone_index)?;
            }
            Ok(())
        });
        self.section("RAWWEIGHTS", 12, weights.len() as u32, &payload)
    }

    pub fn vertex_colors(&mut self, colors: &[[u8; 4]]) -> &mut Self {
        let payload: Vec<u8> = colors.iter().flatten().copied().collect();
        self.section("VERTEXCOLOR", 4, colors.len() as u32, &payload)
    }

    /// One extra UV channel, tagged `EXTRAUVS{channel}`
    pub fn extra_uvs(&mut self, channel: usize, uvs: &[[f32; 2]]) -> &mut Self {
        let payload = encode(|w| {
            for uv in uvs {
                w.write_f32::<LittleEndian>(uv[0])?;
                w.write_f32::<LittleEndian>(uv[1])?;
            }
            Ok(())
        });
        self.section(&format!("EXTRAUVS{}", channel), 8, uvs.len() as u32, &payload)
    }

    pub fn normals(&mut self, normals: &[[f32; 3]]) -> &mut Self {
        let payload = encode(|w| normals.iter().try_for_each(|n| write_vec3(w, *n)));
        self.section("VTXNORMS", 12, normals.len() as u32, &payload)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.bytes.clone()
    }
}

/// Run `write` against a fresh buffer. Writes into a `Vec` cannot fail.
fn encode(write: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> Vec<u8> {
    let mut out = Vec::new();
    let _ = write(&mut out);
    out
}

fn write_vec3<W: Write>(w: &mut W, v: [f32; 3]) -> io::Result<()> {
    for c in v {
        w.write_f32::<LittleEndian>(c)?;
    }
    Ok(())
}

fn write_face_tail<W: Write>(w: &mut W, f: &Face) -> io::Result<()> {
    w.write_u8(f.material_index)?;
    w.write_u8(f.aux_material_index)?;
    w.write_i32::<LittleEndian>(f.smoothing_groups)
}

fn write_name<W: Write>(w: &mut W, name: &[u8]) -> io::Result<()> {
    let mut field = [0u8; NAME_SIZE];
    let len = name.len().min(NAME_SIZE - 1);
    field[..len].copy_from_slice(&name[..len]);
    w.write_all(&field)
}

/// Wedge shorthand for fixtures
pub fn wedge(point_index: u32, u: f32, v: f32, material_index: u32) -> Wedge {
    Wedge {
        point_index,
        u,
        v,
        material_index,
    }
}

/// Face shorthand for fixtures
pub fn face(wedge_indices: [u32; 3], material_index: u8) -> Face {
    Face {
        wedge_indices,
        material_index,
        aux_material_index: 0,
        smoothing_groups: 0,
    }
}

/// Bone shorthand for fixtures
pub fn bone(name: &str, parent_index: i32) -> Bone {
    Bone {
        name: name.to_string(),
        flags: 0,
        children_count: 0,
        parent_index,
        rotation: [0.0, 0.0, 0.0, 1.0],
        location: [0.0; 3],
        length: 1.0,
        size: [1.0; 3],
    }
}

/// A single-triangle mesh with one material, as written by most exporters
pub fn triangle() -> PskWriter {
    let mut writer = PskWriter::new();
    writer
        .points(&[[0.0, 0.0, 0.0], [100.0, 0.0, 0.0], [0.0, 100.0, 0.0]])
        .wedges16(&[
            wedge(0, 0.0, 0.0, 0),
            wedge(1, 1.0, 0.0, 0),
            wedge(2, 0.0, 1.0, 0),
        ])
        .faces16(&[face([0, 1, 2], 0)])
        .materials(&["M_Default"]);
    writer
}

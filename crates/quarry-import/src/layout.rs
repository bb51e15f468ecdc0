//! Per-tag record schema table

use quarry_core::{QuarryError, Result};
use serde::Serialize;

/// What a section's records contain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    /// File marker; its payload (if any) is skipped
    Header,
    Points,
    Wedges,
    Faces,
    Materials,
    Bones,
    Weights,
    VertexColors,
    /// One section per extra UV channel
    ExtraUvs,
    VertexNormals,
}

/// Known tags. `EXTRAUVS` is matched as a prefix since exporters number the
/// channels (`EXTRAUVS0`, `EXTRAUVS1`, ...).
const SCHEMA: &[(&str, SectionKind)] = &[
    ("ACTRHEAD", SectionKind::Header),
    ("PNTS0000", SectionKind::Points),
    ("VTXW0000", SectionKind::Wedges),
    ("FACE0000", SectionKind::Faces),
    ("FACE3200", SectionKind::Faces),
    ("MATT0000", SectionKind::Materials),
    ("REFSKELT", SectionKind::Bones),
    ("RAWWEIGHTS", SectionKind::Weights),
    ("VERTEXCOLOR", SectionKind::VertexColors),
    ("VTXNORMS", SectionKind::VertexNormals),
];

const EXTRA_UV_PREFIX: &str = "EXTRAUVS";

impl SectionKind {
    /// Look up a tag in the schema table
    pub fn classify(tag: &str) -> Option<Self> {
        SCHEMA
            .iter()
            .find(|(name, _)| *name == tag)
            .map(|(_, kind)| *kind)
            .or_else(|| tag.starts_with(EXTRA_UV_PREFIX).then_some(SectionKind::ExtraUvs))
    }

    /// Record size for kinds with a single layout. Wedges and faces have two
    /// legacy layouts each and are resolved by [`WedgeLayout::select`] and
    /// [`FaceLayout::select`].
    pub fn fixed_stride(self) -> Option<u32> {
        match self {
            SectionKind::Header | SectionKind::Wedges | SectionKind::Faces => None,
            SectionKind::Points => Some(12),
            SectionKind::Materials => Some(88),
            SectionKind::Bones => Some(120),
            SectionKind::Weights => Some(12),
            SectionKind::VertexColors => Some(4),
            SectionKind::ExtraUvs => Some(8),
            SectionKind::VertexNormals => Some(12),
        }
    }
}

/// Wedge record layouts. Both are 16 bytes wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WedgeLayout {
    /// u16 point, i16 pad, f32 u, f32 v, u8 material, i8 reserved, i16 pad
    Narrow,
    /// u32 point, f32 u, f32 v, u32 material
    Wide,
}

impl WedgeLayout {
    pub const NARROW_SIZE: u32 = 16;
    pub const WIDE_SIZE: u32 = 16;

    pub fn size(self) -> u32 {
        match self {
            WedgeLayout::Narrow => Self::NARROW_SIZE,
            WedgeLayout::Wide => Self::WIDE_SIZE,
        }
    }

    /// Choose the layout whose size matches `stride`.
    ///
    /// The sizes coincide, so the point count breaks the tie: the narrow
    /// layout cannot address more than `u16::MAX + 1` points.
    pub fn select(stride: u32, point_count: usize) -> Result<Self> {
        let wide_needed = point_count > u16::MAX as usize + 1;
        let candidates: &[WedgeLayout] = if wide_needed {
            &[WedgeLayout::Wide, WedgeLayout::Narrow]
        } else {
            &[WedgeLayout::Narrow, WedgeLayout::Wide]
        };
        candidates
            .iter()
            .copied()
            .find(|layout| layout.size() == stride)
            .ok_or(QuarryError::UnrecognizedWedgeFormat(stride))
    }
}

/// Face record layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceLayout {
    /// 3×u16 wedge, u8 material, u8 aux material, i32 smoothing groups
    Narrow,
    /// Packed 3×u32 wedge, u8 material, u8 aux material, i32 smoothing groups
    Wide,
}

impl FaceLayout {
    pub const NARROW_SIZE: u32 = 12;
    pub const WIDE_SIZE: u32 = 18;

    pub fn select(stride: u32) -> Result<Self> {
        match stride {
            Self::NARROW_SIZE => Ok(FaceLayout::Narrow),
            Self::WIDE_SIZE => Ok(FaceLayout::Wide),
            other => Err(QuarryError::UnrecognizedFaceFormat(other)),
        }
    }
}

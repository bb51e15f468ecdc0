//! Quarry Import - PSK mesh decoding
//!
//! This crate turns the binary PSK mesh format into a polygon mesh:
//! - `SectionScanner` splits a byte stream into tagged sections
//! - `decode_psk` assembles a raw `MeshAsset` from those sections
//! - `build_topology` reconstructs vertices, polygons, UV/color layers,
//!   custom normals and skin weights from the raw wedge soup

mod color;
mod cursor;
mod layout;
mod psk_import;
mod section;
mod topology;
mod types;

#[cfg(any(test, feature = "test-util"))]
pub mod writer;

pub use color::rgb_to_srgb;
pub use cursor::{ReadFieldsExt, RecordCursor};
pub use layout::{FaceLayout, SectionKind, WedgeLayout};
pub use psk_import::{decode_psk, read_psk, scan_sections, SectionSummary};
pub use section::{ByteSection, SectionScanner, SectionTag, FORMAT_FLAGS, HEADER_SIZE};
pub use topology::{build_topology, BuildOptions, BuiltTopology, VertexColorSpace, UNIT_SCALE};
pub use types::{
    Bone, ColorLayer, Face, MeshAsset, MeshBounds, Polygon, PolygonMesh, PskMaterial, UvLayer,
    VertexGroup, Wedge, Weight,
};

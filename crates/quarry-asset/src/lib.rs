//! Quarry Asset - At-most-once asset cache
//!
//! This crate provides the build-once cache shared by every placement of the
//! same mesh, the key derivation that decides when two placements share an
//! entry, and resolution of mesh references to files on disk.

mod cache;
mod key;
mod resolver;
mod types;

pub use cache::{AssetCache, CacheStats};
pub use key::{basename, material_memo_name, texture_suffix, CacheKey, ReusePolicy};
pub use resolver::{probe_file, DirectoryMeshSource, MeshBytes, MeshSource, MESH_EXTENSIONS};
pub use types::{BuiltAsset, FallbackPolicy};

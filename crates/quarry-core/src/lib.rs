//! Quarry Core - Foundational types for the Quarry world importer
//!
//! This crate provides the types that all other Quarry crates depend on:
//! - `QuarryError` / `Warning` - Error taxonomy and recoverable diagnostics
//! - `ContentHash` - SHA-256 based content hashing
//! - `string_hash_code` / `truncate_identifier` - Stable 32-bit naming hashes
//! - `ObjectId`, `MeshId`, ... - Typed scene handles
//! - `Transform`, `Vec3`, `Color` - Spatial types

mod error;
mod hash;
mod id;
mod types;

pub use error::{ErrorClass, QuarryError, Result, Warning};
pub use hash::{hash_suffix, string_hash_code, truncate_identifier, ContentHash};
pub use id::{CollectionId, MaterialId, MeshId, ObjectId};
pub use types::{Color, Transform, Vec3};

//! Cached asset types

use crate::key::CacheKey;
use quarry_core::{ContentHash, MeshId, QuarryError, Warning};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A mesh built once and shared by every placement with the same key
#[derive(Debug, Clone)]
pub struct BuiltAsset {
    pub key: CacheKey,
    pub mesh: MeshId,
    /// Material slot names in slot order
    pub material_slots: Vec<String>,
    /// Data-integrity warnings raised while building
    pub warnings: Vec<Warning>,
    /// Hash of the mesh file, `None` when an existing host mesh was adopted
    pub source_hash: Option<ContentHash>,
}

impl BuiltAsset {
    /// Index of the slot named `name`
    pub fn slot_index(&self, name: &str) -> Option<usize> {
        self.material_slots.iter().position(|s| s == name)
    }
}

/// What stands in for a placement whose mesh is absent or unusable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackPolicy {
    /// A 2-unit cube, visible in the scene
    #[default]
    Cube,
    /// A mesh with no geometry
    Empty,
}

impl FallbackPolicy {
    /// Name of the shared fallback mesh
    pub fn mesh_name(self) -> &'static str {
        match self {
            FallbackPolicy::Cube => "__fallback",
            FallbackPolicy::Empty => "__empty",
        }
    }
}

impl fmt::Display for FallbackPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackPolicy::Cube => write!(f, "cube"),
            FallbackPolicy::Empty => write!(f, "empty"),
        }
    }
}

impl FromStr for FallbackPolicy {
    type Err = QuarryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cube" => Ok(FallbackPolicy::Cube),
            "empty" => Ok(FallbackPolicy::Empty),
            other => Err(QuarryError::ConfigError(format!(
                "unknown fallback '{}', expected 'cube' or 'empty'",
                other
            ))),
        }
    }
}

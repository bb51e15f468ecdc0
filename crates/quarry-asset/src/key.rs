//! Cache identity derivation

use quarry_core::{hash_suffix, truncate_identifier};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of one built mesh: the mesh file plus the material and texture
/// overrides applied to it. Two placements with equal keys share one build.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for a placement.
    ///
    /// `texture_overrides` holds the first texture path of each override map,
    /// `None` for an empty map.
    pub fn derive(
        mesh_path: &str,
        material_paths: &[&str],
        texture_overrides: &[Option<&str>],
    ) -> Self {
        let mut key = basename(mesh_path).to_string();
        if !material_paths.is_empty() {
            key.push('_');
            key.push_str(&hash_suffix(&material_paths.join(";")));
        }
        key.push_str(&texture_suffix(texture_overrides));
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// `_xxxxxxxx` over the first texture path of each override, or an empty
/// string when there are no overrides
pub fn texture_suffix(texture_overrides: &[Option<&str>]) -> String {
    if texture_overrides.is_empty() {
        return String::new();
    }
    let firsts: Vec<&str> = texture_overrides.iter().map(|t| t.unwrap_or("")).collect();
    format!("_{}", hash_suffix(&firsts.join(";")))
}

/// Name under which a built material is memoized
pub fn material_memo_name(material_path: &str, texture_suffix: &str) -> String {
    truncate_identifier(&format!("{}.mat{}", basename(material_path), texture_suffix))
}

/// Last `/`-separated segment of an asset path
pub fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Which levels of the placement tree may reuse earlier builds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReusePolicy {
    /// Instance an already built group instead of rebuilding its subtree
    pub groups: bool,
    /// Share built meshes between placements with equal keys
    pub meshes: bool,
}

impl Default for ReusePolicy {
    fn default() -> Self {
        Self {
            groups: true,
            meshes: true,
        }
    }
}

//! Mesh reference resolution

use quarry_core::{ContentHash, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Extensions tried, in order, when a mesh reference is resolved on disk
pub const MESH_EXTENSIONS: &[&str] = &["psk", "pskx"];

/// Raw mesh file contents plus where they came from
#[derive(Debug, Clone)]
pub struct MeshBytes {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
    pub hash: ContentHash,
}

/// Where mesh files come from
pub trait MeshSource {
    /// Fetch the file for an extensionless mesh reference.
    ///
    /// `Ok(None)` means no file exists; an existing but unreadable file is
    /// an error.
    fn fetch(&self, mesh_path: &str) -> Result<Option<MeshBytes>>;
}

/// Resolves mesh references against an export data directory
#[derive(Debug, Clone)]
pub struct DirectoryMeshSource {
    root: PathBuf,
}

impl DirectoryMeshSource {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl MeshSource for DirectoryMeshSource {
    fn fetch(&self, mesh_path: &str) -> Result<Option<MeshBytes>> {
        let Some(path) = probe_file(&self.root, mesh_path, MESH_EXTENSIONS) else {
            return Ok(None);
        };
        let bytes = fs::read(&path)?;
        let hash = ContentHash::from_bytes(&bytes);
        tracing::trace!(path = %path.display(), %hash, "read mesh file");
        Ok(Some(MeshBytes { path, bytes, hash }))
    }
}

/// Find the first existing `<root>/<asset_path>.<ext>`.
///
/// Asset paths are rooted (`/Game/...`); the leading slash is dropped before
/// joining.
pub fn probe_file(root: &Path, asset_path: &str, extensions: &[&str]) -> Option<PathBuf> {
    let relative = asset_path.trim_start_matches('/');
    if relative.is_empty() {
        return None;
    }
    let base = root.join(relative);
    extensions
        .iter()
        .map(|ext| {
            let mut name = base.clone().into_os_string();
            name.push(".");
            name.push(ext);
            PathBuf::from(name)
        })
        .find(|candidate| candidate.is_file())
}

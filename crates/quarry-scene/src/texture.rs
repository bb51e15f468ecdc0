//! Texture resolution and shader-input classification

use quarry_asset::{basename, probe_file, AssetCache};
use quarry_core::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Extensions tried, in order, when a texture reference is resolved on disk
pub const TEXTURE_EXTENSIONS: &[&str] = &["tga", "png", "dds"];

/// A resolved texture image
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TextureRef {
    /// Basename of the texture path; textures are shared by this name
    pub name: String,
    pub path: PathBuf,
}

/// Where texture images come from
pub trait TextureLoader {
    /// Resolve an extensionless texture path. `Ok(None)` if no file exists.
    fn load(&mut self, texture_path: &str) -> Result<Option<Rc<TextureRef>>>;
}

/// Resolves textures under an export data directory, sharing them by basename
#[derive(Debug)]
pub struct DirectoryTextureLoader {
    root: PathBuf,
    loaded: AssetCache<String, TextureRef>,
}

impl DirectoryTextureLoader {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            loaded: AssetCache::new(),
        }
    }

    pub fn loaded_count(&self) -> usize {
        self.loaded.len()
    }

    /// Release textures no material refers to any more
    pub fn sweep(&mut self) -> usize {
        self.loaded.sweep()
    }
}

impl TextureLoader for DirectoryTextureLoader {
    fn load(&mut self, texture_path: &str) -> Result<Option<Rc<TextureRef>>> {
        let name = basename(texture_path);
        if let Some(existing) = self.loaded.get(name) {
            return Ok(Some(existing));
        }

        let Some(path) = probe_file(&self.root, texture_path, TEXTURE_EXTENSIONS) else {
            tracing::warn!(texture = texture_path, "texture not found");
            return Ok(None);
        };
        tracing::trace!(path = %path.display(), "loaded texture");
        let texture = TextureRef {
            name: name.to_string(),
            path,
        };
        Ok(Some(self.loaded.insert(name.to_string(), texture)))
    }
}

/// What a texture feeds in the shader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextureRole {
    Diffuse,
    Normal,
    Specular,
    Emission,
    Mask,
}

impl TextureRole {
    pub const ALL: [TextureRole; 5] = [
        TextureRole::Diffuse,
        TextureRole::Normal,
        TextureRole::Specular,
        TextureRole::Emission,
        TextureRole::Mask,
    ];
}

/// Shader input names per role for one UV channel
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureSet {
    pub diffuse: Vec<String>,
    pub normal: Vec<String>,
    pub specular: Vec<String>,
    pub emission: Vec<String>,
    pub mask: Vec<String>,
}

impl TextureSet {
    fn from_names(
        diffuse: &[&str],
        normal: &[&str],
        specular: &[&str],
        emission: &[&str],
        mask: &[&str],
    ) -> Self {
        let owned = |names: &[&str]| names.iter().map(|n| n.to_string()).collect();
        Self {
            diffuse: owned(diffuse),
            normal: owned(normal),
            specular: owned(specular),
            emission: owned(emission),
            mask: owned(mask),
        }
    }

    /// Default input names for the given 0-based UV channel
    fn for_channel(channel: u8) -> Self {
        if channel == 0 {
            return Self::from_names(
                &[
                    "Trunk_BaseColor",
                    "Diffuse",
                    "DiffuseTexture",
                    "Base_Color_Tex",
                    "Tex_Color",
                ],
                &[
                    "Trunk_Normal",
                    "Normals",
                    "Normal",
                    "Base_Normal_Tex",
                    "Tex_Normal",
                ],
                &["Trunk_Specular", "SpecularMasks"],
                &["EmissiveTexture"],
                &["MaskTexture"],
            );
        }
        let n = channel + 1;
        Self {
            diffuse: vec![format!("Diffuse_Texture_{}", n)],
            normal: vec![format!("Normals_Texture_{}", n)],
            specular: vec![format!("Specular_Texture_{}", n)],
            emission: vec![format!("Emissive_Texture_{}", n)],
            mask: vec![format!("MaskTexture_{}", n)],
        }
    }

    pub fn names(&self, role: TextureRole) -> &[String] {
        match role {
            TextureRole::Diffuse => &self.diffuse,
            TextureRole::Normal => &self.normal,
            TextureRole::Specular => &self.specular,
            TextureRole::Emission => &self.emission,
            TextureRole::Mask => &self.mask,
        }
    }

    fn names_mut(&mut self, role: TextureRole) -> &mut Vec<String> {
        match role {
            TextureRole::Diffuse => &mut self.diffuse,
            TextureRole::Normal => &mut self.normal,
            TextureRole::Specular => &mut self.specular,
            TextureRole::Emission => &mut self.emission,
            TextureRole::Mask => &mut self.mask,
        }
    }

    pub fn role_of(&self, input: &str) -> Option<TextureRole> {
        TextureRole::ALL
            .into_iter()
            .find(|role| self.names(*role).iter().any(|n| n == input))
    }
}

/// Which shader inputs sample which UV channel, and in what role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureMapping {
    pub uv1: TextureSet,
    pub uv2: TextureSet,
    pub uv3: TextureSet,
    pub uv4: TextureSet,
}

impl Default for TextureMapping {
    fn default() -> Self {
        Self {
            uv1: TextureSet::for_channel(0),
            uv2: TextureSet::for_channel(1),
            uv3: TextureSet::for_channel(2),
            uv4: TextureSet::for_channel(3),
        }
    }
}

impl TextureMapping {
    fn channels(&self) -> [&TextureSet; 4] {
        [&self.uv1, &self.uv2, &self.uv3, &self.uv4]
    }

    fn channels_mut(&mut self) -> [&mut TextureSet; 4] {
        [&mut self.uv1, &mut self.uv2, &mut self.uv3, &mut self.uv4]
    }

    /// 0-based UV channel and role for a shader input, first match wins
    pub fn lookup(&self, input: &str) -> Option<(u8, TextureRole)> {
        self.channels()
            .into_iter()
            .zip(0u8..)
            .find_map(|(set, channel)| set.role_of(input).map(|role| (channel, role)))
    }

    /// Replace every role list that `other` sets to a non-empty value
    pub fn overlay(&mut self, other: &TextureMapping) {
        for (mine, theirs) in self.channels_mut().into_iter().zip(other.channels()) {
            for role in TextureRole::ALL {
                let names = theirs.names(role);
                if !names.is_empty() {
                    *mine.names_mut(role) = names.to_vec();
                }
            }
        }
    }
}

//! Layered import configuration
//!
//! Settings are resolved with four layers of precedence (highest wins):
//! 1. Command-line flags (applied by the caller)
//! 2. Environment variables: `QUARRY_DATA_DIR`, `QUARRY_FALLBACK`,
//!    `QUARRY_REUSE_GROUPS`, `QUARRY_REUSE_MESHES`
//! 3. Project-local: `.quarry/config.toml`
//! 4. Global: `~/.quarry/config.toml`

use crate::texture::TextureMapping;
use quarry_asset::{FallbackPolicy, ReusePolicy};
use quarry_core::{QuarryError, Result};
use quarry_import::BuildOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory holding `config.toml`, both in the home and project directory
pub const CONFIG_DIR: &str = ".quarry";
const CONFIG_FILE: &str = "config.toml";

fn default_collection() -> String {
    "Imported".to_string()
}

/// One config file as written on disk
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportConfigFile {
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default)]
    pub collection: Option<String>,
    #[serde(default)]
    pub fallback: Option<FallbackPolicy>,
    #[serde(default)]
    pub reuse: ReusePolicy,
    #[serde(default)]
    pub build: BuildOptions,
    #[serde(default)]
    pub textures: Option<TextureMapping>,
}

/// Resolved settings for one import run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportSettings {
    /// Export directory holding `processed.json`, `jsons/` and the assets
    pub data_dir: PathBuf,
    /// Collection the root group is placed into
    pub collection: String,
    pub fallback: FallbackPolicy,
    pub reuse: ReusePolicy,
    pub build: BuildOptions,
    pub textures: TextureMapping,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            collection: default_collection(),
            fallback: FallbackPolicy::default(),
            reuse: ReusePolicy::default(),
            build: BuildOptions::default(),
            textures: TextureMapping::default(),
        }
    }
}

impl ImportSettings {
    /// Load settings with layered precedence: global < project < env vars
    pub fn load() -> Result<Self> {
        let project = PathBuf::from(CONFIG_DIR).join(CONFIG_FILE);
        Self::load_layers(
            Self::global_config_path().as_deref(),
            Some(&project),
            |key| std::env::var(key).ok(),
        )
    }

    /// Load from explicit file layers and an environment lookup. Missing
    /// files are skipped.
    pub fn load_layers(
        global: Option<&Path>,
        project: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let mut settings = Self::default();

        for path in [global, project].into_iter().flatten() {
            if path.exists() {
                tracing::debug!(path = %path.display(), "loading config");
                settings.merge_file(Self::load_file(path)?);
            }
        }

        settings.apply_env(env)?;
        Ok(settings)
    }

    /// Load a single config file, without environment overrides
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let mut settings = Self::default();
        settings.merge_file(Self::load_file(path)?);
        Ok(settings)
    }

    pub fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    fn load_file(path: &Path) -> Result<ImportConfigFile> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            QuarryError::ConfigError(format!("Failed to parse config {}: {}", path.display(), e))
        })
    }

    fn merge_file(&mut self, overlay: ImportConfigFile) {
        if let Some(data_dir) = overlay.data_dir {
            self.data_dir = data_dir;
        }
        if let Some(collection) = overlay.collection {
            self.collection = collection;
        }
        if let Some(fallback) = overlay.fallback {
            self.fallback = fallback;
        }

        let reuse_defaults = ReusePolicy::default();
        if overlay.reuse.groups != reuse_defaults.groups {
            self.reuse.groups = overlay.reuse.groups;
        }
        if overlay.reuse.meshes != reuse_defaults.meshes {
            self.reuse.meshes = overlay.reuse.meshes;
        }

        let build_defaults = BuildOptions::default();
        let build = overlay.build;
        if build.scale_down != build_defaults.scale_down {
            self.build.scale_down = build.scale_down;
        }
        if build.import_extra_uvs != build_defaults.import_extra_uvs {
            self.build.import_extra_uvs = build.import_extra_uvs;
        }
        if build.import_vertex_colors != build_defaults.import_vertex_colors {
            self.build.import_vertex_colors = build.import_vertex_colors;
        }
        if build.vertex_color_space != build_defaults.vertex_color_space {
            self.build.vertex_color_space = build.vertex_color_space;
        }
        if build.import_vertex_normals != build_defaults.import_vertex_normals {
            self.build.import_vertex_normals = build.import_vertex_normals;
        }

        if let Some(textures) = overlay.textures {
            self.textures.overlay(&textures);
        }
    }

    fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(dir) = env("QUARRY_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(fallback) = env("QUARRY_FALLBACK") {
            self.fallback = fallback.parse()?;
        }
        if let Some(value) = env("QUARRY_REUSE_GROUPS") {
            self.reuse.groups = parse_flag("QUARRY_REUSE_GROUPS", &value)?;
        }
        if let Some(value) = env("QUARRY_REUSE_MESHES") {
            self.reuse.meshes = parse_flag("QUARRY_REUSE_MESHES", &value)?;
        }
        Ok(())
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(QuarryError::ConfigError(format!(
            "{} must be a boolean, got '{}'",
            name, other
        ))),
    }
}

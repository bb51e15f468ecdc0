//! Quarry Scene - Placement-tree import
//!
//! This crate walks an exported placement tree and populates a host scene:
//! - `format` / `loader` read placement records and light groups
//! - `SceneHost` is the mutation surface; `SceneGraph` implements it in memory
//! - `MaterialBuilder`, `TextureLoader` and `LightBuilder` turn exported
//!   parameters into host data
//! - `SceneImporter` ties these together with the asset cache

mod config;
mod format;
mod graph;
mod host;
mod importer;
mod light;
mod loader;
mod material;
mod texture;
mod transform;

pub use config::{ImportConfigFile, ImportSettings, CONFIG_DIR};
pub use format::{
    parse_lights, parse_records, parse_root, ActorRecord, GroupRef, LightComponent, LightGroup,
    LightProperties, MaterialOverride, MaterialParams, RotationValue, TextureOverride,
    VectorParam,
};
pub use graph::{CollectionNode, ObjectNode, SceneGraph, SceneSummary};
pub use host::{ObjectData, SceneHost};
pub use importer::{ImportReport, NodeFailure, NodeWarning, SceneImporter};
pub use light::{BuiltLight, LightBuilder, LightData, LightKind, PhysicalLightBuilder};
pub use loader::{DirectoryPlacementSource, PlacementGroup, PlacementSource};
pub use material::{
    BlendMode, MaterialBuild, MaterialBuilder, MaterialData, MaterialRequest,
    ShaderParamMaterialBuilder, TextureBinding,
};
pub use texture::{
    DirectoryTextureLoader, TextureLoader, TextureMapping, TextureRef, TextureRole, TextureSet,
    TEXTURE_EXTENSIONS,
};
pub use transform::{
    legacy_euler, light_correction, placement_transform, rotation_to_quat, rotator_to_quat,
    scale_position,
};

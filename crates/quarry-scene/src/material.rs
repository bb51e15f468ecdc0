//! Material construction from exported shader parameters

use crate::format::{MaterialParams, TextureOverride};
use crate::texture::{TextureLoader, TextureMapping, TextureRef, TextureRole};
use quarry_core::{Color, Result, Warning};
use serde::Serialize;

/// Everything needed to build one material
#[derive(Debug, Clone, Copy)]
pub struct MaterialRequest<'a> {
    /// Name the built material is registered under
    pub name: &'a str,
    /// Exported material path
    pub path: &'a str,
    pub params: &'a MaterialParams,
    /// The placement's texture overrides, applied on top of the parameters
    pub texture_overrides: &'a [TextureOverride],
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BlendMode {
    Opaque,
    #[default]
    Clip,
    Blend,
}

/// A texture connected to a shader input
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextureBinding {
    pub input: String,
    pub texture: TextureRef,
    /// 0-based UV channel the input samples, when the mapping knows it
    pub uv_channel: Option<u8>,
    pub role: Option<TextureRole>,
}

/// Host-side material description
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialData {
    pub name: String,
    pub shader: String,
    pub textures: Vec<TextureBinding>,
    pub scalars: Vec<(String, f32)>,
    pub colors: Vec<(String, Color)>,
    pub backface_culling: bool,
    pub blend: BlendMode,
}

impl MaterialData {
    pub fn new(name: impl Into<String>, shader: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shader: shader.into(),
            textures: Vec::new(),
            scalars: Vec::new(),
            colors: Vec::new(),
            backface_culling: false,
            blend: BlendMode::Clip,
        }
    }

    pub fn texture(&self, input: &str) -> Option<&TextureBinding> {
        self.textures.iter().find(|t| t.input == input)
    }
}

/// A built material plus what could not be resolved while building it
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialBuild {
    pub data: MaterialData,
    pub warnings: Vec<Warning>,
}

/// Turns exported material parameters into host material data
pub trait MaterialBuilder {
    fn build(
        &mut self,
        request: &MaterialRequest<'_>,
        textures: &mut dyn TextureLoader,
    ) -> Result<MaterialBuild>;
}

/// Maps every exported parameter onto a shader input of the same name
#[derive(Debug, Clone, Default)]
pub struct ShaderParamMaterialBuilder {
    mapping: TextureMapping,
}

impl ShaderParamMaterialBuilder {
    pub fn new(mapping: TextureMapping) -> Self {
        Self { mapping }
    }

    pub fn mapping(&self) -> &TextureMapping {
        &self.mapping
    }
}

/// Parameter textures with the placement's overrides applied: an override
/// replaces the input of the same name, or adds a new one
fn effective_textures<'a>(
    params: &'a MaterialParams,
    overrides: &'a [TextureOverride],
) -> Vec<(&'a str, &'a str)> {
    let mut textures: Vec<(&str, &str)> = params
        .texture_params
        .iter()
        .map(|(input, path)| (input.as_str(), path.as_str()))
        .collect();
    for (input, path) in overrides.iter().flat_map(|o| o.0.iter()) {
        match textures.iter_mut().find(|(existing, _)| *existing == input.as_str()) {
            Some(entry) => entry.1 = path.as_str(),
            None => textures.push((input.as_str(), path.as_str())),
        }
    }
    textures
}

impl MaterialBuilder for ShaderParamMaterialBuilder {
    fn build(
        &mut self,
        request: &MaterialRequest<'_>,
        textures: &mut dyn TextureLoader,
    ) -> Result<MaterialBuild> {
        let params = request.params;
        let mut data = MaterialData::new(request.name, params.shader_name.as_str());
        let mut warnings = Vec::new();

        for (input, path) in effective_textures(params, request.texture_overrides) {
            let Some(texture) = textures.load(path)? else {
                warnings.push(Warning::MissingTexture(path.to_string()));
                continue;
            };
            let tagged = self.mapping.lookup(input);
            data.textures.push(TextureBinding {
                input: input.to_string(),
                texture: (*texture).clone(),
                uv_channel: tagged.map(|(channel, _)| channel),
                role: tagged.map(|(_, role)| role),
            });
        }

        data.scalars = params.scalar_params.clone();

        for (input, value) in &params.vector_params {
            match value.to_color() {
                Some(color) => data.colors.push((input.clone(), color)),
                None => tracing::warn!(
                    material = request.path,
                    input = input.as_str(),
                    "unreadable color parameter"
                ),
            }
        }

        tracing::debug!(
            material = request.name,
            textures = data.textures.len(),
            "built material"
        );
        Ok(MaterialBuild { data, warnings })
    }
}

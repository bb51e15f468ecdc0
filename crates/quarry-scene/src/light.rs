//! Light construction from exported light components

use crate::format::{LightComponent, LightProperties, RotationValue};
use crate::transform::{light_correction, rotation_to_quat, scale_position};
use quarry_core::{Result, Transform, Vec3};
use serde::Serialize;
use std::f32::consts::PI;

/// Lumens per watt used by the photometric conversions
const LUMINOUS_EFFICACY: f32 = 683.0;
const DEFAULT_CONE_ANGLE: f32 = 90.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LightKind {
    Point,
    Spot,
    Rect,
}

impl LightKind {
    /// Classify an exported component type; `None` for unsupported lights
    pub fn from_type_name(type_name: &str) -> Option<Self> {
        if type_name.contains("Point") {
            Some(LightKind::Point)
        } else if type_name.contains("Spot") {
            Some(LightKind::Spot)
        } else if type_name.contains("RectLightComponent") {
            Some(LightKind::Rect)
        } else {
            None
        }
    }
}

/// Host-side light description. `None` fields keep the host's defaults.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LightData {
    pub name: String,
    pub kind: LightKind,
    /// Radiant power in watts
    pub energy: Option<f32>,
    pub color: [f32; 3],
    pub cast_shadows: bool,
    pub shadow_soft_size: Option<f32>,
    /// Rect lights only, in meters
    pub width: Option<f32>,
    pub height: Option<f32>,
    /// Spot lights only, cone angle in radians
    pub spot_size: Option<f32>,
    pub spot_blend: Option<f32>,
}

impl LightData {
    pub fn new(name: impl Into<String>, kind: LightKind) -> Self {
        Self {
            name: name.into(),
            kind,
            energy: None,
            color: [1.0, 1.0, 1.0],
            cast_shadows: true,
            shadow_soft_size: None,
            width: None,
            height: None,
            spot_size: None,
            spot_blend: None,
        }
    }
}

/// A light plus its transform relative to the placement it belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltLight {
    pub data: LightData,
    pub transform: Transform,
}

/// Turns exported light components into host light data
pub trait LightBuilder {
    /// `Ok(None)` skips components the builder does not support
    fn build(&mut self, light: &LightComponent) -> Result<Option<BuiltLight>>;
}

/// Photometric conversion of point, spot and rect lights
#[derive(Debug, Clone, Copy, Default)]
pub struct PhysicalLightBuilder;

impl PhysicalLightBuilder {
    pub fn new() -> Self {
        Self
    }
}

fn is_candelas(props: &LightProperties) -> bool {
    props
        .intensity_units
        .as_deref()
        .is_some_and(|units| !units.contains("Unitless"))
}

/// Watts for an exported intensity
pub fn light_energy(kind: LightKind, intensity: f32, candelas: bool, cone_angle: f32) -> f32 {
    match (kind, candelas) {
        (LightKind::Point, true) => intensity * 4.0 * PI / LUMINOUS_EFFICACY,
        (LightKind::Point, false) => intensity * 49.7 / LUMINOUS_EFFICACY,
        (LightKind::Rect, true) => intensity * 2.0 * PI / LUMINOUS_EFFICACY,
        (LightKind::Rect, false) => intensity * 199.0 / LUMINOUS_EFFICACY,
        (LightKind::Spot, true) => {
            let solid = 2.0 * PI * (1.0 - (cone_angle.to_radians() / 2.0).cos());
            intensity * solid / LUMINOUS_EFFICACY
        }
        (LightKind::Spot, false) => {
            99.5 * (1.0 - (cone_angle.to_radians() / 2.0).cos()) * intensity
        }
    }
}

fn relative_transform(props: &LightProperties) -> Transform {
    let mut transform = Transform::IDENTITY;
    if let Some(location) = props.relative_location {
        transform.position = scale_position(location.to_array());
    }
    let rotation = props
        .relative_rotation
        .map(|r| rotation_to_quat(RotationValue::Rotator(r.to_array())))
        .unwrap_or_default();
    transform.rotation = (rotation * light_correction()).to_array();
    if let Some(scale) = props.relative_scale {
        transform.scale = Vec3::from_array(scale.to_array());
    }
    transform
}

impl LightBuilder for PhysicalLightBuilder {
    fn build(&mut self, light: &LightComponent) -> Result<Option<BuiltLight>> {
        let Some(kind) = LightKind::from_type_name(&light.type_name) else {
            tracing::debug!(light_type = light.type_name.as_str(), "skipping unsupported light");
            return Ok(None);
        };
        let props = &light.properties;
        let mut data = LightData::new(light.display_name(), kind);

        let cone_angle = props.outer_cone_angle.unwrap_or(DEFAULT_CONE_ANGLE);
        data.energy = props
            .intensity
            .map(|intensity| light_energy(kind, intensity, is_candelas(props), cone_angle));

        if let Some(color) = props.light_color {
            data.color = [color.r / 255.0, color.g / 255.0, color.b / 255.0];
        }
        if let Some(cast) = props.cast_shadows {
            data.cast_shadows = cast;
        }
        if let Some(radius) = props.source_radius {
            let factor = if kind == LightKind::Spot { 0.01 } else { 0.1 };
            data.shadow_soft_size = Some(radius * factor);
        }

        match kind {
            LightKind::Rect => {
                data.width = props.source_width.map(|w| w * 0.01);
                data.height = props.source_height.map(|h| h * 0.01);
            }
            LightKind::Spot => {
                data.spot_size = props.outer_cone_angle.map(f32::to_radians);
                data.spot_blend = props.inner_cone_angle.map(|_| 1.0);
            }
            LightKind::Point => {}
        }

        Ok(Some(BuiltLight {
            data,
            transform: relative_transform(props),
        }))
    }
}

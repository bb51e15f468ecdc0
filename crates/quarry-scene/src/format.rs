//! Placement tree file format definitions
//!
//! Each group file is a JSON array of actor records. A record is itself a
//! positional array:
//!
//! ```text
//! [guid, name, mesh, materials, textures, position, rotation, scale, children, light_index]
//! ```
//!
//! Every slot except `name` may be `null`, and trailing slots may be omitted.

use quarry_asset::{texture_suffix, CacheKey};
use quarry_core::{Color, QuarryError, Result};
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::{Map, Value};

/// One placed actor
#[derive(Debug, Clone, PartialEq)]
pub struct ActorRecord {
    pub guid: Option<String>,
    pub name: String,
    /// Extensionless mesh path, `None` for actors without geometry
    pub mesh: Option<String>,
    /// Material overrides in slot order
    pub materials: Vec<MaterialOverride>,
    /// Per-layer texture overrides; an empty override keeps its position
    pub textures: Vec<TextureOverride>,
    pub position: Option<[f32; 3]>,
    pub rotation: Option<RotationValue>,
    pub scale: Option<[f32; 3]>,
    /// Nested groups; `None` entries mark groups the exporter could not resolve
    pub children: Vec<Option<GroupRef>>,
    /// Index into the group's light file, `-1` for none
    pub light_index: i32,
}

impl ActorRecord {
    /// A bare record, mainly for building trees in code
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            guid: None,
            name: name.into(),
            mesh: None,
            materials: Vec::new(),
            textures: Vec::new(),
            position: None,
            rotation: None,
            scale: None,
            children: Vec::new(),
            light_index: -1,
        }
    }

    pub fn with_mesh(mut self, mesh: impl Into<String>) -> Self {
        self.mesh = Some(mesh.into());
        self
    }

    pub fn with_position(mut self, position: [f32; 3]) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_child(mut self, child: GroupRef) -> Self {
        self.children.push(Some(child));
        self
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn material_paths(&self) -> Vec<&str> {
        self.materials.iter().map(|m| m.path.as_str()).collect()
    }

    /// First texture path of each override, `None` for empty overrides
    pub fn texture_firsts(&self) -> Vec<Option<&str>> {
        self.textures.iter().map(|t| t.first()).collect()
    }

    /// Suffix shared by the mesh key and the material memo names
    pub fn texture_suffix(&self) -> String {
        texture_suffix(&self.texture_firsts())
    }

    /// Identity of the mesh this record builds, if it references one
    pub fn cache_key(&self) -> Option<CacheKey> {
        let mesh = self.mesh.as_deref()?;
        Some(CacheKey::derive(
            mesh,
            &self.material_paths(),
            &self.texture_firsts(),
        ))
    }

    fn from_fields(fields: Vec<Value>) -> std::result::Result<Self, String> {
        let mut fields = fields.into_iter();
        let mut next = || fields.next().unwrap_or(Value::Null);

        let guid: Option<String> = field(next(), "guid")?;
        let name: String = field::<Option<String>>(next(), "name")?
            .ok_or_else(|| "record is missing its name".to_string())?;
        let mesh = field::<Option<String>>(next(), "mesh")?.filter(|m| !m.is_empty());

        let materials = match field::<Option<Map<String, Value>>>(next(), "materials")? {
            Some(map) => map
                .into_iter()
                .map(|(path, params)| {
                    Ok(MaterialOverride {
                        params: field(params, "material parameters")?,
                        path,
                    })
                })
                .collect::<std::result::Result<_, String>>()?,
            None => Vec::new(),
        };

        let textures = field::<Option<Vec<Option<Map<String, Value>>>>>(next(), "textures")?
            .unwrap_or_default()
            .into_iter()
            .map(|layer| {
                let entries = ordered_entries(layer.unwrap_or_default(), "texture override")?;
                Ok(TextureOverride(entries))
            })
            .collect::<std::result::Result<_, String>>()?;

        let position = field(next(), "position")?;
        let rotation = match field::<Option<Vec<f32>>>(next(), "rotation")? {
            None => None,
            Some(values) => Some(RotationValue::from_slice(&values)?),
        };
        let scale = field(next(), "scale")?;
        let children = field::<Option<Vec<Option<GroupRef>>>>(next(), "children")?
            .unwrap_or_default();
        let light_index = field::<Option<i32>>(next(), "light index")?.unwrap_or(-1);

        Ok(Self {
            guid,
            name,
            mesh,
            materials,
            textures,
            position,
            rotation,
            scale,
            children,
            light_index,
        })
    }
}

impl<'de> Deserialize<'de> for ActorRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let fields = Vec::<Value>::deserialize(deserializer)?;
        ActorRecord::from_fields(fields).map_err(de::Error::custom)
    }
}

fn field<T: DeserializeOwned>(value: Value, what: &str) -> std::result::Result<T, String> {
    serde_json::from_value(value).map_err(|e| format!("invalid {}: {}", what, e))
}

/// Decode a JSON object into (key, value) pairs, keeping file order and
/// dropping `null` values
fn ordered_entries<T: DeserializeOwned>(
    map: Map<String, Value>,
    what: &str,
) -> std::result::Result<Vec<(String, T)>, String> {
    map.into_iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| Ok((k, field(v, what)?)))
        .collect()
}

fn ordered_map<'de, D, T>(deserializer: D) -> std::result::Result<Vec<(String, T)>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let map = Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default();
    ordered_entries(map, "parameter").map_err(de::Error::custom)
}

/// Exported rotation: an Unreal rotator in degrees or a quaternion
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RotationValue {
    /// [pitch, yaw, roll] in degrees
    Rotator([f32; 3]),
    /// [x, y, z, w]
    Quat([f32; 4]),
}

impl RotationValue {
    fn from_slice(values: &[f32]) -> std::result::Result<Self, String> {
        match *values {
            [pitch, yaw, roll] => Ok(RotationValue::Rotator([pitch, yaw, roll])),
            [x, y, z, w] => Ok(RotationValue::Quat([x, y, z, w])),
            _ => Err(format!(
                "rotation must have 3 or 4 components, got {}",
                values.len()
            )),
        }
    }
}

/// A reference to a nested group
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum GroupRef {
    /// Rooted group path (`/Game/Maps/Lobby`), loaded from its own file
    Path(String),
    /// Records embedded directly in the parent file
    Inline(Vec<ActorRecord>),
}

/// A material slot override and the parameters to build it from
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialOverride {
    pub path: String,
    /// `None` keeps whatever material the mesh file names for the slot
    pub params: Option<MaterialParams>,
}

/// Exported shader parameters for one material
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MaterialParams {
    #[serde(rename = "ShaderName", default)]
    pub shader_name: String,
    /// Shader input -> texture path
    #[serde(rename = "TextureParams", default, deserialize_with = "ordered_map")]
    pub texture_params: Vec<(String, String)>,
    #[serde(rename = "ScalerParams", default, deserialize_with = "ordered_map")]
    pub scalar_params: Vec<(String, f32)>,
    #[serde(rename = "VectorParams", default, deserialize_with = "ordered_map")]
    pub vector_params: Vec<(String, VectorParam)>,
}

impl MaterialParams {
    /// True for `{}`: no shader and no parameters to build a material from
    pub fn is_empty(&self) -> bool {
        self.shader_name.is_empty()
            && self.texture_params.is_empty()
            && self.scalar_params.is_empty()
            && self.vector_params.is_empty()
    }
}

/// A color-valued shader parameter
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum VectorParam {
    /// `AARRGGBB` or `RRGGBB`
    Hex(String),
    Linear {
        #[serde(rename = "R")]
        r: f32,
        #[serde(rename = "G")]
        g: f32,
        #[serde(rename = "B")]
        b: f32,
        #[serde(rename = "A", default = "one")]
        a: f32,
    },
}

fn one() -> f32 {
    1.0
}

impl VectorParam {
    pub fn to_color(&self) -> Option<Color> {
        match self {
            VectorParam::Hex(hex) => Color::from_argb_hex(hex),
            VectorParam::Linear { r, g, b, a } => Some(Color::new(*r, *g, *b, *a)),
        }
    }
}

/// Role -> texture path pairs for one texture layer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextureOverride(pub Vec<(String, String)>);

impl TextureOverride {
    pub fn first(&self) -> Option<&str> {
        self.0.first().map(|(_, path)| path.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, role: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == role)
            .map(|(_, v)| v.as_str())
    }
}

/// The lights attached to one actor
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LightGroup {
    #[serde(rename = "Props", default)]
    pub props: Vec<LightComponent>,
}

/// An exported light component
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LightComponent {
    /// Component class, e.g. `PointLightComponent`
    #[serde(rename = "Type")]
    pub type_name: String,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "Outer", default)]
    pub outer: Option<String>,
    #[serde(rename = "Properties", default)]
    pub properties: LightProperties,
}

impl LightComponent {
    /// Object name for the light: the owning actor, else the component
    pub fn display_name(&self) -> &str {
        self.outer
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or(&self.type_name)
    }
}

/// The light properties the importer understands; anything else is ignored
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LightProperties {
    #[serde(rename = "Intensity")]
    pub intensity: Option<f32>,
    /// Present only when the exporter recorded a physical unit
    #[serde(rename = "IntensityUnits")]
    pub intensity_units: Option<String>,
    #[serde(rename = "LightColor")]
    pub light_color: Option<Rgba255>,
    #[serde(rename = "SourceRadius")]
    pub source_radius: Option<f32>,
    #[serde(rename = "CastShadows")]
    pub cast_shadows: Option<bool>,
    #[serde(rename = "SourceWidth")]
    pub source_width: Option<f32>,
    #[serde(rename = "SourceHeight")]
    pub source_height: Option<f32>,
    #[serde(rename = "InnerConeAngle")]
    pub inner_cone_angle: Option<f32>,
    #[serde(rename = "OuterConeAngle")]
    pub outer_cone_angle: Option<f32>,
    #[serde(rename = "RelativeLocation")]
    pub relative_location: Option<Xyz>,
    #[serde(rename = "RelativeRotation")]
    pub relative_rotation: Option<Rotator>,
    #[serde(rename = "RelativeScale3D")]
    pub relative_scale: Option<Xyz>,
}

/// 8-bit color channels as exported (values 0-255)
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Rgba255 {
    #[serde(rename = "R")]
    pub r: f32,
    #[serde(rename = "G")]
    pub g: f32,
    #[serde(rename = "B")]
    pub b: f32,
    #[serde(rename = "A", default = "opaque")]
    pub a: f32,
}

fn opaque() -> f32 {
    255.0
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Xyz {
    #[serde(rename = "X")]
    pub x: f32,
    #[serde(rename = "Y")]
    pub y: f32,
    #[serde(rename = "Z")]
    pub z: f32,
}

impl Xyz {
    pub fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }
}

/// Unreal rotator in degrees
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Rotator {
    #[serde(rename = "Pitch")]
    pub pitch: f32,
    #[serde(rename = "Yaw")]
    pub yaw: f32,
    #[serde(rename = "Roll")]
    pub roll: f32,
}

impl Rotator {
    pub fn to_array(self) -> [f32; 3] {
        [self.pitch, self.yaw, self.roll]
    }
}

/// Parse a group file
pub fn parse_records(json: &str) -> Result<Vec<ActorRecord>> {
    serde_json::from_str(json).map_err(|e| QuarryError::PlacementParse(e.to_string()))
}

/// Parse a group's light file
pub fn parse_lights(json: &str) -> Result<Vec<LightGroup>> {
    serde_json::from_str(json).map_err(|e| QuarryError::PlacementParse(e.to_string()))
}

/// Parse the root entry file: a group path or inline records
pub fn parse_root(json: &str) -> Result<GroupRef> {
    serde_json::from_str(json).map_err(|e| QuarryError::PlacementParse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROCK: &str = r#"[
        "0a1b2c",
        "Rock_01",
        "/Game/Props/SM_Rock",
        {
            "/Game/M/MI_Moss": {
                "ShaderName": "M_Rock",
                "TextureParams": {"Diffuse": "/Game/T/T_Moss_D", "Normals": "/Game/T/T_Moss_N"},
                "ScalerParams": {"Roughness": 0.8},
                "VectorParams": {"Tint": "ff336699"}
            },
            "/Game/M/MI_Plain": null
        },
        [{"Diffuse": "/Game/T/T_Wet_D"}, {}],
        [100.0, -200.0, 50.0],
        [0.0, 90.0, 0.0],
        null,
        [],
        -1
    ]"#;

    #[test]
    fn test_parse_full_record() {
        let record: ActorRecord = serde_json::from_str(ROCK).unwrap();
        assert_eq!(record.guid.as_deref(), Some("0a1b2c"));
        assert_eq!(record.name, "Rock_01");
        assert_eq!(record.mesh.as_deref(), Some("/Game/Props/SM_Rock"));
        assert_eq!(
            record.material_paths(),
            vec!["/Game/M/MI_Moss", "/Game/M/MI_Plain"]
        );

        let params = record.materials[0].params.as_ref().unwrap();
        assert_eq!(params.shader_name, "M_Rock");
        assert_eq!(params.texture_params[0].0, "Diffuse");
        assert_eq!(params.texture_params[1].1, "/Game/T/T_Moss_N");
        assert_eq!(params.scalar_params, vec![("Roughness".to_string(), 0.8)]);
        assert!(record.materials[1].params.is_none());

        assert_eq!(
            record.texture_firsts(),
            vec![Some("/Game/T/T_Wet_D"), None]
        );
        assert_eq!(record.rotation, Some(RotationValue::Rotator([0.0, 90.0, 0.0])));
        assert_eq!(record.scale, None);
        assert!(!record.has_children());
        assert_eq!(record.light_index, -1);
    }

    #[test]
    fn test_cache_key_from_record() {
        let record: ActorRecord = serde_json::from_str(ROCK).unwrap();
        let key = record.cache_key().unwrap();
        assert_eq!(
            key,
            CacheKey::derive(
                "/Game/Props/SM_Rock",
                &["/Game/M/MI_Moss", "/Game/M/MI_Plain"],
                &[Some("/Game/T/T_Wet_D"), None],
            )
        );
        assert!(ActorRecord::new("Empty").cache_key().is_none());
    }

    #[test]
    fn test_short_record_defaults() {
        let record: ActorRecord = serde_json::from_str(r#"[null, "Marker"]"#).unwrap();
        assert_eq!(record.name, "Marker");
        assert!(record.mesh.is_none());
        assert!(record.materials.is_empty());
        assert_eq!(record.light_index, -1);
    }

    #[test]
    fn test_children_kinds() {
        let json = r#"[null, "Foundation", null, null, null, null,
            [0.0, 0.0, 0.0, 1.0], null,
            ["/Game/Maps/Lobby", [[null, "Inner", "/Game/SM_Box"]], null], -1]"#;
        let record: ActorRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.rotation, Some(RotationValue::Quat([0.0, 0.0, 0.0, 1.0])));
        assert_eq!(record.children.len(), 3);
        assert_eq!(
            record.children[0],
            Some(GroupRef::Path("/Game/Maps/Lobby".into()))
        );
        match &record.children[1] {
            Some(GroupRef::Inline(records)) => assert_eq!(records[0].name, "Inner"),
            other => panic!("expected inline group, got {:?}", other),
        }
        assert!(record.children[2].is_none());
    }

    #[test]
    fn test_bad_records_rejected() {
        assert!(matches!(
            parse_records(r#"[[null, null]]"#),
            Err(QuarryError::PlacementParse(_))
        ));
        assert!(parse_records(r#"[[null, "A", null, null, null, null, [1.0, 2.0]]]"#).is_err());
        assert!(parse_records(r#"{"not": "an array"}"#).is_err());
    }

    #[test]
    fn test_vector_params() {
        let hex = VectorParam::Hex("336699".into()).to_color().unwrap();
        assert_eq!(hex.a, 1.0);
        let linear: VectorParam =
            serde_json::from_str(r#"{"R": 0.5, "G": 0.25, "B": 0.0}"#).unwrap();
        assert_eq!(linear.to_color(), Some(Color::new(0.5, 0.25, 0.0, 1.0)));
    }

    #[test]
    fn test_empty_material_params() {
        let empty: MaterialParams = serde_json::from_str("{}").unwrap();
        assert!(empty.is_empty());
        let scalar: MaterialParams =
            serde_json::from_str(r#"{"ScalerParams": {"Roughness": 0.5}}"#).unwrap();
        assert!(!scalar.is_empty());
    }

    #[test]
    fn test_parse_lights() {
        let json = r#"[{"Props": [{
            "Type": "PointLightComponent",
            "Name": "LightComponent0",
            "Outer": "Lamp_01",
            "Properties": {
                "Intensity": 5000.0,
                "LightColor": {"R": 255, "G": 128, "B": 0, "A": 255},
                "RelativeLocation": {"X": 0.0, "Y": 0.0, "Z": 120.0},
                "SomethingElse": [1, 2, 3]
            }
        }]}]"#;
        let groups = parse_lights(json).unwrap();
        let light = &groups[0].props[0];
        assert_eq!(light.display_name(), "Lamp_01");
        assert_eq!(light.properties.intensity, Some(5000.0));
        assert_eq!(light.properties.light_color.unwrap().g, 128.0);
        assert_eq!(
            light.properties.relative_location.unwrap().to_array(),
            [0.0, 0.0, 120.0]
        );
    }

    #[test]
    fn test_parse_root_variants() {
        assert_eq!(
            parse_root(r#""/Game/Maps/Apollo""#).unwrap(),
            GroupRef::Path("/Game/Maps/Apollo".into())
        );
        assert!(matches!(
            parse_root(r#"[[null, "A"]]"#).unwrap(),
            GroupRef::Inline(_)
        ));
    }
}

//! Placement tree loading from an export directory

use crate::format::{parse_lights, parse_records, parse_root, ActorRecord, GroupRef, LightGroup};
use quarry_core::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Entry file naming the root group
pub const ROOT_FILE: &str = "processed.json";
const GROUP_SUFFIX: &str = ".processed.json";
const LIGHTS_SUFFIX: &str = ".lights.processed.json";

/// The records of one group plus its optional light groups
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlacementGroup {
    pub records: Vec<ActorRecord>,
    pub lights: Option<Vec<LightGroup>>,
}

impl PlacementGroup {
    pub fn new(records: Vec<ActorRecord>) -> Self {
        Self {
            records,
            lights: None,
        }
    }

    pub fn with_lights(mut self, lights: Vec<LightGroup>) -> Self {
        self.lights = Some(lights);
        self
    }

    /// Light group for a record's light index, if the index is in range
    pub fn light_group(&self, index: i32) -> Option<&LightGroup> {
        let index = usize::try_from(index).ok()?;
        self.lights.as_ref()?.get(index)
    }
}

/// Where placement groups come from
pub trait PlacementSource {
    /// The group the import starts from
    fn root(&self) -> Result<GroupRef>;

    /// Load a group by its rooted path
    fn load_group(&self, path: &str) -> Result<PlacementGroup>;
}

/// Reads placement groups from an export data directory:
///
/// ```text
/// <data>/processed.json
/// <data>/jsons/Game/Maps/Lobby.processed.json
/// <data>/jsons/Game/Maps/Lobby.lights.processed.json   (optional)
/// ```
#[derive(Debug, Clone)]
pub struct DirectoryPlacementSource {
    root: PathBuf,
}

impl DirectoryPlacementSource {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn group_file(&self, path: &str) -> PathBuf {
        self.jsons_file(path, GROUP_SUFFIX)
    }

    pub fn lights_file(&self, path: &str) -> PathBuf {
        self.jsons_file(path, LIGHTS_SUFFIX)
    }

    fn jsons_file(&self, path: &str, suffix: &str) -> PathBuf {
        let relative = path.trim_start_matches('/');
        self.root
            .join("jsons")
            .join(format!("{}{}", relative, suffix))
    }
}

impl PlacementSource for DirectoryPlacementSource {
    fn root(&self) -> Result<GroupRef> {
        let content = fs::read_to_string(self.root.join(ROOT_FILE))?;
        parse_root(&content)
    }

    fn load_group(&self, path: &str) -> Result<PlacementGroup> {
        let group_file = self.group_file(path);
        tracing::debug!(file = %group_file.display(), "loading group");
        let records = parse_records(&fs::read_to_string(&group_file)?)?;

        let lights_file = self.lights_file(path);
        let lights = if lights_file.is_file() {
            Some(parse_lights(&fs::read_to_string(&lights_file)?)?)
        } else {
            None
        };

        Ok(PlacementGroup { records, lights })
    }
}

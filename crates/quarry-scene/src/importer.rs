//! Placement tree import
//!
//! Walks the group tree depth-first. Each group becomes a collection placed
//! through a collection-instance object; each record becomes a mesh object,
//! a fallback object, or instances of its child groups. Meshes, materials
//! and groups are built once per identity and shared afterwards.

use crate::config::ImportSettings;
use crate::format::{ActorRecord, GroupRef};
use crate::host::{ObjectData, SceneHost};
use crate::light::{LightBuilder, PhysicalLightBuilder};
use crate::loader::{DirectoryPlacementSource, PlacementGroup, PlacementSource};
use crate::material::{MaterialBuilder, MaterialRequest, ShaderParamMaterialBuilder};
use crate::texture::{DirectoryTextureLoader, TextureLoader};
use crate::transform::placement_transform;
use quarry_asset::{
    basename, material_memo_name, AssetCache, BuiltAsset, CacheKey, DirectoryMeshSource,
    FallbackPolicy, MeshSource,
};
use quarry_core::{
    truncate_identifier, CollectionId, ErrorClass, MaterialId, MeshId, ObjectId, QuarryError,
    Result, Transform, Warning,
};
use quarry_import::{build_topology, decode_psk, BuildOptions, PolygonMesh};
use serde::Serialize;
use std::rc::Rc;

/// A placement that could not be imported
#[derive(Debug, Clone, Serialize)]
pub struct NodeFailure {
    pub group: String,
    pub node: String,
    pub message: String,
    #[serde(skip)]
    pub class: ErrorClass,
}

/// A recoverable problem attached to one placement
#[derive(Debug, Clone, Serialize)]
pub struct NodeWarning {
    pub group: String,
    pub node: String,
    pub message: String,
    #[serde(skip)]
    pub warning: Warning,
}

/// Outcome of one import run
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    /// Objects created, including instances, fallbacks and lights
    pub objects: usize,
    pub groups_built: usize,
    pub groups_reused: usize,
    pub meshes_built: usize,
    pub mesh_cache_hits: usize,
    pub materials_built: usize,
    pub lights: usize,
    pub fallbacks: usize,
    /// Cache entries and host data released by the start and end sweeps
    pub swept: usize,
    pub failures: Vec<NodeFailure>,
    pub warnings: Vec<NodeWarning>,
}

impl ImportReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.warnings.is_empty()
    }

    pub fn has_warning(&self, warning: &Warning) -> bool {
        self.warnings.iter().any(|w| &w.warning == warning)
    }
}

enum BuildFailure {
    /// No mesh file exists for the reference
    Missing,
    Failed(QuarryError),
}

impl From<QuarryError> for BuildFailure {
    fn from(err: QuarryError) -> Self {
        BuildFailure::Failed(err)
    }
}

/// Where the record being imported sits in the tree
struct NodeContext<'g> {
    group: &'g str,
    placement: &'g PlacementGroup,
    collection: CollectionId,
}

/// Collaborators a mesh build needs, borrowed apart from the mesh cache
struct BuildContext<'a> {
    host: &'a mut dyn SceneHost,
    meshes: &'a dyn MeshSource,
    materials: &'a mut dyn MaterialBuilder,
    textures: &'a mut dyn TextureLoader,
    material_cache: &'a mut AssetCache<String, MaterialId>,
    options: &'a BuildOptions,
    report: &'a mut ImportReport,
}

/// Imports a placement tree into a [`SceneHost`]
pub struct SceneImporter<'h> {
    host: &'h mut dyn SceneHost,
    placements: Box<dyn PlacementSource>,
    meshes: Box<dyn MeshSource>,
    materials: Box<dyn MaterialBuilder>,
    textures: Box<dyn TextureLoader>,
    lights: Box<dyn LightBuilder>,
    settings: ImportSettings,
    group_cache: AssetCache<String, CollectionId>,
    mesh_cache: AssetCache<CacheKey, BuiltAsset>,
    material_cache: AssetCache<String, MaterialId>,
    build_stack: Vec<String>,
    fallback_mesh: Option<MeshId>,
    report: ImportReport,
}

impl<'h> SceneImporter<'h> {
    /// An importer reading everything from `settings.data_dir`
    pub fn new(host: &'h mut dyn SceneHost, settings: ImportSettings) -> Self {
        let data_dir = settings.data_dir.clone();
        Self {
            host,
            placements: Box::new(DirectoryPlacementSource::new(&data_dir)),
            meshes: Box::new(DirectoryMeshSource::new(&data_dir)),
            materials: Box::new(ShaderParamMaterialBuilder::new(settings.textures.clone())),
            textures: Box::new(DirectoryTextureLoader::new(&data_dir)),
            lights: Box::new(PhysicalLightBuilder::new()),
            settings,
            group_cache: AssetCache::new(),
            mesh_cache: AssetCache::new(),
            material_cache: AssetCache::new(),
            build_stack: Vec::new(),
            fallback_mesh: None,
            report: ImportReport::default(),
        }
    }

    pub fn with_placements(mut self, placements: impl PlacementSource + 'static) -> Self {
        self.placements = Box::new(placements);
        self
    }

    pub fn with_mesh_source(mut self, meshes: impl MeshSource + 'static) -> Self {
        self.meshes = Box::new(meshes);
        self
    }

    pub fn with_material_builder(mut self, materials: impl MaterialBuilder + 'static) -> Self {
        self.materials = Box::new(materials);
        self
    }

    pub fn with_texture_loader(mut self, textures: impl TextureLoader + 'static) -> Self {
        self.textures = Box::new(textures);
        self
    }

    pub fn with_light_builder(mut self, lights: impl LightBuilder + 'static) -> Self {
        self.lights = Box::new(lights);
        self
    }

    pub fn settings(&self) -> &ImportSettings {
        &self.settings
    }

    /// Import the source's root group into the configured collection.
    ///
    /// Only a failure to read the root or to prepare the scene is returned
    /// as an error; problems with individual placements end up in the report.
    pub fn run(&mut self) -> Result<ImportReport> {
        self.report = ImportReport::default();
        self.sweep();
        self.ensure_fallback_meshes()?;

        let root = self.placements.root()?;
        let target = match self.host.find_collection(&self.settings.collection) {
            Some(collection) => collection,
            None => self.host.create_collection(&self.settings.collection)?,
        };
        let instance_name = match &root {
            GroupRef::Path(path) => basename(path).to_string(),
            GroupRef::Inline(_) => self.settings.collection.clone(),
        };
        tracing::info!(
            collection = self.settings.collection.as_str(),
            root = instance_name.as_str(),
            "importing placement tree"
        );

        self.import_group(&root, target, &instance_name)?;
        self.sweep();

        let report = std::mem::take(&mut self.report);
        tracing::info!(
            objects = report.objects,
            meshes = report.meshes_built,
            fallbacks = report.fallbacks,
            failures = report.failures.len(),
            "import finished"
        );
        Ok(report)
    }

    fn sweep(&mut self) {
        let released =
            self.group_cache.sweep() + self.mesh_cache.sweep() + self.material_cache.sweep();
        self.report.swept += released + self.host.remove_unused();
    }

    fn ensure_fallback_meshes(&mut self) -> Result<()> {
        for policy in [FallbackPolicy::Cube, FallbackPolicy::Empty] {
            let name = policy.mesh_name();
            let mesh = match self.host.find_mesh(name) {
                Some(mesh) => mesh,
                None => {
                    let geometry = match policy {
                        FallbackPolicy::Cube => PolygonMesh::cube(name, 2.0),
                        FallbackPolicy::Empty => PolygonMesh::empty(name),
                    };
                    self.host.create_mesh(geometry)?
                }
            };
            if policy == self.settings.fallback {
                self.fallback_mesh = Some(mesh);
            }
        }
        Ok(())
    }

    /// Import a group and place an instance of it named `instance_name`
    fn import_group(
        &mut self,
        group: &GroupRef,
        into: CollectionId,
        instance_name: &str,
    ) -> Result<ObjectId> {
        match group {
            GroupRef::Path(path) => self.import_group_path(path, into, instance_name),
            GroupRef::Inline(records) => {
                let placement = PlacementGroup::new(records.clone());
                let collection = self.host.create_collection(instance_name)?;
                let instance = self.place_instance(instance_name, collection, into)?;
                self.build_group(instance_name, &placement, collection);
                self.report.groups_built += 1;
                Ok(instance)
            }
        }
    }

    fn import_group_path(
        &mut self,
        path: &str,
        into: CollectionId,
        instance_name: &str,
    ) -> Result<ObjectId> {
        if self.build_stack.iter().any(|p| p == path) {
            let mut chain = self.build_stack.clone();
            chain.push(path.to_string());
            return Err(QuarryError::PlacementCycle(chain.join(" -> ")));
        }

        let name = basename(path).to_string();
        if self.settings.reuse.groups {
            let cached = match self.group_cache.get(name.as_str()) {
                Some(collection) => Some(*collection),
                None => self
                    .host
                    .find_collection(&name)
                    .map(|collection| *self.group_cache.insert(name.clone(), collection)),
            };
            if let Some(collection) = cached {
                tracing::debug!(group = path, "reusing group");
                self.report.groups_reused += 1;
                return self.place_instance(instance_name, collection, into);
            }
        }

        let placement = self.placements.load_group(path)?;
        let collection = self.host.create_collection(&name)?;
        if self.settings.reuse.groups {
            self.group_cache.insert(name, collection);
        }
        let instance = self.place_instance(instance_name, collection, into)?;

        self.build_stack.push(path.to_string());
        self.build_group(path, &placement, collection);
        self.build_stack.pop();

        self.report.groups_built += 1;
        Ok(instance)
    }

    fn build_group(&mut self, label: &str, placement: &PlacementGroup, collection: CollectionId) {
        let total = placement.records.len();
        for (i, record) in placement.records.iter().enumerate() {
            let name = truncate_identifier(&record.name);
            tracing::info!(actor = i + 1, total, name = name.as_str(), "importing actor");

            let node = NodeContext {
                group: label,
                placement,
                collection,
            };
            if let Err(err) = self.import_record(&node, record, &name) {
                self.fail(&node, &name, err);
            }
        }
    }

    fn import_record(&mut self, node: &NodeContext<'_>, record: &ActorRecord, name: &str) -> Result<()> {
        let transform = placement_transform(record.position, record.rotation, record.scale);

        if record.has_children() {
            for (i, child) in record.children.iter().enumerate() {
                let Some(child) = child else { continue };
                let child_name = if i == 0 {
                    name.to_string()
                } else {
                    format!("{}_{}", name, i)
                };
                match self.import_group(child, node.collection, &child_name) {
                    Ok(instance) => self.host.set_transform(instance, transform)?,
                    Err(err) => {
                        self.fail(node, &child_name, err);
                        self.place_fallback(node, &child_name, transform)?;
                    }
                }
            }
            return Ok(());
        }

        let object = match record.mesh.as_deref() {
            None => {
                self.warn(node, name, Warning::NoMeshReference);
                self.place_fallback(node, name, transform)?
            }
            Some(mesh_path) => match self.mesh_for(record, mesh_path) {
                Ok((asset, fresh)) => {
                    if fresh {
                        for warning in &asset.warnings {
                            self.warn(node, name, warning.clone());
                        }
                    }
                    self.place_object(node, name, asset.mesh, transform)?
                }
                Err(BuildFailure::Missing) => {
                    self.warn(node, name, Warning::MissingMesh(mesh_path.to_string()));
                    self.place_fallback(node, name, transform)?
                }
                Err(BuildFailure::Failed(err)) => {
                    self.fail(node, name, err);
                    self.place_fallback(node, name, transform)?
                }
            },
        };

        self.attach_lights(node, record, object)
    }

    /// The built mesh for a record, and whether this call built it
    fn mesh_for(
        &mut self,
        record: &ActorRecord,
        mesh_path: &str,
    ) -> std::result::Result<(Rc<BuiltAsset>, bool), BuildFailure> {
        let Some(key) = record.cache_key() else {
            return Err(BuildFailure::Missing);
        };
        let mut ctx = BuildContext {
            host: &mut *self.host,
            meshes: self.meshes.as_ref(),
            materials: self.materials.as_mut(),
            textures: self.textures.as_mut(),
            material_cache: &mut self.material_cache,
            options: &self.settings.build,
            report: &mut self.report,
        };

        if !self.settings.reuse.meshes {
            let asset = build_asset(&mut ctx, record, mesh_path, key)?;
            return Ok((Rc::new(asset), true));
        }

        if self.mesh_cache.contains(&key) {
            tracing::debug!(key = %key, "mesh cache hit");
            ctx.report.mesh_cache_hits += 1;
            let asset = self
                .mesh_cache
                .get(&key)
                .ok_or_else(|| QuarryError::MeshNotFound(key.to_string()))?;
            return Ok((asset, false));
        }

        let mut fresh = false;
        let asset = self.mesh_cache.get_or_build(key.clone(), || {
            if let Some(mesh) = ctx.host.find_mesh(key.as_str()) {
                tracing::debug!(key = %key, "adopting existing mesh");
                return Ok(BuiltAsset {
                    material_slots: ctx.host.mesh_slots(mesh),
                    key,
                    mesh,
                    warnings: Vec::new(),
                    source_hash: None,
                });
            }
            fresh = true;
            build_asset(&mut ctx, record, mesh_path, key)
        })?;
        Ok((asset, fresh))
    }

    fn place_instance(
        &mut self,
        name: &str,
        collection: CollectionId,
        into: CollectionId,
    ) -> Result<ObjectId> {
        let object = self
            .host
            .create_object(name, ObjectData::CollectionInstance(collection))?;
        self.host.link(object, into)?;
        self.report.objects += 1;
        Ok(object)
    }

    fn place_object(
        &mut self,
        node: &NodeContext<'_>,
        name: &str,
        mesh: MeshId,
        transform: Transform,
    ) -> Result<ObjectId> {
        let object = self.host.create_object(name, ObjectData::Mesh(mesh))?;
        self.host.link(object, node.collection)?;
        self.host.set_transform(object, transform)?;
        self.report.objects += 1;
        Ok(object)
    }

    fn place_fallback(
        &mut self,
        node: &NodeContext<'_>,
        name: &str,
        transform: Transform,
    ) -> Result<ObjectId> {
        let mesh = self.fallback_mesh.ok_or_else(|| {
            QuarryError::MeshNotFound(self.settings.fallback.mesh_name().to_string())
        })?;
        tracing::warn!(group = node.group, node = name, "placing fallback mesh");
        self.report.fallbacks += 1;
        self.place_object(node, name, mesh, transform)
    }

    fn attach_lights(
        &mut self,
        node: &NodeContext<'_>,
        record: &ActorRecord,
        parent: ObjectId,
    ) -> Result<()> {
        if record.light_index < 0 || node.placement.lights.is_none() {
            return Ok(());
        }
        let Some(group) = node.placement.light_group(record.light_index) else {
            self.warn(node, &record.name, Warning::MissingLightGroup(record.light_index));
            return Ok(());
        };

        for component in &group.props {
            let Some(light) = self.lights.build(component)? else {
                continue;
            };
            let name = light.data.name.clone();
            let object = self.host.create_object(&name, ObjectData::Light(light.data))?;
            self.host.link(object, node.collection)?;
            self.host.set_transform(object, light.transform)?;
            self.host.set_parent(object, parent)?;
            self.report.lights += 1;
            self.report.objects += 1;
        }
        Ok(())
    }

    fn fail(&mut self, node: &NodeContext<'_>, name: &str, err: QuarryError) {
        tracing::warn!(group = node.group, node = name, error = %err, "placement failed");
        self.report.failures.push(NodeFailure {
            group: node.group.to_string(),
            node: name.to_string(),
            message: err.to_string(),
            class: err.class(),
        });
    }

    fn warn(&mut self, node: &NodeContext<'_>, name: &str, warning: Warning) {
        tracing::warn!(group = node.group, node = name, "{}", warning);
        self.report.warnings.push(NodeWarning {
            group: node.group.to_string(),
            node: name.to_string(),
            message: warning.to_string(),
            warning,
        });
    }
}

/// Decode, rebuild and register one mesh, then build and assign its materials
fn build_asset(
    ctx: &mut BuildContext<'_>,
    record: &ActorRecord,
    mesh_path: &str,
    key: CacheKey,
) -> std::result::Result<BuiltAsset, BuildFailure> {
    let Some(file) = ctx.meshes.fetch(mesh_path)? else {
        return Err(BuildFailure::Missing);
    };
    let asset = decode_psk(&file.bytes)?;
    let topology = build_topology(key.as_str(), &asset, ctx.options)?;

    let material_slots = topology.mesh.material_slots.clone();
    let mesh = ctx.host.create_mesh(topology.mesh)?;
    ctx.report.meshes_built += 1;
    tracing::debug!(key = %key, path = %file.path.display(), "built mesh");

    let mut warnings = topology.warnings;
    assign_materials(ctx, record, mesh, &material_slots, &mut warnings)?;

    Ok(BuiltAsset {
        key,
        mesh,
        material_slots,
        warnings,
        source_hash: Some(file.hash),
    })
}

/// Build each overridden material once per memo name and assign it to the
/// slot of the same name, else to the slot at its own index
fn assign_materials(
    ctx: &mut BuildContext<'_>,
    record: &ActorRecord,
    mesh: MeshId,
    slots: &[String],
    warnings: &mut Vec<Warning>,
) -> Result<()> {
    let BuildContext {
        host,
        materials,
        textures,
        material_cache,
        report,
        ..
    } = ctx;
    let suffix = record.texture_suffix();

    for (index, material) in record.materials.iter().enumerate() {
        let Some(params) = material.params.as_ref().filter(|p| !p.is_empty()) else {
            continue;
        };
        let memo = material_memo_name(&material.path, &suffix);
        let request = MaterialRequest {
            name: &memo,
            path: &material.path,
            params,
            texture_overrides: &record.textures,
        };
        let id = material_cache.get_or_build(memo.clone(), || -> Result<MaterialId> {
            let built = materials.build(&request, &mut **textures)?;
            warnings.extend(built.warnings);
            report.materials_built += 1;
            host.create_material(built.data)
        })?;

        let slot_name = basename(&material.path);
        let slot = match slots.iter().position(|s| s == slot_name) {
            Some(slot) => slot,
            None if index < slots.len() => index,
            None => {
                warnings.push(Warning::UnassignedMaterial(material.path.clone()));
                continue;
            }
        };
        host.assign_material(mesh, slot, *id)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::SceneGraph;
    use crate::texture::TextureRole;
    use quarry_core::Vec3;
    use quarry_import::writer;
    use std::fs;
    use std::path::{Path, PathBuf};

    /// An export directory in the system temp dir, removed on drop
    struct Fixture {
        root: PathBuf,
    }

    impl Fixture {
        fn new(root_group: &str) -> Self {
            let root =
                std::env::temp_dir().join(format!("quarry_import_test_{}", uuid::Uuid::new_v4()));
            fs::create_dir_all(&root).unwrap();
            fs::write(root.join("processed.json"), format!("\"{}\"", root_group)).unwrap();
            Self { root }
        }

        fn write(&self, relative: &str, contents: &[u8]) {
            let path = self.root.join(relative);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, contents).unwrap();
        }

        fn group(&self, path: &str, records: &str) -> &Self {
            self.write(&format!("jsons{}.processed.json", path), records.as_bytes());
            self
        }

        fn lights(&self, path: &str, lights: &str) -> &Self {
            self.write(&format!("jsons{}.lights.processed.json", path), lights.as_bytes());
            self
        }

        fn mesh(&self, path: &str, bytes: &[u8]) -> &Self {
            self.write(&format!("{}.psk", path.trim_start_matches('/')), bytes);
            self
        }

        fn settings(&self) -> ImportSettings {
            ImportSettings {
                data_dir: self.root.clone(),
                ..Default::default()
            }
        }

        fn path(&self) -> &Path {
            &self.root
        }
    }

    impl Drop for Fixture {
        fn drop(&mut self) {
            fs::remove_dir_all(&self.root).ok();
        }
    }

    fn triangle_bytes() -> Vec<u8> {
        writer::triangle().to_bytes()
    }

    fn import(settings: ImportSettings) -> (SceneGraph, ImportReport) {
        let mut graph = SceneGraph::new();
        let report = SceneImporter::new(&mut graph, settings).run().unwrap();
        (graph, report)
    }

    #[test]
    fn test_sibling_placements_share_one_build() {
        let fixture = Fixture::new("/Game/Maps/Lobby");
        fixture
            .group(
                "/Game/Maps/Lobby",
                r#"[
                    [null, "RockA", "/Game/Props/SM_Rock", null, null, [0, 0, 0]],
                    [null, "RockB", "/Game/Props/SM_Rock", null, null, [100, 0, 0]]
                ]"#,
            )
            .mesh("/Game/Props/SM_Rock", &triangle_bytes());

        let (graph, report) = import(fixture.settings());
        assert_eq!(report.meshes_built, 1);
        assert_eq!(report.mesh_cache_hits, 1);
        assert!(report.is_clean(), "{:?}", report);

        let a = graph.object_by_name("RockA").unwrap();
        let b = graph.object_by_name("RockB").unwrap();
        assert_eq!(graph.object_mesh(a), graph.object_mesh(b));
        let mesh = graph.mesh(graph.object_mesh(a).unwrap()).unwrap();
        assert_eq!(mesh.name, "SM_Rock");
        assert_eq!(mesh.polygon_count(), 1);
        assert_eq!(graph.object(b).unwrap().transform.position, Vec3::new(1.0, 0.0, 0.0));

        let lobby = graph.find_collection("Lobby").unwrap();
        assert_eq!(graph.objects_in(lobby), &[a, b]);
        let imported = graph.find_collection("Imported").unwrap();
        let root = graph.objects_in(imported)[0];
        assert_eq!(graph.object(root).unwrap().name, "Lobby");
        assert_eq!(
            graph.object(root).unwrap().data,
            ObjectData::CollectionInstance(lobby)
        );
    }

    #[test]
    fn test_mesh_less_placement_gets_fallback() {
        let fixture = Fixture::new("/Game/Maps/Lobby");
        fixture.group("/Game/Maps/Lobby", r#"[[null, "Marker", null, null, null, [0, 200, 0]]]"#);

        let (graph, report) = import(fixture.settings());
        assert_eq!(report.fallbacks, 1);
        assert!(report.has_warning(&Warning::NoMeshReference));

        let marker = graph.object_by_name("Marker").unwrap();
        let mesh = graph.mesh(graph.object_mesh(marker).unwrap()).unwrap();
        assert_eq!(mesh.name, "__fallback");
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(
            graph.object(marker).unwrap().transform.position,
            Vec3::new(0.0, -2.0, 0.0)
        );
        // the unused empty fallback is swept at the end of the run
        assert!(graph.find_mesh("__empty").is_none());
    }

    #[test]
    fn test_empty_fallback_policy() {
        let fixture = Fixture::new("/Game/Maps/Lobby");
        fixture.group("/Game/Maps/Lobby", r#"[[null, "Ghost", "/Game/Props/SM_Ghost"]]"#);
        let mut settings = fixture.settings();
        settings.fallback = FallbackPolicy::Empty;

        let (graph, report) = import(settings);
        assert!(report.has_warning(&Warning::MissingMesh("/Game/Props/SM_Ghost".into())));
        let ghost = graph.object_by_name("Ghost").unwrap();
        let mesh = graph.mesh(graph.object_mesh(ghost).unwrap()).unwrap();
        assert_eq!(mesh.name, "__empty");
        assert_eq!(mesh.vertex_count(), 0);
    }

    #[test]
    fn test_corrupt_mesh_fails_only_its_node() {
        let fixture = Fixture::new("/Game/Maps/Lobby");
        fixture
            .group(
                "/Game/Maps/Lobby",
                r#"[
                    [null, "Broken", "/Game/Props/SM_Bad"],
                    [null, "Rock", "/Game/Props/SM_Rock"]
                ]"#,
            )
            .mesh("/Game/Props/SM_Bad", b"not a mesh")
            .mesh("/Game/Props/SM_Rock", &triangle_bytes());

        let (graph, report) = import(fixture.settings());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].node, "Broken");
        assert_eq!(report.failures[0].class, ErrorClass::StructuralFormat);
        assert_eq!(report.fallbacks, 1);
        assert_eq!(report.meshes_built, 1);

        let broken = graph.object_by_name("Broken").unwrap();
        assert_eq!(
            graph.mesh(graph.object_mesh(broken).unwrap()).unwrap().name,
            "__fallback"
        );
        assert!(graph.object_by_name("Rock").is_some());
    }

    const HUTS: &str = r#"[
        [null, "HutA", null, null, null, [0, 0, 0], null, null, ["/Game/Maps/Hut"]],
        [null, "HutB", null, null, null, [500, 0, 0], [0, 90, 0], null, ["/Game/Maps/Hut"]]
    ]"#;

    #[test]
    fn test_groups_reused_by_name() {
        let fixture = Fixture::new("/Game/Maps/Lobby");
        fixture
            .group("/Game/Maps/Lobby", HUTS)
            .group("/Game/Maps/Hut", r#"[[null, "Rock", "/Game/Props/SM_Rock"]]"#)
            .mesh("/Game/Props/SM_Rock", &triangle_bytes());

        let (graph, report) = import(fixture.settings());
        assert_eq!(report.groups_built, 2);
        assert_eq!(report.groups_reused, 1);
        assert_eq!(report.meshes_built, 1);

        let hut = graph.find_collection("Hut").unwrap();
        let a = graph.object_by_name("HutA").unwrap();
        let b = graph.object_by_name("HutB").unwrap();
        assert_eq!(graph.object(a).unwrap().data, ObjectData::CollectionInstance(hut));
        assert_eq!(graph.object(b).unwrap().data, ObjectData::CollectionInstance(hut));
        assert_eq!(graph.object(b).unwrap().transform.position, Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(graph.objects_named("Rock").len(), 1);
    }

    #[test]
    fn test_group_reuse_disabled_rebuilds() {
        let fixture = Fixture::new("/Game/Maps/Lobby");
        fixture
            .group("/Game/Maps/Lobby", HUTS)
            .group("/Game/Maps/Hut", r#"[[null, "Rock", "/Game/Props/SM_Rock"]]"#)
            .mesh("/Game/Props/SM_Rock", &triangle_bytes());
        let mut settings = fixture.settings();
        settings.reuse.groups = false;

        let (graph, report) = import(settings);
        assert_eq!(report.groups_built, 3);
        assert_eq!(report.groups_reused, 0);
        assert_eq!(report.meshes_built, 1);
        assert!(graph.find_collection("Hut.001").is_some());
        assert_eq!(graph.objects_named("Rock").len(), 2);
    }

    #[test]
    fn test_mesh_reuse_disabled_rebuilds() {
        let fixture = Fixture::new("/Game/Maps/Lobby");
        fixture
            .group(
                "/Game/Maps/Lobby",
                r#"[[null, "A", "/Game/Props/SM_Rock"], [null, "B", "/Game/Props/SM_Rock"]]"#,
            )
            .mesh("/Game/Props/SM_Rock", &triangle_bytes());
        let mut settings = fixture.settings();
        settings.reuse.meshes = false;

        let (graph, report) = import(settings);
        assert_eq!(report.meshes_built, 2);
        assert_eq!(report.mesh_cache_hits, 0);
        let a = graph.object_mesh(graph.object_by_name("A").unwrap());
        let b = graph.object_mesh(graph.object_by_name("B").unwrap());
        assert_ne!(a, b);
    }

    #[test]
    fn test_cycle_is_node_scoped() {
        let fixture = Fixture::new("/Game/Maps/Lobby");
        fixture
            .group(
                "/Game/Maps/Lobby",
                r#"[
                    [null, "Loop", null, null, null, null, null, null, ["/Game/Maps/Lobby"]],
                    [null, "Rock", "/Game/Props/SM_Rock"]
                ]"#,
            )
            .mesh("/Game/Props/SM_Rock", &triangle_bytes());

        let (graph, report) = import(fixture.settings());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].node, "Loop");
        assert_eq!(report.failures[0].class, ErrorClass::Placement);
        assert!(report.failures[0].message.contains("/Game/Maps/Lobby -> /Game/Maps/Lobby"));
        assert!(graph.object_by_name("Rock").is_some());
        assert!(graph.object_by_name("Loop").is_some());
    }

    #[test]
    fn test_children_named_by_index() {
        let fixture = Fixture::new("/Game/Maps/Lobby");
        fixture
            .group(
                "/Game/Maps/Lobby",
                r#"[[null, "Site", null, null, null, null, null, null,
                    ["/Game/Maps/Yard", null, [[null, "Shed"]]]]]"#,
            )
            .group("/Game/Maps/Yard", "[]");

        let (graph, report) = import(fixture.settings());
        assert_eq!(report.groups_built, 3);
        assert!(graph.object_by_name("Site").is_some());
        assert!(graph.object_by_name("Site_1").is_none());
        assert!(graph.object_by_name("Site_2").is_some());
        assert!(graph.object_by_name("Shed").is_some());
    }

    #[test]
    fn test_materials_and_lights() {
        let fixture = Fixture::new("/Game/Maps/Lobby");
        fixture
            .group(
                "/Game/Maps/Lobby",
                r#"[
                    [null, "Lamp", "/Game/Props/SM_Rock",
                        {"/Game/M/M_Default": {
                            "ShaderName": "M_Base",
                            "TextureParams": {"Diffuse": "/Game/T/T_Rock_D", "Normals": "/Game/T/T_Gone"}
                        }},
                        null, null, null, null, null, 0],
                    [null, "Dark", null, null, null, null, null, null, null, 4]
                ]"#,
            )
            .lights(
                "/Game/Maps/Lobby",
                r#"[{"Props": [{"Type": "PointLightComponent", "Outer": "Bulb",
                    "Properties": {"Intensity": 5000.0}}]}]"#,
            )
            .mesh("/Game/Props/SM_Rock", &triangle_bytes());
        fixture.write("Game/T/T_Rock_D.tga", b"");

        let (graph, report) = import(fixture.settings());
        assert_eq!(report.materials_built, 1);
        assert_eq!(report.lights, 1);
        assert!(report.has_warning(&Warning::MissingTexture("/Game/T/T_Gone".into())));
        assert!(report.has_warning(&Warning::MissingLightGroup(4)));

        let lamp = graph.object_by_name("Lamp").unwrap();
        let mesh = graph.object_mesh(lamp).unwrap();
        let material = graph.mesh_materials(mesh)[0].unwrap();
        let data = graph.material(material).unwrap();
        assert_eq!(data.name, "M_Default.mat");
        assert_eq!(data.shader, "M_Base");
        let diffuse = data.texture("Diffuse").unwrap();
        assert_eq!(diffuse.role, Some(TextureRole::Diffuse));
        assert!(diffuse.texture.path.starts_with(fixture.path()));

        let bulb = graph.object_by_name("Bulb").unwrap();
        assert_eq!(graph.object(bulb).unwrap().parent, Some(lamp));
        assert_eq!(graph.children(lamp), vec![bulb]);
    }

    #[test]
    fn test_unmatched_material_reported() {
        let fixture = Fixture::new("/Game/Maps/Lobby");
        fixture
            .group(
                "/Game/Maps/Lobby",
                r#"[[null, "Rock", "/Game/Props/SM_Rock", {
                    "/Game/M/MI_A": {"ShaderName": "S"},
                    "/Game/M/MI_B": {"ShaderName": "S"}
                }]]"#,
            )
            .mesh("/Game/Props/SM_Rock", &triangle_bytes());

        let (graph, report) = import(fixture.settings());
        // MI_A falls back to slot 0; MI_B has neither a name match nor a slot 1
        assert!(report.has_warning(&Warning::UnassignedMaterial("/Game/M/MI_B".into())));
        let mesh = graph.object_mesh(graph.object_by_name("Rock").unwrap()).unwrap();
        let assigned = graph.mesh_materials(mesh)[0].unwrap();
        assert_eq!(graph.material(assigned).unwrap().name, "MI_A.mat");
    }

    #[test]
    fn test_empty_material_params_keep_slot() {
        let fixture = Fixture::new("/Game/Maps/Lobby");
        fixture
            .group(
                "/Game/Maps/Lobby",
                r#"[[null, "Rock", "/Game/Props/SM_Rock", {"/Game/M/M_Default": {}}]]"#,
            )
            .mesh("/Game/Props/SM_Rock", &triangle_bytes());

        let (graph, report) = import(fixture.settings());
        assert_eq!(report.materials_built, 0);
        assert!(report.is_clean(), "{:?}", report);
        let mesh = graph.object_mesh(graph.object_by_name("Rock").unwrap()).unwrap();
        assert!(graph.mesh_materials(mesh)[0].is_none());
    }

    #[test]
    fn test_second_run_reuses_scene() {
        let fixture = Fixture::new("/Game/Maps/Lobby");
        fixture
            .group("/Game/Maps/Lobby", r#"[[null, "Rock", "/Game/Props/SM_Rock"]]"#)
            .mesh("/Game/Props/SM_Rock", &triangle_bytes());

        let mut graph = SceneGraph::new();
        let mut importer = SceneImporter::new(&mut graph, fixture.settings());
        let first = importer.run().unwrap();
        let second = importer.run().unwrap();
        drop(importer);

        assert_eq!(first.groups_built, 1);
        assert_eq!(second.groups_built, 0);
        assert_eq!(second.groups_reused, 1);
        assert_eq!(second.meshes_built, 0);
        assert_eq!(graph.objects_named("Lobby").len(), 2);
        assert_eq!(graph.objects_named("Rock").len(), 1);
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let fixture = Fixture::new("/Game/Maps/Nowhere");
        let mut graph = SceneGraph::new();
        let result = SceneImporter::new(&mut graph, fixture.settings()).run();
        assert!(matches!(result, Err(QuarryError::IoError(_))));
    }
}

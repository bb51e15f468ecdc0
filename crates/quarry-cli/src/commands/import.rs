//! Import command

use anyhow::{Context, Result};
use quarry_asset::FallbackPolicy;
use quarry_scene::{ImportReport, ImportSettings, SceneGraph, SceneImporter, SceneSummary};
use serde::Serialize;
use std::path::PathBuf;

pub struct ImportArgs {
    pub data_dir: Option<PathBuf>,
    pub collection: Option<String>,
    pub fallback: Option<FallbackPolicy>,
    pub no_group_reuse: bool,
    pub no_mesh_reuse: bool,
    pub config: Option<PathBuf>,
    pub format: String,
    pub scene: bool,
}

#[derive(Serialize)]
struct ImportOutput<'a> {
    report: &'a ImportReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    scene: Option<SceneSummary>,
}

/// Resolve settings from config layers, then apply command-line overrides
fn resolve_settings(args: &ImportArgs) -> Result<ImportSettings> {
    let mut settings = match &args.config {
        Some(path) => ImportSettings::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ImportSettings::load().context("Failed to load config")?,
    };

    if let Some(dir) = &args.data_dir {
        settings.data_dir = dir.clone();
    }
    if let Some(collection) = &args.collection {
        settings.collection = collection.clone();
    }
    if let Some(fallback) = args.fallback {
        settings.fallback = fallback;
    }
    if args.no_group_reuse {
        settings.reuse.groups = false;
    }
    if args.no_mesh_reuse {
        settings.reuse.meshes = false;
    }
    Ok(settings)
}

pub fn run(args: ImportArgs) -> Result<()> {
    let settings = resolve_settings(&args)?;
    let data_dir = settings.data_dir.clone();

    let mut graph = SceneGraph::new();
    let report = SceneImporter::new(&mut graph, settings)
        .run()
        .with_context(|| format!("Failed to import {}", data_dir.display()))?;

    let scene = args.scene.then(|| graph.summary());
    match args.format.as_str() {
        "json" => {
            let output = ImportOutput {
                report: &report,
                scene,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        "text" => print_text(&report, scene.as_ref()),
        _ => anyhow::bail!("Unknown format: {}", args.format),
    }

    Ok(())
}

fn print_text(report: &ImportReport, scene: Option<&SceneSummary>) {
    println!("Objects:    {}", report.objects);
    println!(
        "Groups:     {} built, {} reused",
        report.groups_built, report.groups_reused
    );
    println!(
        "Meshes:     {} built, {} cache hits",
        report.meshes_built, report.mesh_cache_hits
    );
    println!("Materials:  {}", report.materials_built);
    println!("Lights:     {}", report.lights);
    println!("Fallbacks:  {}", report.fallbacks);

    if !report.warnings.is_empty() {
        println!("\nWarnings ({}):", report.warnings.len());
        for w in &report.warnings {
            println!("  [{}] {}: {}", w.group, w.node, w.message);
        }
    }
    if !report.failures.is_empty() {
        println!("\nFailures ({}):", report.failures.len());
        for f in &report.failures {
            println!("  [{}] {}: {}", f.group, f.node, f.message);
        }
    }

    if let Some(scene) = scene {
        println!("\nScene:");
        println!("  Collections: {}", scene.collections);
        println!(
            "  Objects:     {} ({} mesh, {} instance, {} light)",
            scene.objects, scene.mesh_objects, scene.instances, scene.lights
        );
        println!("  Meshes:      {}", scene.meshes);
        println!("  Materials:   {}", scene.materials);
        println!(
            "  Geometry:    {} vertices, {} polygons",
            scene.vertices, scene.polygons
        );
    }
}

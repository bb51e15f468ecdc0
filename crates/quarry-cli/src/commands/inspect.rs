//! Inspect command

use anyhow::{Context, Result};
use quarry_core::{ContentHash, Warning};
use quarry_import::{
    build_topology, decode_psk, scan_sections, BuildOptions, MeshAsset, PolygonMesh,
    SectionSummary,
};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
struct MeshReport {
    path: String,
    hash: String,
    sections: Vec<SectionSummary>,
    points: usize,
    wedges: usize,
    faces: usize,
    bones: usize,
    materials: Vec<String>,
    vertices: usize,
    polygons: usize,
    uv_layers: usize,
    vertex_colors: bool,
    custom_normals: bool,
    vertex_groups: usize,
    warnings: Vec<String>,
}

impl MeshReport {
    fn new(
        path: &Path,
        hash: ContentHash,
        sections: Vec<SectionSummary>,
        asset: &MeshAsset,
        mesh: &PolygonMesh,
        warnings: &[Warning],
    ) -> Self {
        Self {
            path: path.display().to_string(),
            hash: hash.to_prefixed_hex(),
            sections,
            points: asset.points.len(),
            wedges: asset.wedges.len(),
            faces: asset.faces.len(),
            bones: asset.bones.len(),
            materials: asset.materials.iter().map(|m| m.name.clone()).collect(),
            vertices: mesh.vertex_count(),
            polygons: mesh.polygon_count(),
            uv_layers: mesh.uv_layers.len(),
            vertex_colors: mesh.color_layer.is_some(),
            custom_normals: mesh.custom_normals.is_some(),
            vertex_groups: mesh.vertex_groups.len(),
            warnings: warnings.iter().map(ToString::to_string).collect(),
        }
    }
}

fn inspect_bytes(path: &Path, bytes: &[u8]) -> Result<MeshReport> {
    let sections = scan_sections(bytes).context("Failed to scan sections")?;
    let asset = decode_psk(bytes).context("Failed to decode mesh")?;
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let built = build_topology(&name, &asset, &BuildOptions::default())
        .context("Failed to rebuild topology")?;

    Ok(MeshReport::new(
        path,
        ContentHash::from_bytes(bytes),
        sections,
        &asset,
        &built.mesh,
        &built.warnings,
    ))
}

pub fn run(path: &Path, format: &str) -> Result<()> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let report = inspect_bytes(path, &bytes)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        "text" => print_text(&report),
        _ => anyhow::bail!("Unknown format: {}", format),
    }
    Ok(())
}

fn print_text(report: &MeshReport) {
    println!("File: {}", report.path);
    println!("Hash: {}", report.hash);

    println!("\nSections:");
    for s in &report.sections {
        let kind = s.kind.map_or_else(|| "unknown".to_string(), |k| format!("{:?}", k));
        println!(
            "  {:<20} {:<14} offset {:>8}  {} x {} bytes",
            s.tag, kind, s.offset, s.count, s.stride
        );
    }

    println!("\nRaw:");
    println!("  Points: {}", report.points);
    println!("  Wedges: {}", report.wedges);
    println!("  Faces:  {}", report.faces);
    println!("  Bones:  {}", report.bones);
    println!("  Materials: {}", report.materials.join(", "));

    println!("\nMesh:");
    println!("  Vertices: {}", report.vertices);
    println!("  Polygons: {}", report.polygons);
    println!("  UV layers: {}", report.uv_layers);
    println!("  Vertex colors: {}", report.vertex_colors);
    println!("  Custom normals: {}", report.custom_normals);
    println!("  Vertex groups: {}", report.vertex_groups);

    if !report.warnings.is_empty() {
        println!("\nWarnings:");
        for w in &report.warnings {
            println!("  {}", w);
        }
    }
}

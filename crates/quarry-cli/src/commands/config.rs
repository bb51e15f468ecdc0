//! Configuration commands

use anyhow::{Context, Result};
use clap::Subcommand;
use quarry_scene::{ImportSettings, CONFIG_DIR};
use std::fs;
use std::path::Path;

const DEFAULT_CONFIG: &str = r#"# Quarry import settings. Environment variables (QUARRY_DATA_DIR,
# QUARRY_FALLBACK, QUARRY_REUSE_GROUPS, QUARRY_REUSE_MESHES) and
# command-line flags take precedence over this file.

# Export directory holding processed.json, jsons/ and the asset files
data_dir = "."

# Collection the root group is placed into
collection = "Imported"

# Stand-in for missing or unreadable meshes: "cube" or "empty"
fallback = "cube"

[reuse]
groups = true
meshes = true

[build]
scale_down = true
import_extra_uvs = true
import_vertex_colors = true
vertex_color_space = "srgb"
import_vertex_normals = true

# Extra material input names per UV channel, e.g.
# [textures.uv1]
# diffuse = ["BaseColor"]
"#;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the resolved settings
    Show {
        /// Output format (toml or json)
        #[arg(long, default_value = "toml")]
        format: String,
    },

    /// List config file locations in precedence order
    Path,

    /// Write a commented default config to .quarry/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub fn run(cmd: ConfigCommands) -> Result<()> {
    match cmd {
        ConfigCommands::Show { format } => show(&format),
        ConfigCommands::Path => {
            let project = Path::new(CONFIG_DIR).join("config.toml");
            print_location("project", &project);
            match ImportSettings::global_config_path() {
                Some(global) => print_location("global", &global),
                None => println!("global:  (no home directory)"),
            }
            Ok(())
        }
        ConfigCommands::Init { force } => init(Path::new(CONFIG_DIR), force),
    }
}

fn print_location(label: &str, path: &Path) {
    let state = if path.exists() { "" } else { " (missing)" };
    println!("{:<8} {}{}", format!("{}:", label), path.display(), state);
}

fn show(format: &str) -> Result<()> {
    let settings = ImportSettings::load().context("Failed to load config")?;
    let output = match format {
        "toml" => toml::to_string_pretty(&settings)?,
        "json" => serde_json::to_string_pretty(&settings)?,
        _ => anyhow::bail!("Unknown format: {}", format),
    };
    println!("{}", output);
    Ok(())
}

fn init(dir: &Path, force: bool) -> Result<()> {
    let path = dir.join("config.toml");
    if path.exists() && !force {
        anyhow::bail!("'{}' already exists (use --force to overwrite)", path.display());
    }
    fs::create_dir_all(dir)?;
    fs::write(&path, DEFAULT_CONFIG)?;
    println!("Wrote {}", path.display());
    Ok(())
}

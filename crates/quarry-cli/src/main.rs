//! Quarry CLI - Import exported level placement trees

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{config, import, inspect};
use quarry_asset::FallbackPolicy;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "quarry")]
#[command(about = "Rebuild exported level placements as a scene", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a placement tree and report what was built
    Import {
        /// Export directory holding processed.json (overrides config)
        data_dir: Option<PathBuf>,

        /// Collection the root group is placed into
        #[arg(long)]
        collection: Option<String>,

        /// Stand-in for missing or unreadable meshes (cube or empty)
        #[arg(long)]
        fallback: Option<FallbackPolicy>,

        /// Rebuild every group reference instead of instancing earlier builds
        #[arg(long)]
        no_group_reuse: bool,

        /// Rebuild meshes for every placement
        #[arg(long)]
        no_mesh_reuse: bool,

        /// Read settings from this file instead of the layered config
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,

        /// Also print the resulting scene contents
        #[arg(long)]
        scene: bool,
    },

    /// Dump the sections and decoded contents of a PSK mesh file
    Inspect {
        /// Path to the .psk file
        path: PathBuf,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Configuration operations
    #[command(subcommand)]
    Config(config::ConfigCommands),
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Import {
            data_dir,
            collection,
            fallback,
            no_group_reuse,
            no_mesh_reuse,
            config,
            format,
            scene,
        } => import::run(import::ImportArgs {
            data_dir,
            collection,
            fallback,
            no_group_reuse,
            no_mesh_reuse,
            config,
            format,
            scene,
        }),
        Commands::Inspect { path, format } => inspect::run(&path, &format),
        Commands::Config(cmd) => config::run(cmd),
    }
}

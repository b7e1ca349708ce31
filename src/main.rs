use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use weight_helper::registry::safetensors::read_header;
use weight_helper::{entry_metadata, get_metadata, DirectoryRegistry, HelperSettings, InMemoryRegistry, ModelEntry, ModelRegistry};

/// Inspect LoRA/LyCORIS model files: architecture, algorithm and touched blocks.
#[derive(Parser)]
#[command(name = "weight-helper")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a single .safetensors file and print the result as JSON
    Inspect {
        /// Model file
        path: PathBuf,

        /// Re-read weight keys even when a key cache exists
        #[arg(long)]
        force: bool,

        /// Skip block detection (does not read or write the key cache)
        #[arg(long)]
        no_blocks: bool,
    },

    /// Classify every model under a directory
    List {
        /// LoRA directory, scanned recursively
        dir: PathBuf,

        /// Re-read weight keys even when a key cache exists
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "weight_helper=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect { path, force, no_blocks } => {
            let header = read_header(&path).with_context(|| format!("Failed to read {}", path.display()))?;
            let entry = ModelEntry::new(&path, header.metadata);
            let key = entry.name.clone();
            let registry = InMemoryRegistry::new(vec![entry]);

            let settings = HelperSettings { parse_lora_blocks: !no_blocks, ..HelperSettings::default() };
            let response = get_metadata(&registry, &settings, &key, force);
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::List { dir, force } => {
            let registry = DirectoryRegistry::scan(&dir)?;
            let settings = HelperSettings::default();

            if registry.entries().is_empty() {
                println!("No models found in {}", dir.display());
                return Ok(());
            }
            for entry in registry.entries() {
                let response = entry_metadata(entry, &settings, force);
                let shown = entry.path.strip_prefix(registry.root()).unwrap_or(&entry.path);
                println!(
                    "{:<40} {:<6} {:<16} {}",
                    shown.display().to_string(),
                    response.model_type.as_deref().unwrap_or("-"),
                    response.algorithm.as_deref().unwrap_or("-"),
                    response.using_blocks.map(|b| b.join(",")).unwrap_or_else(|| "-".to_owned()),
                );
            }
        }
    }

    Ok(())
}

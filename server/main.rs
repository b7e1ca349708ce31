/// whapi: the weight-helper HTTP API.
///
/// Serves the LoRA metadata and preview endpoints the prompt widget calls,
/// backed by a scanned LoRA directory. Served by a synchronous tiny_http
/// server with one thread per request.
///
/// Run with:
///   cargo run --bin whapi --release -- --lora-dir models/Lora
/// Endpoints:
///   POST     /whapi/v1/get_metadata?key=<name>&force=<bool>
///   POST     /whapi/v1/get_preview_info?key=<name>
///   GET|POST /whapi/v1/get_settings
///   GET      /sd_extra_networks/thumb?filename=<path>

mod handlers;
mod routes;
mod state;
mod util;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tiny_http::Server;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use weight_helper::{DirectoryRegistry, HelperSettings};

use state::ApiState;

#[derive(Parser)]
#[command(name = "whapi")]
#[command(version, about = "Weight-helper metadata and preview API", long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:7878")]
    addr: String,

    /// LoRA directory, scanned recursively at startup
    #[arg(long)]
    lora_dir: PathBuf,

    /// Settings JSON; missing file means defaults
    #[arg(long)]
    settings: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "weight_helper=info,whapi=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let settings = match &args.settings {
        Some(path) => HelperSettings::load_or_default(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => HelperSettings::default(),
    };
    let registry = DirectoryRegistry::scan(&args.lora_dir)
        .with_context(|| format!("Failed to scan {}", args.lora_dir.display()))?;

    let preview_root = registry.root().to_path_buf();
    let state = Arc::new(ApiState::new(Box::new(registry), settings).with_preview_root(preview_root));

    let server = Server::http(&args.addr).map_err(|e| anyhow!("Failed to bind {}: {}", args.addr, e))?;
    tracing::info!("whapi listening on http://{}", args.addr);

    for request in server.incoming_requests() {
        let state = Arc::clone(&state);
        std::thread::spawn(move || {
            routes::dispatch(request, state);
        });
    }

    Ok(())
}

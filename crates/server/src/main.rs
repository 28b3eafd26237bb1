//! `tillscan-server`: the receipt upload API.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tillscan_core::{Config, ExtractionEngine};
use tillscan_ocr::ReceiptPipeline;

mod routes;

#[derive(Parser)]
#[command(name = "tillscan-server", version, about = "Receipt upload API")]
struct Args {
    /// Path to a tillscan.toml config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address; overrides `server.bind`
    #[arg(long)]
    bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };
    if config.extraction.engine == ExtractionEngine::Llm {
        warn!("upload API extracts with line templates; extraction.engine = \"llm\" is ignored");
    }

    let addr = match args.bind {
        Some(addr) => addr,
        None => config.server.socket_addr()?,
    };
    let pipeline = ReceiptPipeline::from_config(&config)?;
    let app = routes::router(routes::AppState::new(pipeline), config.server.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, "receipt upload API listening");
    axum::serve(listener, app).await?;
    Ok(())
}

//! Admin API binary for the gallery
//!
//! Wires the Sanity-backed stores into the core repository and orchestrator
//! and serves the admin HTTP surface.

mod cache;
mod config;
mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use secstr::SecStr;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use stuntreel_core::repository::GalleryRepository;
use stuntreel_core::upload::UploadOrchestrator;
use stuntreel_sanity::SanityClient;

use cache::{GalleryCache, GALLERY_CACHE_TTL};
use config::ServerConfig;
use routes::{router, AppState};

#[derive(Parser, Debug)]
#[command(name = "stuntreel-server", about = "Admin API for the gallery page")]
struct Args {
    /// Address to bind.
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 3000)]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();

    let args = Args::parse();
    let config = ServerConfig::from_env()?;
    if config.sanity.token.is_none() {
        warn!("SANITY_API_TOKEN is not set; uploads, deletes, and reorders will fail");
    }
    if config.revalidate_secret.is_none() {
        warn!("REVALIDATE_SECRET is not set; the revalidation webhook will fail");
    }

    let client = Arc::new(SanityClient::new(config.sanity.clone()));
    let repository = GalleryRepository::new(client.clone());
    let uploader = UploadOrchestrator::new(client, repository.clone());
    let state = Arc::new(AppState {
        repository,
        uploader,
        cache: GalleryCache::new(GALLERY_CACHE_TTL),
        revalidate_secret: config.revalidate_secret.map(SecStr::from),
    });

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .context("Invalid listen address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind listen address")?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down");
    }
}

//! cutout-api: portrait background removal and retouching over HTTP
//!
//! Provides endpoints for:
//! - POST /api/remove-bg - Remove the background, then apply effects
//! - GET  /api/effects   - Effect parameter schema
//! - GET  /health        - Health check
//!
//! Segmentation (rembg) and effects (an external script) run as child
//! processes. Each request works in its own set of temporary files, so
//! requests run concurrently without sharing any in-process state.

use std::sync::Arc;

use eyre::Context;
use salvo::prelude::*;

mod config;
mod error;
mod state;

mod handlers;
mod params;
mod pipeline;
mod router;
mod stages;
mod types;
mod workspace;

use config::Config;
use pipeline::Pipeline;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cutout_api=info".into()),
        )
        .init();

    let config = Config::from_env();
    tracing::info!("Starting cutout-api server on port {}", config.port);

    std::fs::create_dir_all(&config.work_dir)
        .context(format!("Failed to create work directory {:?}", config.work_dir))?;
    tracing::info!("Workspace root: {:?}", config.work_dir);
    tracing::info!(
        "Segmentation: {:?} (timeout {:?})",
        config.rembg_path,
        config.segment_timeout
    );
    tracing::info!(
        "Effects: {:?} {:?} (timeout {:?}, argument contract v{})",
        config.effect_program,
        config.effect_script,
        config.effect_timeout,
        params::ARGS_VERSION
    );

    let state = AppState {
        pipeline: Arc::new(Pipeline::from_config(&config)),
    };

    let router = router::build_router(state, config.max_upload_bytes);

    let listen_addr = format!("0.0.0.0:{}", config.port);
    let acceptor = TcpListener::new(&listen_addr).bind().await;

    tracing::info!("HTTP server listening on http://{}", listen_addr);
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health");
    tracing::info!("  GET  /api/effects");
    tracing::info!("  POST /api/remove-bg");

    Server::new(acceptor).serve(router).await;

    Ok(())
}

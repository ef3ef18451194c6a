// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use clap::Parser;
use plate_lookup_node::{
    api::{start_server, AppState},
    cli::Cli,
    storage::PgVehicleLookup,
    vision::VisionModelManager,
};
use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("🚀 Starting Plate Lookup Node...\n");
    println!("📦 BUILD VERSION: {}", plate_lookup_node::version::VERSION);
    println!("📅 Build Date: {}", plate_lookup_node::version::BUILD_DATE);
    println!();

    let cli = Cli::parse();
    let config = cli.load_config().context("Invalid configuration")?;
    let addr = config.api.socket_addr()?;

    // OCR loads in the background; requests wait on the readiness gate
    println!("🔍 Loading OCR model from {}...", config.vision.ocr_model_dir);
    let vision = VisionModelManager::new(config.vision.clone(), config.resolver.clone());
    let load_handle = vision.spawn_load();

    println!("🗄️  Vehicle registry: {}", config.database.redacted_url());
    let lookup = PgVehicleLookup::connect_lazy(&config.database)
        .context("Failed to configure vehicle lookup")?;

    let state = AppState::new(vision, Arc::new(lookup), config.api.clone());

    let separator = "=".repeat(60);
    println!("\n{}", separator);
    println!("✅ Plate Lookup Node is running!");
    println!("  Health:       GET  http://localhost:{}/health", addr.port());
    println!("  Plate:        POST http://localhost:{}/v1/plate", addr.port());
    println!("  Upload:       POST http://localhost:{}/v1/plate/upload", addr.port());
    println!("  Vehicles:     POST http://localhost:{}/v1/plate/vehicles", addr.port());
    println!("  Registry:     POST http://localhost:{}/api/vehiculos/read/", addr.port());
    println!("\nPress Ctrl+C to shutdown...");
    println!("{}\n", separator);

    start_server(addr, state, async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
        }
        println!("\n⏹️  Shutting down...");
    })
    .await?;

    load_handle.abort();
    println!("👋 Goodbye!");
    Ok(())
}

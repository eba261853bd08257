// API Server Binary Entry Point
//
// Usage: cargo run --bin api_server

use bioscout_rust::{create_router, AppState, JsonlStore, LlmClient};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing (structured logging)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                // Default log level: info for our crate, warn for others
                "bioscout_rust=info,tower_http=debug,axum=debug,warn".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting API server...");

    // Configuration from environment variables
    let observations_file = std::env::var("OBSERVATIONS_FILE")
        .unwrap_or_else(|_| "data/observations.jsonl".to_string());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);

    let llm = LlmClient::from_env();

    tracing::info!("Configuration:");
    tracing::info!("  OBSERVATIONS_FILE: {}", observations_file);
    tracing::info!("  PORT: {}", port);
    tracing::info!("  LLM_MODEL: {}", llm.model());
    tracing::info!(
        "  LLM provider: {}",
        if llm.is_configured() {
            "configured"
        } else {
            "not configured (keyword fallback only)"
        }
    );

    // Initialize application state
    let store = Arc::new(JsonlStore::open(&observations_file)?);
    let state = AppState::new(store, Arc::new(llm));
    tracing::info!("Application state initialized successfully");

    // Create router with all endpoints and middleware
    let app = create_router(state);

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

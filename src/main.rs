mod catalog;
mod config;
mod error;
mod gemini;
mod generation;
mod models;
mod pdf;
mod prompt;
mod routes;
mod session;

use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Settings;
use crate::gemini::GeminiClient;
use crate::routes::{evict_idle_sessions, router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Init tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let settings = Settings::from_env();
    match &settings.api_key {
        Some(key) => tracing::info!("Using API key: {}...", key.chars().take(6).collect::<String>()),
        None => tracing::warn!("GEMINI_API_KEY is not set; every submission will be refused"),
    }
    tracing::info!("Models: text={} image={}", settings.text_model, settings.image_model);

    let state = AppState {
        store: Arc::default(),
        gemini: Arc::new(GeminiClient::new(settings.api_key.clone(), settings.api_base.clone())),
        settings: Arc::new(settings.clone()),
    };

    spawn_session_sweeper(state.clone());
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    tracing::info!(%addr, "Starting server");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}

fn spawn_session_sweeper(state: AppState) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(60));
        loop {
            ticker.tick().await;
            evict_idle_sessions(&state, chrono::Utc::now());
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for ctrl-c: {}", e);
    }
    tracing::info!("Shutting down");
}

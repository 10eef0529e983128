use anyhow::Context;
use axum::http::HeaderName;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use pdf_study_assistant::config::AppConfig;
use pdf_study_assistant::middleware::session::SESSION_HEADER;
use pdf_study_assistant::routes;
use pdf_study_assistant::services::session_store;
use pdf_study_assistant::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded (env: {})", std::env::var("RUN_ENV").unwrap_or_else(|_| "development".into()));

    if config.llm.api_key.is_none() {
        tracing::warn!(
            "No API key for provider '{}'; LLM features will fail until {} or APP__LLM__API_KEY is set",
            config.llm.provider,
            pdf_study_assistant::config::provider_key_var(&config.llm.provider)
        );
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::from_config(config).context("Failed to initialise application state")?;

    session_store::spawn_sweeper(
        state.sessions.clone(),
        Duration::from_secs(state.config.session.idle_timeout_secs),
        Duration::from_secs(state.config.session.sweep_interval_secs),
    );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([HeaderName::from_static(SESSION_HEADER)]);

    let app = routes::router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    tracing::info!("Starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}

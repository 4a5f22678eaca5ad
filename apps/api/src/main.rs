mod analysis;
mod config;
mod db;
mod errors;
mod llm_client;
mod models;
mod results;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::AnalysisPipeline;
use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::{CompletionService, OpenAiClient, OpenAiConfig, RetryPolicy, RetryingClient};
use crate::results::store::PgAnalysisStore;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Screening API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    let store = Arc::new(PgAnalysisStore::new(db));

    // Initialize evaluation client
    let client = OpenAiClient::new(OpenAiConfig {
        api_key: config.openai_api_key.clone(),
        api_url: config.openai_api_url.clone(),
        model: config.openai_model.clone(),
    });
    info!("Evaluation client initialized (model: {})", client.model());

    let evaluator: Arc<dyn CompletionService> = if config.llm_max_retries > 0 {
        let policy = RetryPolicy {
            max_retries: config.llm_max_retries,
            base_delay: Duration::from_millis(config.llm_retry_base_ms),
        };
        info!(
            "Retrying evaluation failures up to {} times",
            policy.max_retries
        );
        Arc::new(RetryingClient::new(client, policy))
    } else {
        Arc::new(client)
    };

    if let Some(secs) = config.analysis_timeout_secs {
        info!("Analysis deadline: {secs}s");
    }

    // Build app state
    let state = AppState {
        pipeline: AnalysisPipeline::new(evaluator),
        store,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict CORS origins once the frontend host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

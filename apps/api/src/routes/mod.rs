pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::analysis::handlers as analysis;
use crate::results::handlers as results;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Analysis API
        .route("/api/v1/analyses", post(analysis::handle_analyze_text))
        .route(
            "/api/v1/analyses/upload",
            post(analysis::handle_analyze_upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        // Results API
        .route(
            "/api/v1/results",
            get(results::handle_list_results).post(results::handle_save_result),
        )
        .route("/api/v1/results/:id", get(results::handle_get_result))
        .with_state(state)
}

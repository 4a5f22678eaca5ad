use std::sync::Arc;

use crate::analysis::AnalysisPipeline;
use crate::config::Config;
use crate::results::store::AnalysisStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: AnalysisPipeline,
    /// Pluggable result store. Default: PgAnalysisStore.
    pub store: Arc<dyn AnalysisStore>,
    pub config: Config,
}

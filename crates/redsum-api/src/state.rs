use std::sync::Arc;

use redsum_pipeline::SummaryPipeline;
use redsum_reddit::ThreadFetcher;
use tokio_util::sync::CancellationToken;

use crate::config::Config;

/// Shared application state passed to all handlers
///
/// The pipeline is stateless and built once at startup; every request gets
/// a child of `shutdown` so in-flight work stops when the server does.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub fetcher: Arc<dyn ThreadFetcher>,
    pub pipeline: Arc<SummaryPipeline>,
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: Config, fetcher: Arc<dyn ThreadFetcher>, pipeline: SummaryPipeline) -> Self {
        Self {
            config: Arc::new(config),
            fetcher,
            pipeline: Arc::new(pipeline),
            shutdown: CancellationToken::new(),
        }
    }
}

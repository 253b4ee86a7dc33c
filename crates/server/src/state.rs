//! Application state

use call_qa_config::Settings;
use call_qa_core::Result;
use call_qa_pipeline::CallAnalyzer;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Shared application state.
///
/// Each request runs its own pipeline instance flow; the only shared
/// pieces are the immutable configuration, the analyzer (stateless across
/// requests), and the admission semaphore protecting external API quotas.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub analyzer: Arc<CallAnalyzer>,
    pub admission: Arc<Semaphore>,
}

impl AppState {
    /// Build state wired to the configured HTTP capabilities
    pub fn new(config: Settings) -> Result<Self> {
        let analyzer = CallAnalyzer::from_settings(&config)?;
        Ok(Self::with_analyzer(config, analyzer))
    }

    /// Build state over an explicit analyzer (tests inject mocks here)
    pub fn with_analyzer(config: Settings, analyzer: CallAnalyzer) -> Self {
        let admission = Arc::new(Semaphore::new(config.server.max_in_flight));
        Self {
            config: Arc::new(config),
            analyzer: Arc::new(analyzer),
            admission,
        }
    }
}

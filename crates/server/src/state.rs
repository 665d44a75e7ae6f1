use std::sync::Arc;

use mediathekarr_core::{Config, SanitizedConfig, SearchService};

/// Shared application state
pub struct AppState {
    config: Config,
    search: Arc<SearchService>,
}

impl AppState {
    pub fn new(config: Config, search: Arc<SearchService>) -> Self {
        Self { config, search }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn search(&self) -> &SearchService {
        self.search.as_ref()
    }

    /// Newznab API key, if one is configured.
    pub fn api_key(&self) -> Option<&str> {
        self.config
            .server
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
    }
}

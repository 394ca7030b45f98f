use reelpush_core::{Config, RequestProcessor};

/// Shared application state
pub struct AppState {
    config: Config,
    processor: RequestProcessor,
}

impl AppState {
    pub fn new(config: Config, processor: RequestProcessor) -> Self {
        Self { config, processor }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn processor(&self) -> &RequestProcessor {
        &self.processor
    }
}

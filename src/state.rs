use std::sync::Arc;

use crate::{
    config::AppConfig,
    provider::{SealedCookieProvider, SessionProvider},
    resolver::{SessionPolicy, SessionResolver},
};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub resolver: SessionResolver,
}

impl AppState {
    /// Sessions come from cookies sealed with `config.cookie_secret`.
    pub fn new(config: AppConfig) -> Self {
        let provider = SealedCookieProvider::from_secret(&config.cookie_secret);
        Self::with_provider(config, Arc::new(provider))
    }

    pub fn with_provider(config: AppConfig, provider: Arc<dyn SessionProvider>) -> Self {
        let resolver = SessionResolver::new(SessionPolicy::from(&config), provider);
        Self { config, resolver }
    }
}

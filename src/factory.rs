use std::sync::Arc;

use tracing::info;

use crate::cache::ClientCache;
use crate::client::{ClientError, ClientHandle};
use crate::config::{self, ConfigError, ConfigSource};
use crate::key::ClientProperties;
use crate::trust::{TrustError, TrustInitializer};

#[derive(Debug, thiserror::Error)]
pub enum FactoryError {
    #[error("failed to initialize certificate trust: {0}")]
    Trust(#[from] TrustError),
    #[error("failed to read trusted certificates: {0}")]
    Config(#[from] ConfigError),
}

/// Hands out cached clients and sets up certificate trust when it is built.
///
/// Trust initialization happens once, in the constructor, so a broken trust
/// setup fails before any client is handed out.
#[derive(Clone)]
pub struct WebClientFactory {
    cache: Arc<ClientCache>,
}

impl WebClientFactory {
    pub fn new(cache: Arc<ClientCache>) -> Self {
        Self { cache }
    }

    pub fn with_thumbprints(
        cache: Arc<ClientCache>,
        thumbprints: Vec<String>,
        initializer: &dyn TrustInitializer,
    ) -> Result<Self, FactoryError> {
        let count = thumbprints.len();
        initializer.initialize(thumbprints)?;
        info!(thumbprints = count, "client factory trust configured");
        Ok(Self::new(cache))
    }

    pub fn from_config(
        cache: Arc<ClientCache>,
        source: &dyn ConfigSource,
        initializer: &dyn TrustInitializer,
    ) -> Result<Self, FactoryError> {
        let thumbprints = config::allowed_thumbprints(source)?;
        Self::with_thumbprints(cache, thumbprints, initializer)
    }

    pub fn get_client(
        &self,
        properties: &ClientProperties,
    ) -> Result<Arc<ClientHandle>, ClientError> {
        self.cache.get_client(properties)
    }

    pub fn cache(&self) -> &Arc<ClientCache> {
        &self.cache
    }
}

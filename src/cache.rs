use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use tracing::{debug, warn};

use crate::client::{ClientBuilder, ClientError, ClientHandle, HttpClientBuilder};
use crate::key::ClientProperties;

static GLOBAL_CACHE: LazyLock<ClientCache> = LazyLock::new(ClientCache::new);

/// Registry of shared [`ClientHandle`]s, one per distinct [`ClientProperties`].
///
/// Entries are added on first request and are never removed or replaced, so a
/// handle returned for a key stays valid and identical for as long as the
/// cache lives. Lookups that hit only take the shared lock. Misses go through
/// the upgradable lock, which admits a single holder at a time, so concurrent
/// misses on the same key build exactly one client.
pub struct ClientCache {
    clients: RwLock<HashMap<ClientProperties, Arc<ClientHandle>>>,
    builder: Box<dyn ClientBuilder>,
}

impl ClientCache {
    pub fn new() -> Self {
        Self::with_builder(HttpClientBuilder::new())
    }

    pub fn with_builder(builder: impl ClientBuilder + 'static) -> Self {
        Self {
            clients: RwLock::new(HashMap::new()),
            builder: Box::new(builder),
        }
    }

    /// The process-wide cache, created on first use and never cleared.
    pub fn global() -> &'static ClientCache {
        &GLOBAL_CACHE
    }

    /// Return the client for `properties`, building it if this is the first request.
    ///
    /// A failed build is returned to the caller and leaves no entry behind, so
    /// the next call for the same key tries again.
    pub fn get_client(
        &self,
        properties: &ClientProperties,
    ) -> Result<Arc<ClientHandle>, ClientError> {
        if let Some(handle) = self.clients.read().get(properties) {
            return Ok(Arc::clone(handle));
        }

        let clients = self.clients.upgradable_read();
        if let Some(handle) = clients.get(properties) {
            debug!(charset = %properties.charset(), "client built by a concurrent caller");
            return Ok(Arc::clone(handle));
        }

        let mut clients = RwLockUpgradableReadGuard::upgrade(clients);
        let handle = match self.builder.build(properties) {
            Ok(handle) => Arc::new(handle),
            Err(err) => {
                warn!(charset = %properties.charset(), error = %err, "failed to build client");
                return Err(err);
            }
        };
        clients.insert(properties.clone(), Arc::clone(&handle));
        debug!(
            charset = %properties.charset(),
            cached = clients.len(),
            "cached new client"
        );
        Ok(handle)
    }

    pub fn contains(&self, properties: &ClientProperties) -> bool {
        self.clients.read().contains_key(properties)
    }

    pub fn len(&self) -> usize {
        self.clients.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.read().is_empty()
    }
}

impl Default for ClientCache {
    fn default() -> Self {
        Self::new()
    }
}

//! Server adapter module
//!
//! An adapter drives an [`Application`] from some transport. Adapters are kept in
//! an [`AdapterRegistry`] owned by the composition root and selected by name.

use crate::app::Application;
use crate::config::Config;
use crate::error::ConfigError;
use crate::server::{self, ServerSettings};
use std::collections::BTreeMap;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::Notify;

/// Future returned by [`ServerAdapter::serve`]
pub type ServeFuture = Pin<Box<dyn Future<Output = std::io::Result<()>> + Send>>;

/// Transport that feeds requests into an application
pub trait ServerAdapter: Send + Sync {
    fn name(&self) -> &'static str;

    /// Serve `app` on `addr` until `shutdown` is notified
    fn serve(&self, app: Arc<Application>, addr: SocketAddr, shutdown: Arc<Notify>) -> ServeFuture;
}

/// Name -> adapter lookup
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: BTreeMap<String, Arc<dyn ServerAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in hyper adapter configured from `config`
    pub fn with_defaults(config: &Config) -> Self {
        let mut registry = Self::new();
        registry.adapters.insert(
            HyperAdapter::NAME.to_string(),
            Arc::new(HyperAdapter::from_config(config)),
        );
        registry
    }

    pub fn register(&mut self, adapter: Arc<dyn ServerAdapter>) -> Result<(), ConfigError> {
        let name = adapter.name();
        if self.adapters.contains_key(name) {
            return Err(ConfigError::DuplicateAdapter(name.to_string()));
        }
        self.adapters.insert(name.to_string(), adapter);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn ServerAdapter>, ConfigError> {
        self.adapters
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownAdapter(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.adapters.keys().map(String::as_str)
    }
}

/// HTTP/1.1 adapter built on hyper and tokio
#[derive(Debug, Clone, Default)]
pub struct HyperAdapter {
    settings: Arc<ServerSettings>,
}

impl HyperAdapter {
    pub const NAME: &'static str = "hyper";

    pub fn new(settings: ServerSettings) -> Self {
        Self {
            settings: Arc::new(settings),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(ServerSettings::from_config(config))
    }
}

impl ServerAdapter for HyperAdapter {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn serve(&self, app: Arc<Application>, addr: SocketAddr, shutdown: Arc<Notify>) -> ServeFuture {
        let settings = Arc::clone(&self.settings);
        Box::pin(async move {
            let listener = server::create_reusable_listener(addr)?;
            server::run(listener, app, settings, shutdown).await
        })
    }
}

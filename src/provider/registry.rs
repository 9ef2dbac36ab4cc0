//! Name-keyed construction of [`TranscodingProvider`] instances.
//!
//! The [`ProviderRegistry`] is built once at startup and handed to the job
//! facade. Each name maps to a factory that validates that provider's
//! configuration and builds a bound instance. Instances are built on first
//! use and reused for the lifetime of the registry.

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;
use orchestrator_common::{Error, Result};
use tracing::{debug, warn};

use super::store::SummaryStore;
use super::TranscodingProvider;
use crate::config::Config;

/// Everything a factory may bind a provider to.
#[derive(Clone)]
pub struct ProviderContext {
    pub config: Arc<Config>,
    pub store: Arc<dyn SummaryStore>,
}

/// Validate configuration and build a provider. Never returns a provider for
/// an incomplete configuration.
pub type ProviderFactory =
    Arc<dyn Fn(&ProviderContext) -> Result<Arc<dyn TranscodingProvider>> + Send + Sync>;

pub struct ProviderRegistry {
    context: ProviderContext,
    factories: BTreeMap<String, ProviderFactory>,
    instances: DashMap<String, Arc<dyn TranscodingProvider>>,
}

impl ProviderRegistry {
    /// Create a registry with no providers.
    pub fn new(context: ProviderContext) -> Self {
        Self {
            context,
            factories: BTreeMap::new(),
            instances: DashMap::new(),
        }
    }

    /// Create a registry with every built-in provider registered.
    pub fn with_builtin_providers(context: ProviderContext) -> Self {
        let mut registry = Self::new(context);
        crate::providers::register_builtin(&mut registry);
        registry
    }

    /// Register `factory` under `name`, replacing any previous one.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&ProviderContext) -> Result<Arc<dyn TranscodingProvider>> + Send + Sync + 'static,
    {
        let name = name.into();
        self.instances.remove(&name);
        self.factories.insert(name, Arc::new(factory));
    }

    /// Registered provider names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Resolve `name` to a provider instance. Names are case-sensitive.
    ///
    /// Fails with [`Error::NotFound`] for an unregistered name, or with the
    /// factory's error (typically [`Error::Configuration`]). Failed
    /// constructions are not cached.
    pub fn get(&self, name: &str) -> Result<Arc<dyn TranscodingProvider>> {
        if let Some(instance) = self.instances.get(name) {
            return Ok(Arc::clone(instance.value()));
        }

        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| Error::not_found("provider", name))?;

        let provider = factory(&self.context).map_err(|e| {
            warn!(provider = name, error = %e, "provider construction failed");
            e
        })?;
        debug!(provider = name, "constructed provider");

        let instance = self
            .instances
            .entry(name.to_string())
            .or_insert(provider)
            .value()
            .clone();
        Ok(instance)
    }
}

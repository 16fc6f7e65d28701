//! Adapter catalog: resolves adapter names to instances

use super::command::CommandAdapter;
use super::image::ImageAdapter;
use super::text::BasicTextAdapter;
use super::traits::Adapter;
use crate::error::{AdapterError, MediaError, MediaResult};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Builds a fresh adapter instance from its attach-time configuration.
pub type AdapterFactory =
    Arc<dyn Fn(&Value) -> Result<Box<dyn Adapter>, AdapterError> + Send + Sync>;

/// Name → factory table. Every attach creates a new instance, so no two
/// items share adapter state.
#[derive(Clone, Default)]
pub struct AdapterCatalog {
    factories: BTreeMap<String, AdapterFactory>,
}

impl AdapterCatalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// A catalog with the built-in adapters registered.
    pub fn with_builtins() -> Self {
        let mut catalog = Self::new();
        catalog.register("Image", |_| Ok(Box::new(ImageAdapter::new())));
        catalog.register("BasicText", |_| Ok(Box::new(BasicTextAdapter::new())));
        catalog.register("Command", |config| {
            Ok(Box::new(CommandAdapter::from_config(config)?))
        });
        catalog
    }

    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&Value) -> Result<Box<dyn Adapter>, AdapterError> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Instantiate the named adapter.
    pub fn create(&self, name: &str, config: &Value) -> MediaResult<Box<dyn Adapter>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| MediaError::Configuration(format!("adapter {} not found", name)))?;
        factory(config).map_err(|e| {
            MediaError::Configuration(format!("adapter {} rejected its configuration: {}", name, e))
        })
    }
}

impl std::fmt::Debug for AdapterCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.factories.keys()).finish()
    }
}

//! Shared, immutable processing environment
//!
//! Bundles the configuration, the category table derived from it, the
//! adapter catalog, the MIME collaborator and the runtime probe. Built
//! once and handed to items as `Arc<Environment>`.

use crate::adapter::{Adapter, AdapterCatalog, RuntimeProbe};
use crate::category::CategoryTable;
use crate::config::MediaConfig;
use crate::error::AdapterError;
use crate::mime::{DefaultDetector, MimeDetector};
use crate::pipeline::Instruction;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

pub struct Environment {
    config: MediaConfig,
    categories: CategoryTable,
    catalog: AdapterCatalog,
    detector: Box<dyn MimeDetector>,
    runtime: RuntimeProbe,
    search_paths: Vec<PathBuf>,
}

impl Environment {
    /// Environment with built-in adapters, default detector and detected runtime.
    pub fn new(config: MediaConfig) -> Arc<Self> {
        Self::builder().config(config).build()
    }

    pub fn builder() -> EnvironmentBuilder {
        EnvironmentBuilder::new()
    }

    pub fn config(&self) -> &MediaConfig {
        &self.config
    }

    pub fn categories(&self) -> &CategoryTable {
        &self.categories
    }

    pub fn catalog(&self) -> &AdapterCatalog {
        &self.catalog
    }

    pub fn detector(&self) -> &dyn MimeDetector {
        self.detector.as_ref()
    }

    pub fn runtime(&self) -> &RuntimeProbe {
        &self.runtime
    }

    /// Directories searched for external executables.
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// A named preset for a category.
    pub fn filter(&self, category: &str, preset: &str) -> Option<&[Instruction]> {
        self.config.filter(category, preset)
    }
}

impl Default for Environment {
    fn default() -> Self {
        EnvironmentBuilder::new().into_environment()
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("catalog", &self.catalog)
            .field("runtime", &self.runtime)
            .field("search_paths", &self.search_paths)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Environment`].
pub struct EnvironmentBuilder {
    config: Option<MediaConfig>,
    catalog: AdapterCatalog,
    detector: Box<dyn MimeDetector>,
    runtime: RuntimeProbe,
}

impl EnvironmentBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            catalog: AdapterCatalog::with_builtins(),
            detector: Box::new(DefaultDetector),
            runtime: RuntimeProbe::detect(),
        }
    }

    /// Use this configuration instead of the embedded default.
    pub fn config(mut self, config: MediaConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Register (or replace) an adapter factory.
    pub fn adapter<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&Value) -> Result<Box<dyn Adapter>, AdapterError> + Send + Sync + 'static,
    {
        self.catalog.register(name, factory);
        self
    }

    /// Replace the whole catalog, dropping the built-ins.
    pub fn catalog(mut self, catalog: AdapterCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn detector(mut self, detector: impl MimeDetector + 'static) -> Self {
        self.detector = Box::new(detector);
        self
    }

    pub fn runtime(mut self, runtime: RuntimeProbe) -> Self {
        self.runtime = runtime;
        self
    }

    fn into_environment(self) -> Environment {
        let config = self.config.unwrap_or_default();
        let categories = config.category_table();
        let search_paths = config.executable_search_paths();
        Environment {
            config,
            categories,
            catalog: self.catalog,
            detector: self.detector,
            runtime: self.runtime,
            search_paths,
        }
    }

    pub fn build(self) -> Arc<Environment> {
        Arc::new(self.into_environment())
    }
}

impl Default for EnvironmentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_environment_uses_embedded_config() {
        let env = Environment::new(MediaConfig::default());
        assert_eq!(env.categories().resolve("image/png"), "Image");
        assert!(env.catalog().contains("Image"));
        assert!(env.runtime().has_extension("image"));
        assert!(env.filter("Image", "m").is_some());
    }

    #[test]
    fn builder_can_replace_catalog() {
        let env = Environment::builder()
            .config(MediaConfig::empty())
            .catalog(AdapterCatalog::new())
            .build();
        assert!(!env.catalog().contains("Image"));
        assert_eq!(env.categories().resolve("image/png"), "Generic");
    }
}

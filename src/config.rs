//! Static configuration: category table, adapter lists, filter presets
//!
//! Loaded once (from YAML) into an immutable [`MediaConfig`] and shared
//! through the [`Environment`](crate::Environment).

use crate::category::{CategoryRule, CategoryTable};
use crate::error::{MediaError, MediaResult};
use crate::pipeline::Instruction;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Configuration shipped with the crate.
pub const DEFAULT_CONFIG: &str = include_str!("../config/default.yaml");

/// One attached-adapter entry: a name plus its attach-time configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AdapterEntry {
    pub name: String,
    pub config: Value,
}

impl AdapterEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: Value::Null,
        }
    }

    pub fn with_config(mut self, config: Value) -> Self {
        self.config = config;
        self
    }
}

impl<'de> Deserialize<'de> for AdapterEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Bare(String),
            Configured(BTreeMap<String, Value>),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Bare(name) => Ok(AdapterEntry::new(name)),
            Raw::Configured(map) => {
                let mut entries = map.into_iter();
                match (entries.next(), entries.next()) {
                    (Some((name, config)), None) => Ok(AdapterEntry { name, config }),
                    _ => Err(serde::de::Error::custom(
                        "adapter entry must have exactly one key",
                    )),
                }
            }
        }
    }
}

fn default_fallback() -> String {
    "Generic".to_string()
}

/// Immutable process-wide configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    /// Ordered (pattern, category) pairs; first substring match wins
    #[serde(default)]
    pub categories: Vec<CategoryRule>,
    /// Category name to short code
    #[serde(default)]
    pub short_codes: HashMap<String, String>,
    /// Category used when no pattern matches
    #[serde(default = "default_fallback")]
    pub fallback: String,
    /// Per-category adapter lists, in priority order
    #[serde(default)]
    pub adapters: HashMap<String, Vec<AdapterEntry>>,
    /// Per-category named presets
    #[serde(default)]
    pub filters: BTreeMap<String, BTreeMap<String, Vec<Instruction>>>,
    /// Directories searched for external executables; `PATH` when absent
    #[serde(default)]
    pub search_paths: Option<Vec<PathBuf>>,
}

impl MediaConfig {
    /// Parse a YAML document.
    pub fn from_yaml_str(yaml: &str) -> MediaResult<Self> {
        let config: MediaConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a YAML file.
    pub fn load(path: &Path) -> MediaResult<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// A configuration with no categories, adapters or presets.
    pub fn empty() -> Self {
        Self {
            categories: Vec::new(),
            short_codes: HashMap::new(),
            fallback: default_fallback(),
            adapters: HashMap::new(),
            filters: BTreeMap::new(),
            search_paths: None,
        }
    }

    /// Every category that resolution can yield needs a short code.
    fn validate(&self) -> MediaResult<()> {
        let named = self
            .categories
            .iter()
            .map(|rule| rule.category.as_str())
            .chain(std::iter::once(self.fallback.as_str()));
        for category in named {
            if !self.short_codes.contains_key(category) {
                return Err(MediaError::Configuration(format!(
                    "category {} has no short code",
                    category
                )));
            }
        }
        Ok(())
    }

    /// Build the resolver table for this configuration.
    pub fn category_table(&self) -> CategoryTable {
        CategoryTable::new(
            self.categories.clone(),
            self.short_codes.clone(),
            self.fallback.clone(),
        )
    }

    /// Adapters configured for a category, in attach order.
    pub fn adapters_for(&self, category: &str) -> &[AdapterEntry] {
        self.adapters
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Look up a preset's instruction list.
    pub fn filter(&self, category: &str, preset: &str) -> Option<&[Instruction]> {
        self.filters
            .get(category)
            .and_then(|presets| presets.get(preset))
            .map(Vec::as_slice)
    }

    /// Directories searched for executables: configured, else `PATH`.
    pub fn executable_search_paths(&self) -> Vec<PathBuf> {
        match &self.search_paths {
            Some(paths) => paths.clone(),
            None => std::env::var_os("PATH")
                .map(|path| std::env::split_paths(&path).collect())
                .unwrap_or_default(),
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self::from_yaml_str(DEFAULT_CONFIG).expect("embedded default config is valid")
    }
}

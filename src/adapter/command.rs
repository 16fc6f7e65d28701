//! Configuration-driven adapter wrapping an external tool
//!
//! ```yaml
//! Js:
//!   - Command:
//!       command: jsmin
//!       operations:
//!         compress: ":command: :source: :destination:"
//! ```
//!
//! Each configured operation runs its template through [`run_external`]
//! with `source` (the active content as a file), `destination` (a fresh
//! temporary file) and `arg0`, `arg1`, ... bound. On success the
//! destination becomes the item's active working copy, except for
//! `convert`, whose first argument is the target MIME type: its output
//! becomes a new item of that type.

use super::exec::run_external;
use super::requirements::Requirements;
use super::traits::{args, Adapter, Outcome};
use crate::error::AdapterError;
use crate::item::{temporary_path, Item, ItemData};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, Deserialize)]
pub struct CommandConfig {
    /// Executable name or absolute path
    pub command: String,
    /// Operation name → argument template
    #[serde(default)]
    pub operations: BTreeMap<String, String>,
    /// Extension for the destination file; defaults to the item's canonical one
    #[serde(default)]
    pub extension: Option<String>,
}

#[derive(Debug)]
pub struct CommandAdapter {
    config: CommandConfig,
}

impl CommandAdapter {
    pub fn new(config: CommandConfig) -> Self {
        Self { config }
    }

    pub fn from_config(config: &Value) -> Result<Self, AdapterError> {
        let config = CommandConfig::deserialize(config)
            .map_err(|e| AdapterError::InvalidArguments(format!("command adapter: {}", e)))?;
        Ok(Self::new(config))
    }
}

impl Adapter for CommandAdapter {
    fn name(&self) -> &str {
        "Command"
    }

    fn capabilities(&self) -> Vec<&str> {
        self.config.operations.keys().map(String::as_str).collect()
    }

    fn requirements(&self) -> Requirements {
        Requirements::new().with_command(self.config.command.clone())
    }

    fn call(
        &mut self,
        operation: &str,
        item: &mut ItemData,
        args: &[Value],
    ) -> Result<Outcome, AdapterError> {
        let template = self
            .config
            .operations
            .get(operation)
            .ok_or_else(|| AdapterError::Unsupported(operation.to_string()))?;

        // `convert` hands its output over as a new item of the target type
        let target = match operation {
            "convert" => Some(args::str_at(args, 0)?.to_string()),
            _ => None,
        };

        let source = item.ensure_path()?;
        let extension = match (&self.config.extension, &target) {
            (Some(extension), _) => Some(extension.as_str()),
            (None, Some(mime_type)) => item.env().detector().guess_extension(mime_type),
            (None, None) => item.env().detector().guess_extension(item.mime_type()),
        };
        let destination = temporary_path(extension)?;

        let mut params = BTreeMap::new();
        params.insert("command".to_string(), self.config.command.clone());
        params.insert("source".to_string(), source.to_string_lossy().into_owned());
        params.insert(
            "destination".to_string(),
            destination.to_string_lossy().into_owned(),
        );
        for (index, value) in args.iter().enumerate() {
            params.insert(format!("arg{}", index), args::to_param(value));
        }

        let output = run_external(template, &params, item.env().search_paths())?;
        debug!(command = %self.config.command, operation, "external operation finished");

        if let Some(mime_type) = target {
            let converted = Item::from_temporary(item.env(), destination, &mime_type)
                .map_err(|e| AdapterError::Failed(e.to_string()))?;
            return Ok(Outcome::Replaced(converted));
        }

        item.adopt_temporary(destination);
        Ok(match output {
            Some(line) => Outcome::value(line),
            None => Outcome::Done,
        })
    }
}

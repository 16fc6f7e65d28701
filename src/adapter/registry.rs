//! Adapter registry: attaches, lazily initializes and dispatches to adapters
//!
//! Each item owns exactly one registry. Attach order is priority order: a
//! dispatch scan walks attached adapters front to back and stops at the
//! first one that can be initialized and answers the operation.
//!
//! Resolved operations are cached in an overlay (operation → adapter).
//! The overlay is rebuilt from the initialized adapters, in initialization
//! order, whenever that set changes; an adapter initialized later takes
//! over operations it shares with earlier ones.

use super::traits::{Adapter, Outcome};
use crate::config::AdapterEntry;
use crate::environment::Environment;
use crate::error::{MediaError, MediaResult};
use crate::item::ItemData;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

struct Attached {
    name: String,
    adapter: Box<dyn Adapter>,
}

/// Per-item adapter state: attached adapters, initialized set, overlay,
/// and diagnostic records.
pub struct AdapterRegistry {
    env: Arc<Environment>,
    attached: Vec<Attached>,
    /// Names in initialization order; always a subset of `attached`
    initialized: Vec<String>,
    overlay: HashMap<String, String>,
    messages: Vec<String>,
    /// (adapter or operation, message)
    errors: Vec<(String, String)>,
}

impl AdapterRegistry {
    pub fn new(env: Arc<Environment>) -> Self {
        Self {
            env,
            attached: Vec::new(),
            initialized: Vec::new(),
            overlay: HashMap::new(),
            messages: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Attach every entry in order. Failures are recorded, not returned.
    pub fn init(&mut self, entries: &[AdapterEntry]) {
        for entry in entries {
            // Recorded in `errors` by attach
            let _ = self.attach(&entry.name, &entry.config);
        }
    }

    /// Instantiate the named adapter and append it to the attached list.
    ///
    /// Attaching a name that is already attached is a no-op.
    pub fn attach(&mut self, name: &str, config: &Value) -> MediaResult<()> {
        if self.is_attached(name) {
            self.messages.push(format!("{} already attached", name));
            return Ok(());
        }

        let adapter = match self.env.catalog().create(name, config) {
            Ok(adapter) => adapter,
            Err(err) => {
                warn!(adapter = name, error = %err, "attach failed");
                self.errors.push((name.to_string(), err.to_string()));
                return Err(err);
            }
        };

        self.attached.push(Attached {
            name: name.to_string(),
            adapter,
        });
        self.messages.push(format!("attached {}", name));
        Ok(())
    }

    /// Remove an adapter from the attached and initialized sets.
    ///
    /// Idempotent. A later re-attach starts from a fresh, uninitialized
    /// instance.
    pub fn detach(&mut self, name: &str) {
        self.attached.retain(|a| a.name != name);
        self.initialized.retain(|n| n != name);
        self.regenerate_overlay();
        debug!(adapter = name, "detached adapter");
        self.messages.push(format!("removed {}", name));
    }

    /// Route `operation` to the adapter that answers it for `item`.
    pub fn dispatch(
        &mut self,
        item: &mut ItemData,
        operation: &str,
        args: &[Value],
    ) -> MediaResult<Outcome> {
        if let Some(owner) = self.overlay.get(operation).cloned() {
            return self.invoke(&owner, item, operation, args);
        }

        let candidates: Vec<String> = self
            .attached
            .iter()
            .filter(|a| a.adapter.capabilities().contains(&operation))
            .map(|a| a.name.clone())
            .collect();

        for name in candidates {
            if !self.is_initialized(&name) {
                if let Err(err) = self.activate(&name, item) {
                    warn!(adapter = %name, error = %err, "adapter unusable for item");
                    self.errors.push((name.clone(), err.to_string()));
                    self.detach(&name);
                    continue;
                }
                self.messages.push(format!("initialized {}", name));
                self.regenerate_overlay();
            }

            if let Some(owner) = self.overlay.get(operation).cloned() {
                return self.invoke(&owner, item, operation, args);
            }
        }

        let err = MediaError::Dispatch {
            operation: operation.to_string(),
        };
        debug!(operation, "no adapter answered");
        self.errors.push((operation.to_string(), err.to_string()));
        Err(err)
    }

    /// Check compatibility, then initialize.
    fn activate(&mut self, name: &str, item: &mut ItemData) -> MediaResult<()> {
        let slot = self
            .attached
            .iter_mut()
            .find(|a| a.name == name)
            .ok_or_else(|| MediaError::Configuration(format!("adapter {} not attached", name)))?;

        if !slot.adapter.compatible(item) {
            return Err(MediaError::Compatibility {
                adapter: name.to_string(),
                mime_type: item.mime_type().to_string(),
            });
        }

        slot.adapter
            .initialize(item)
            .map_err(|e| MediaError::Initialization {
                adapter: name.to_string(),
                reason: e.to_string(),
            })?;

        self.initialized.push(name.to_string());
        Ok(())
    }

    fn invoke(
        &mut self,
        owner: &str,
        item: &mut ItemData,
        operation: &str,
        args: &[Value],
    ) -> MediaResult<Outcome> {
        debug!(adapter = owner, operation, "dispatching");
        self.messages.push(format!("calling {}::{}", owner, operation));

        let slot = self
            .attached
            .iter_mut()
            .find(|a| a.name == owner)
            .ok_or_else(|| MediaError::Dispatch {
                operation: operation.to_string(),
            })?;

        slot.adapter.call(operation, item, args).map_err(|source| {
            let err = MediaError::Operation {
                adapter: owner.to_string(),
                operation: operation.to_string(),
                source,
            };
            self.errors.push((owner.to_string(), err.to_string()));
            err
        })
    }

    /// Rebuild operation → adapter from initialized adapters; last write wins.
    fn regenerate_overlay(&mut self) {
        self.overlay.clear();
        for name in &self.initialized {
            if let Some(attached) = self.attached.iter().find(|a| &a.name == name) {
                for operation in attached.adapter.capabilities() {
                    self.overlay.insert(operation.to_string(), name.clone());
                }
            }
        }
        debug!(operations = self.overlay.len(), "regenerated overlay");
        self.messages.push("regenerated overlay".to_string());
    }

    pub fn is_attached(&self, name: &str) -> bool {
        self.attached.iter().any(|a| a.name == name)
    }

    pub fn is_initialized(&self, name: &str) -> bool {
        self.initialized.iter().any(|n| n == name)
    }

    /// Whether any attached adapter declares `operation`.
    pub fn exposes(&self, operation: &str) -> bool {
        self.attached
            .iter()
            .any(|a| a.adapter.capabilities().contains(&operation))
    }

    /// Attached adapter names in priority order.
    pub fn attached(&self) -> Vec<&str> {
        self.attached.iter().map(|a| a.name.as_str()).collect()
    }

    /// Initialized adapter names in initialization order.
    pub fn initialized(&self) -> &[String] {
        &self.initialized
    }

    /// The adapter currently owning `operation` in the overlay.
    pub fn owner(&self, operation: &str) -> Option<&str> {
        self.overlay.get(operation).map(String::as_str)
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn errors(&self) -> &[(String, String)] {
        &self.errors
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("attached", &self.attached())
            .field("initialized", &self.initialized)
            .field("overlay", &self.overlay)
            .finish()
    }
}

//! Adapter requirement declarations and the runtime they are checked against

use super::exec::resolve_executable;
use crate::item::ItemData;
use serde::Deserialize;
use std::collections::BTreeSet;

/// What an adapter needs before it can be initialized for an item.
///
/// A non-empty `mime_types` allow-list is the only check when present.
/// Otherwise every listed extension, function, command and collaborator
/// must be available. Empty lists pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Requirements {
    pub mime_types: Vec<String>,
    pub extensions: Vec<String>,
    pub functions: Vec<String>,
    pub commands: Vec<String>,
    pub imports: Vec<String>,
}

impl Requirements {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mime_types<I, S>(mut self, mime_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mime_types = mime_types.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extensions.push(extension.into());
        self
    }

    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.functions.push(function.into());
        self
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.commands.push(command.into());
        self
    }

    pub fn with_import(mut self, collaborator: impl Into<String>) -> Self {
        self.imports.push(collaborator.into());
        self
    }

    /// Evaluate against an item and the runtime of its environment.
    pub fn satisfied_by(&self, item: &ItemData) -> bool {
        if !self.mime_types.is_empty() {
            return self.mime_types.iter().any(|m| m == item.mime_type());
        }

        let env = item.env();
        let runtime = env.runtime();

        self.extensions.iter().all(|e| runtime.has_extension(e))
            && self.functions.iter().all(|f| runtime.has_function(f))
            && self
                .commands
                .iter()
                .all(|c| resolve_executable(c, env.search_paths()).is_some())
            && self.imports.iter().all(|i| runtime.has_collaborator(i))
    }
}

/// What the running process provides: loaded extensions, callable
/// functions and importable collaborators, all by name.
#[derive(Debug, Clone, Default)]
pub struct RuntimeProbe {
    extensions: BTreeSet<String>,
    functions: BTreeSet<String>,
    collaborators: BTreeSet<String>,
}

impl RuntimeProbe {
    /// An empty runtime: nothing available.
    pub fn new() -> Self {
        Self::default()
    }

    /// The capabilities compiled into this build.
    pub fn detect() -> Self {
        Self::new()
            .with_extension("image")
            .with_extension("text")
            .with_collaborator("mime")
    }

    pub fn with_extension(mut self, name: impl Into<String>) -> Self {
        self.extensions.insert(name.into());
        self
    }

    pub fn with_function(mut self, name: impl Into<String>) -> Self {
        self.functions.insert(name.into());
        self
    }

    pub fn with_collaborator(mut self, name: impl Into<String>) -> Self {
        self.collaborators.insert(name.into());
        self
    }

    pub fn has_extension(&self, name: &str) -> bool {
        self.extensions.contains(name)
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains(name)
    }

    pub fn has_collaborator(&self, name: &str) -> bool {
        self.collaborators.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MediaConfig;
    use crate::environment::Environment;
    use crate::item::Item;
    use std::sync::Arc;

    fn env_with(runtime: RuntimeProbe) -> Arc<Environment> {
        Environment::builder()
            .config(MediaConfig::empty())
            .runtime(runtime)
            .build()
    }

    fn item(env: &Arc<Environment>, mime: &str) -> Item {
        Item::open(env, b"bytes".to_vec(), Some(mime)).unwrap()
    }

    #[test]
    fn empty_requirements_pass() {
        let env = env_with(RuntimeProbe::new());
        assert!(Requirements::new().satisfied_by(item(&env, "image/png").data()));
    }

    // === Scenario: allow-list is the only check when present ===
    #[test]
    fn mime_allow_list_is_exclusive() {
        let env = env_with(RuntimeProbe::new());
        let reqs = Requirements::new()
            .with_mime_types(["image/png"])
            .with_extension("missing-extension");

        assert!(reqs.satisfied_by(item(&env, "image/png").data()));
        assert!(!reqs.satisfied_by(item(&env, "image/jpeg").data()));
    }

    #[test]
    fn every_listed_capability_must_be_present() {
        let env = env_with(
            RuntimeProbe::new()
                .with_extension("image")
                .with_function("resample")
                .with_collaborator("mime"),
        );
        let subject = item(&env, "image/png");

        let ok = Requirements::new()
            .with_extension("image")
            .with_function("resample")
            .with_import("mime");
        assert!(ok.satisfied_by(subject.data()));

        let missing_function = ok.clone().with_function("sharpen");
        assert!(!missing_function.satisfied_by(subject.data()));

        let missing_import = Requirements::new().with_import("pdf-renderer");
        assert!(!missing_import.satisfied_by(subject.data()));
    }

    #[test]
    fn unresolvable_command_fails() {
        let env = env_with(RuntimeProbe::new());
        let reqs = Requirements::new().with_command("mediaflow-no-such-command-7f3a");
        assert!(!reqs.satisfied_by(item(&env, "text/plain").data()));
    }

    #[test]
    fn requirements_deserialize_with_defaults() {
        let reqs: Requirements = serde_yaml::from_str("commands: [pngcrush]").unwrap();
        assert_eq!(reqs, Requirements::new().with_command("pngcrush"));
    }
}

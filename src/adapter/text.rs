//! Plain text adapter
//!
//! Reads the active content as UTF-8 (lossily) on every call, so it sees
//! working copies produced by other adapters.

use super::traits::{args, Adapter, Outcome};
use crate::error::AdapterError;
use crate::item::{Content, ItemData};
use serde_json::Value;

#[derive(Debug, Default)]
pub struct BasicTextAdapter;

impl BasicTextAdapter {
    pub fn new() -> Self {
        Self
    }

    fn text(item: &mut ItemData) -> Result<String, AdapterError> {
        match item.content_mut() {
            Content::Object(object) => object
                .downcast_ref::<String>()
                .cloned()
                .ok_or_else(|| AdapterError::Failed("object is not text".to_string())),
            content => Ok(String::from_utf8_lossy(&content.read_bytes()?).into_owned()),
        }
    }
}

impl Adapter for BasicTextAdapter {
    fn name(&self) -> &str {
        "BasicText"
    }

    fn capabilities(&self) -> Vec<&str> {
        vec!["characters", "lines", "contents", "store"]
    }

    fn initialize(&mut self, item: &mut ItemData) -> Result<(), AdapterError> {
        Self::text(item).map(|_| ())
    }

    fn call(
        &mut self,
        operation: &str,
        item: &mut ItemData,
        args: &[Value],
    ) -> Result<Outcome, AdapterError> {
        match operation {
            "characters" => Ok(Outcome::value(Self::text(item)?.chars().count())),
            "lines" => Ok(Outcome::value(Self::text(item)?.lines().count())),
            "contents" => Ok(Outcome::value(Self::text(item)?)),
            "store" => {
                let path = args::str_at(args, 0)?;
                std::fs::write(path, Self::text(item)?)?;
                Ok(Outcome::Done)
            }
            other => Err(AdapterError::Unsupported(other.to_string())),
        }
    }
}

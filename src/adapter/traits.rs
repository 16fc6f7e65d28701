//! Adapter trait: the contract backends implement
//!
//! An adapter declares which named operations it performs and what the
//! runtime must provide for it to work. The registry decides when it is
//! initialized and which operations it answers.

use super::requirements::Requirements;
use crate::error::AdapterError;
use crate::item::{Item, ItemData};
use serde_json::Value;

/// What a successful operation produced.
#[derive(Debug)]
pub enum Outcome {
    /// Applied to the item in place; nothing to return
    Done,
    /// A computed value (dimensions, counts, paths, ...)
    Value(Value),
    /// A brand-new item superseding the current one
    Replaced(Item),
}

impl Outcome {
    pub fn value(value: impl Into<Value>) -> Self {
        Self::Value(value.into())
    }

    /// The carried value, if any.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_item(self) -> Option<Item> {
        match self {
            Self::Replaced(item) => Some(item),
            _ => None,
        }
    }
}

/// The contract adapters implement.
pub trait Adapter: Send {
    /// Name the adapter is attached under
    fn name(&self) -> &str;

    /// Named operations this adapter answers.
    ///
    /// Operations not listed here are never routed to the adapter.
    fn capabilities(&self) -> Vec<&str>;

    /// Runtime requirements checked before initialization.
    fn requirements(&self) -> Requirements {
        Requirements::default()
    }

    /// Whether this adapter can work with `item`.
    fn compatible(&self, item: &ItemData) -> bool {
        self.requirements().satisfied_by(item)
    }

    /// Bind to the item. Called at most once per item.
    fn initialize(&mut self, _item: &mut ItemData) -> Result<(), AdapterError> {
        Ok(())
    }

    /// Perform `operation`; only called for names in [`capabilities`](Self::capabilities).
    fn call(
        &mut self,
        operation: &str,
        item: &mut ItemData,
        args: &[Value],
    ) -> Result<Outcome, AdapterError>;
}

/// Typed access to positional operation arguments.
pub mod args {
    use crate::error::AdapterError;
    use serde_json::Value;

    pub fn u32_at(args: &[Value], index: usize) -> Result<u32, AdapterError> {
        args.get(index)
            .and_then(Value::as_u64)
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| {
                AdapterError::InvalidArguments(format!(
                    "argument {} must be a non-negative integer",
                    index
                ))
            })
    }

    pub fn str_at(args: &[Value], index: usize) -> Result<&str, AdapterError> {
        args.get(index).and_then(Value::as_str).ok_or_else(|| {
            AdapterError::InvalidArguments(format!("argument {} must be a string", index))
        })
    }

    /// A positive integer argument such as a width or height.
    pub fn extent_at(args: &[Value], index: usize) -> Result<u32, AdapterError> {
        match u32_at(args, index)? {
            0 => Err(AdapterError::InvalidArguments(format!(
                "argument {} must be greater than zero",
                index
            ))),
            n => Ok(n),
        }
    }

    /// Two positive integer arguments, as (width, height).
    pub fn dimensions(args: &[Value]) -> Result<(u32, u32), AdapterError> {
        Ok((extent_at(args, 0)?, extent_at(args, 1)?))
    }

    /// Render an argument for command-line substitution.
    pub fn to_param(value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

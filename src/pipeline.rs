//! Instruction pipeline
//!
//! Runs an ordered list of operations against an item in one pass. A step
//! is an operation name with optional arguments; in configuration it is
//! written either as a bare name or as a single-key map:
//!
//! ```yaml
//! - convert: image/png
//! - fit_crop: [100, 100]
//! - store
//! ```
//!
//! The pipeline stops at the first step the current handle cannot reach or
//! that fails. Steps already applied are not rolled back. A step that
//! yields a replacement item rebinds the handle for every later step.

use crate::adapter::Outcome;
use crate::environment::Environment;
use crate::error::{MediaError, MediaResult};
use crate::item::{Item, Source};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One pipeline step.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub operation: String,
    pub args: Vec<Value>,
}

impl Instruction {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: Vec<Value>) -> Self {
        self.args = args;
        self
    }

    /// Parse the command-line form `operation[=arg,arg,...]`.
    ///
    /// Arguments that read as JSON scalars (numbers, booleans) keep their
    /// type; anything else is a string.
    pub fn parse(step: &str) -> MediaResult<Self> {
        let (operation, args) = match step.split_once('=') {
            Some((operation, args)) => (operation.trim(), Some(args)),
            None => (step.trim(), None),
        };
        if operation.is_empty() {
            return Err(MediaError::Configuration(format!(
                "instruction without operation: {:?}",
                step
            )));
        }

        let args = args
            .map(|args| args.split(',').map(|arg| parse_arg(arg.trim())).collect())
            .unwrap_or_default();
        Ok(Self::new(operation).with_args(args))
    }
}

fn parse_arg(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ (Value::Number(_) | Value::Bool(_))) => value,
        _ => Value::String(raw.to_string()),
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args: Vec<String> = self.args.iter().map(Value::to_string).collect();
        write!(f, "{}({})", self.operation, args.join(", "))
    }
}

impl<'de> Deserialize<'de> for Instruction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Bare(String),
            WithArgs(BTreeMap<String, Value>),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Bare(operation) => Ok(Instruction::new(operation)),
            Raw::WithArgs(map) => {
                let mut steps = map.into_iter();
                match (steps.next(), steps.next()) {
                    (Some((operation, args)), None) => {
                        let args = match args {
                            Value::Array(args) => args,
                            Value::Null => Vec::new(),
                            scalar => vec![scalar],
                        };
                        Ok(Instruction::new(operation).with_args(args))
                    }
                    _ => Err(serde::de::Error::custom(
                        "instruction must have exactly one operation",
                    )),
                }
            }
        }
    }
}

/// A pipeline that stopped early, with the handle it was working on.
///
/// `item` reflects every step applied before the failure.
#[derive(Debug)]
pub struct PipelineError {
    pub error: MediaError,
    pub item: Item,
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl From<PipelineError> for MediaError {
    fn from(err: PipelineError) -> Self {
        err.error
    }
}

/// Apply `instructions` to `item` in order and return the final handle.
pub fn run(mut item: Item, instructions: &[Instruction]) -> Result<Item, PipelineError> {
    for (step, instruction) in instructions.iter().enumerate() {
        let operation = instruction.operation.as_str();
        let handle = item.handle_name();

        if !item.supports(operation) {
            warn!(step, operation, handle = %handle, "instruction not reachable");
            return Err(PipelineError {
                error: MediaError::InvalidInstruction {
                    operation: operation.to_string(),
                    handle,
                },
                item,
            });
        }

        debug!(step, instruction = %instruction, handle = %handle, "running instruction");
        match item.call(operation, &instruction.args) {
            Ok(Outcome::Replaced(next)) => {
                debug!(step, from = %handle, to = %next.handle_name(), "handle replaced");
                item = next;
            }
            Ok(_) => {}
            Err(err) => {
                warn!(step, operation, handle = %handle, error = %err, "instruction failed");
                return Err(PipelineError {
                    error: MediaError::InstructionFailed {
                        operation: operation.to_string(),
                        handle,
                        source: Box::new(err),
                    },
                    item,
                });
            }
        }
    }

    info!(
        steps = instructions.len(),
        mime_type = item.mime_type(),
        "pipeline finished"
    );
    Ok(item)
}

/// Open an item and run `instructions` on it.
pub fn make(
    env: &Arc<Environment>,
    source: impl Into<Source>,
    mime_type: Option<&str>,
    instructions: &[Instruction],
) -> MediaResult<Item> {
    let item = Item::open(env, source, mime_type)?;
    Ok(run(item, instructions)?)
}

/// Open an item and run the named preset configured for its category.
pub fn make_preset(
    env: &Arc<Environment>,
    source: impl Into<Source>,
    mime_type: Option<&str>,
    preset: &str,
) -> MediaResult<Item> {
    let item = Item::open(env, source, mime_type)?;
    let instructions = env.filter(item.category(), preset).ok_or_else(|| {
        MediaError::Configuration(format!(
            "no preset {} for category {}",
            preset,
            item.category()
        ))
    })?;
    Ok(run(item, instructions)?)
}

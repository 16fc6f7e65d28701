//! Error taxonomy for item processing

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by adapter operation bodies.
///
/// These never escape the registry directly: dispatch wraps them in
/// [`MediaError::Operation`] together with the adapter and operation name.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("operation not supported: {0}")]
    Unsupported(String),
    #[error("adapter failed: {0}")]
    Failed(String),
    #[error("external command failed: {0}")]
    External(String),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors surfaced to callers of items, registries and pipelines.
#[derive(Debug, Error)]
pub enum MediaError {
    /// Unknown adapter, malformed configuration or rejected input shape
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Adapter requirements not satisfied by the item
    #[error("adapter {adapter} is not compatible with {mime_type}")]
    Compatibility { adapter: String, mime_type: String },

    /// Adapter `initialize` refused the item
    #[error("adapter {adapter} failed to initialize: {reason}")]
    Initialization { adapter: String, reason: String },

    /// No attached adapter could answer the operation
    #[error("operation {operation} not found in any attached adapter")]
    Dispatch { operation: String },

    /// An adapter answered the operation but failed while performing it
    #[error("{adapter}::{operation} failed: {source}")]
    Operation {
        adapter: String,
        operation: String,
        #[source]
        source: AdapterError,
    },

    /// Pipeline step names an operation the current handle cannot reach
    #[error("invalid instruction {handle}::{operation}()")]
    InvalidInstruction { operation: String, handle: String },

    /// Pipeline step was reachable but did not succeed
    #[error("instruction {handle}::{operation}() failed: {source}")]
    InstructionFailed {
        operation: String,
        handle: String,
        #[source]
        source: Box<MediaError>,
    },

    /// Store destination exists and overwriting was not requested
    #[error("destination already exists: {}", .0.display())]
    Storage(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Config(#[from] serde_yaml::Error),
}

/// Result type for item operations
pub type MediaResult<T> = Result<T, MediaError>;

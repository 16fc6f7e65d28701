//! Mediaflow: adapter resolution and dispatch for media items
//!
//! An item (an image, a document, a stylesheet, ...) is classified into a
//! category by its MIME type. The category's configured adapters are
//! attached to the item in order, initialized only when an operation needs
//! them, and asked to perform named operations on it.
//!
//! # Core Concepts
//!
//! - **Item**: one unit of work with its content, MIME type, category and
//!   an exclusively owned adapter registry
//! - **Adapter**: a backend declaring the operations it answers and the
//!   runtime it needs
//! - **Registry**: attach order, lazy initialization, and the overlay that
//!   maps each operation to the adapter answering it
//! - **Pipeline**: an ordered instruction list applied to an item in one pass
//!
//! # Example
//!
//! ```
//! use mediaflow::{Environment, Item, MediaConfig};
//!
//! let env = Environment::new(MediaConfig::default());
//! let item = Item::open(&env, b"plain words".to_vec(), None).unwrap();
//! assert_eq!(item.category(), "Text");
//! ```

pub mod adapter;
mod category;
mod config;
mod environment;
mod error;
pub mod item;
pub mod mime;
pub mod pipeline;

pub use adapter::{Adapter, AdapterCatalog, AdapterRegistry, Outcome, Requirements, RuntimeProbe};
pub use category::{CategoryRule, CategoryTable};
pub use config::{AdapterEntry, MediaConfig, DEFAULT_CONFIG};
pub use environment::{Environment, EnvironmentBuilder};
pub use error::{AdapterError, MediaError, MediaResult};
pub use item::{ActiveCopy, Content, ContentKind, Item, ItemData, Object, Resource, Source};
pub use mime::{DefaultDetector, GuessOptions, MimeDetector};
pub use pipeline::{make, make_preset, run, Instruction, PipelineError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

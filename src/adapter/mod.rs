//! Adapter layer
//!
//! Adapters are interchangeable backends that perform named operations on
//! an item. Each item owns a registry that attaches them in configured
//! order, initializes them lazily and routes operation calls to them.

mod catalog;
mod command;
pub mod exec;
mod image;
mod registry;
mod requirements;
mod text;
mod traits;

pub use catalog::{AdapterCatalog, AdapterFactory};
pub use command::{CommandAdapter, CommandConfig};
pub use exec::{resolve_executable, run_external};
pub use image::ImageAdapter;
pub use registry::AdapterRegistry;
pub use requirements::{Requirements, RuntimeProbe};
pub use text::BasicTextAdapter;
pub use traits::{args, Adapter, Outcome};

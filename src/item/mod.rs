//! The item under processing
//!
//! An [`Item`] pairs the item's state ([`ItemData`]) with the adapter
//! registry it exclusively owns. Operations the item does not define
//! itself fall through to registry dispatch.

mod content;
mod ratio;


pub use content::{Content, ContentKind, Object, Resource, Source};
pub use ratio::known_ratio;

use crate::adapter::{AdapterRegistry, Outcome};
use crate::environment::Environment;
use crate::error::{MediaError, MediaResult};
use crate::mime::GuessOptions;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempPath;

/// Operations an item answers itself rather than through its adapters.
pub const ITEM_OPERATIONS: &[&str] = &["store", "convert", "ratio"];

/// Which working copy is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveCopy {
    Original,
    Temporary,
}

/// Temporary working copy; an owned temp file is deleted on drop.
#[derive(Debug)]
struct WorkingCopy {
    content: Content,
    _guard: Option<TempPath>,
}

/// Allocate a fresh temporary file path, deleted when the returned guard drops.
pub fn temporary_path(extension: Option<&str>) -> std::io::Result<TempPath> {
    let suffix = extension.map(|ext| format!(".{}", ext)).unwrap_or_default();
    Ok(tempfile::Builder::new()
        .prefix("mediaflow_")
        .suffix(&suffix)
        .tempfile()?
        .into_temp_path())
}

/// Item state: MIME type, derived category, content and by-products.
#[derive(Debug)]
pub struct ItemData {
    env: Arc<Environment>,
    mime_type: String,
    category: String,
    short_code: String,
    original: Content,
    temporary: Option<WorkingCopy>,
    /// Related files keyed by role
    pub files: BTreeMap<String, PathBuf>,
    /// Related open resources keyed by role
    pub resources: BTreeMap<String, Resource>,
    /// Related objects keyed by role
    pub objects: BTreeMap<String, Object>,
    /// Related contents; `raw` holds a full byte dump when present
    pub contents: BTreeMap<String, Vec<u8>>,
}

impl ItemData {
    fn new(env: Arc<Environment>, original: Content, mime_type: &str) -> Self {
        let (category, short_code) = env.categories().classify(mime_type);
        Self {
            env,
            mime_type: mime_type.to_string(),
            category,
            short_code,
            original,
            temporary: None,
            files: BTreeMap::new(),
            resources: BTreeMap::new(),
            objects: BTreeMap::new(),
            contents: BTreeMap::new(),
        }
    }

    pub fn env(&self) -> &Arc<Environment> {
        &self.env
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn short_code(&self) -> &str {
        &self.short_code
    }

    /// Change the MIME type and re-derive category and short code.
    pub fn set_mime_type(&mut self, mime_type: &str) {
        let (category, short_code) = self.env.categories().classify(mime_type);
        self.mime_type = mime_type.to_string();
        self.category = category;
        self.short_code = short_code;
    }

    pub fn active(&self) -> ActiveCopy {
        if self.temporary.is_some() {
            ActiveCopy::Temporary
        } else {
            ActiveCopy::Original
        }
    }

    /// The active content: the temporary copy once one exists.
    pub fn content(&self) -> &Content {
        match &self.temporary {
            Some(copy) => &copy.content,
            None => &self.original,
        }
    }

    pub fn content_mut(&mut self) -> &mut Content {
        match &mut self.temporary {
            Some(copy) => &mut copy.content,
            None => &mut self.original,
        }
    }

    pub fn original(&self) -> &Content {
        &self.original
    }

    /// Path of the active content, when it is a file.
    pub fn path(&self) -> Option<&Path> {
        self.content().as_path()
    }

    /// Make `content` the active temporary copy.
    pub fn set_temporary(&mut self, content: Content) {
        self.temporary = Some(WorkingCopy {
            content,
            _guard: None,
        });
    }

    /// Take ownership of a temp file and make it the active copy.
    pub fn adopt_temporary(&mut self, path: TempPath) {
        self.temporary = Some(WorkingCopy {
            content: Content::Path(path.to_path_buf()),
            _guard: Some(path),
        });
    }

    /// Drop the temporary copy, reactivating the original.
    pub fn discard_temporary(&mut self) {
        self.temporary = None;
    }

    /// Ensure the active content is a file, spilling other forms to a
    /// temporary file first.
    pub fn ensure_path(&mut self) -> std::io::Result<PathBuf> {
        if let Some(path) = self.path() {
            return Ok(path.to_path_buf());
        }
        let bytes = self.content_mut().read_bytes()?;
        let extension = self.env.detector().guess_extension(&self.mime_type);
        let temp = temporary_path(extension)?;
        std::fs::write(&temp, bytes)?;
        let path = temp.to_path_buf();
        self.adopt_temporary(temp);
        Ok(path)
    }
}

/// One unit of work: state plus its exclusively owned adapter registry.
pub struct Item {
    data: ItemData,
    registry: AdapterRegistry,
}

impl Item {
    /// Construct an item and attach its category's configured adapters.
    ///
    /// Without an explicit MIME type the environment's detector is asked
    /// for a simplified guess. A `Source::Many` list must be non-empty and
    /// of one content kind; its first element becomes the original and the
    /// rest are kept as related content keyed by position.
    pub fn open(
        env: &Arc<Environment>,
        source: impl Into<Source>,
        mime_type: Option<&str>,
    ) -> MediaResult<Self> {
        let (original, related) = match source.into() {
            Source::Single(content) => (content, Vec::new()),
            Source::Many(contents) => split_homogeneous(contents)?,
        };

        let mime_type = match mime_type {
            Some(mime) => mime.to_string(),
            None => env
                .detector()
                .guess_type(&original, GuessOptions::simplified()),
        };

        let mut data = ItemData::new(env.clone(), original, &mime_type);
        for (index, content) in related.into_iter().enumerate() {
            let key = (index + 1).to_string();
            match content {
                Content::Path(path) => {
                    data.files.insert(key, path);
                }
                Content::Resource(resource) => {
                    data.resources.insert(key, resource);
                }
                Content::Object(object) => {
                    data.objects.insert(key, object);
                }
                Content::Buffer(bytes) => {
                    data.contents.insert(key, bytes);
                }
            }
        }

        let mut registry = AdapterRegistry::new(env.clone());
        registry.init(env.config().adapters_for(data.category()));

        Ok(Self { data, registry })
    }

    /// Construct an item whose only content is an owned temporary file.
    pub fn from_temporary(
        env: &Arc<Environment>,
        path: TempPath,
        mime_type: &str,
    ) -> MediaResult<Self> {
        let mut item = Self::open(env, path.to_path_buf(), Some(mime_type))?;
        item.data.adopt_temporary(path);
        Ok(item)
    }

    pub fn data(&self) -> &ItemData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut ItemData {
        &mut self.data
    }

    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut AdapterRegistry {
        &mut self.registry
    }

    pub fn mime_type(&self) -> &str {
        self.data.mime_type()
    }

    pub fn category(&self) -> &str {
        self.data.category()
    }

    pub fn short_code(&self) -> &str {
        self.data.short_code()
    }

    pub fn content(&self) -> &Content {
        self.data.content()
    }

    /// Name used for this item in diagnostics, e.g. `ImageItem`.
    pub fn handle_name(&self) -> String {
        format!("{}Item", self.data.category())
    }

    /// Whether `operation` is defined on the item or exposed by an
    /// attached adapter.
    pub fn supports(&self, operation: &str) -> bool {
        ITEM_OPERATIONS.contains(&operation) || self.registry.exposes(operation)
    }

    /// Invoke an operation by name.
    ///
    /// `store`, `convert` and `ratio` are handled by the item; anything
    /// else is dispatched through the registry.
    pub fn call(&mut self, operation: &str, args: &[Value]) -> MediaResult<Outcome> {
        match operation {
            "store" => {
                let destination = args.first().and_then(Value::as_str).ok_or_else(|| {
                    MediaError::Configuration("store expects a destination path".to_string())
                })?;
                let overwrite = args.get(1).and_then(Value::as_bool).unwrap_or(false);
                let path = self.store(Path::new(destination), overwrite)?;
                Ok(Outcome::value(path.to_string_lossy().into_owned()))
            }
            "convert" => {
                let mime_type = args.first().and_then(Value::as_str).ok_or_else(|| {
                    MediaError::Configuration("convert expects a MIME type".to_string())
                })?;
                self.convert(mime_type)
            }
            "ratio" => Ok(Outcome::value(self.ratio()?)),
            _ => self.registry.dispatch(&mut self.data, operation, args),
        }
    }

    /// Write the item to `destination` with the canonical extension for
    /// its MIME type, returning the path actually written.
    ///
    /// Fails with [`MediaError::Storage`] when that path exists and
    /// `overwrite` is false; nothing is touched in that case. The adapter
    /// writes to a staging file next to the target, which replaces the
    /// target only once the adapter succeeded.
    pub fn store(&mut self, destination: &Path, overwrite: bool) -> MediaResult<PathBuf> {
        let target = self.storage_path(destination);
        if target.exists() && !overwrite {
            return Err(MediaError::Storage(target));
        }

        let staging = staging_path(&target)?;
        let arg = Value::String(staging.to_string_lossy().into_owned());
        self.registry.dispatch(&mut self.data, "store", &[arg])?;

        let persisted = if overwrite {
            staging.persist(&target)
        } else {
            staging.persist_noclobber(&target)
        };
        persisted.map_err(|e| match e.error.kind() {
            std::io::ErrorKind::AlreadyExists => MediaError::Storage(target.clone()),
            _ => MediaError::Io(e.error),
        })?;
        Ok(target)
    }

    fn storage_path(&self, destination: &Path) -> PathBuf {
        let extension = self
            .data
            .env
            .detector()
            .guess_extension(self.mime_type())
            .map(str::to_string)
            .or_else(|| {
                destination
                    .extension()
                    .map(|ext| ext.to_string_lossy().into_owned())
            });

        let stem = destination
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = match extension {
            Some(ext) => format!("{}.{}", stem, ext),
            None => stem,
        };
        destination.with_file_name(name)
    }

    /// Convert to another MIME type.
    ///
    /// Returns `Outcome::Done` when converted in place (MIME type,
    /// category and short code updated) or `Outcome::Replaced` when the
    /// adapter produced a new item. On error the item is unchanged.
    pub fn convert(&mut self, mime_type: &str) -> MediaResult<Outcome> {
        let arg = Value::String(mime_type.to_string());
        match self.registry.dispatch(&mut self.data, "convert", &[arg])? {
            Outcome::Replaced(item) => Ok(Outcome::Replaced(item)),
            _ => {
                self.data.set_mime_type(mime_type);
                Ok(Outcome::Done)
            }
        }
    }

    /// Name of the well-known aspect ratio closest to the item's dimensions.
    pub fn ratio(&mut self) -> MediaResult<String> {
        let width = self.dimension("width")?;
        let height = self.dimension("height")?;
        known_ratio(width, height).map(str::to_string).ok_or_else(|| {
            MediaError::Configuration(format!("cannot compute ratio of {}x{}", width, height))
        })
    }

    fn dimension(&mut self, operation: &str) -> MediaResult<u64> {
        let outcome = self.registry.dispatch(&mut self.data, operation, &[])?;
        outcome.as_value().and_then(Value::as_u64).ok_or_else(|| {
            MediaError::Configuration(format!("{} did not return an integer", operation))
        })
    }

    pub fn attach(&mut self, adapter: &str, config: &Value) -> MediaResult<()> {
        self.registry.attach(adapter, config)
    }

    pub fn detach(&mut self, adapter: &str) {
        self.registry.detach(adapter)
    }
}

impl std::fmt::Debug for Item {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Item")
            .field("mime_type", &self.data.mime_type)
            .field("category", &self.data.category)
            .field("active", &self.data.active())
            .field("content", &self.data.content().kind())
            .field("registry", &self.registry)
            .finish()
    }
}

/// Temp file beside `target` carrying its extension, so adapters that pick
/// an encoding from the path see the final one.
fn staging_path(target: &Path) -> MediaResult<TempPath> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let suffix = target
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    Ok(tempfile::Builder::new()
        .prefix(".mediaflow_")
        .suffix(&suffix)
        .tempfile_in(dir)?
        .into_temp_path())
}

fn split_homogeneous(contents: Vec<Content>) -> MediaResult<(Content, Vec<Content>)> {
    let mut contents = contents.into_iter();
    let first = contents
        .next()
        .ok_or_else(|| MediaError::Configuration("empty content list".to_string()))?;
    let kind = first.kind();

    let rest: Vec<Content> = contents.collect();
    if let Some(mismatch) = rest.iter().find(|c| c.kind() != kind) {
        return Err(MediaError::Configuration(format!(
            "mixed content list: expected {} but found {}",
            kind,
            mismatch.kind()
        )));
    }
    Ok((first, rest))
}

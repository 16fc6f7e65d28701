//! Item content representations and construction input

use std::any::Any;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// An open resource handle, keyed by the kind of resource it is.
#[derive(Debug)]
pub struct Resource {
    pub kind: String,
    pub handle: File,
}

impl Resource {
    pub fn new(kind: impl Into<String>, handle: File) -> Self {
        Self {
            kind: kind.into(),
            handle,
        }
    }
}

/// An embedded object, keyed by its type name.
pub struct Object {
    type_name: &'static str,
    value: Box<dyn Any + Send>,
}

impl Object {
    pub fn new<T: Any + Send>(value: T) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            value: Box::new(value),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    pub fn downcast_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.value.downcast_mut::<T>()
    }
}

impl std::fmt::Debug for Object {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Object")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// Which representation a [`Content`] value holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Path,
    Resource,
    Object,
    Buffer,
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Path => write!(f, "path"),
            Self::Resource => write!(f, "resource"),
            Self::Object => write!(f, "object"),
            Self::Buffer => write!(f, "buffer"),
        }
    }
}

/// The content of an item: exactly one representation.
#[derive(Debug)]
pub enum Content {
    Path(PathBuf),
    Resource(Resource),
    Object(Object),
    Buffer(Vec<u8>),
}

impl Content {
    pub fn kind(&self) -> ContentKind {
        match self {
            Self::Path(_) => ContentKind::Path,
            Self::Resource(_) => ContentKind::Resource,
            Self::Object(_) => ContentKind::Object,
            Self::Buffer(_) => ContentKind::Buffer,
        }
    }

    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Self::Path(path) => Some(path),
            _ => None,
        }
    }

    /// Read the complete byte content.
    ///
    /// Resource handles are rewound before and after reading. Objects have
    /// no byte form.
    pub fn read_bytes(&mut self) -> std::io::Result<Vec<u8>> {
        match self {
            Self::Path(path) => std::fs::read(path),
            Self::Buffer(bytes) => Ok(bytes.clone()),
            Self::Resource(resource) => {
                let mut bytes = Vec::new();
                resource.handle.seek(SeekFrom::Start(0))?;
                resource.handle.read_to_end(&mut bytes)?;
                resource.handle.seek(SeekFrom::Start(0))?;
                Ok(bytes)
            }
            Self::Object(object) => Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("object {} has no byte representation", object.type_name()),
            )),
        }
    }
}

impl From<PathBuf> for Content {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for Content {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<Vec<u8>> for Content {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Buffer(bytes)
    }
}

impl From<Resource> for Content {
    fn from(resource: Resource) -> Self {
        Self::Resource(resource)
    }
}

impl From<Object> for Content {
    fn from(object: Object) -> Self {
        Self::Object(object)
    }
}

/// Construction input for an item: one content value or a homogeneous list.
#[derive(Debug)]
pub enum Source {
    Single(Content),
    Many(Vec<Content>),
}

impl From<Content> for Source {
    fn from(content: Content) -> Self {
        Self::Single(content)
    }
}

macro_rules! single_source_from {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Source {
            fn from(value: $ty) -> Self {
                Self::Single(Content::from(value))
            }
        })*
    };
}

single_source_from!(PathBuf, &Path, Vec<u8>, Resource, Object);

impl From<Vec<PathBuf>> for Source {
    fn from(paths: Vec<PathBuf>) -> Self {
        Self::Many(paths.into_iter().map(Content::Path).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn object_downcasts_to_original_type() {
        let mut object = Object::new(vec![1u32, 2, 3]);
        assert!(object.type_name().contains("Vec"));
        assert_eq!(object.downcast_ref::<Vec<u32>>().unwrap().len(), 3);
        object.downcast_mut::<Vec<u32>>().unwrap().push(4);
        assert_eq!(object.downcast_ref::<Vec<u32>>().unwrap().len(), 4);
        assert!(object.downcast_ref::<String>().is_none());
    }

    #[test]
    fn resource_read_rewinds_handle() {
        let mut file = tempfile::tempfile().unwrap();
        file.write_all(b"hello").unwrap();
        let mut content = Content::Resource(Resource::new("stream", file));

        assert_eq!(content.read_bytes().unwrap(), b"hello");
        assert_eq!(content.read_bytes().unwrap(), b"hello");
    }

    #[test]
    fn object_has_no_bytes() {
        let mut content = Content::Object(Object::new(42u8));
        assert!(content.read_bytes().is_err());
        assert_eq!(content.kind(), ContentKind::Object);
    }

    #[test]
    fn path_vectors_become_many() {
        let source: Source = vec![PathBuf::from("a.png"), PathBuf::from("b.png")].into();
        match source {
            Source::Many(items) => assert_eq!(items.len(), 2),
            Source::Single(_) => panic!("expected Many"),
        }
    }
}

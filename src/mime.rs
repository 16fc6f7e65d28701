//! MIME type collaborator: type guessing and extension mapping
//!
//! The engine only depends on the [`MimeDetector`] contract. The default
//! implementation sniffs a handful of magic numbers and falls back to the
//! file extension.

use crate::item::Content;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// Options for [`MimeDetector::guess_type`].
#[derive(Debug, Clone, Copy, Default)]
pub struct GuessOptions {
    /// Reduce the result to a broad `family/subtype` form
    pub simplify: bool,
}

impl GuessOptions {
    pub fn simplified() -> Self {
        Self { simplify: true }
    }
}

/// The MIME collaborator contract consumed by items.
pub trait MimeDetector: Send + Sync {
    /// Guess the MIME type of some content.
    fn guess_type(&self, content: &Content, options: GuessOptions) -> String;

    /// Canonical file extension for a MIME type, without the leading dot.
    fn guess_extension(&self, mime_type: &str) -> Option<&'static str>;
}

const OCTET_STREAM: &str = "application/octet-stream";

/// (extension, MIME type); the first row for a MIME type is its canonical extension.
const EXTENSIONS: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("bmp", "image/bmp"),
    ("webp", "image/webp"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
    ("ico", "image/icon"),
    ("svg", "image/svg+xml"),
    ("pdf", "application/pdf"),
    ("doc", "application/msword"),
    ("rtf", "text/rtf"),
    ("txt", "text/plain"),
    ("md", "text/markdown"),
    ("markdown", "text/markdown"),
    ("css", "text/css"),
    ("js", "text/javascript"),
    ("html", "text/html"),
    ("htm", "text/html"),
    ("json", "application/json"),
    ("yaml", "text/yaml"),
    ("yml", "text/yaml"),
    ("xml", "text/xml"),
    ("mp3", "audio/mpeg"),
    ("wav", "audio/wav"),
    ("ogg", "audio/ogg"),
    ("flac", "audio/flac"),
    ("mp4", "video/mp4"),
    ("webm", "video/webm"),
    ("avi", "video/avi"),
    ("zip", "application/zip"),
];

/// Known aliases folded during simplification.
const ALIASES: &[(&str, &str)] = &[
    ("image/jpg", "image/jpeg"),
    ("image/pjpeg", "image/jpeg"),
    ("image/vnd.microsoft.icon", "image/icon"),
    ("application/javascript", "text/javascript"),
    ("application/rtf", "text/rtf"),
    ("audio/mp3", "audio/mpeg"),
    ("audio/wave", "audio/wav"),
];

/// Reduce a MIME type to lowercase `family/subtype`, dropping parameters,
/// an `x-` subtype prefix and known aliases.
pub fn simplify(mime_type: &str) -> String {
    let base = mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    let base = match base.split_once('/') {
        Some((family, subtype)) => {
            let subtype = subtype.strip_prefix("x-").unwrap_or(subtype);
            format!("{}/{}", family, subtype)
        }
        None => base,
    };

    ALIASES
        .iter()
        .find(|(alias, _)| *alias == base)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(base)
}

/// Identify content from its leading bytes.
pub fn sniff(bytes: &[u8]) -> Option<&'static str> {
    const SIGNATURES: &[(&[u8], &str)] = &[
        (b"\xFF\xD8\xFF", "image/jpeg"),
        (b"\x89PNG\r\n\x1A\n", "image/png"),
        (b"GIF87a", "image/gif"),
        (b"GIF89a", "image/gif"),
        (b"%PDF-", "application/pdf"),
        (b"BM", "image/bmp"),
        (b"\x00\x00\x01\x00", "image/icon"),
        (b"ID3", "audio/mpeg"),
        (b"OggS", "audio/ogg"),
        (b"fLaC", "audio/flac"),
        (b"PK\x03\x04", "application/zip"),
    ];

    if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" {
        return match &bytes[8..12] {
            b"WEBP" => Some("image/webp"),
            b"WAVE" => Some("audio/wav"),
            b"AVI " => Some("video/avi"),
            _ => None,
        };
    }

    SIGNATURES
        .iter()
        .find(|(magic, _)| bytes.starts_with(magic))
        .map(|(_, mime)| *mime)
}

/// MIME type implied by a path's extension.
pub fn from_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    EXTENSIONS
        .iter()
        .find(|(candidate, _)| *candidate == ext)
        .map(|(_, mime)| *mime)
}

/// Magic-number sniffing with extension fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultDetector;

impl DefaultDetector {
    fn detect_path(path: &Path) -> &'static str {
        let mut head = [0u8; 16];
        let sniffed = std::fs::File::open(path)
            .and_then(|mut file| file.read(&mut head))
            .ok()
            .and_then(|n| sniff(&head[..n]));

        sniffed
            .or_else(|| from_extension(path))
            .unwrap_or(OCTET_STREAM)
    }

    /// Sniff an open handle, leaving its position where it was.
    fn detect_resource(handle: &File) -> &'static str {
        let mut head = [0u8; 512];
        match read_head(handle, &mut head) {
            Ok(n) => sniff_or_text(&head[..n]),
            Err(_) => OCTET_STREAM,
        }
    }
}

fn read_head(mut handle: &File, head: &mut [u8]) -> std::io::Result<usize> {
    let start = handle.stream_position()?;
    let n = handle.read(head)?;
    handle.seek(SeekFrom::Start(start))?;
    Ok(n)
}

fn sniff_or_text(bytes: &[u8]) -> &'static str {
    sniff(bytes).unwrap_or_else(|| match std::str::from_utf8(bytes) {
        Ok(_) => "text/plain",
        // a head cut inside a multi-byte character
        Err(e) if e.error_len().is_none() => "text/plain",
        Err(_) => OCTET_STREAM,
    })
}

impl MimeDetector for DefaultDetector {
    fn guess_type(&self, content: &Content, options: GuessOptions) -> String {
        let detected = match content {
            Content::Path(path) => Self::detect_path(path),
            Content::Buffer(bytes) => sniff_or_text(bytes),
            Content::Resource(resource) => Self::detect_resource(&resource.handle),
            Content::Object(_) => OCTET_STREAM,
        };

        if options.simplify {
            simplify(detected)
        } else {
            detected.to_string()
        }
    }

    fn guess_extension(&self, mime_type: &str) -> Option<&'static str> {
        let mime_type = simplify(mime_type);
        EXTENSIONS
            .iter()
            .find(|(_, mime)| *mime == mime_type)
            .map(|(ext, _)| *ext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn simplify_strips_parameters_and_x_prefix() {
        assert_eq!(simplify("text/plain; charset=utf-8"), "text/plain");
        assert_eq!(simplify("image/x-png"), "image/png");
        assert_eq!(simplify("image/x-icon"), "image/icon");
        assert_eq!(simplify("IMAGE/JPG"), "image/jpeg");
        assert_eq!(simplify("application/javascript"), "text/javascript");
    }

    #[test]
    fn sniff_recognizes_common_signatures() {
        assert_eq!(sniff(b"\xFF\xD8\xFF\xE0rest"), Some("image/jpeg"));
        assert_eq!(sniff(b"\x89PNG\r\n\x1A\n...."), Some("image/png"));
        assert_eq!(sniff(b"RIFF\0\0\0\0WEBPVP8 "), Some("image/webp"));
        assert_eq!(sniff(b"RIFF\0\0\0\0WAVEfmt "), Some("audio/wav"));
        assert_eq!(sniff(b"plain words"), None);
    }

    #[test]
    fn canonical_extension_is_first_table_row() {
        let detector = DefaultDetector;
        assert_eq!(detector.guess_extension("image/jpeg"), Some("jpg"));
        assert_eq!(detector.guess_extension("image/png"), Some("png"));
        assert_eq!(detector.guess_extension("text/markdown"), Some("md"));
        assert_eq!(detector.guess_extension("application/x-unknown"), None);
    }

    #[test]
    fn path_detection_prefers_magic_over_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("misnamed.txt");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"GIF89a\x01\x00\x01\x00").unwrap();

        let detected = DefaultDetector.guess_type(&Content::Path(path), GuessOptions::simplified());
        assert_eq!(detected, "image/gif");
    }

    #[test]
    fn path_detection_falls_back_to_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("style.css");
        std::fs::write(&path, "body { margin: 0 }").unwrap();

        let detected = DefaultDetector.guess_type(&Content::Path(path), GuessOptions::default());
        assert_eq!(detected, "text/css");
    }

    #[test]
    fn utf8_buffer_is_plain_text() {
        let detected = DefaultDetector.guess_type(
            &Content::Buffer(b"hello".to_vec()),
            GuessOptions::simplified(),
        );
        assert_eq!(detected, "text/plain");
    }

    #[test]
    fn resources_are_sniffed_without_moving_the_handle() {
        let mut handle = tempfile::tempfile().unwrap();
        handle.write_all(b"\x89PNG\r\n\x1A\n....").unwrap();
        handle.seek(SeekFrom::Start(0)).unwrap();
        let resource = crate::item::Resource::new("stream", handle);

        let content = Content::Resource(resource);
        let detected = DefaultDetector.guess_type(&content, GuessOptions::simplified());
        assert_eq!(detected, "image/png");

        let Content::Resource(mut resource) = content else {
            unreachable!()
        };
        assert_eq!(resource.handle.stream_position().unwrap(), 0);
    }

    #[test]
    fn binary_resources_stay_generic() {
        let mut handle = tempfile::tempfile().unwrap();
        handle.write_all(&[0x00, 0xFF, 0xFE, 0x80]).unwrap();
        handle.seek(SeekFrom::Start(0)).unwrap();

        let content = Content::Resource(crate::item::Resource::new("stream", handle));
        assert_eq!(
            DefaultDetector.guess_type(&content, GuessOptions::default()),
            OCTET_STREAM
        );
    }
}

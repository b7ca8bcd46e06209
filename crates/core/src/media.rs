use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported media type: filename='{filename}', content_type='{content_type}'")]
pub struct UnsupportedMediaType {
    pub filename: String,
    pub content_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Pdf,
    Image,
}

const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "tif", "tiff", "bmp", "gif", "webp", "pnm", "pbm", "pgm", "ppm",
];

const PDF_CONTENT_TYPES: &[&str] = &["application/pdf", "application/x-pdf"];

const IMAGE_CONTENT_TYPES: &[&str] = &[
    "image/png",
    "image/jpeg",
    "image/jpg",
    "image/tiff",
    "image/bmp",
    "image/gif",
    "image/webp",
    "image/x-portable-anymap",
];

impl MediaKind {
    /// Classify an upload from its filename and declared content type.
    ///
    /// A recognized extension decides. Otherwise the content type (parameters
    /// stripped) decides. Anything else is rejected; bytes are never sniffed.
    pub fn classify(
        filename: &str,
        content_type: Option<&str>,
    ) -> Result<Self, UnsupportedMediaType> {
        if let Some(kind) = Self::from_extension(filename) {
            return Ok(kind);
        }
        if let Some(kind) = content_type.and_then(Self::from_content_type) {
            return Ok(kind);
        }
        Err(UnsupportedMediaType {
            filename: filename.to_string(),
            content_type: content_type.unwrap_or("").to_string(),
        })
    }

    fn from_extension(filename: &str) -> Option<Self> {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())?
            .to_ascii_lowercase();
        if ext == "pdf" {
            Some(MediaKind::Pdf)
        } else if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Image)
        } else {
            None
        }
    }

    fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();
        if PDF_CONTENT_TYPES.contains(&essence.as_str()) {
            Some(MediaKind::Pdf)
        } else if IMAGE_CONTENT_TYPES.contains(&essence.as_str()) {
            Some(MediaKind::Image)
        } else {
            None
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Pdf => write!(f, "pdf"),
            MediaKind::Image => write!(f, "image"),
        }
    }
}

/// An upload held in memory for the duration of one extraction.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub filename: String,
    pub kind: MediaKind,
    pub bytes: Vec<u8>,
}

impl UploadedDocument {
    pub fn new(filename: impl Into<String>, kind: MediaKind, bytes: Vec<u8>) -> Self {
        Self { filename: filename.into(), kind, bytes }
    }

    /// Classify and wrap an upload in one step.
    pub fn classify(
        filename: impl Into<String>,
        content_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<Self, UnsupportedMediaType> {
        let filename = filename.into();
        let kind = MediaKind::classify(&filename, content_type)?;
        Ok(Self { filename, kind, bytes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_decides_when_recognized() {
        assert_eq!(MediaKind::classify("scan.PDF", None), Ok(MediaKind::Pdf));
        assert_eq!(MediaKind::classify("label.jpeg", None), Ok(MediaKind::Image));
        assert_eq!(
            MediaKind::classify("box.png", Some("application/pdf")),
            Ok(MediaKind::Image)
        );
    }

    #[test]
    fn content_type_decides_without_known_extension() {
        assert_eq!(MediaKind::classify("upload", Some("application/pdf")), Ok(MediaKind::Pdf));
        assert_eq!(
            MediaKind::classify("upload.bin", Some("Image/PNG; charset=binary")),
            Ok(MediaKind::Image)
        );
        assert_eq!(MediaKind::classify("", Some("application/x-pdf")), Ok(MediaKind::Pdf));
    }

    #[test]
    fn unknown_uploads_are_rejected() {
        let err = MediaKind::classify("notes.txt", Some("text/plain")).unwrap_err();
        assert_eq!(err.filename, "notes.txt");
        assert_eq!(err.content_type, "text/plain");
        assert!(MediaKind::classify("archive.zip", None).is_err());
        assert!(MediaKind::classify("data", Some("application/octet-stream")).is_err());
    }

    #[test]
    fn uploaded_document_classify_keeps_bytes() {
        let doc = UploadedDocument::classify("a.pdf", None, vec![1, 2, 3]).unwrap();
        assert_eq!(doc.kind, MediaKind::Pdf);
        assert_eq!(doc.bytes, vec![1, 2, 3]);
    }
}

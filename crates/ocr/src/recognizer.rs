use std::io::{self, Write};
use std::path::PathBuf;
use std::process::Command;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Image decode error: {0}")]
    ImageDecode(String),
    #[error("OCR engine error: {0}")]
    Engine(String),
    #[error("OCR engine not available: {0}")]
    NotAvailable(String),
}

/// Abstraction over an OCR backend.
/// Implementations accept PNG image bytes and return the recognized text.
pub trait OcrBackend: Send + Sync {
    fn recognize(&self, image_bytes: &[u8]) -> Result<String, OcrError>;

    /// Recognize an image of known resolution, such as a rasterized page.
    /// Backends that take no resolution hint ignore `dpi`.
    fn recognize_at_dpi(&self, image_bytes: &[u8], dpi: u32) -> Result<String, OcrError> {
        let _ = dpi;
        self.recognize(image_bytes)
    }
}

impl<B: OcrBackend + ?Sized> OcrBackend for Box<B> {
    fn recognize(&self, image_bytes: &[u8]) -> Result<String, OcrError> {
        (**self).recognize(image_bytes)
    }

    fn recognize_at_dpi(&self, image_bytes: &[u8], dpi: u32) -> Result<String, OcrError> {
        (**self).recognize_at_dpi(image_bytes, dpi)
    }
}

// ── Mock backend (always available, used for tests) ───────────────────────────

/// Returns a pre-set string, so the pipeline can be exercised without
/// Tesseract installed.
pub struct MockRecognizer {
    pub text: String,
}

impl MockRecognizer {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl OcrBackend for MockRecognizer {
    fn recognize(&self, _image_bytes: &[u8]) -> Result<String, OcrError> {
        Ok(self.text.clone())
    }
}

// ── Tesseract command-line backend ────────────────────────────────────────────

/// Runs the `tesseract` executable. Needs no native linking, only the binary
/// on `PATH` (or at the configured location).
#[derive(Debug, Clone)]
pub struct TesseractCli {
    bin: PathBuf,
    language: String,
    tessdata_dir: Option<PathBuf>,
}

impl TesseractCli {
    pub fn new(bin: impl Into<PathBuf>, language: &str) -> Self {
        Self { bin: bin.into(), language: language.to_string(), tessdata_dir: None }
    }

    pub fn with_tessdata_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.tessdata_dir = Some(dir.into());
        self
    }
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self::new("tesseract", "eng")
    }
}

impl TesseractCli {
    fn run(&self, image_bytes: &[u8], dpi: Option<u32>) -> Result<String, OcrError> {
        // Removed on drop, including on the error paths below.
        let mut input = tempfile::Builder::new()
            .prefix("imei-ocr-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| OcrError::Engine(format!("temp file: {e}")))?;
        input
            .write_all(image_bytes)
            .and_then(|_| input.flush())
            .map_err(|e| OcrError::Engine(format!("temp file: {e}")))?;

        let mut cmd = Command::new(&self.bin);
        cmd.arg(input.path()).arg("stdout").arg("-l").arg(&self.language);
        if let Some(dir) = &self.tessdata_dir {
            cmd.arg("--tessdata-dir").arg(dir);
        }
        if let Some(dpi) = dpi {
            cmd.arg("--dpi").arg(dpi.to_string());
        }

        let output = cmd.output().map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => OcrError::NotAvailable(self.bin.display().to_string()),
            _ => OcrError::Engine(e.to_string()),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Engine(format!("{}: {}", output.status, stderr.trim())));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl OcrBackend for TesseractCli {
    fn recognize(&self, image_bytes: &[u8]) -> Result<String, OcrError> {
        self.run(image_bytes, None)
    }

    fn recognize_at_dpi(&self, image_bytes: &[u8], dpi: u32) -> Result<String, OcrError> {
        self.run(image_bytes, Some(dpi))
    }
}

// ── Tesseract library backend (optional, gated behind `tesseract` feature) ────

#[cfg(feature = "tesseract")]
pub mod tesseract_backend {
    use super::{OcrBackend, OcrError};
    use leptess::LepTess;

    /// In-process libtesseract. A fresh engine per call keeps the backend
    /// `Sync` without locking.
    pub struct LeptessRecognizer {
        data_path: Option<String>,
        lang: String,
    }

    impl LeptessRecognizer {
        pub fn new(data_path: Option<String>, lang: &str) -> Self {
            Self { data_path, lang: lang.to_string() }
        }
    }

    impl LeptessRecognizer {
        fn run(&self, image_bytes: &[u8], dpi: Option<u32>) -> Result<String, OcrError> {
            let mut lt = LepTess::new(self.data_path.as_deref(), &self.lang)
                .map_err(|e| OcrError::NotAvailable(e.to_string()))?;
            lt.set_image_from_mem(image_bytes)
                .map_err(|e| OcrError::ImageDecode(e.to_string()))?;
            if let Some(dpi) = dpi {
                lt.set_source_resolution(dpi as i32);
            }
            lt.get_utf8_text().map_err(|e| OcrError::Engine(e.to_string()))
        }
    }

    impl OcrBackend for LeptessRecognizer {
        fn recognize(&self, image_bytes: &[u8]) -> Result<String, OcrError> {
            self.run(image_bytes, None)
        }

        fn recognize_at_dpi(&self, image_bytes: &[u8], dpi: u32) -> Result<String, OcrError> {
            self.run(image_bytes, Some(dpi))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_ignores_image_content() {
        let r = MockRecognizer::new("IMEI 490154203237518");
        assert_eq!(r.recognize(b"anything").unwrap(), "IMEI 490154203237518");
        assert_eq!(r.recognize(b"").unwrap(), "IMEI 490154203237518");
    }

    #[test]
    fn boxed_backend_delegates() {
        let r: Box<dyn OcrBackend> = Box::new(MockRecognizer::new("hello"));
        assert_eq!(r.recognize(b"").unwrap(), "hello");
    }

    #[test]
    fn missing_tesseract_binary_is_not_available() {
        let r = TesseractCli::new("/nonexistent/bin/tesseract", "eng");
        let err = r.recognize(b"\x89PNG").unwrap_err();
        assert!(matches!(err, OcrError::NotAvailable(_)), "{err}");
    }

    #[cfg(unix)]
    #[test]
    fn failing_tesseract_is_an_engine_error() {
        let r = TesseractCli::new("false", "eng");
        let err = r.recognize_at_dpi(b"\x89PNG", 300).unwrap_err();
        assert!(matches!(err, OcrError::Engine(_)), "{err}");
    }

    // `echo` stands in for tesseract and prints the arguments it was given.
    #[cfg(unix)]
    #[test]
    fn dpi_hint_is_passed_only_when_known() {
        let r = TesseractCli::new("echo", "eng").with_tessdata_dir("/opt/tessdata");
        let page = r.recognize_at_dpi(b"\x89PNG", 600).unwrap();
        assert!(page.contains("stdout -l eng --tessdata-dir /opt/tessdata --dpi 600"), "{page}");

        let photo = r.recognize(b"\x89PNG").unwrap();
        assert!(!photo.contains("--dpi"), "{photo}");
    }

    #[test]
    fn default_dpi_hint_falls_back_to_recognize() {
        let r = MockRecognizer::new("IMEI 490154203237518");
        assert_eq!(r.recognize_at_dpi(b"", 300).unwrap(), "IMEI 490154203237518");
        let boxed: Box<dyn OcrBackend> = Box::new(r);
        assert_eq!(boxed.recognize_at_dpi(b"", 72).unwrap(), "IMEI 490154203237518");
    }
}

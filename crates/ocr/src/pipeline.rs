use imei_core::{
    ExtractionMethod, ExtractionResult, ImeiReport, MediaKind, UnsupportedMediaType,
    UploadedDocument,
};
use imei_pdf::{LopdfTextLayer, PageRasterizer, Pdftoppm, RasterError, TextLayerExtractor};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::preprocess::{self, PreprocessError};
use crate::recognizer::{OcrBackend, OcrError};

/// Minimum non-whitespace characters for a PDF text layer to be used as-is.
pub const DEFAULT_MIN_TEXT_CHARS: usize = 10;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    UnsupportedMediaType(#[from] UnsupportedMediaType),
    #[error("Extraction failed: {0}")]
    ExtractionFailed(#[from] ExtractionFailure),
}

/// Why the OCR path failed. OCR is the last resort, so each of these ends
/// the request.
#[derive(Debug, Error)]
pub enum ExtractionFailure {
    #[error("PDF rasterization failed: {0}")]
    Raster(#[from] RasterError),
    #[error("Image preprocessing failed: {0}")]
    Preprocess(#[from] PreprocessError),
    #[error("OCR recognition failed: {0}")]
    Ocr(#[from] OcrError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub min_text_chars: usize,
    pub ocr_dpi: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { min_text_chars: DEFAULT_MIN_TEXT_CHARS, ocr_dpi: imei_pdf::DEFAULT_DPI }
    }
}

/// Which extractor produces the text for a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    UseTextLayer,
    Ocr,
}

/// Images always go to OCR. A PDF keeps its text layer when it carries at
/// least `min_text_chars` non-whitespace characters; a missing (failed)
/// text layer counts as empty.
pub fn decide(kind: MediaKind, text_layer: Option<&str>, min_text_chars: usize) -> Strategy {
    match (kind, text_layer) {
        (MediaKind::Pdf, Some(text)) if non_whitespace_chars(text) >= min_text_chars => {
            Strategy::UseTextLayer
        }
        _ => Strategy::Ocr,
    }
}

pub fn non_whitespace_chars(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}

/// Orchestrates: classify → text layer or OCR → scan → Luhn → report.
pub struct ImeiPipeline<R: OcrBackend, T = LopdfTextLayer, P = Pdftoppm> {
    recognizer: R,
    text_layer: T,
    rasterizer: P,
    config: PipelineConfig,
}

impl<R: OcrBackend> ImeiPipeline<R> {
    pub fn new(recognizer: R) -> Self {
        Self {
            recognizer,
            text_layer: LopdfTextLayer,
            rasterizer: Pdftoppm::default(),
            config: PipelineConfig::default(),
        }
    }
}

impl<R, T, P> ImeiPipeline<R, T, P>
where
    R: OcrBackend,
    T: TextLayerExtractor,
    P: PageRasterizer,
{
    pub fn with_text_layer<T2: TextLayerExtractor>(self, text_layer: T2) -> ImeiPipeline<R, T2, P> {
        ImeiPipeline {
            recognizer: self.recognizer,
            text_layer,
            rasterizer: self.rasterizer,
            config: self.config,
        }
    }

    pub fn with_rasterizer<P2: PageRasterizer>(self, rasterizer: P2) -> ImeiPipeline<R, T, P2> {
        ImeiPipeline {
            recognizer: self.recognizer,
            text_layer: self.text_layer,
            rasterizer,
            config: self.config,
        }
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Classify a raw upload, then process it.
    pub fn process_upload(
        &self,
        filename: &str,
        content_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<ImeiReport, ExtractError> {
        let doc = UploadedDocument::classify(filename, content_type, bytes)?;
        self.process_document(&doc)
    }

    pub fn process_document(&self, doc: &UploadedDocument) -> Result<ImeiReport, ExtractError> {
        let result = self.extract(doc)?;
        let report = ImeiReport::assemble(&doc.filename, &result);
        info!(
            method = %report.method_used,
            chars = report.num_chars_extracted,
            imeis_found = report.num_imeis_found,
            "Extraction complete"
        );
        Ok(report)
    }

    /// Run the selected extractor without scanning the result.
    pub fn extract(&self, doc: &UploadedDocument) -> Result<ExtractionResult, ExtractError> {
        let text_layer = match doc.kind {
            MediaKind::Pdf => match self.text_layer.extract(&doc.bytes) {
                Ok(text) => Some(text),
                Err(e) => {
                    warn!(error = %e, "Text layer extraction failed");
                    None
                }
            },
            MediaKind::Image => None,
        };

        let strategy = decide(doc.kind, text_layer.as_deref(), self.config.min_text_chars);
        if let (Strategy::UseTextLayer, Some(text)) = (strategy, text_layer.as_ref()) {
            return Ok(ExtractionResult::new(ExtractionMethod::TextLayer, text.clone()));
        }

        if doc.kind == MediaKind::Pdf {
            info!(
                chars = text_layer.as_deref().map(non_whitespace_chars).unwrap_or(0),
                threshold = self.config.min_text_chars,
                "Text layer insufficient, falling back to OCR"
            );
        }

        let text = match doc.kind {
            MediaKind::Pdf => self.ocr_pdf(&doc.bytes)?,
            MediaKind::Image => self.ocr_image(&doc.bytes)?,
        };
        Ok(ExtractionResult::new(ExtractionMethod::Ocr, text))
    }

    /// Pages are kept near their rendered resolution and recognized with that
    /// resolution as a hint.
    fn ocr_pdf(&self, pdf_bytes: &[u8]) -> Result<String, ExtractionFailure> {
        let dpi = self.config.ocr_dpi;
        let pages = self.rasterizer.rasterize(pdf_bytes, dpi)?;
        let mut parts = Vec::with_capacity(pages.len());
        for (i, page) in pages.iter().enumerate() {
            let prepared =
                preprocess::prepare_for_ocr_from_bytes(page, preprocess::page_side_limit(dpi))?;
            let page_dpi = prepared.effective_dpi(dpi);
            let text = self.recognizer.recognize_at_dpi(&prepared.png, page_dpi)?;
            debug!(page = i + 1, dpi = page_dpi, chars = text.chars().count(), "Page recognized");
            if !text.trim().is_empty() {
                parts.push(text);
            }
        }
        Ok(parts.join("\n").trim().to_string())
    }

    /// Photos are recognized without a resolution hint.
    fn ocr_image(&self, image_bytes: &[u8]) -> Result<String, ExtractionFailure> {
        let prepared = preprocess::prepare_for_ocr_from_bytes(image_bytes, preprocess::MAX_OCR_SIDE)?;
        Ok(self.recognizer.recognize(&prepared.png)?.trim().to_string())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

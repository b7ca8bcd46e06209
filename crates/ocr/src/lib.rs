pub mod pipeline;
pub mod preprocess;
pub mod recognizer;

pub use pipeline::{
    decide, ExtractError, ExtractionFailure, ImeiPipeline, PipelineConfig, Strategy,
    DEFAULT_MIN_TEXT_CHARS,
};
pub use preprocess::{prepare_for_ocr_from_bytes, PreparedImage, PreprocessError};
pub use recognizer::{MockRecognizer, OcrBackend, OcrError, TesseractCli};

#[cfg(feature = "tesseract")]
pub use recognizer::tesseract_backend::LeptessRecognizer;

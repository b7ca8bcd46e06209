pub mod config;
pub mod docs;
pub mod error;
pub mod logging;
pub mod routes;

use anyhow::Result;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use imei_ocr::{ImeiPipeline, OcrBackend, TesseractCli};
use imei_pdf::{LopdfTextLayer, PageRasterizer, Pdftoppm, TextLayerExtractor};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

use crate::config::{Config, OcrBackendKind};

/// Pipeline with every stage chosen at runtime from config.
pub type DynPipeline =
    ImeiPipeline<Box<dyn OcrBackend>, Box<dyn TextLayerExtractor>, Box<dyn PageRasterizer>>;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<DynPipeline>,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(pipeline: Arc<DynPipeline>, request_timeout: Duration) -> Self {
        Self { pipeline, request_timeout }
    }
}

pub fn build_pipeline(cfg: &Config) -> Result<DynPipeline> {
    let ocr: Box<dyn OcrBackend> = match cfg.ocr.backend {
        OcrBackendKind::Cli => {
            let mut cli = TesseractCli::new(&cfg.ocr.tesseract_bin, &cfg.ocr.language);
            if !cfg.ocr.tessdata_dir.is_empty() {
                cli = cli.with_tessdata_dir(&cfg.ocr.tessdata_dir);
            }
            Box::new(cli)
        }
        #[cfg(feature = "tesseract")]
        OcrBackendKind::Leptess => {
            let data_path = Some(cfg.ocr.tessdata_dir.clone()).filter(|d| !d.is_empty());
            Box::new(imei_ocr::LeptessRecognizer::new(data_path, &cfg.ocr.language))
        }
        #[cfg(not(feature = "tesseract"))]
        OcrBackendKind::Leptess => {
            anyhow::bail!("ocr.backend = \"leptess\" requires building with the `tesseract` feature")
        }
    };

    Ok(ImeiPipeline::new(ocr)
        .with_text_layer(Box::new(LopdfTextLayer) as Box<dyn TextLayerExtractor>)
        .with_rasterizer(Box::new(Pdftoppm::new(&cfg.ocr.pdftoppm_bin)) as Box<dyn PageRasterizer>)
        .with_config(cfg.pipeline()))
}

pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route(routes::EXTRACT_PATH, post(routes::extract_imei))
        .route("/health", get(|| async { "ok" }))
        .route(docs::OPENAPI_PATH, get(docs::openapi_json))
        .route(docs::DOCS_PATH, get(docs::docs_page))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

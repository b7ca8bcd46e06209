use anyhow::{Context, Result};
use imei_server::config::Config;
use imei_server::{build_pipeline, logging, router, AppState};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let (cfg, source) = Config::discover()?;
    let _log_guard = logging::init(&cfg.logging)?;

    match &source {
        Some(path) => tracing::info!("Loaded config from {}", path.display()),
        None => tracing::info!("No config file found, using defaults"),
    }

    let pipeline = build_pipeline(&cfg)?;
    tracing::info!(
        backend = ?cfg.ocr.backend,
        min_text_chars = cfg.extraction.min_text_chars,
        ocr_dpi = cfg.extraction.ocr_dpi,
        "Extraction pipeline ready"
    );

    let state = AppState::new(Arc::new(pipeline), cfg.server.request_timeout());
    let app = router(state, cfg.server.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(&cfg.server.bind)
        .await
        .with_context(|| format!("binding {}", cfg.server.bind))?;
    tracing::info!("IMEI extractor listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await
        .context("server error")?;

    Ok(())
}

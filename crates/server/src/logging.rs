use anyhow::{anyhow, Context, Result};
use std::fs::OpenOptions;
use std::path::Path;
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::{LogFileFormat, Logging};

const SERVICE_NAME: &str = "imei-extractor";

type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;

/// Install the process-wide subscriber: console plus an append-only log file.
///
/// Call once, before serving. The returned guard flushes the file writer on
/// drop and must live until shutdown.
pub fn init(cfg: &Logging) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.level));

    let console_layer = tracing_subscriber::fmt::layer().with_target(true).boxed();

    let (file_layer, guard) = match file_layer(cfg)? {
        Some((layer, guard)) => (Some(layer), Some(guard)),
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(JsonStorageLayer)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

/// Layer writing to `cfg.file` in append mode, creating missing directories.
/// `None` when `cfg.file` is empty.
fn file_layer<S>(cfg: &Logging) -> Result<Option<(BoxedLayer<S>, WorkerGuard)>>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    if cfg.file.is_empty() {
        return Ok(None);
    }

    let path = Path::new(&cfg.file);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create log directory: {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file: {}", path.display()))?;

    let (writer, guard) = tracing_appender::non_blocking(file);
    let layer = match cfg.file_format {
        LogFileFormat::Text => tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(true)
            .boxed(),
        LogFileFormat::Bunyan => BunyanFormattingLayer::new(SERVICE_NAME.into(), writer).boxed(),
    };
    Ok(Some((layer, guard)))
}

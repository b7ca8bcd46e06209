use anyhow::{bail, Context, Result};
use imei_ocr::PipelineConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_ENV: &str = "IMEI_EXTRACTOR_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "imei-extractor.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: Server,
    #[serde(default)]
    pub extraction: Extraction,
    #[serde(default)]
    pub ocr: Ocr,
    #[serde(default)]
    pub logging: Logging,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("loading config: {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(raw).context("parsing TOML")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// `$IMEI_EXTRACTOR_CONFIG`, else `./imei-extractor.toml` if present, else
    /// defaults. Returns the file actually read, if any.
    pub fn discover() -> Result<(Self, Option<PathBuf>)> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            let path = PathBuf::from(path);
            return Ok((Self::load(&path)?, Some(path)));
        }
        let local = PathBuf::from(DEFAULT_CONFIG_FILE);
        if local.is_file() {
            return Ok((Self::load(&local)?, Some(local)));
        }
        Ok((Self::default(), None))
    }

    pub fn validate(&self) -> Result<()> {
        if self.extraction.min_text_chars == 0 {
            bail!("extraction.min_text_chars must be at least 1");
        }
        if !(72..=1200).contains(&self.extraction.ocr_dpi) {
            bail!("extraction.ocr_dpi must be within 72..=1200, got {}", self.extraction.ocr_dpi);
        }
        if self.server.max_upload_bytes == 0 {
            bail!("server.max_upload_bytes must be positive");
        }
        if self.server.request_timeout_secs == 0 {
            bail!("server.request_timeout_secs must be positive");
        }
        if self.ocr.language.trim().is_empty() {
            bail!("ocr.language must not be empty");
        }
        Ok(())
    }

    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            min_text_chars: self.extraction.min_text_chars,
            ocr_dpi: self.extraction.ocr_dpi,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Server {
    pub bind: String,
    pub max_upload_bytes: usize,
    pub request_timeout_secs: u64,
}
impl Default for Server {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8010".into(),
            max_upload_bytes: 50 * 1024 * 1024,
            request_timeout_secs: 300,
        }
    }
}
impl Server {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Extraction {
    pub min_text_chars: usize,
    pub ocr_dpi: u32,
}
impl Default for Extraction {
    fn default() -> Self {
        let p = PipelineConfig::default();
        Self { min_text_chars: p.min_text_chars, ocr_dpi: p.ocr_dpi }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrBackendKind {
    Cli,
    Leptess,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Ocr {
    pub backend: OcrBackendKind,
    pub tesseract_bin: String,
    pub pdftoppm_bin: String,
    pub language: String,
    /// Empty means the engine's own default.
    pub tessdata_dir: String,
}
impl Default for Ocr {
    fn default() -> Self {
        Self {
            backend: OcrBackendKind::Cli,
            tesseract_bin: "tesseract".into(),
            pdftoppm_bin: "pdftoppm".into(),
            language: "eng".into(),
            tessdata_dir: "".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFileFormat {
    Text,
    Bunyan,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Logging {
    pub level: String,
    /// Append-only log file. Empty disables file logging.
    pub file: String,
    pub file_format: LogFileFormat,
}
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".into(),
            file: "imei_extractor.log".into(),
            file_format: LogFileFormat::Text,
        }
    }
}

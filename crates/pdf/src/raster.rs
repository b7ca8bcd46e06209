use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

pub const DEFAULT_DPI: u32 = 300;

#[derive(Debug, Error)]
pub enum RasterError {
    #[error("Rasterizer binary not found: {0}")]
    ToolMissing(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Rasterizer exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
    #[error("Rasterizer produced no pages")]
    NoPages,
}

/// Renders every page of a PDF to a PNG bitmap.
pub trait PageRasterizer: Send + Sync {
    /// One PNG per page, in page order.
    fn rasterize(&self, pdf_bytes: &[u8], dpi: u32) -> Result<Vec<Vec<u8>>, RasterError>;
}

impl<T: PageRasterizer + ?Sized> PageRasterizer for Box<T> {
    fn rasterize(&self, pdf_bytes: &[u8], dpi: u32) -> Result<Vec<Vec<u8>>, RasterError> {
        (**self).rasterize(pdf_bytes, dpi)
    }
}

/// Rasterizes through poppler's `pdftoppm`.
///
/// The PDF copy and the rendered pages live in a temporary directory that is
/// removed when the call returns, whatever the outcome.
#[derive(Debug, Clone)]
pub struct Pdftoppm {
    bin: PathBuf,
}

impl Pdftoppm {
    pub fn new(bin: impl Into<PathBuf>) -> Self {
        Self { bin: bin.into() }
    }
}

impl Default for Pdftoppm {
    fn default() -> Self {
        Self::new("pdftoppm")
    }
}

impl PageRasterizer for Pdftoppm {
    fn rasterize(&self, pdf_bytes: &[u8], dpi: u32) -> Result<Vec<Vec<u8>>, RasterError> {
        let dir = tempfile::Builder::new().prefix("imei-raster-").tempdir()?;
        let input = dir.path().join("input.pdf");
        std::fs::write(&input, pdf_bytes)?;
        let prefix = dir.path().join(PAGE_PREFIX);

        let output = Command::new(&self.bin)
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-png")
            .arg(&input)
            .arg(&prefix)
            .output()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => RasterError::ToolMissing(self.bin.display().to_string()),
                _ => RasterError::Io(e),
            })?;

        if !output.status.success() {
            return Err(RasterError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let pages = collect_pages(dir.path())?;
        if pages.is_empty() {
            return Err(RasterError::NoPages);
        }
        tracing::debug!(pages = pages.len(), dpi, "PDF rasterized");

        pages
            .into_iter()
            .map(|path| std::fs::read(path).map_err(RasterError::from))
            .collect()
    }
}

const PAGE_PREFIX: &str = "page";

/// Rendered page files sorted by page number. `pdftoppm` zero-pads the number
/// to the width of the page count, so lexical order is not enough.
fn collect_pages(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut pages: Vec<(u32, PathBuf)> = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if let Some(n) = path.file_name().and_then(|n| n.to_str()).and_then(page_number) {
            pages.push((n, path));
        }
    }
    pages.sort_by_key(|(n, _)| *n);
    Ok(pages.into_iter().map(|(_, p)| p).collect())
}

/// `page-07.png` → 7.
fn page_number(file_name: &str) -> Option<u32> {
    file_name
        .strip_prefix(PAGE_PREFIX)?
        .strip_prefix('-')?
        .strip_suffix(".png")?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_number_parses_padded_names() {
        assert_eq!(page_number("page-1.png"), Some(1));
        assert_eq!(page_number("page-007.png"), Some(7));
        assert_eq!(page_number("page-12.png"), Some(12));
        assert_eq!(page_number("input.pdf"), None);
        assert_eq!(page_number("page-x.png"), None);
        assert_eq!(page_number("page-3.ppm"), None);
    }

    #[test]
    fn collect_pages_orders_numerically() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["page-10.png", "page-2.png", "page-1.png", "input.pdf"] {
            std::fs::write(dir.path().join(name), name).unwrap();
        }
        let pages = collect_pages(dir.path()).unwrap();
        let names: Vec<_> = pages
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["page-1.png", "page-2.png", "page-10.png"]);
    }

    #[test]
    fn missing_binary_is_reported() {
        let r = Pdftoppm::new("/nonexistent/bin/pdftoppm");
        let err = r.rasterize(b"%PDF-1.5", DEFAULT_DPI).unwrap_err();
        assert!(matches!(err, RasterError::ToolMissing(_)), "{err}");
    }

    #[cfg(unix)]
    #[test]
    fn failing_binary_is_reported() {
        let r = Pdftoppm::new("false");
        let err = r.rasterize(b"%PDF-1.5", DEFAULT_DPI).unwrap_err();
        assert!(matches!(err, RasterError::Failed { .. }), "{err}");
    }

    #[cfg(unix)]
    #[test]
    fn silent_binary_yields_no_pages() {
        let r = Pdftoppm::new("true");
        let err = r.rasterize(b"%PDF-1.5", DEFAULT_DPI).unwrap_err();
        assert!(matches!(err, RasterError::NoPages), "{err}");
    }
}

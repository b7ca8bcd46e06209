use image::{DynamicImage, GrayImage};
use std::io::Cursor;
use thiserror::Error;

/// Longest side kept for uploaded photos, whose resolution is unknown.
pub const MAX_OCR_SIDE: u32 = 3600;

/// Longest page edge, in inches, a rasterized page keeps at full resolution.
/// Covers A3 and tabloid.
pub const MAX_PAGE_INCHES: u32 = 17;

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("Failed to load image: {0}")]
    Load(#[from] image::ImageError),
    #[error("Failed to encode processed image: {0}")]
    Encode(String),
}

/// Grayscale PNG ready for recognition.
#[derive(Debug, Clone)]
pub struct PreparedImage {
    pub png: Vec<u8>,
    /// Output width over input width; 1.0 unless the input was downscaled.
    pub scale: f64,
}

impl PreparedImage {
    /// Resolution of the prepared image, given the resolution of its source.
    pub fn effective_dpi(&self, source_dpi: u32) -> u32 {
        ((source_dpi as f64 * self.scale).round() as u32).max(1)
    }
}

/// Side limit for a page rendered at `dpi`, so that pages up to
/// [`MAX_PAGE_INCHES`] are never shrunk.
pub fn page_side_limit(dpi: u32) -> u32 {
    dpi.saturating_mul(MAX_PAGE_INCHES)
}

/// Decode image bytes (PNG / JPEG / TIFF / …), shrink anything whose longest
/// side exceeds `max_side`, and return normalized PNG bytes.
pub fn prepare_for_ocr_from_bytes(
    data: &[u8],
    max_side: u32,
) -> Result<PreparedImage, PreprocessError> {
    let img = image::load_from_memory(data)?;
    let source_width = img.width().max(1);
    let normalized = normalize(img, max_side);
    let scale = normalized.width() as f64 / source_width as f64;
    Ok(PreparedImage { png: encode_as_png(normalized)?, scale })
}

fn normalize(img: DynamicImage, max_side: u32) -> DynamicImage {
    let img = if img.width().max(img.height()) > max_side {
        img.resize(max_side, max_side, image::imageops::FilterType::Lanczos3)
    } else {
        img
    };

    let mut gray = img.to_luma8();
    if let Some(table) = stretch_table(&gray) {
        for p in gray.pixels_mut() {
            p[0] = table[p[0] as usize];
        }
    }
    DynamicImage::ImageLuma8(gray)
}

/// Lookup table sending the darkest level present to 0 and the lightest to
/// 255. `None` for a flat image.
fn stretch_table(gray: &GrayImage) -> Option<[u8; 256]> {
    let mut present = [false; 256];
    for p in gray.pixels() {
        present[p[0] as usize] = true;
    }
    let lo = present.iter().position(|&seen| seen)?;
    let hi = present.iter().rposition(|&seen| seen)?;
    if lo == hi {
        return None;
    }

    let mut table = [0u8; 256];
    for (level, out) in table.iter_mut().enumerate().skip(lo) {
        *out = ((level.min(hi) - lo) * 255 / (hi - lo)) as u8;
    }
    Some(table)
}

fn encode_as_png(img: DynamicImage) -> Result<Vec<u8>, PreprocessError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| PreprocessError::Encode(e.to_string()))?;
    Ok(buf)
}

pub mod raster;
pub mod text;

pub use raster::{PageRasterizer, Pdftoppm, RasterError, DEFAULT_DPI};
pub use text::{LopdfTextLayer, PdfTextError, TextLayerExtractor};

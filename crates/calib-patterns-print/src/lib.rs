//! Rendering and export of calibration pattern layouts.
//!
//! - [`render_svg`]: vector output, one SVG element per drawn primitive.
//! - [`rasterize`] / [`rasterize_to_fit`]: anti-aliased grayscale images.
//! - [`export`]: pick the format from the file extension and write the file.
//!
//! ```no_run
//! use calib_patterns_core::{generate, PatternKind, PatternSpec};
//! use calib_patterns_print::{export, RasterOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let layout = generate(&PatternSpec::new(PatternKind::Circles, 11, 8, 20.0))?;
//! export(&layout, "circles.png", &RasterOptions::default())?;
//! # Ok(())
//! # }
//! ```

mod export;
mod raster;
mod svg;

use std::path::PathBuf;

pub use export::{encode, export, ExportFormat};
pub use raster::{rasterize, rasterize_to_fit, RasterOptions, MAX_CANVAS_PIXELS};
pub use svg::render_svg;

/// Errors produced while rendering or writing a layout.
#[derive(thiserror::Error, Debug)]
pub enum ExportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported output format `{0}` (expected svg, png, jpg, bmp or tiff)")]
    UnsupportedFormat(String),
    #[error("failed to encode {format} image: {source}")]
    Encode {
        format: ExportFormat,
        #[source]
        source: image::ImageError,
    },
    #[error("invalid raster options: {0}")]
    InvalidRasterOptions(String),
    #[error("raster canvas {width}x{height} (x{supersample} supersampling) exceeds {max} pixels")]
    ImageTooLarge {
        width: u32,
        height: u32,
        supersample: u32,
        max: u64,
    },
}

//! Writing layouts to disk.

use std::fmt;
use std::io::Cursor;
use std::path::Path;

use calib_patterns_core::PatternLayout;
use image::ImageFormat;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::raster::{rasterize, RasterOptions};
use crate::svg::render_svg;
use crate::ExportError;

/// Output file format, picked from the file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Svg,
    Png,
    Jpeg,
    Bmp,
    Tiff,
}

impl ExportFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "svg" => Some(ExportFormat::Svg),
            "png" => Some(ExportFormat::Png),
            "jpg" | "jpeg" => Some(ExportFormat::Jpeg),
            "bmp" => Some(ExportFormat::Bmp),
            "tif" | "tiff" => Some(ExportFormat::Tiff),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, ExportError> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::from_extension(&ext).ok_or(ExportError::UnsupportedFormat(ext))
    }

    fn image_format(self) -> Option<ImageFormat> {
        match self {
            ExportFormat::Svg => None,
            ExportFormat::Png => Some(ImageFormat::Png),
            ExportFormat::Jpeg => Some(ImageFormat::Jpeg),
            ExportFormat::Bmp => Some(ImageFormat::Bmp),
            ExportFormat::Tiff => Some(ImageFormat::Tiff),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExportFormat::Svg => "svg",
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpeg",
            ExportFormat::Bmp => "bmp",
            ExportFormat::Tiff => "tiff",
        })
    }
}

/// Encode a layout in `format` without touching the filesystem.
pub fn encode(
    layout: &PatternLayout,
    format: ExportFormat,
    options: &RasterOptions,
) -> Result<Vec<u8>, ExportError> {
    let Some(image_format) = format.image_format() else {
        return Ok(render_svg(layout).into_bytes());
    };
    let img = rasterize(layout, options)?;
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image_format)
        .map_err(|source| ExportError::Encode { format, source })?;
    Ok(buf.into_inner())
}

/// Render `layout` into the format implied by `path` and write it once.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(layout, options), fields(path = %path.as_ref().display()))
)]
pub fn export(
    layout: &PatternLayout,
    path: impl AsRef<Path>,
    options: &RasterOptions,
) -> Result<ExportFormat, ExportError> {
    let path = path.as_ref();
    let format = ExportFormat::from_path(path)?;
    let bytes = encode(layout, format, options)?;
    std::fs::write(path, &bytes).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!(
        "wrote {} {} ({} bytes) to {}",
        layout.kind,
        format,
        bytes.len(),
        path.display()
    );
    Ok(format)
}

//! Software rasterizer for pattern layouts.
//!
//! Shapes are painted in layout order onto a white supersampled canvas,
//! then box-filtered down to the output resolution. Coverage is decided at
//! sub-pixel centres with half-open edges, so adjacent cells never overlap.

use calib_patterns_core::{Bounds, CornerStyle, Fill, PatternLayout, ShapePrimitive};
use image::GrayImage;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::ExportError;

/// Upper bound on supersampled canvas pixels.
pub const MAX_CANVAS_PIXELS: u64 = 400_000_000;

fn default_dpi() -> f64 {
    300.0
}

fn default_supersample() -> u32 {
    4
}

/// Raster output settings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RasterOptions {
    /// Output resolution; ignored for `px` layouts.
    #[serde(default = "default_dpi")]
    pub dpi: f64,
    /// Sub-samples per pixel along each axis (1 = no anti-aliasing).
    #[serde(default = "default_supersample")]
    pub supersample: u32,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            dpi: default_dpi(),
            supersample: default_supersample(),
        }
    }
}

impl RasterOptions {
    pub fn validate(&self) -> Result<(), ExportError> {
        if !self.dpi.is_finite() || self.dpi <= 0.0 {
            return Err(ExportError::InvalidRasterOptions(format!(
                "dpi must be finite and > 0 (got {})",
                self.dpi
            )));
        }
        if self.supersample == 0 || self.supersample > 16 {
            return Err(ExportError::InvalidRasterOptions(format!(
                "supersample must be in 1..=16 (got {})",
                self.supersample
            )));
        }
        Ok(())
    }
}

/// Rasterize a layout at `options.dpi` into an 8-bit grayscale image.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(layout), fields(primitives = layout.primitives.len()))
)]
pub fn rasterize(layout: &PatternLayout, options: &RasterOptions) -> Result<GrayImage, ExportError> {
    options.validate()?;
    let px_per_unit = layout.units.pixels_per_unit(options.dpi);
    let width = pixel_extent(layout.width * px_per_unit);
    let height = pixel_extent(layout.height * px_per_unit);
    rasterize_scaled(layout, width, height, px_per_unit, options.supersample)
}

/// Rasterize a layout scaled to fit into `max_width × max_height` pixels,
/// preserving its aspect ratio. Used for previews.
pub fn rasterize_to_fit(
    layout: &PatternLayout,
    max_width: u32,
    max_height: u32,
    supersample: u32,
) -> Result<GrayImage, ExportError> {
    if max_width == 0 || max_height == 0 {
        return Err(ExportError::InvalidRasterOptions(format!(
            "preview box must be non-empty (got {max_width}x{max_height})"
        )));
    }
    let options = RasterOptions {
        supersample,
        ..RasterOptions::default()
    };
    options.validate()?;
    let px_per_unit = (max_width as f64 / layout.width).min(max_height as f64 / layout.height);
    let width = ((layout.width * px_per_unit).round() as u32).clamp(1, max_width);
    let height = ((layout.height * px_per_unit).round() as u32).clamp(1, max_height);
    rasterize_scaled(layout, width, height, px_per_unit, supersample)
}

/// Round a page side to whole pixels, clamped to `1..=u32::MAX`.
fn pixel_extent(px: f64) -> u32 {
    px.round().clamp(1.0, u32::MAX as f64) as u32
}

fn rasterize_scaled(
    layout: &PatternLayout,
    width: u32,
    height: u32,
    px_per_unit: f64,
    supersample: u32,
) -> Result<GrayImage, ExportError> {
    let ss = supersample as u64;
    let canvas_pixels = (width as u64)
        .checked_mul(height as u64)
        .and_then(|p| p.checked_mul(ss * ss));
    if canvas_pixels.is_none_or(|p| p > MAX_CANVAS_PIXELS) {
        return Err(ExportError::ImageTooLarge {
            width,
            height,
            supersample,
            max: MAX_CANVAS_PIXELS,
        });
    }

    let mut canvas = Canvas::new(
        width as usize * supersample as usize,
        height as usize * supersample as usize,
        px_per_unit * supersample as f64,
    );
    for primitive in &layout.primitives {
        canvas.paint(primitive);
    }
    log::debug!(
        "rasterized {} primitives into {}x{} px (x{} supersampling)",
        layout.primitives.len(),
        width,
        height,
        supersample
    );
    Ok(canvas.downsample(width, height, supersample as usize))
}

fn value(fill: Fill) -> u8 {
    match fill {
        Fill::Black => 0,
        Fill::White => 255,
    }
}

#[inline]
fn in_rect(x: f64, y: f64, origin: Point2<f64>, w: f64, h: f64) -> bool {
    x >= origin.x && x < origin.x + w && y >= origin.y && y < origin.y + h
}

struct Canvas {
    width: usize,
    height: usize,
    /// Canvas pixels per layout unit.
    scale: f64,
    data: Vec<u8>,
}

impl Canvas {
    fn new(width: usize, height: usize, scale: f64) -> Self {
        Self {
            width,
            height,
            scale,
            data: vec![255; width * height],
        }
    }

    /// Set every pixel of `bounds` whose centre satisfies `inside`.
    fn fill(&mut self, bounds: Bounds, value: u8, inside: impl Fn(f64, f64) -> bool) {
        let span = |lo: f64, hi: f64, limit: usize| {
            let a = (lo * self.scale).floor().max(0.0) as usize;
            let b = ((hi * self.scale).ceil().max(0.0) as usize).min(limit);
            a..b
        };
        let xs = span(bounds.min.x, bounds.max.x, self.width);
        let ys = span(bounds.min.y, bounds.max.y, self.height);
        for py in ys {
            let y = (py as f64 + 0.5) / self.scale;
            let row = py * self.width;
            for px in xs.clone() {
                let x = (px as f64 + 0.5) / self.scale;
                if inside(x, y) {
                    self.data[row + px] = value;
                }
            }
        }
    }

    fn paint(&mut self, primitive: &ShapePrimitive) {
        let bounds = primitive.bounds();
        match *primitive {
            ShapePrimitive::Circle {
                center,
                radius,
                fill,
            } => {
                let r2 = radius * radius;
                self.fill(bounds, value(fill), |x, y| {
                    let (dx, dy) = (x - center.x, y - center.y);
                    dx * dx + dy * dy <= r2
                });
            }
            ShapePrimitive::Rect {
                origin,
                width,
                height,
                fill,
            } => {
                self.fill(bounds, value(fill), |x, y| in_rect(x, y, origin, width, height));
            }
            ShapePrimitive::RoundedSquare {
                origin,
                size,
                corners,
                fill,
            } => {
                // with radius size/2 every round corner is centred on the square centre
                let rad = size / 2.0;
                let c = Point2::new(origin.x + rad, origin.y + rad);
                self.fill(bounds, value(fill), |x, y| {
                    if !in_rect(x, y, origin, size, size) {
                        return false;
                    }
                    let quadrant = match (x >= c.x, y >= c.y) {
                        (false, false) => 0,
                        (true, false) => 1,
                        (true, true) => 2,
                        (false, true) => 3,
                    };
                    match corners[quadrant] {
                        CornerStyle::Right => true,
                        CornerStyle::Round => {
                            let (dx, dy) = (x - c.x, y - c.y);
                            dx * dx + dy * dy <= rad * rad
                        }
                    }
                });
            }
            ShapePrimitive::Marker {
                marker_side,
                ref bits,
                ..
            } => {
                let Some(marker) = primitive.marker_origin() else {
                    return;
                };
                let marker_bounds = Bounds {
                    min: marker,
                    max: Point2::new(marker.x + marker_side, marker.y + marker_side),
                };
                let module = marker_side / bits.side() as f64;
                self.fill(marker_bounds, value(Fill::Black), |x, y| {
                    in_rect(x, y, marker, marker_side, marker_side)
                });
                self.fill(marker_bounds, value(Fill::White), |x, y| {
                    if !in_rect(x, y, marker, marker_side, marker_side) {
                        return false;
                    }
                    let mx = ((x - marker.x) / module) as usize;
                    let my = ((y - marker.y) / module) as usize;
                    bits.is_white(mx, my)
                });
            }
        }
    }

    fn downsample(&self, width: u32, height: u32, ss: usize) -> GrayImage {
        if ss == 1 {
            return GrayImage::from_fn(width, height, |x, y| {
                image::Luma([self.data[y as usize * self.width + x as usize]])
            });
        }
        let area = (ss * ss) as u32;
        GrayImage::from_fn(width, height, |x, y| {
            let (x0, y0) = (x as usize * ss, y as usize * ss);
            let mut sum = 0u32;
            for sy in y0..y0 + ss {
                let row = &self.data[sy * self.width + x0..sy * self.width + x0 + ss];
                sum += row.iter().map(|&v| v as u32).sum::<u32>();
            }
            image::Luma([((sum + area / 2) / area) as u8])
        })
    }
}

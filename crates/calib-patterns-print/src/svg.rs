//! SVG serialization.

use std::fmt::Write;

use calib_patterns_core::{CornerStyle, Fill, PatternLayout, ShapePrimitive};
use nalgebra::Point2;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// White module outline relative to the cell size; hides hairline seams
/// between adjacent modules in viewers that anti-alias each rect.
const MODULE_STROKE_REL: f64 = 0.01;

/// Serialize a layout into a standalone SVG 1.1 document.
///
/// The page is sized in the layout's units with a matching `viewBox`, so
/// every coordinate is written unscaled. White checkerboard cells are not
/// emitted: the page itself is white.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(layout), fields(primitives = layout.primitives.len()))
)]
pub fn render_svg(layout: &PatternLayout) -> String {
    let mut out = String::with_capacity(128 + 96 * layout.primitives.len());
    let unit = layout.units.suffix();
    let _ = writeln!(out, r#"<?xml version="1.0" encoding="utf-8" ?>"#);
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" version="1.1" width="{w}{unit}" height="{h}{unit}" viewBox="0 0 {w} {h}">"#,
        w = num(layout.width),
        h = num(layout.height),
    );
    let _ = writeln!(out, "<g>");
    for primitive in &layout.primitives {
        write_primitive(&mut out, primitive);
    }
    let _ = writeln!(out, "</g>");
    let _ = writeln!(out, "</svg>");
    out
}

fn color(fill: Fill) -> &'static str {
    match fill {
        Fill::Black => "black",
        Fill::White => "white",
    }
}

fn write_primitive(out: &mut String, primitive: &ShapePrimitive) {
    match primitive {
        ShapePrimitive::Circle {
            center,
            radius,
            fill,
        } => {
            let _ = writeln!(
                out,
                r#"<circle cx="{}" cy="{}" r="{}" fill="{}" stroke="none" />"#,
                num(center.x),
                num(center.y),
                num(*radius),
                color(*fill)
            );
        }
        ShapePrimitive::Rect {
            origin,
            width,
            height,
            fill,
        } => {
            if *fill == Fill::White {
                return;
            }
            write_rect(out, *origin, *width, *height, *fill, None);
        }
        ShapePrimitive::RoundedSquare {
            origin,
            size,
            corners,
            fill,
        } => {
            if *fill == Fill::White {
                return;
            }
            let _ = writeln!(
                out,
                r#"<path d="{}" fill="{}" stroke="none" />"#,
                rounded_square_path(*origin, *size, corners),
                color(*fill)
            );
        }
        ShapePrimitive::Marker {
            cell_size,
            marker_side,
            bits,
            ..
        } => {
            let Some(marker) = primitive.marker_origin() else {
                return;
            };
            write_rect(out, marker, *marker_side, *marker_side, Fill::Black, None);
            let module = marker_side / bits.side() as f64;
            let stroke = Some(cell_size * MODULE_STROKE_REL);
            for (mx, my) in bits.white_modules() {
                let at = Point2::new(
                    marker.x + mx as f64 * module,
                    marker.y + my as f64 * module,
                );
                write_rect(out, at, module, module, Fill::White, stroke);
            }
        }
    }
}

fn write_rect(
    out: &mut String,
    origin: Point2<f64>,
    width: f64,
    height: f64,
    fill: Fill,
    stroke_width: Option<f64>,
) {
    let c = color(fill);
    let stroke = match stroke_width {
        Some(w) => format!(r#"stroke="{c}" stroke-width="{}""#, num(w)),
        None => r#"stroke="none""#.to_string(),
    };
    let _ = writeln!(
        out,
        r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{c}" {stroke} />"#,
        num(origin.x),
        num(origin.y),
        num(width),
        num(height),
    );
}

/// Path of a square with per-corner style, traced clockwise from the
/// left-edge midpoint. Round corners are quarter arcs of radius `size / 2`.
pub(crate) fn rounded_square_path(origin: Point2<f64>, size: f64, corners: &[CornerStyle; 4]) -> String {
    let rad = size / 2.0;
    let (x, y) = (origin.x, origin.y);
    // [top-left, top-right, bottom-right, bottom-left]
    let corner_pts = [(0.0, 0.0), (size, 0.0), (size, size), (0.0, size)];
    // midpoint of the edge that follows each corner
    let next_mid = [(rad, 0.0), (size, rad), (rad, size), (0.0, rad)];

    let mut d = format!("M{},{}", num(x), num(y + rad));
    for (i, style) in corners.iter().enumerate() {
        let (mx, my) = next_mid[i];
        match style {
            CornerStyle::Right => {
                let (cx, cy) = corner_pts[i];
                let _ = write!(d, " L{},{}", num(x + cx), num(y + cy));
                let _ = write!(d, " L{},{}", num(x + mx), num(y + my));
            }
            CornerStyle::Round => {
                let _ = write!(
                    d,
                    " A{r},{r} 0 0 1 {},{}",
                    num(x + mx),
                    num(y + my),
                    r = num(rad)
                );
            }
        }
    }
    d.push_str(" Z");
    d
}

/// Compact fixed-precision number: at most 4 decimals, no trailing zeros.
pub(crate) fn num(v: f64) -> String {
    let s = format!("{v:.4}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

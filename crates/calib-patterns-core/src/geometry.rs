//! Shape primitives and the pattern generator.
//!
//! The generator is a pure function of the [`PatternSpec`]: the same spec
//! always yields the same primitive sequence. Primitives are emitted in
//! row-major order (`y` outer, `x` inner); radon orientation dots follow the
//! cells in the order they were requested.

use calib_patterns_aruco::MarkerBits;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::charuco::{is_black_square, CharucoLayout};
use crate::page::{PageSize, Units};
use crate::spec::{PatternKind, PatternSpec};
use crate::PatternError;

/// Radon orientation dot radius relative to the square size.
const RADON_DOT_RADIUS_REL: f64 = 0.17;
/// Minimum ChArUco cell border, in marker modules, before a warning is logged.
const MIN_MARKER_BORDER_MODULES: f64 = 0.7;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fill {
    Black,
    White,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CornerStyle {
    Right,
    /// Quarter circle of radius `size / 2`.
    Round,
}

/// Axis-aligned bounding box `[min, max]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min: Point2<f64>,
    pub max: Point2<f64>,
}

/// One drawable unit of a pattern.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ShapePrimitive {
    Circle {
        center: Point2<f64>,
        radius: f64,
        fill: Fill,
    },
    Rect {
        origin: Point2<f64>,
        width: f64,
        height: f64,
        fill: Fill,
    },
    /// Square with per-corner style, corners clockwise from top-left.
    RoundedSquare {
        origin: Point2<f64>,
        size: f64,
        corners: [CornerStyle; 4],
        fill: Fill,
    },
    /// White ChArUco cell carrying marker `id`, centred in the cell.
    Marker {
        id: u32,
        /// Top-left corner of the cell.
        origin: Point2<f64>,
        cell_size: f64,
        /// Printed marker side, border ring included.
        marker_side: f64,
        bits: MarkerBits,
    },
}

impl ShapePrimitive {
    pub fn bounds(&self) -> Bounds {
        match self {
            ShapePrimitive::Circle { center, radius, .. } => Bounds {
                min: Point2::new(center.x - radius, center.y - radius),
                max: Point2::new(center.x + radius, center.y + radius),
            },
            ShapePrimitive::Rect {
                origin,
                width,
                height,
                ..
            } => Bounds {
                min: *origin,
                max: Point2::new(origin.x + width, origin.y + height),
            },
            ShapePrimitive::RoundedSquare { origin, size, .. } => Bounds {
                min: *origin,
                max: Point2::new(origin.x + size, origin.y + size),
            },
            ShapePrimitive::Marker {
                origin, cell_size, ..
            } => Bounds {
                min: *origin,
                max: Point2::new(origin.x + cell_size, origin.y + cell_size),
            },
        }
    }

    /// Top-left corner of the printed marker of a `Marker` primitive.
    pub fn marker_origin(&self) -> Option<Point2<f64>> {
        match self {
            ShapePrimitive::Marker {
                origin,
                cell_size,
                marker_side,
                ..
            } => {
                let border = (cell_size - marker_side) / 2.0;
                Some(Point2::new(origin.x + border, origin.y + border))
            }
            _ => None,
        }
    }
}

/// Generator output: the page and everything drawn on it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PatternLayout {
    pub kind: PatternKind,
    pub units: Units,
    pub width: f64,
    pub height: f64,
    pub square_size: f64,
    pub primitives: Vec<ShapePrimitive>,
}

impl PatternLayout {
    /// Union of all primitive bounds, `None` for an empty layout.
    pub fn content_bounds(&self) -> Option<Bounds> {
        self.primitives
            .iter()
            .map(ShapePrimitive::bounds)
            .reduce(|a, b| Bounds {
                min: Point2::new(a.min.x.min(b.min.x), a.min.y.min(b.min.y)),
                max: Point2::new(a.max.x.max(b.max.x), a.max.y.max(b.max.y)),
            })
    }

    /// Number of `Marker` primitives.
    pub fn marker_count(&self) -> usize {
        self.primitives
            .iter()
            .filter(|p| matches!(p, ShapePrimitive::Marker { .. }))
            .count()
    }
}

/// Expected number of primitives for a valid spec.
pub fn expected_primitive_count(spec: &PatternSpec) -> usize {
    let cells = spec.rows as usize * spec.cols as usize;
    match spec.kind {
        PatternKind::RadonCheckerboard => cells + spec.markers.len(),
        _ => cells,
    }
}

/// `[width, height]` of the pattern itself, without page or margin.
pub fn pattern_extent(spec: &PatternSpec) -> [f64; 2] {
    let s = spec.square_size;
    let cols = spec.cols as f64;
    let rows = spec.rows as f64;
    let r = s / spec.radius_rate;
    match spec.kind {
        PatternKind::Circles => [(cols - 1.0) * s + 2.0 * r, (rows - 1.0) * s + 2.0 * r],
        PatternKind::AsymmetricCircles => {
            // odd rows are shifted right by one spacing
            let shift = if spec.rows > 1 { s } else { 0.0 };
            [
                (cols - 1.0) * 2.0 * s + shift + 2.0 * r,
                (rows - 1.0) * s + 2.0 * r,
            ]
        }
        PatternKind::Checkerboard | PatternKind::RadonCheckerboard | PatternKind::Charuco => {
            [cols * s, rows * s]
        }
    }
}

/// Validate `spec` and compute its layout.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(spec), fields(kind = %spec.kind, rows = spec.rows, cols = spec.cols))
)]
pub fn generate(spec: &PatternSpec) -> Result<PatternLayout, PatternError> {
    spec.validate()?;

    let extent = pattern_extent(spec);
    let page = spec.page.resolve(spec.units, extent, spec.margin);
    check_page_fit(spec, extent, page);
    if !spec.markers.is_empty() && spec.kind != PatternKind::RadonCheckerboard {
        log::warn!(
            "{} marker cell(s) ignored: orientation dots only apply to radon_checkerboard",
            spec.markers.len()
        );
    }

    let offset = Point2::new(
        (page.width - extent[0]) / 2.0,
        (page.height - extent[1]) / 2.0,
    );
    let mut primitives = Vec::with_capacity(expected_primitive_count(spec));
    match spec.kind {
        PatternKind::Circles => circles(spec, offset, false, &mut primitives),
        PatternKind::AsymmetricCircles => circles(spec, offset, true, &mut primitives),
        PatternKind::Checkerboard => checkerboard(spec, offset, &mut primitives),
        PatternKind::RadonCheckerboard => radon_checkerboard(spec, offset, &mut primitives),
        PatternKind::Charuco => charuco(spec, offset, &mut primitives)?,
    }

    log::debug!(
        "{} pattern {}x{}: {} primitives on a {:.2}x{:.2} {} page",
        spec.kind,
        spec.cols,
        spec.rows,
        primitives.len(),
        page.width,
        page.height,
        spec.units
    );

    Ok(PatternLayout {
        kind: spec.kind,
        units: spec.units,
        width: page.width,
        height: page.height,
        square_size: spec.square_size,
        primitives,
    })
}

fn check_page_fit(spec: &PatternSpec, extent: [f64; 2], page: PageSize) {
    let slack_x = (page.width - extent[0]) / 2.0;
    let slack_y = (page.height - extent[1]) / 2.0;
    if slack_x < 0.0 || slack_y < 0.0 {
        log::warn!(
            "pattern ({:.2}x{:.2} {u}) does not fit on the {:.2}x{:.2} {u} page",
            extent[0],
            extent[1],
            page.width,
            page.height,
            u = spec.units
        );
    } else if slack_x < spec.margin || slack_y < spec.margin {
        log::warn!(
            "pattern leaves {:.2} {u} of clearance, less than the requested margin {:.2} {u}",
            slack_x.min(slack_y),
            spec.margin,
            u = spec.units
        );
    }
}

#[inline]
fn cell_origin(offset: Point2<f64>, s: f64, x: u32, y: u32) -> Point2<f64> {
    Point2::new(offset.x + x as f64 * s, offset.y + y as f64 * s)
}

fn circles(spec: &PatternSpec, offset: Point2<f64>, asymmetric: bool, out: &mut Vec<ShapePrimitive>) {
    let s = spec.square_size;
    let r = s / spec.radius_rate;
    for y in 0..spec.rows {
        for x in 0..spec.cols {
            let cx = if asymmetric {
                2.0 * x as f64 * s + (y % 2) as f64 * s
            } else {
                x as f64 * s
            };
            out.push(ShapePrimitive::Circle {
                center: Point2::new(cx + offset.x + r, y as f64 * s + offset.y + r),
                radius: r,
                fill: Fill::Black,
            });
        }
    }
}

fn square_fill(x: u32, y: u32) -> Fill {
    if is_black_square(x, y) {
        Fill::Black
    } else {
        Fill::White
    }
}

fn checkerboard(spec: &PatternSpec, offset: Point2<f64>, out: &mut Vec<ShapePrimitive>) {
    let s = spec.square_size;
    for y in 0..spec.rows {
        for x in 0..spec.cols {
            out.push(ShapePrimitive::Rect {
                origin: cell_origin(offset, s, x, y),
                width: s,
                height: s,
                fill: square_fill(x, y),
            });
        }
    }
}

/// Corner styles of cell `(x, y)`: corners touching the board border are round.
fn border_corners(spec: &PatternSpec, x: u32, y: u32) -> Option<[CornerStyle; 4]> {
    let mut corners = [CornerStyle::Right; 4];
    let mut on_border = false;
    // corners: [top-left, top-right, bottom-right, bottom-left]
    let mut round = |idx: [usize; 2]| {
        corners[idx[0]] = CornerStyle::Round;
        corners[idx[1]] = CornerStyle::Round;
        on_border = true;
    };
    if x == 0 {
        round([0, 3]);
    }
    if y == 0 {
        round([0, 1]);
    }
    if x + 1 == spec.cols {
        round([1, 2]);
    }
    if y + 1 == spec.rows {
        round([2, 3]);
    }
    on_border.then_some(corners)
}

fn radon_checkerboard(spec: &PatternSpec, offset: Point2<f64>, out: &mut Vec<ShapePrimitive>) {
    let s = spec.square_size;
    for y in 0..spec.rows {
        for x in 0..spec.cols {
            let origin = cell_origin(offset, s, x, y);
            let fill = square_fill(x, y);
            let corners = match fill {
                Fill::Black => border_corners(spec, x, y),
                Fill::White => None,
            };
            out.push(match corners {
                Some(corners) => ShapePrimitive::RoundedSquare {
                    origin,
                    size: s,
                    corners,
                    fill,
                },
                None => ShapePrimitive::Rect {
                    origin,
                    width: s,
                    height: s,
                    fill,
                },
            });
        }
    }

    let r = s * RADON_DOT_RADIUS_REL;
    for &[x, y] in &spec.markers {
        let origin = cell_origin(offset, s, x, y);
        // contrast with the cell underneath
        let fill = match square_fill(x, y) {
            Fill::Black => Fill::White,
            Fill::White => Fill::Black,
        };
        out.push(ShapePrimitive::Circle {
            center: Point2::new(origin.x + s / 2.0, origin.y + s / 2.0),
            radius: r,
            fill,
        });
    }
}

fn charuco(
    spec: &PatternSpec,
    offset: Point2<f64>,
    out: &mut Vec<ShapePrimitive>,
) -> Result<(), PatternError> {
    let params = spec
        .charuco
        .as_ref()
        .ok_or(PatternError::MissingCharucoParams)?;
    let s = spec.square_size;
    let dict = &params.dictionary;

    let module = params.marker_size / (dict.marker_size + 2) as f64;
    let border = (s - params.marker_size) / 2.0;
    if border < module * MIN_MARKER_BORDER_MODULES {
        log::warn!(
            "marker border {border:.3} {u} is less than {:.0}% of the marker module size {module:.3} {u}",
            MIN_MARKER_BORDER_MODULES * 100.0,
            u = spec.units
        );
    }

    let layout = CharucoLayout::new(spec.rows, spec.cols);
    let available = dict.len();
    for y in 0..spec.rows {
        for x in 0..spec.cols {
            let origin = cell_origin(offset, s, x, y);
            let primitive = match layout.marker_id_at(x, y) {
                None => ShapePrimitive::Rect {
                    origin,
                    width: s,
                    height: s,
                    fill: Fill::Black,
                },
                Some(id) => ShapePrimitive::Marker {
                    id,
                    origin,
                    cell_size: s,
                    marker_side: params.marker_size,
                    bits: dict.marker_bits(id).ok_or(PatternError::NotEnoughMarkers {
                        needed: layout.marker_count(),
                        available,
                    })?,
                },
            };
            out.push(primitive);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{PageSetup, PageSize};
    use crate::spec::CharucoParams;
    use approx::assert_relative_eq;
    use calib_patterns_aruco::Dictionary;

    fn dict(n: u64) -> Dictionary {
        Dictionary::from_codes("test", 4, 0, (0..n).map(|i| i * 7 + 1).collect()).expect("dict")
    }

    fn centers(layout: &PatternLayout) -> Vec<Point2<f64>> {
        layout
            .primitives
            .iter()
            .filter_map(|p| match p {
                ShapePrimitive::Circle { center, .. } => Some(*center),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn circle_grid_11x8_spaced_20mm() {
        let spec = PatternSpec::new(PatternKind::Circles, 11, 8, 20.0);
        let layout = generate(&spec).expect("layout");
        assert_eq!(layout.primitives.len(), 88);
        assert_eq!((layout.width, layout.height), (210.0, 297.0));

        let c = centers(&layout);
        // r = 4, extent 148 x 208, centred on A4
        assert_relative_eq!(c[0].x, 31.0 + 4.0);
        assert_relative_eq!(c[0].y, 44.5 + 4.0);
        assert_relative_eq!(c[1].x - c[0].x, 20.0);
        assert_relative_eq!(c[8].y - c[0].y, 20.0);
        assert_relative_eq!(c[87].x, 210.0 - 35.0);
        assert_relative_eq!(c[87].y, 297.0 - 48.5);
    }

    #[test]
    fn asymmetric_rows_are_shifted() {
        let spec = PatternSpec::new(PatternKind::AsymmetricCircles, 4, 3, 10.0);
        let layout = generate(&spec).expect("layout");
        assert_eq!(layout.primitives.len(), 12);
        let c = centers(&layout);
        assert_relative_eq!(c[1].x - c[0].x, 20.0);
        assert_relative_eq!(c[3].x - c[0].x, 10.0);
        assert_relative_eq!(c[3].y - c[0].y, 10.0);
        assert_relative_eq!(c[6].x, c[0].x);

        let bounds = layout.content_bounds().expect("bounds");
        assert_relative_eq!(bounds.min.x, layout.width - bounds.max.x, epsilon = 1e-9);
        assert_relative_eq!(bounds.min.y, layout.height - bounds.max.y, epsilon = 1e-9);
    }

    #[test]
    fn checkerboard_alternates_in_row_major_order() {
        let spec = PatternSpec::new(PatternKind::Checkerboard, 3, 4, 10.0)
            .with_page(PageSetup::Fit)
            .with_margin(5.0);
        let layout = generate(&spec).expect("layout");
        assert_eq!((layout.width, layout.height), (50.0, 40.0));
        assert_eq!(layout.primitives.len(), 12);

        let fills: Vec<Fill> = layout
            .primitives
            .iter()
            .map(|p| match p {
                ShapePrimitive::Rect { fill, .. } => *fill,
                other => panic!("unexpected primitive {other:?}"),
            })
            .collect();
        use Fill::{Black as B, White as W};
        assert_eq!(fills, vec![B, W, B, W, W, B, W, B, B, W, B, W]);

        assert_eq!(
            layout.primitives[5].bounds().min,
            Point2::new(15.0, 15.0)
        );
    }

    #[test]
    fn radon_rounds_outer_black_corners_and_adds_dots() {
        let spec = PatternSpec::new(PatternKind::RadonCheckerboard, 3, 3, 10.0)
            .with_page(PageSetup::Fit)
            .with_markers(vec![[1, 1], [1, 0]]);
        let layout = generate(&spec).expect("layout");
        assert_eq!(layout.primitives.len(), 9 + 2);

        use CornerStyle::{Right as R, Round as O};
        match &layout.primitives[0] {
            ShapePrimitive::RoundedSquare { corners, .. } => assert_eq!(*corners, [O, O, R, O]),
            other => panic!("expected rounded square, got {other:?}"),
        }
        match &layout.primitives[8] {
            ShapePrimitive::RoundedSquare { corners, .. } => assert_eq!(*corners, [R, O, O, O]),
            other => panic!("expected rounded square, got {other:?}"),
        }
        // inner black cell and white border cells stay plain
        assert!(matches!(
            layout.primitives[4],
            ShapePrimitive::Rect { fill: Fill::Black, .. }
        ));
        assert!(matches!(
            layout.primitives[1],
            ShapePrimitive::Rect { fill: Fill::White, .. }
        ));

        match (&layout.primitives[9], &layout.primitives[10]) {
            (
                ShapePrimitive::Circle { center, radius, fill },
                ShapePrimitive::Circle { fill: fill2, .. },
            ) => {
                assert_relative_eq!(center.x, 15.0);
                assert_relative_eq!(center.y, 15.0);
                assert_relative_eq!(*radius, 1.7);
                assert_eq!(*fill, Fill::White);
                assert_eq!(*fill2, Fill::Black);
            }
            other => panic!("expected two dots, got {other:?}"),
        }
    }

    #[test]
    fn charuco_tags_white_cells_with_sequential_ids() {
        let spec = PatternSpec::new(PatternKind::Charuco, 5, 7, 20.0).with_charuco(CharucoParams {
            marker_size: 15.0,
            dictionary: dict(20),
        });
        let layout = generate(&spec).expect("layout");
        assert_eq!(layout.primitives.len(), 35);
        assert_eq!(layout.marker_count(), 17);

        let ids: Vec<u32> = layout
            .primitives
            .iter()
            .filter_map(|p| match p {
                ShapePrimitive::Marker { id, .. } => Some(*id),
                _ => None,
            })
            .collect();
        assert_eq!(ids, (0..17).collect::<Vec<_>>());

        let first = &layout.primitives[1];
        let cell = first.bounds().min;
        let marker = first.marker_origin().expect("marker origin");
        assert_relative_eq!(marker.x - cell.x, 2.5);
        assert_relative_eq!(marker.y - cell.y, 2.5);
        match first {
            ShapePrimitive::Marker { bits, .. } => {
                assert_eq!(Some(bits), spec.charuco.as_ref().unwrap().dictionary.marker_bits(0).as_ref())
            }
            other => panic!("expected marker, got {other:?}"),
        }
    }

    #[test]
    fn overflowing_fixed_page_still_renders() {
        let spec = PatternSpec::new(PatternKind::Checkerboard, 4, 4, 10.0)
            .with_page(PageSetup::Custom(PageSize {
                width: 30.0,
                height: 30.0,
            }))
            .with_margin(5.0);
        let layout = generate(&spec).expect("overflow is only a warning");
        assert_eq!((layout.width, layout.height), (30.0, 30.0));
        assert_eq!(layout.primitives.len(), 16);
        assert_eq!(layout.primitives[0].bounds().min, Point2::new(-5.0, -5.0));
        assert_eq!(layout.primitives[15].bounds().max, Point2::new(35.0, 35.0));
    }

    #[test]
    fn margin_violation_still_renders_centred() {
        let spec = PatternSpec::new(PatternKind::Circles, 2, 2, 10.0)
            .with_page(PageSetup::Custom(PageSize {
                width: 20.0,
                height: 20.0,
            }))
            .with_margin(5.0);
        let layout = generate(&spec).expect("margin is only a warning");
        // extent 14 x 14, 3 units of clearance on each side
        let bounds = layout.content_bounds().expect("bounds");
        assert_relative_eq!(bounds.min.x, 3.0);
        assert_relative_eq!(bounds.max.y, 17.0);
    }

    #[test]
    fn charuco_marker_may_fill_its_cell() {
        let spec = PatternSpec::new(PatternKind::Charuco, 2, 3, 10.0)
            .with_page(PageSetup::Fit)
            .with_charuco(CharucoParams {
                marker_size: 10.0,
                dictionary: dict(3),
            });
        let layout = generate(&spec).expect("borderless markers still generate");
        assert_eq!(layout.marker_count(), 3);
        let first = &layout.primitives[1];
        assert_eq!(first.marker_origin(), Some(first.bounds().min));
    }

    #[test]
    fn generation_is_deterministic() {
        let spec = PatternSpec::new(PatternKind::RadonCheckerboard, 6, 9, 12.5)
            .with_markers(vec![[4, 3], [5, 3], [4, 2]]);
        let a = generate(&spec).expect("a");
        let b = generate(&spec).expect("b");
        assert_eq!(a, b);
    }

    #[test]
    fn invalid_spec_produces_nothing() {
        let spec = PatternSpec::new(PatternKind::Checkerboard, 0, 8, 20.0);
        assert!(generate(&spec).is_err());
    }

    #[test]
    fn primitive_count_matches_for_every_kind() {
        for kind in PatternKind::ALL {
            for (rows, cols) in [(2, 2), (3, 5), (11, 8)] {
                let mut spec = PatternSpec::new(kind, rows, cols, 10.0)
                    .with_page(PageSetup::Custom(PageSize {
                        width: 400.0,
                        height: 400.0,
                    }));
                if kind == PatternKind::Charuco {
                    spec = spec.with_charuco(CharucoParams {
                        marker_size: 7.0,
                        dictionary: dict(50),
                    });
                }
                if kind == PatternKind::RadonCheckerboard {
                    spec = spec.with_markers(vec![[0, 0], [1, 1]]);
                }
                let layout = generate(&spec).expect("layout");
                assert_eq!(
                    layout.primitives.len(),
                    expected_primitive_count(&spec),
                    "{kind} {rows}x{cols}"
                );
            }
        }
    }
}

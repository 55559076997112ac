use crate::PatternKind;

/// Parameter validation errors.
///
/// Every variant is an invalid-parameter condition: generation is aborted
/// before any primitive is produced.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PatternError {
    #[error("unknown pattern type `{0}` (expected circles, acircles, checkerboard, radon_checkerboard or charuco)")]
    UnknownPatternKind(String),
    #[error("unknown units `{0}` (expected mm, in or px)")]
    UnknownUnits(String),
    #[error("unknown page size `{0}` (expected A0..A5 or fit)")]
    UnknownPageSize(String),
    #[error("{kind} pattern needs rows and cols >= {min} (got {rows}x{cols})")]
    InvalidGridSize {
        kind: PatternKind,
        rows: u32,
        cols: u32,
        min: u32,
    },
    #[error("square size must be finite and > 0 (got {0})")]
    InvalidSquareSize(f64),
    #[error("radius rate must be finite and > 0 (got {0})")]
    InvalidRadiusRate(f64),
    #[error("radius rate {rate} makes neighbouring circles overlap (minimum {min:.3})")]
    OverlappingCircles { rate: f64, min: f64 },
    #[error("margin must be finite and >= 0 (got {0})")]
    InvalidMargin(f64),
    #[error("page size must be finite and > 0 (got {width}x{height})")]
    InvalidPageSize { width: f64, height: f64 },
    #[error("marker cell ({x}, {y}) lies outside the {cols}x{rows} grid")]
    MarkerOutOfGrid { x: u32, y: u32, rows: u32, cols: u32 },
    #[error("charuco pattern needs marker size and dictionary")]
    MissingCharucoParams,
    #[error("aruco marker size must be finite and > 0 (got {0})")]
    InvalidMarkerSize(f64),
    #[error("aruco marker size {marker_size} cannot be larger than square size {square_size}")]
    MarkerLargerThanSquare { marker_size: f64, square_size: f64 },
    #[error("board needs {needed} markers, dictionary has {available}")]
    NotEnoughMarkers { needed: usize, available: usize },
}

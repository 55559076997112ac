//! Pattern parameters and geometry for printable calibration targets.
//!
//! This crate is purely geometric: it validates a [`PatternSpec`] and turns
//! it into a [`PatternLayout`], an ordered list of [`ShapePrimitive`]s on a
//! page. Drawing and file export live in `calib-patterns-print`.
//!
//! ```
//! use calib_patterns_core::{generate, PatternKind, PatternSpec};
//!
//! let spec = PatternSpec::new(PatternKind::Checkerboard, 7, 8, 25.0);
//! let layout = generate(&spec).expect("valid spec");
//! assert_eq!(layout.primitives.len(), 56);
//! ```

mod charuco;
mod error;
mod geometry;
mod logger;
mod page;
mod spec;

pub use charuco::{is_black_square, CharucoLayout};
pub use error::PatternError;
pub use geometry::{
    expected_primitive_count, generate, pattern_extent, Bounds, CornerStyle, Fill, PatternLayout,
    ShapePrimitive,
};
pub use page::{IsoPage, PageSetup, PageSize, Units};
pub use spec::{CharucoParams, PatternKind, PatternSpec};

#[cfg(feature = "tracing")]
pub use logger::{init_tracing, init_tracing_with_level};

pub use logger::{default_directive, init_with_level, init_with_verbosity, level_from_verbosity};

pub use calib_patterns_aruco::{Dictionary, MarkerBits};

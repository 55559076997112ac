//! Pattern parameters and their validation.

use std::fmt;
use std::str::FromStr;

use calib_patterns_aruco::Dictionary;
use serde::{Deserialize, Serialize};

use crate::page::{PageSetup, Units};
use crate::PatternError;

/// Calibration-target geometry family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    /// Symmetric grid of dots.
    #[default]
    Circles,
    /// Asymmetric dot grid: odd rows are shifted by one spacing.
    #[serde(rename = "acircles")]
    AsymmetricCircles,
    Checkerboard,
    /// Checkerboard with rounded outer corners and optional orientation dots.
    RadonCheckerboard,
    /// Checkerboard whose white cells carry ArUco markers.
    #[serde(alias = "charuco_board")]
    Charuco,
}

impl PatternKind {
    pub const ALL: [PatternKind; 5] = [
        PatternKind::Circles,
        PatternKind::AsymmetricCircles,
        PatternKind::Checkerboard,
        PatternKind::RadonCheckerboard,
        PatternKind::Charuco,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PatternKind::Circles => "circles",
            PatternKind::AsymmetricCircles => "acircles",
            PatternKind::Checkerboard => "checkerboard",
            PatternKind::RadonCheckerboard => "radon_checkerboard",
            PatternKind::Charuco => "charuco",
        }
    }

    /// True for kinds made of checkerboard cells.
    pub fn is_checkerboard_like(self) -> bool {
        matches!(
            self,
            PatternKind::Checkerboard | PatternKind::RadonCheckerboard | PatternKind::Charuco
        )
    }

    /// Smallest allowed row/column count.
    ///
    /// Cell-based boards need at least one interior corner.
    pub fn min_grid_size(self) -> u32 {
        if self.is_checkerboard_like() {
            2
        } else {
            1
        }
    }

    /// Smallest `radius_rate` that keeps neighbouring dots apart.
    ///
    /// Returns `None` for kinds without a dot grid.
    pub fn min_radius_rate(self) -> Option<f64> {
        match self {
            PatternKind::Circles => Some(2.0),
            // nearest neighbours sit on the diagonal, `spacing * sqrt(2)` apart
            PatternKind::AsymmetricCircles => Some(std::f64::consts::SQRT_2),
            _ => None,
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PatternKind {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "circles" => Ok(PatternKind::Circles),
            "acircles" | "asymmetric_circles" => Ok(PatternKind::AsymmetricCircles),
            "checkerboard" | "chessboard" => Ok(PatternKind::Checkerboard),
            "radon_checkerboard" => Ok(PatternKind::RadonCheckerboard),
            "charuco" | "charuco_board" => Ok(PatternKind::Charuco),
            _ => Err(PatternError::UnknownPatternKind(s.to_string())),
        }
    }
}

/// ArUco settings of a ChArUco board.
#[derive(Clone, Debug, PartialEq)]
pub struct CharucoParams {
    /// Side of the printed marker (border ring included), in pattern units.
    pub marker_size: f64,
    pub dictionary: Dictionary,
}

impl CharucoParams {
    /// Markers needed for a `rows × cols` board: one per white cell.
    pub fn markers_needed(rows: u32, cols: u32) -> usize {
        (rows as usize * cols as usize) / 2
    }
}

/// Validated-on-demand generation parameters.
///
/// `rows`/`cols` count dots for circle grids and **squares** (not inner
/// corners) for cell-based boards.
#[derive(Clone, Debug, PartialEq)]
pub struct PatternSpec {
    pub kind: PatternKind,
    pub rows: u32,
    pub cols: u32,
    /// Grid spacing (dots) or cell side (boards), in `units`.
    pub square_size: f64,
    /// Circle radius is `square_size / radius_rate`.
    pub radius_rate: f64,
    /// Minimum clearance between the pattern and the page edge.
    pub margin: f64,
    pub units: Units,
    pub page: PageSetup,
    /// Radon checkerboard orientation dots, as `[x, y]` cell indices.
    pub markers: Vec<[u32; 2]>,
    pub charuco: Option<CharucoParams>,
}

impl PatternSpec {
    pub const DEFAULT_RADIUS_RATE: f64 = 5.0;

    /// Spec with the defaults used by the CLI: millimetres on an A4 page.
    pub fn new(kind: PatternKind, rows: u32, cols: u32, square_size: f64) -> Self {
        Self {
            kind,
            rows,
            cols,
            square_size,
            radius_rate: Self::DEFAULT_RADIUS_RATE,
            margin: 0.0,
            units: Units::default(),
            page: PageSetup::default(),
            markers: Vec::new(),
            charuco: None,
        }
    }

    pub fn with_units(mut self, units: Units) -> Self {
        self.units = units;
        self
    }

    pub fn with_page(mut self, page: PageSetup) -> Self {
        self.page = page;
        self
    }

    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin = margin;
        self
    }

    pub fn with_radius_rate(mut self, radius_rate: f64) -> Self {
        self.radius_rate = radius_rate;
        self
    }

    pub fn with_markers(mut self, markers: Vec<[u32; 2]>) -> Self {
        self.markers = markers;
        self
    }

    pub fn with_charuco(mut self, charuco: CharucoParams) -> Self {
        self.charuco = Some(charuco);
        self
    }

    /// Check every parameter invariant. Has no side effects.
    pub fn validate(&self) -> Result<(), PatternError> {
        self.validate_grid()?;
        if self.kind == PatternKind::Charuco {
            let charuco = self
                .charuco
                .as_ref()
                .ok_or(PatternError::MissingCharucoParams)?;
            if !charuco.marker_size.is_finite() || charuco.marker_size <= 0.0 {
                return Err(PatternError::InvalidMarkerSize(charuco.marker_size));
            }
            if charuco.marker_size > self.square_size {
                return Err(PatternError::MarkerLargerThanSquare {
                    marker_size: charuco.marker_size,
                    square_size: self.square_size,
                });
            }
            let needed = CharucoParams::markers_needed(self.rows, self.cols);
            let available = charuco.dictionary.len();
            if available < needed {
                return Err(PatternError::NotEnoughMarkers { needed, available });
            }
        }
        Ok(())
    }

    /// Check grid, size, page and radon marker invariants; ChArUco marker
    /// settings are left to [`validate`](Self::validate).
    pub fn validate_grid(&self) -> Result<(), PatternError> {
        let min = self.kind.min_grid_size();
        if self.rows < min || self.cols < min {
            return Err(PatternError::InvalidGridSize {
                kind: self.kind,
                rows: self.rows,
                cols: self.cols,
                min,
            });
        }
        if !self.square_size.is_finite() || self.square_size <= 0.0 {
            return Err(PatternError::InvalidSquareSize(self.square_size));
        }
        if !self.radius_rate.is_finite() || self.radius_rate <= 0.0 {
            return Err(PatternError::InvalidRadiusRate(self.radius_rate));
        }
        if let Some(min_rate) = self.kind.min_radius_rate() {
            if self.radius_rate < min_rate {
                return Err(PatternError::OverlappingCircles {
                    rate: self.radius_rate,
                    min: min_rate,
                });
            }
        }
        if !self.margin.is_finite() || self.margin < 0.0 {
            return Err(PatternError::InvalidMargin(self.margin));
        }
        self.page.validate()?;

        if self.kind == PatternKind::RadonCheckerboard {
            for &[x, y] in &self.markers {
                if x >= self.cols || y >= self.rows {
                    return Err(PatternError::MarkerOutOfGrid {
                        x,
                        y,
                        rows: self.rows,
                        cols: self.cols,
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict(n: usize) -> Dictionary {
        Dictionary::from_codes("test", 4, 0, (0..n as u64).collect()).expect("dict")
    }

    #[test]
    fn parses_kind_names_and_aliases() {
        for kind in PatternKind::ALL {
            assert_eq!(kind.name().parse::<PatternKind>(), Ok(kind));
        }
        assert_eq!(
            "charuco_board".parse::<PatternKind>(),
            Ok(PatternKind::Charuco)
        );
        assert_eq!(
            "dots".parse::<PatternKind>(),
            Err(PatternError::UnknownPatternKind("dots".into()))
        );
    }

    #[test]
    fn kind_serde_uses_cli_names() {
        let json = serde_json::to_string(&PatternKind::AsymmetricCircles).expect("json");
        assert_eq!(json, "\"acircles\"");
        let kind: PatternKind = serde_json::from_str("\"charuco_board\"").expect("alias");
        assert_eq!(kind, PatternKind::Charuco);
    }

    #[test]
    fn default_spec_is_valid() {
        PatternSpec::new(PatternKind::Circles, 11, 8, 20.0)
            .validate()
            .expect("valid");
    }

    #[test]
    fn zero_rows_and_bad_sizes_are_rejected() {
        let spec = PatternSpec::new(PatternKind::Circles, 0, 8, 20.0);
        assert!(matches!(
            spec.validate(),
            Err(PatternError::InvalidGridSize { rows: 0, .. })
        ));

        let spec = PatternSpec::new(PatternKind::Checkerboard, 5, 8, -1.0);
        assert_eq!(spec.validate(), Err(PatternError::InvalidSquareSize(-1.0)));

        let spec = PatternSpec::new(PatternKind::Checkerboard, 5, 8, f64::NAN);
        assert!(matches!(
            spec.validate(),
            Err(PatternError::InvalidSquareSize(_))
        ));

        let spec = PatternSpec::new(PatternKind::Circles, 5, 8, 10.0).with_margin(-2.0);
        assert_eq!(spec.validate(), Err(PatternError::InvalidMargin(-2.0)));
    }

    #[test]
    fn checkerboards_need_interior_corners() {
        let spec = PatternSpec::new(PatternKind::Checkerboard, 1, 8, 20.0);
        assert!(matches!(
            spec.validate(),
            Err(PatternError::InvalidGridSize { min: 2, .. })
        ));
        PatternSpec::new(PatternKind::Circles, 1, 1, 20.0)
            .validate()
            .expect("single dot is fine");
    }

    #[test]
    fn overlapping_circles_are_rejected() {
        let spec = PatternSpec::new(PatternKind::Circles, 4, 4, 10.0).with_radius_rate(1.5);
        assert!(matches!(
            spec.validate(),
            Err(PatternError::OverlappingCircles { .. })
        ));
        PatternSpec::new(PatternKind::AsymmetricCircles, 4, 4, 10.0)
            .with_radius_rate(1.5)
            .validate()
            .expect("acircles tolerate a larger radius");
        PatternSpec::new(PatternKind::Checkerboard, 4, 4, 10.0)
            .with_radius_rate(1.0)
            .validate()
            .expect("radius rate is irrelevant for boards");
    }

    #[test]
    fn radon_markers_must_be_inside_grid() {
        let spec = PatternSpec::new(PatternKind::RadonCheckerboard, 4, 5, 10.0)
            .with_markers(vec![[1, 1], [5, 0]]);
        assert_eq!(
            spec.validate(),
            Err(PatternError::MarkerOutOfGrid {
                x: 5,
                y: 0,
                rows: 4,
                cols: 5
            })
        );
    }

    #[test]
    fn charuco_validation() {
        let base = PatternSpec::new(PatternKind::Charuco, 5, 7, 20.0);
        assert_eq!(base.validate(), Err(PatternError::MissingCharucoParams));

        let too_big = base.clone().with_charuco(CharucoParams {
            marker_size: 25.0,
            dictionary: dict(50),
        });
        assert!(matches!(
            too_big.validate(),
            Err(PatternError::MarkerLargerThanSquare { .. })
        ));

        let small_dict = base.clone().with_charuco(CharucoParams {
            marker_size: 15.0,
            dictionary: dict(10),
        });
        assert_eq!(
            small_dict.validate(),
            Err(PatternError::NotEnoughMarkers {
                needed: 17,
                available: 10
            })
        );

        base.with_charuco(CharucoParams {
            marker_size: 15.0,
            dictionary: dict(17),
        })
        .validate()
        .expect("exactly enough markers");
    }

    #[test]
    fn grid_checks_ignore_charuco_params() {
        let board = PatternSpec::new(PatternKind::Charuco, 5, 7, 20.0);
        board.validate_grid().expect("grid is fine");
        assert_eq!(board.validate(), Err(PatternError::MissingCharucoParams));

        let flat = PatternSpec::new(PatternKind::Charuco, 1, 7, 20.0);
        assert!(matches!(
            flat.validate_grid(),
            Err(PatternError::InvalidGridSize { rows: 1, .. })
        ));
    }
}

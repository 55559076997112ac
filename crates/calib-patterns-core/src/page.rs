//! Units and page setup.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::PatternError;

const MM_PER_INCH: f64 = 25.4;
/// PostScript points per inch; `px` pages follow the point grid.
const PX_PER_INCH: f64 = 72.0;

/// Length unit of every coordinate in a spec and its layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Units {
    #[default]
    Mm,
    #[serde(alias = "inches")]
    In,
    Px,
}

impl Units {
    /// Suffix used in SVG `width`/`height` attributes.
    pub fn suffix(self) -> &'static str {
        match self {
            Units::Mm => "mm",
            Units::In => "in",
            Units::Px => "px",
        }
    }

    /// Convert a length in millimetres into this unit.
    pub fn from_mm(self, mm: f64) -> f64 {
        match self {
            Units::Mm => mm,
            Units::In => mm / MM_PER_INCH,
            Units::Px => mm / MM_PER_INCH * PX_PER_INCH,
        }
    }

    /// Raster pixels per unit at the given resolution.
    ///
    /// `px` layouts are already in pixels and ignore `dpi`.
    pub fn pixels_per_unit(self, dpi: f64) -> f64 {
        match self {
            Units::Mm => dpi / MM_PER_INCH,
            Units::In => dpi,
            Units::Px => 1.0,
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

impl FromStr for Units {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mm" => Ok(Units::Mm),
            "in" | "inch" | "inches" => Ok(Units::In),
            "px" => Ok(Units::Px),
            _ => Err(PatternError::UnknownUnits(s.to_string())),
        }
    }
}

/// ISO 216 page presets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum IsoPage {
    A0,
    A1,
    A2,
    A3,
    #[default]
    A4,
    A5,
}

impl IsoPage {
    /// Portrait `[width, height]` in millimetres.
    pub fn dimensions_mm(self) -> [f64; 2] {
        match self {
            IsoPage::A0 => [840.0, 1188.0],
            IsoPage::A1 => [594.0, 840.0],
            IsoPage::A2 => [420.0, 594.0],
            IsoPage::A3 => [297.0, 420.0],
            IsoPage::A4 => [210.0, 297.0],
            IsoPage::A5 => [148.0, 210.0],
        }
    }

    /// Page size in `units`. Pixel pages are rounded to whole pixels.
    pub fn size_in(self, units: Units) -> PageSize {
        let [w, h] = self.dimensions_mm();
        let (width, height) = match units {
            Units::Px => (units.from_mm(w).round(), units.from_mm(h).round()),
            _ => (units.from_mm(w), units.from_mm(h)),
        };
        PageSize { width, height }
    }
}

impl FromStr for IsoPage {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A0" => Ok(IsoPage::A0),
            "A1" => Ok(IsoPage::A1),
            "A2" => Ok(IsoPage::A2),
            "A3" => Ok(IsoPage::A3),
            "A4" => Ok(IsoPage::A4),
            "A5" => Ok(IsoPage::A5),
            _ => Err(PatternError::UnknownPageSize(s.to_string())),
        }
    }
}

/// Page dimensions in pattern units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

/// How the page around the pattern is sized.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageSetup {
    /// ISO preset, converted into the pattern's units.
    Iso(IsoPage),
    /// Explicit size in the pattern's units.
    Custom(PageSize),
    /// Pattern extent plus the margin on every side.
    Fit,
}

impl Default for PageSetup {
    fn default() -> Self {
        PageSetup::Iso(IsoPage::A4)
    }
}

impl FromStr for PageSetup {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("fit") {
            return Ok(PageSetup::Fit);
        }
        s.parse().map(PageSetup::Iso)
    }
}

impl PageSetup {
    pub fn validate(&self) -> Result<(), PatternError> {
        if let PageSetup::Custom(PageSize { width, height }) = *self {
            let ok = |v: f64| v.is_finite() && v > 0.0;
            if !ok(width) || !ok(height) {
                return Err(PatternError::InvalidPageSize { width, height });
            }
        }
        Ok(())
    }

    /// Final page size for a pattern of `extent` (`[width, height]`).
    pub fn resolve(&self, units: Units, extent: [f64; 2], margin: f64) -> PageSize {
        match *self {
            PageSetup::Iso(page) => page.size_in(units),
            PageSetup::Custom(size) => size,
            PageSetup::Fit => PageSize {
                width: extent[0] + 2.0 * margin,
                height: extent[1] + 2.0 * margin,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn a4_in_every_unit() {
        let mm = IsoPage::A4.size_in(Units::Mm);
        assert_eq!((mm.width, mm.height), (210.0, 297.0));

        let px = IsoPage::A4.size_in(Units::Px);
        assert_eq!((px.width, px.height), (595.0, 842.0));

        let inch = IsoPage::A4.size_in(Units::In);
        assert_relative_eq!(inch.width, 8.2677, epsilon = 1e-4);
        assert_relative_eq!(inch.height, 11.6929, epsilon = 1e-4);
    }

    #[test]
    fn parses_units_and_pages() {
        assert_eq!("inches".parse::<Units>(), Ok(Units::In));
        assert_eq!("PX".parse::<Units>(), Ok(Units::Px));
        assert!("cm".parse::<Units>().is_err());
        assert_eq!("a3".parse::<PageSetup>(), Ok(PageSetup::Iso(IsoPage::A3)));
        assert_eq!("Fit".parse::<PageSetup>(), Ok(PageSetup::Fit));
        assert_eq!(
            "letter".parse::<PageSetup>(),
            Err(PatternError::UnknownPageSize("letter".into()))
        );
    }

    #[test]
    fn fit_adds_margin_on_both_sides() {
        let page = PageSetup::Fit.resolve(Units::Mm, [100.0, 50.0], 5.0);
        assert_eq!(page, PageSize { width: 110.0, height: 60.0 });
    }

    #[test]
    fn custom_page_must_be_positive() {
        let page = PageSetup::Custom(PageSize { width: 0.0, height: 10.0 });
        assert!(page.validate().is_err());
    }

    #[test]
    fn page_setup_serde_shape() {
        let json = serde_json::to_string(&PageSetup::Iso(IsoPage::A4)).expect("json");
        assert_eq!(json, r#"{"iso":"A4"}"#);
        let fit: PageSetup = serde_json::from_str(r#""fit""#).expect("fit");
        assert_eq!(fit, PageSetup::Fit);
    }
}

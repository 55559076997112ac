//! JSON configuration for a single generate-and-export run.

use std::fs;
use std::path::{Path, PathBuf};

use calib_patterns_aruco::Dictionary;
use calib_patterns_core::{CharucoParams, PageSetup, PatternKind, PatternSpec, Units};
use calib_patterns_print::RasterOptions;
use serde::{Deserialize, Serialize};

use crate::Error;

fn default_rows() -> u32 {
    11
}

fn default_cols() -> u32 {
    8
}

fn default_square_size() -> f64 {
    20.0
}

fn default_radius_rate() -> f64 {
    5.0
}

fn default_marker_size() -> f64 {
    10.0
}

fn default_dict_file() -> PathBuf {
    PathBuf::from("DICT_ARUCO_ORIGINAL.json")
}

fn default_output() -> PathBuf {
    PathBuf::from("out.svg")
}

/// Serializable pattern parameters.
///
/// Mirrors [`PatternSpec`], except that the ChArUco dictionary is referenced
/// by path and only loaded when the pattern is a ChArUco board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternSpecConfig {
    #[serde(default, rename = "type", alias = "kind")]
    pub kind: PatternKind,
    #[serde(default = "default_rows")]
    pub rows: u32,
    #[serde(default = "default_cols")]
    pub cols: u32,
    #[serde(default = "default_square_size")]
    pub square_size: f64,
    #[serde(default = "default_radius_rate")]
    pub radius_rate: f64,
    #[serde(default)]
    pub margin: f64,
    #[serde(default)]
    pub units: Units,
    #[serde(default)]
    pub page: PageSetup,
    #[serde(default)]
    pub markers: Vec<[u32; 2]>,
    #[serde(default = "default_marker_size")]
    pub aruco_marker_size: f64,
    #[serde(default = "default_dict_file")]
    pub dict_file: PathBuf,
}

impl Default for PatternSpecConfig {
    fn default() -> Self {
        Self {
            kind: PatternKind::default(),
            rows: default_rows(),
            cols: default_cols(),
            square_size: default_square_size(),
            radius_rate: default_radius_rate(),
            margin: 0.0,
            units: Units::default(),
            page: PageSetup::default(),
            markers: Vec::new(),
            aruco_marker_size: default_marker_size(),
            dict_file: default_dict_file(),
        }
    }
}

impl PatternSpecConfig {
    /// Build the generator input, loading the dictionary for ChArUco boards.
    ///
    /// Grid and size parameters are validated before the dictionary file is
    /// touched.
    pub fn build_spec(&self) -> Result<PatternSpec, Error> {
        let mut spec = PatternSpec::new(self.kind, self.rows, self.cols, self.square_size)
            .with_radius_rate(self.radius_rate)
            .with_margin(self.margin)
            .with_units(self.units)
            .with_page(self.page)
            .with_markers(self.markers.clone());
        if self.kind == PatternKind::Charuco {
            spec.validate_grid()?;
            let dictionary = Dictionary::load_json(&self.dict_file)?;
            spec = spec.with_charuco(CharucoParams {
                marker_size: self.aruco_marker_size,
                dictionary,
            });
        }
        Ok(spec)
    }
}

/// Everything needed for one run: pattern, output path and raster settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateConfig {
    #[serde(default)]
    pub pattern: PatternSpecConfig,
    #[serde(default = "default_output")]
    pub output: PathBuf,
    #[serde(default)]
    pub raster: RasterOptions,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            pattern: PatternSpecConfig::default(),
            output: default_output(),
            raster: RasterOptions::default(),
        }
    }
}

impl GenerateConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| Error::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw).map_err(|source| Error::ConfigJson {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let path = path.as_ref();
        let json = self.to_json_pretty().map_err(|source| Error::ConfigJson {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(|source| Error::ConfigIo {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Parse a `"x,y;x,y"` list of cell coordinates. Empty input gives no cells.
pub fn parse_markers(raw: &str) -> Result<Vec<[u32; 2]>, Error> {
    let invalid = || Error::InvalidMarkers(raw.to_string());
    raw.split(';')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            let (x, y) = item.split_once(',').ok_or_else(invalid)?;
            let x = x.trim().parse::<u32>().map_err(|_| invalid())?;
            let y = y.trim().parse::<u32>().map_err(|_| invalid())?;
            Ok([x, y])
        })
        .collect()
}

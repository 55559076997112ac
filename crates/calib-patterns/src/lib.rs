//! High-level facade crate for the `calib-patterns-*` workspace.
//!
//! This crate provides:
//! - re-exports of the dictionary, geometry and rendering crates
//! - [`GenerateConfig`], a JSON-backed description of one generation run
//! - [`generate_and_export`], which validates, lays out and writes a pattern
//!
//! ## Quickstart
//!
//! ```no_run
//! use calib_patterns::{generate_and_export, GenerateConfig};
//! use calib_patterns::core::{PageSetup, PatternKind};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut cfg = GenerateConfig::default();
//! cfg.pattern.kind = PatternKind::Checkerboard;
//! cfg.pattern.rows = 7;
//! cfg.pattern.cols = 9;
//! cfg.pattern.page = PageSetup::Fit;
//! cfg.output = "checkerboard.png".into();
//!
//! let path = generate_and_export(&cfg)?;
//! println!("Pattern saved to {}", path.display());
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `calib_patterns::aruco`: ArUco dictionaries (OpenCV JSON, optionally gzipped).
//! - `calib_patterns::core`: pattern parameters, validation and layout.
//! - `calib_patterns::print`: SVG and raster rendering, file export.

use std::path::PathBuf;

pub use calib_patterns_aruco as aruco;
pub use calib_patterns_core as core;
pub use calib_patterns_print as print;

pub use calib_patterns_core::{generate, PatternKind, PatternLayout, PatternSpec};
pub use calib_patterns_print::{export, render_svg, ExportFormat, RasterOptions};

mod config;

pub use config::{parse_markers, GenerateConfig, PatternSpecConfig};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Errors surfaced by the facade and the CLI.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Pattern(#[from] calib_patterns_core::PatternError),
    #[error(transparent)]
    Export(#[from] calib_patterns_print::ExportError),
    #[error(transparent)]
    Dictionary(#[from] calib_patterns_aruco::DictionaryError),
    #[error("failed to access config {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    ConfigJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid marker list `{0}` (expected \"x,y;x,y\")")]
    InvalidMarkers(String),
}

/// Validate and lay out the configured pattern, then write it to
/// `config.output`. Returns the written path.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(config), fields(output = %config.output.display()))
)]
pub fn generate_and_export(config: &GenerateConfig) -> Result<PathBuf, Error> {
    let spec = config.pattern.build_spec()?;
    let layout = generate(&spec)?;
    log::info!(
        "{} {}x{} at {}{}: {} primitives on a {}x{} page",
        spec.kind,
        spec.rows,
        spec.cols,
        spec.square_size,
        spec.units,
        layout.primitives.len(),
        layout.width,
        layout.height
    );
    export(&layout, &config.output, &config.raster)?;
    Ok(config.output.clone())
}

/// Install a `tracing` subscriber and forward `log` records into it.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool) {
    init_tracing_with_verbosity(json, 1);
}

/// Like [`init_tracing`], with the default filter picked from a `-v` count.
/// `RUST_LOG` still takes precedence when set.
#[cfg(feature = "tracing")]
pub fn init_tracing_with_verbosity(json: bool, verbosity: u8) {
    let level = calib_patterns_core::level_from_verbosity(verbosity);
    calib_patterns_core::init_tracing_with_level(json, level);
    let _ = tracing_log::LogTracer::init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use calib_patterns_core::PageSetup;

    #[test]
    fn writes_requested_svg() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut cfg = GenerateConfig::default();
        cfg.output = dir.path().join("circles.svg");

        let path = generate_and_export(&cfg).expect("export");
        assert_eq!(path, cfg.output);
        let svg = std::fs::read_to_string(&path).expect("read");
        assert_eq!(svg.matches("<circle ").count(), 88);
    }

    #[test]
    fn invalid_spec_writes_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut cfg = GenerateConfig::default();
        cfg.pattern.rows = 0;
        cfg.pattern.page = PageSetup::Fit;
        cfg.output = dir.path().join("never.svg");

        assert!(matches!(generate_and_export(&cfg), Err(Error::Pattern(_))));
        assert!(!cfg.output.exists());
    }
}

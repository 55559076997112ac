use std::error::Error;
use std::path::PathBuf;

use calib_patterns::core::{IsoPage, PageSetup, PageSize, PatternKind, Units};
use calib_patterns::{generate_and_export, parse_markers, GenerateConfig};
use clap::{ArgAction, Parser};

/// Generate printable camera calibration patterns.
#[derive(Debug, Parser)]
#[command(name = "calib-patterns", author, version, about = "Calibration pattern generator")]
struct Args {
    /// Output file; the extension picks the format (svg, png, jpg, bmp, tiff) [default: out.svg].
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Pattern columns [default: 8].
    #[arg(short = 'c', long)]
    columns: Option<u32>,

    /// Pattern rows [default: 11].
    #[arg(short = 'r', long)]
    rows: Option<u32>,

    /// circles, acircles, checkerboard, radon_checkerboard or charuco [default: circles].
    #[arg(short = 'T', long = "type")]
    kind: Option<PatternKind>,

    /// mm, in or px [default: mm].
    #[arg(short = 'u', long)]
    units: Option<Units>,

    /// Cell side or dot spacing, in units [default: 20].
    #[arg(short = 's', long)]
    square_size: Option<f64>,

    /// Circle radius is square size divided by this [default: 5].
    #[arg(short = 'R', long)]
    radius_rate: Option<f64>,

    /// Page width in units; overrides the width of the page size.
    #[arg(short = 'w', long)]
    page_width: Option<f64>,

    /// Page height in units; overrides the height of the page size.
    #[arg(short = 'H', long)]
    page_height: Option<f64>,

    /// A0..A5, or `fit` to size the page to the pattern [default: A4].
    #[arg(short = 'p', long)]
    page_size: Option<PageSetup>,

    /// Minimum clearance between pattern and page edge, in units [default: 0].
    #[arg(long)]
    margin: Option<f64>,

    /// ChArUco marker side, border included, in units [default: 10].
    #[arg(short = 'a', long)]
    aruco_marker_size: Option<f64>,

    /// ArUco dictionary in OpenCV JSON layout, optionally .gz [default: DICT_ARUCO_ORIGINAL.json].
    #[arg(short = 'd', long)]
    dict_file: Option<PathBuf>,

    /// Radon checkerboard dot cells as "x,y;x,y".
    #[arg(short = 'm', long)]
    markers: Option<String>,

    /// Raster resolution [default: 300].
    #[arg(long)]
    dpi: Option<f64>,

    /// Raster anti-aliasing factor per axis [default: 4].
    #[arg(long)]
    supersample: Option<u32>,

    /// JSON config; explicit flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the effective configuration as JSON and exit.
    #[arg(long)]
    dump_config: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn into_config(self) -> Result<GenerateConfig, Box<dyn Error>> {
        let mut cfg = match &self.config {
            Some(path) => GenerateConfig::load_json(path)?,
            None => GenerateConfig::default(),
        };

        let pattern = &mut cfg.pattern;
        if let Some(kind) = self.kind {
            pattern.kind = kind;
        }
        if let Some(rows) = self.rows {
            pattern.rows = rows;
        }
        if let Some(cols) = self.columns {
            pattern.cols = cols;
        }
        if let Some(units) = self.units {
            pattern.units = units;
        }
        if let Some(size) = self.square_size {
            pattern.square_size = size;
        }
        if let Some(rate) = self.radius_rate {
            pattern.radius_rate = rate;
        }
        if let Some(margin) = self.margin {
            pattern.margin = margin;
        }
        if let Some(page) = self.page_size {
            pattern.page = page;
        }
        if self.page_width.is_some() || self.page_height.is_some() {
            let base = match pattern.page {
                PageSetup::Custom(size) => size,
                PageSetup::Iso(iso) => iso.size_in(pattern.units),
                PageSetup::Fit => IsoPage::default().size_in(pattern.units),
            };
            pattern.page = PageSetup::Custom(PageSize {
                width: self.page_width.unwrap_or(base.width),
                height: self.page_height.unwrap_or(base.height),
            });
        }
        if let Some(markers) = self.markers.as_deref() {
            pattern.markers = parse_markers(markers)?;
        }
        if let Some(size) = self.aruco_marker_size {
            pattern.aruco_marker_size = size;
        }
        if let Some(dict) = self.dict_file {
            pattern.dict_file = dict;
        }

        if let Some(output) = self.output {
            cfg.output = output;
        }
        if let Some(dpi) = self.dpi {
            cfg.raster.dpi = dpi;
        }
        if let Some(supersample) = self.supersample {
            cfg.raster.supersample = supersample;
        }
        Ok(cfg)
    }
}

#[cfg(feature = "tracing")]
fn init_logging(verbosity: u8) {
    calib_patterns::init_tracing_with_verbosity(false, verbosity);
}

#[cfg(not(feature = "tracing"))]
fn init_logging(verbosity: u8) {
    let _ = calib_patterns::core::init_with_verbosity(verbosity);
}

fn main() {
    if let Err(err) = try_main() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_logging(args.verbose);

    let dump = args.dump_config;
    let cfg = args.into_config()?;
    if dump {
        println!("{}", cfg.to_json_pretty()?);
        return Ok(());
    }

    let path = generate_and_export(&cfg)?;
    println!("Pattern saved to {}", path.display());
    Ok(())
}

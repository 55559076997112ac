//! ArUco marker dictionaries for printable targets.
//!
//! This crate focuses on:
//! - loading dictionaries in the OpenCV JSON layout (plain or gzipped),
//! - expanding packed marker codes into bordered module grids ready to draw.
//!
//! It does **not** decode markers from images.

mod bits;
mod dictionary;
mod io;

use std::path::PathBuf;

pub use bits::MarkerBits;
pub use dictionary::{Dictionary, MAX_MARKER_SIZE};

/// Errors produced while loading or building a dictionary.
#[derive(thiserror::Error, Debug)]
pub enum DictionaryError {
    #[error("failed to read dictionary {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("dictionary JSON must be an object")]
    NotAnObject,
    #[error("dictionary is missing field `{0}`")]
    MissingField(&'static str),
    #[error("dictionary field `{0}` has an invalid value")]
    InvalidField(&'static str),
    #[error("dictionary is missing marker_{id}")]
    MissingMarker { id: usize },
    #[error("marker_{id} must be a string of {expected} '0'/'1' characters")]
    InvalidBits { id: usize, expected: usize },
    #[error("marker size {marker_size} is unsupported (expected 1..=8)")]
    UnsupportedMarkerSize { marker_size: usize },
    #[error("code of marker {id} does not fit into {marker_size}x{marker_size} bits")]
    CodeOutOfRange { id: usize, marker_size: usize },
}

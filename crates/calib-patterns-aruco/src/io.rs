//! Loading and writing dictionaries in the OpenCV JSON layout.
//!
//! The layout is a flat object:
//!
//! ```json
//! { "name": "DICT_4X4_50", "nmarkers": 50, "markersize": 4,
//!   "maxCorrectionBits": 1, "marker_0": "1011000011110100", ... }
//! ```
//!
//! Files ending in `.gz` are gunzipped first.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use serde_json::{Map, Value};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{Dictionary, DictionaryError, MAX_MARKER_SIZE};

impl Dictionary {
    /// Load a dictionary from a `.json` or `.json.gz` file.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(path), fields(path = %path.as_ref().display()))
    )]
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, DictionaryError> {
        let path = path.as_ref();
        let io_err = |source| DictionaryError::Io {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(io_err)?;
        let mut raw = String::new();
        if path.extension().is_some_and(|ext| ext == "gz") {
            GzDecoder::new(file)
                .read_to_string(&mut raw)
                .map_err(io_err)?;
        } else {
            BufReader::new(file)
                .read_to_string(&mut raw)
                .map_err(io_err)?;
        }

        let fallback_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let fallback_name = fallback_name
            .trim_end_matches(".gz")
            .trim_end_matches(".json");
        let dict = Self::from_json_str(&raw, fallback_name)?;
        log::debug!(
            "loaded dictionary {} ({} markers, {}x{} bits) from {}",
            dict.name,
            dict.len(),
            dict.marker_size,
            dict.marker_size,
            path.display()
        );
        Ok(dict)
    }

    /// Parse a dictionary from OpenCV-layout JSON text.
    ///
    /// `fallback_name` is used when the document carries no `name` field.
    pub fn from_json_str(raw: &str, fallback_name: &str) -> Result<Self, DictionaryError> {
        let value: Value = serde_json::from_str(raw)?;
        let obj = value.as_object().ok_or(DictionaryError::NotAnObject)?;

        let nmarkers = read_usize(obj, "nmarkers")?;
        let marker_size = read_usize(obj, "markersize")?;
        if marker_size == 0 || marker_size > MAX_MARKER_SIZE {
            return Err(DictionaryError::UnsupportedMarkerSize { marker_size });
        }
        // every marker needs its own key
        if nmarkers > obj.len() {
            return Err(DictionaryError::MissingMarker { id: obj.len() });
        }
        let max_correction_bits = match obj.get("maxCorrectionBits") {
            Some(v) => v
                .as_u64()
                .and_then(|v| u8::try_from(v).ok())
                .ok_or(DictionaryError::InvalidField("maxCorrectionBits"))?,
            None => 0,
        };
        let name = obj
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or(fallback_name)
            .to_string();

        let bit_count = marker_size * marker_size;
        let mut codes = Vec::with_capacity(nmarkers);
        for id in 0..nmarkers {
            let bits = obj
                .get(&format!("marker_{id}"))
                .and_then(Value::as_str)
                .ok_or(DictionaryError::MissingMarker { id })?;
            codes.push(parse_bit_string(bits, bit_count).ok_or(
                DictionaryError::InvalidBits {
                    id,
                    expected: bit_count,
                },
            )?);
        }

        Self::from_codes(name, marker_size, max_correction_bits, codes)
    }

    /// Serialize into the OpenCV JSON layout.
    pub fn to_json_value(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("name".into(), Value::from(self.name.clone()));
        obj.insert("nmarkers".into(), Value::from(self.len()));
        obj.insert("markersize".into(), Value::from(self.marker_size));
        obj.insert(
            "maxCorrectionBits".into(),
            Value::from(self.max_correction_bits),
        );
        for (id, &code) in self.codes.iter().enumerate() {
            let bits: String = (0..self.bit_count())
                .map(|i| if (code >> i) & 1 == 1 { '1' } else { '0' })
                .collect();
            obj.insert(format!("marker_{id}"), Value::from(bits));
        }
        Value::Object(obj)
    }

    /// Write this dictionary to disk as pretty JSON (uncompressed).
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), DictionaryError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(&self.to_json_value())?;
        std::fs::write(path, json).map_err(|source| DictionaryError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn read_usize(obj: &Map<String, Value>, key: &'static str) -> Result<usize, DictionaryError> {
    let v = obj.get(key).ok_or(DictionaryError::MissingField(key))?;
    v.as_u64()
        .and_then(|v| usize::try_from(v).ok())
        .ok_or(DictionaryError::InvalidField(key))
}

fn parse_bit_string(bits: &str, expected: usize) -> Option<u64> {
    if bits.len() != expected || expected > 64 {
        return None;
    }
    let mut code = 0u64;
    for (i, ch) in bits.chars().enumerate() {
        match ch {
            '0' => {}
            '1' => code |= 1 << i,
            _ => return None,
        }
    }
    Some(code)
}

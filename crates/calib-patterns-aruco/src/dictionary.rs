//! Dictionary metadata and packed marker codes.

use crate::bits::MarkerBits;
use crate::DictionaryError;

/// Largest supported marker side: `marker_size²` bits must fit in a `u64`.
pub const MAX_MARKER_SIZE: usize = 8;

/// An ArUco-style marker dictionary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dictionary {
    /// Human-readable name (for debugging/logging).
    pub name: String,
    /// Marker side length (number of inner bits per side).
    pub marker_size: usize,
    /// Maximum error-correcting Hamming distance supported by the dictionary.
    pub max_correction_bits: u8,
    /// One `u64` per marker id, encoding the inner `marker_size × marker_size` bits.
    ///
    /// Bits are stored in row-major order (`idx = y * marker_size + x`) with
    /// **white = 1**, the convention of the OpenCV JSON dictionary files.
    pub codes: Vec<u64>,
}

impl Dictionary {
    /// Build a dictionary from packed codes, checking that every code fits
    /// into `marker_size²` bits.
    pub fn from_codes(
        name: impl Into<String>,
        marker_size: usize,
        max_correction_bits: u8,
        codes: Vec<u64>,
    ) -> Result<Self, DictionaryError> {
        if marker_size == 0 || marker_size > MAX_MARKER_SIZE {
            return Err(DictionaryError::UnsupportedMarkerSize { marker_size });
        }
        let bits = marker_size * marker_size;
        if bits < 64 {
            let mask = !((1u64 << bits) - 1);
            if let Some(id) = codes.iter().position(|&c| c & mask != 0) {
                return Err(DictionaryError::CodeOutOfRange { id, marker_size });
            }
        }
        Ok(Self {
            name: name.into(),
            marker_size,
            max_correction_bits,
            codes,
        })
    }

    /// Total number of inner bits per marker.
    #[inline]
    pub fn bit_count(&self) -> usize {
        self.marker_size * self.marker_size
    }

    /// Number of markers in the dictionary.
    #[inline]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Packed code for marker `id`.
    #[inline]
    pub fn code(&self, id: u32) -> Option<u64> {
        self.codes.get(id as usize).copied()
    }

    /// Full module grid (black border ring included) for marker `id`.
    pub fn marker_bits(&self, id: u32) -> Option<MarkerBits> {
        let code = self.code(id)?;
        Some(MarkerBits::from_code(code, self.marker_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_codes_wider_than_marker() {
        let err = Dictionary::from_codes("tiny", 2, 0, vec![0b1010, 0b1_0000]).unwrap_err();
        assert!(matches!(
            err,
            DictionaryError::CodeOutOfRange { id: 1, marker_size: 2 }
        ));
    }

    #[test]
    fn rejects_unsupported_marker_size() {
        assert!(matches!(
            Dictionary::from_codes("big", 9, 0, vec![]),
            Err(DictionaryError::UnsupportedMarkerSize { marker_size: 9 })
        ));
        assert!(Dictionary::from_codes("full", 8, 0, vec![u64::MAX]).is_ok());
    }

    #[test]
    fn marker_bits_lookup_is_bounded() {
        let dict = Dictionary::from_codes("d", 3, 1, vec![0b111_000_101]).expect("dict");
        assert_eq!(dict.bit_count(), 9);
        assert!(dict.marker_bits(0).is_some());
        assert!(dict.marker_bits(1).is_none());
    }
}

//! Module grids for drawing markers.

use serde::{Deserialize, Serialize};

/// Module grid of one marker, including the one-module black border.
///
/// The grid is `side × side` with `side = marker_size + 2`, stored row-major.
/// `true` marks a white module.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarkerBits {
    marker_size: usize,
    modules: Vec<bool>,
}

impl MarkerBits {
    /// Expand a packed code (row-major, white = 1) into a bordered module grid.
    pub fn from_code(code: u64, marker_size: usize) -> Self {
        let side = marker_size + 2;
        let mut modules = vec![false; side * side];
        for y in 0..marker_size {
            for x in 0..marker_size {
                let idx = y * marker_size + x;
                if (code >> idx) & 1 == 1 {
                    modules[(y + 1) * side + (x + 1)] = true;
                }
            }
        }
        Self {
            marker_size,
            modules,
        }
    }

    /// Inner bits per side (border excluded).
    #[inline]
    pub fn marker_size(&self) -> usize {
        self.marker_size
    }

    /// Modules per side (border included).
    #[inline]
    pub fn side(&self) -> usize {
        self.marker_size + 2
    }

    /// True if module `(x, y)` is white. Out-of-range modules read as black.
    #[inline]
    pub fn is_white(&self, x: usize, y: usize) -> bool {
        let side = self.side();
        x < side && y < side && self.modules[y * side + x]
    }

    /// Coordinates `(x, y)` of white modules in row-major order.
    pub fn white_modules(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let side = self.side();
        self.modules
            .iter()
            .enumerate()
            .filter(|(_, &white)| white)
            .map(move |(idx, _)| (idx % side, idx / side))
    }
}

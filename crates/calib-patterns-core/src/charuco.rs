//! ChArUco board layout helpers.

/// Marker bookkeeping for a `rows × cols` ChArUco board.
///
/// Follows the OpenCV convention: the top-left square is black, so markers
/// sit on squares with `(x + y)` odd, and marker ids run row-major over them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CharucoLayout {
    rows: u32,
    cols: u32,
}

impl CharucoLayout {
    pub fn new(rows: u32, cols: u32) -> Self {
        Self { rows, cols }
    }

    /// Number of markers on the board: one per white square.
    #[inline]
    pub fn marker_count(&self) -> usize {
        (self.rows as usize * self.cols as usize) / 2
    }

    /// Marker id printed on square `(x, y)`, if it is a white square.
    pub fn marker_id_at(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.cols || y >= self.rows || is_black_square(x, y) {
            return None;
        }
        // white squares before row y, then white squares left of x in row y
        let before_rows = (y as usize * self.cols as usize) / 2;
        let in_row = x as usize / 2;
        u32::try_from(before_rows + in_row).ok()
    }
}

/// Shared checkerboard parity: the top-left square is black.
#[inline]
pub fn is_black_square(x: u32, y: u32) -> bool {
    x % 2 == y % 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_ids_follow_white_squares_row_major() {
        for (rows, cols) in [(5, 6), (7, 5), (2, 2), (3, 3)] {
            let layout = CharucoLayout::new(rows, cols);
            let mut next = 0;
            for y in 0..rows {
                for x in 0..cols {
                    if is_black_square(x, y) {
                        assert_eq!(layout.marker_id_at(x, y), None);
                    } else {
                        assert_eq!(layout.marker_id_at(x, y), Some(next), "{rows}x{cols} ({x}, {y})");
                        next += 1;
                    }
                }
            }
            assert_eq!(next as usize, layout.marker_count());
            assert_eq!(layout.marker_id_at(cols, 0), None);
            assert_eq!(layout.marker_id_at(0, rows), None);
        }
    }

    #[test]
    fn first_markers_of_a_board() {
        let layout = CharucoLayout::new(5, 6);
        assert_eq!(layout.marker_id_at(1, 0), Some(0));
        assert_eq!(layout.marker_id_at(0, 1), Some(3));
        assert_eq!(layout.marker_id_at(2, 1), Some(4));
    }

    #[test]
    fn odd_boards_use_floor_half_markers() {
        assert_eq!(CharucoLayout::new(3, 3).marker_count(), 4);
        assert_eq!(CharucoLayout::new(11, 8).marker_count(), 44);
    }
}

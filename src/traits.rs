use num_traits::AsPrimitive;
use std::fmt::Debug;

/// The integer type used to store palette indices.
///
/// The width of the index type also decides how finely the color cube is quantized
/// in a [`PaletteIndex`](crate::PaletteIndex): wider indices support larger palettes
/// and use more bits per channel for each cell.
pub trait IndexWord: Copy + Default + Eq + Debug + Send + Sync + AsPrimitive<usize> + 'static {
    /// The number of bits kept from each 8-bit color channel when computing a cell.
    const CELL_BITS: u32;

    /// The maximum number of palette colors (including the sentinel at index `0`).
    const MAX_COLORS: usize;

    /// Converts a palette position into an index word.
    ///
    /// `index` must be less than [`IndexWord::MAX_COLORS`].
    fn from_index(index: usize) -> Self;

    /// The total number of cells in the quantized color cube.
    #[must_use]
    fn num_cells() -> usize {
        1 << (3 * Self::CELL_BITS)
    }
}

impl IndexWord for u8 {
    const CELL_BITS: u32 = 5;
    const MAX_COLORS: usize = u8::MAX as usize + 1;

    #[inline]
    fn from_index(index: usize) -> Self {
        debug_assert!(index < Self::MAX_COLORS);
        #[allow(clippy::cast_possible_truncation)]
        {
            index as u8
        }
    }
}

impl IndexWord for u16 {
    const CELL_BITS: u32 = 6;
    const MAX_COLORS: usize = u16::MAX as usize + 1;

    #[inline]
    fn from_index(index: usize) -> Self {
        debug_assert!(index < Self::MAX_COLORS);
        #[allow(clippy::cast_possible_truncation)]
        {
            index as u16
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_counts() {
        assert_eq!(u8::num_cells(), 0x8000);
        assert_eq!(u16::num_cells(), 0x40000);
    }

    #[test]
    fn round_trips_max_index() {
        let i: usize = u8::from_index(255).as_();
        assert_eq!(i, 255);
        let i: usize = u16::from_index(65535).as_();
        assert_eq!(i, 65535);
    }
}

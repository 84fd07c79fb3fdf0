//! Contains the dense nearest palette color lookup table.
//!
//! The color cube is quantized into cells by keeping the top `I::CELL_BITS` bits of each
//! channel, and every cell stores the index of the palette color nearest to the cell's
//! representative color under some [`ColorMetric`]. Looking up a color is then a single
//! table access.

use crate::{types::is_visible, ColorMetric, IndexWord, Palette};
use bitvec::vec::BitVec;
use palette::Srgba;
#[cfg(feature = "threads")]
use rayon::prelude::*;

/// The number of cells given to each task in [`PaletteIndex::build_par`].
#[cfg(feature = "threads")]
const PAR_CHUNK_SIZE: usize = 4096;

/// Returns the cell of a color when keeping `bits` bits per channel.
///
/// Cells are ordered with red as the most significant component.
#[must_use]
#[inline]
pub fn cell_of([r, g, b]: [u8; 3], bits: u32) -> usize {
    let shift = 8 - bits;
    let r = usize::from(r >> shift);
    let g = usize::from(g >> shift);
    let b = usize::from(b >> shift);
    (r << (2 * bits)) | (g << bits) | b
}

/// Returns the representative color of a cell.
///
/// Each quantized component is shifted back up with its high bits replicated into
/// the freed low bits, so the smallest cell maps to `0` and the largest cell maps to `255`.
#[must_use]
#[inline]
pub fn cell_color(cell: usize, bits: u32) -> [u8; 3] {
    debug_assert!((4..=8).contains(&bits));
    let mask = (1 << bits) - 1;
    let expand = |c: usize| {
        #[allow(clippy::cast_possible_truncation)]
        let v = ((c & mask) << (8 - bits)) as u8;
        v | (v >> bits)
    };
    [
        expand(cell >> (2 * bits)),
        expand(cell >> bits),
        expand(cell),
    ]
}

/// A palette color that was overwritten by another, different palette color in the same cell.
///
/// The color at `replaced` can no longer be produced by a lookup of its own exact color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Collision {
    /// The cell both colors fall into.
    pub cell: usize,
    /// The palette index that was overwritten.
    pub replaced: usize,
    /// The palette index that now occupies the cell.
    pub kept: usize,
}

/// A dense table mapping each cell of the quantized color cube to its nearest palette index.
///
/// The table is built once per palette and metric, and it must be rebuilt wholesale if either changes.
/// Every visible palette color resolves to a palette entry with the same color,
/// which is its own index unless a different color [collided](Collision) into its cell.
///
/// # Examples
/// ```
/// # use palettize::{Palette, PaletteIndex, Metric, ConfigError};
/// # use palette::{Srgb, Srgba};
/// # fn main() -> Result<(), ConfigError> {
/// let palette = Palette::<u8>::with_sentinel([Srgb::new(0, 0, 0), Srgb::new(255, 255, 255)])?;
/// let index = PaletteIndex::build(&palette, &Metric::WeightedRgb);
/// assert_eq!(index.index_of(Srgba::new(200, 210, 220, 255)), 2);
/// assert_eq!(index.index_of(Srgba::new(200, 210, 220, 0)), 0);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteIndex<I = u8> {
    /// The palette index of each cell.
    cells: Box<[I]>,
    /// The collisions that happened while writing exact hits.
    collisions: Vec<Collision>,
}

/// The intermediate state after writing the exact palette hits.
struct ExactHits<I> {
    /// The partially filled cells.
    cells: Vec<I>,
    /// Which cells have been written.
    filled: BitVec,
    /// The collisions seen so far.
    collisions: Vec<Collision>,
    /// The visible palette colors and their indices.
    visible: Vec<(usize, Srgba<u8>)>,
}

impl<I: IndexWord> ExactHits<I> {
    /// Writes the index of every visible palette color into the cell of its own color.
    fn new(palette: &Palette<I>) -> Self {
        let num_cells = I::num_cells();
        let mut cells = vec![I::from_index(0); num_cells];
        let mut filled: BitVec = BitVec::repeat(false, num_cells);
        let mut collisions = Vec::new();
        let visible = palette.visible().collect::<Vec<_>>();

        for &(i, color) in &visible {
            let cell = cell_of([color.red, color.green, color.blue], I::CELL_BITS);

            if filled[cell] {
                let prev = cells[cell].as_();
                if palette.colors()[prev] == color {
                    // identical colors keep the lowest index
                    continue;
                }

                log::warn!("palette colors {prev} and {i} share cell {cell}, keeping {i}");
                collisions.push(Collision { cell, replaced: prev, kept: i });
            }

            cells[cell] = I::from_index(i);
            filled.set(cell, true);
        }

        Self { cells, filled, collisions, visible }
    }

    /// Finishes the table, logging a summary.
    fn finish(self) -> PaletteIndex<I> {
        let Self { cells, filled, collisions, visible } = self;
        log::debug!(
            "built palette index with {} cells for {} visible colors ({} exact hits, {} collisions)",
            cells.len(),
            visible.len(),
            filled.count_ones(),
            collisions.len(),
        );
        PaletteIndex { cells: cells.into_boxed_slice(), collisions }
    }
}

/// Returns the visible palette index nearest to the given color.
///
/// Ties go to the lowest index.
#[inline]
fn nearest<I: IndexWord>(
    visible: &[(usize, Srgba<u8>)],
    metric: &dyn ColorMetric,
    [r, g, b]: [u8; 3],
) -> I {
    let mut min_index = visible.first().map_or(0, |&(i, _)| i);
    let mut min_diff = f64::INFINITY;
    for &(i, color) in visible {
        let diff = metric.difference_rgb(color, r, g, b);
        if diff < min_diff {
            min_diff = diff;
            min_index = i;
        }
    }
    I::from_index(min_index)
}

impl<I: IndexWord> PaletteIndex<I> {
    /// Builds the lookup table for the given palette and metric.
    ///
    /// Each visible palette color is first written into its own cell. If a cell already holds
    /// a different color, the later color wins and a [`Collision`] is recorded (see
    /// [`PaletteIndex::collisions`]). Every remaining cell then gets the palette color
    /// nearest to its representative color, with ties going to the lowest index.
    #[must_use]
    pub fn build(palette: &Palette<I>, metric: &dyn ColorMetric) -> Self {
        let mut hits = ExactHits::new(palette);

        for cell in hits.filled.iter_zeros() {
            hits.cells[cell] = nearest(&hits.visible, metric, cell_color(cell, I::CELL_BITS));
        }

        hits.finish()
    }

    /// Returns the palette index for the given color.
    ///
    /// Colors that are not visible map to the sentinel index `0`.
    #[must_use]
    #[inline]
    pub fn index_of(&self, color: Srgba<u8>) -> I {
        if is_visible(color) {
            self.index_of_rgb(color.red, color.green, color.blue)
        } else {
            I::from_index(0)
        }
    }

    /// Returns the palette index for the given opaque color.
    #[must_use]
    #[inline]
    pub fn index_of_rgb(&self, r: u8, g: u8, b: u8) -> I {
        self.cells[cell_of([r, g, b], I::CELL_BITS)]
    }

    /// Whether every cell holds a visible palette index.
    ///
    /// This is always `true` for a table returned by [`PaletteIndex::build`].
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.cells.len() == I::num_cells() && self.cells.iter().all(|i| i.as_() != 0)
    }

    /// Returns the palette colors that were overwritten by a different color in the same cell.
    #[must_use]
    pub fn collisions(&self) -> &[Collision] {
        &self.collisions
    }

    /// Returns the palette index of each cell.
    #[must_use]
    pub fn cells(&self) -> &[I] {
        &self.cells
    }
}

#[cfg(feature = "threads")]
impl<I: IndexWord> PaletteIndex<I> {
    /// Builds the lookup table in parallel.
    ///
    /// The result is identical to [`PaletteIndex::build`].
    #[must_use]
    pub fn build_par(palette: &Palette<I>, metric: &dyn ColorMetric) -> Self {
        let mut hits = ExactHits::new(palette);

        {
            let ExactHits { cells, filled, visible, .. } = &mut hits;
            let filled = &*filled;
            let visible = &*visible;

            cells
                .par_chunks_mut(PAR_CHUNK_SIZE)
                .enumerate()
                .for_each(|(chunk_i, chunk)| {
                    let start = chunk_i * PAR_CHUNK_SIZE;
                    for (i, index) in chunk.iter_mut().enumerate() {
                        let cell = start + i;
                        if !filled[cell] {
                            *index = nearest(visible, metric, cell_color(cell, I::CELL_BITS));
                        }
                    }
                });
        }

        hits.finish()
    }
}

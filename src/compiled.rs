//! Contains [`CompiledPalette`], the immutable unit shared by all ditherers.

use crate::{ColorMetric, IndexWord, Palette, PaletteIndex};
use palette::Srgba;
use std::{fmt::Debug, sync::Arc};

/// A palette together with the metric and the lookup table built from them.
///
/// A [`CompiledPalette`] never changes after it is built. To use a different palette or metric,
/// build a new one. It is cheap to share across threads behind an [`Arc`].
///
/// # Examples
/// ```
/// # use std::sync::Arc;
/// # use palettize::{CompiledPalette, Palette, Metric, ConfigError};
/// # use palette::{Srgb, Srgba};
/// # fn main() -> Result<(), ConfigError> {
/// let palette = Palette::<u8>::with_sentinel([Srgb::new(0, 0, 0), Srgb::new(255, 255, 255)])?;
/// let compiled = CompiledPalette::build(palette, Arc::new(Metric::default()));
/// assert_eq!(compiled.color(compiled.index_of(Srgba::new(20, 20, 20, 255))), Srgba::new(0, 0, 0, 255));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct CompiledPalette<I = u8> {
    /// The palette the table was built for.
    palette: Palette<I>,
    /// The metric the table was built with.
    metric: Arc<dyn ColorMetric>,
    /// The nearest color lookup table.
    index: PaletteIndex<I>,
}

impl<I: IndexWord> CompiledPalette<I> {
    /// Builds the lookup table for `palette` under `metric`.
    #[must_use]
    pub fn build(palette: Palette<I>, metric: Arc<dyn ColorMetric>) -> Self {
        let index = PaletteIndex::build(&palette, &*metric);
        Self { palette, metric, index }
    }

    /// Returns the palette.
    #[must_use]
    pub fn palette(&self) -> &Palette<I> {
        &self.palette
    }

    /// Returns the metric the lookup table was built with.
    #[must_use]
    pub fn metric(&self) -> &dyn ColorMetric {
        &*self.metric
    }

    /// Returns the lookup table.
    #[must_use]
    pub fn index(&self) -> &PaletteIndex<I> {
        &self.index
    }

    /// Returns the nearest palette index for a color, or `0` if the color is not visible.
    #[must_use]
    #[inline]
    pub fn index_of(&self, color: Srgba<u8>) -> I {
        self.index.index_of(color)
    }

    /// Returns the nearest palette index for an opaque color.
    #[must_use]
    #[inline]
    pub fn index_of_rgb(&self, r: u8, g: u8, b: u8) -> I {
        self.index.index_of_rgb(r, g, b)
    }

    /// Returns the palette color at the given index.
    #[must_use]
    #[inline]
    pub fn color(&self, index: I) -> Srgba<u8> {
        self.palette.get(index)
    }
}

#[cfg(feature = "threads")]
impl<I: IndexWord> CompiledPalette<I> {
    /// Builds the lookup table for `palette` under `metric` in parallel.
    ///
    /// The result is identical to [`CompiledPalette::build`].
    #[must_use]
    pub fn build_par(palette: Palette<I>, metric: Arc<dyn ColorMetric>) -> Self {
        let index = PaletteIndex::build_par(&palette, &*metric);
        Self { palette, metric, index }
    }
}

impl<I: IndexWord> Debug for CompiledPalette<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledPalette")
            .field("palette", &self.palette)
            .field("collisions", &self.index.collisions())
            .finish_non_exhaustive()
    }
}

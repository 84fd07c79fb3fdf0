//! Ordered dithering.

use super::{RowDitherer, ThresholdPattern};
use crate::{colorspace::clamp_u8, types::is_visible, CompiledPalette, IndexWord, Strength};
use palette::Srgba;

/// Ordered dithering: each pixel is offset by `(t - 0.5) * spread * strength`,
/// where `t` is the threshold of the pixel's position in a [`ThresholdPattern`].
///
/// Pixels do not depend on each other, so the result is the same when run in parallel.
/// With a tileable pattern, translating the input by a multiple of the pattern's period
/// translates the output by the same amount.
#[derive(Debug, Clone, PartialEq)]
pub struct Ordered {
    /// The threshold pattern.
    pattern: ThresholdPattern,
    /// The size of the offset range in 8-bit channel units.
    spread: f32,
}

impl Ordered {
    /// The default spread in channel units.
    pub const DEFAULT_SPREAD: f32 = 64.0;

    /// Creates a new [`Ordered`] ditherer with the default spread.
    #[must_use]
    pub const fn new(pattern: ThresholdPattern) -> Self {
        Self { pattern, spread: Self::DEFAULT_SPREAD }
    }

    /// Creates a new [`Ordered`] ditherer with the given spread.
    ///
    /// For example, a spread of `255.0` can move a pixel across the whole channel range,
    /// which suits black and white palettes.
    ///
    /// This will return `None` if `spread` is negative or not finite.
    #[must_use]
    pub fn with_spread(pattern: ThresholdPattern, spread: f32) -> Option<Self> {
        if spread.is_finite() && spread >= 0.0 {
            Some(Self { pattern, spread })
        } else {
            None
        }
    }

    /// Returns the threshold pattern.
    #[must_use]
    pub fn pattern(&self) -> &ThresholdPattern {
        &self.pattern
    }

    /// Returns the spread in channel units.
    #[must_use]
    pub const fn spread(&self) -> f32 {
        self.spread
    }
}

impl RowDitherer for Ordered {
    type Scratch = Vec<f32>;

    fn scratch(&self, width: usize) -> Self::Scratch {
        vec![0.5; width]
    }

    #[inline]
    fn dither_row<I: IndexWord>(
        &self,
        y: u32,
        pixels: &[Srgba<u8>],
        compiled: &CompiledPalette<I>,
        strength: Strength,
        indices: &mut [I],
        thresholds: &mut Self::Scratch,
    ) {
        let thresholds = &mut thresholds[..pixels.len()];
        self.pattern.fill_row(y, thresholds);
        let spread = self.spread * strength.get();

        for ((index, &pixel), &t) in indices.iter_mut().zip(pixels).zip(&*thresholds) {
            *index = if is_visible(pixel) {
                let offset = (t - 0.5) * spread;
                let [r, g, b] = [pixel.red, pixel.green, pixel.blue]
                    .map(|c| clamp_u8(f32::from(c) + offset));
                compiled.index_of_rgb(r, g, b)
            } else {
                I::from_index(0)
            };
        }
    }
}

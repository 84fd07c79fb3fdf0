//! Pattern dithering (Knoll's algorithm).
//!
//! For each pixel, a small plan of candidate palette colors is built whose average approximates
//! the source color. The candidates are sorted by luma, and the pixel's threshold picks one.

use super::{RowDitherer, ThresholdPattern};
use crate::{
    colorspace::clamp_u8, types::is_visible, CompiledPalette, ConfigError, IndexWord, Strength,
};
use ordered_float::OrderedFloat;
use palette::Srgba;
use std::array;

/// Pattern dithering with a fixed number of candidates per pixel.
///
/// More candidates give smoother mixes at a proportionally higher cost.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternDither {
    /// The number of candidates in each pixel's plan.
    candidates: usize,
    /// The threshold pattern used to pick a candidate.
    pattern: ThresholdPattern,
}

/// Returns the Rec. 601 luma of a color.
#[inline]
fn luma(color: Srgba<u8>) -> f32 {
    0.299 * f32::from(color.red) + 0.587 * f32::from(color.green) + 0.114 * f32::from(color.blue)
}

impl PatternDither {
    /// The maximum number of candidates.
    pub const MAX_CANDIDATES: usize = 256;

    /// Creates a new [`PatternDither`].
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidCandidates`] if `candidates` is not in `1..=256`.
    pub fn new(candidates: usize, pattern: ThresholdPattern) -> Result<Self, ConfigError> {
        if (1..=Self::MAX_CANDIDATES).contains(&candidates) {
            Ok(Self { candidates, pattern })
        } else {
            Err(ConfigError::InvalidCandidates(candidates))
        }
    }

    /// Returns the number of candidates per pixel.
    #[must_use]
    pub const fn candidates(&self) -> usize {
        self.candidates
    }

    /// Returns the threshold pattern.
    #[must_use]
    pub fn pattern(&self) -> &ThresholdPattern {
        &self.pattern
    }

    /// Builds the sorted candidate plan for one visible pixel.
    fn plan<I: IndexWord>(
        &self,
        pixel: Srgba<u8>,
        compiled: &CompiledPalette<I>,
        strength: f32,
        plan: &mut Vec<(OrderedFloat<f32>, usize)>,
    ) {
        let source = [pixel.red, pixel.green, pixel.blue].map(f32::from);
        let mut error = [0.0; 3];
        plan.clear();

        for _ in 0..self.candidates {
            let [r, g, b] = array::from_fn(|c| clamp_u8(source[c] + error[c] * strength));
            let index = compiled.index_of_rgb(r, g, b);
            let chosen = compiled.color(index);
            plan.push((OrderedFloat(luma(chosen)), index.as_()));

            let chosen = [chosen.red, chosen.green, chosen.blue].map(f32::from);
            for c in 0..3 {
                error[c] += source[c] - chosen[c];
            }
        }

        plan.sort_unstable();
    }
}

impl RowDitherer for PatternDither {
    type Scratch = (Vec<f32>, Vec<(OrderedFloat<f32>, usize)>);

    fn scratch(&self, width: usize) -> Self::Scratch {
        (vec![0.5; width], Vec::with_capacity(self.candidates))
    }

    fn dither_row<I: IndexWord>(
        &self,
        y: u32,
        pixels: &[Srgba<u8>],
        compiled: &CompiledPalette<I>,
        strength: Strength,
        indices: &mut [I],
        (thresholds, plan): &mut Self::Scratch,
    ) {
        let thresholds = &mut thresholds[..pixels.len()];
        self.pattern.fill_row(y, thresholds);
        let strength = strength.get();

        #[allow(clippy::cast_precision_loss)]
        let n = self.candidates as f32;

        for ((index, &pixel), &t) in indices.iter_mut().zip(pixels).zip(&*thresholds) {
            *index = if is_visible(pixel) {
                self.plan(pixel, compiled, strength, plan);
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let pick = ((t * n) as usize).min(self.candidates - 1);
                I::from_index(plan[pick].1)
            } else {
                I::from_index(0)
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dither::{BayerOrder, Ditherer},
        tests::*,
    };

    fn knoll(candidates: usize) -> Ditherer {
        #[allow(clippy::unwrap_used)]
        let pattern =
            PatternDither::new(candidates, ThresholdPattern::Bayer(BayerOrder::DEFAULT)).unwrap();
        Ditherer::Pattern(pattern)
    }

    #[test]
    fn candidate_bounds() {
        let pattern = ThresholdPattern::InterleavedGradient;
        assert_eq!(
            PatternDither::new(0, pattern.clone()),
            Err(ConfigError::InvalidCandidates(0))
        );
        assert_eq!(
            PatternDither::new(257, pattern.clone()),
            Err(ConfigError::InvalidCandidates(257))
        );
        assert!(PatternDither::new(256, pattern).is_ok());
    }

    #[test]
    fn plan_is_sorted_by_luma() {
        let compiled = compiled_black_white();
        #[allow(clippy::unwrap_used)]
        let dither = PatternDither::new(8, ThresholdPattern::InterleavedGradient).unwrap();
        let mut plan = Vec::new();
        dither.plan(Srgba::new(128, 128, 128, 255), &compiled, 1.0, &mut plan);

        assert_eq!(plan.len(), 8);
        assert!(plan.windows(2).all(|w| w[0] <= w[1]));
        // the plan averages to mid gray
        let whites = plan.iter().filter(|&&(_, i)| i == 2).count();
        assert_eq!(whites, 4);
    }

    #[test]
    fn mid_gray_mixes_black_and_white() {
        let compiled = compiled_black_white();
        let pixels = vec![Srgba::new(128, 128, 128, 255); 8 * 8];
        let output = knoll(16).dither(image_ref(8, 8, &pixels), &compiled, Strength::DEFAULT);
        let whites = output.indices().iter().filter(|&&i| i == 2).count();
        assert!((24..=40).contains(&whites), "{whites}");
    }

    #[test]
    fn zero_strength_plan_is_solid() {
        let compiled = compiled_web_safe();
        #[allow(clippy::unwrap_used)]
        let dither = PatternDither::new(4, ThresholdPattern::InterleavedGradient).unwrap();
        let mut plan = Vec::new();
        for pixel in test_pixels(100, 12) {
            dither.plan(pixel, &compiled, 0.0, &mut plan);
            let solid = usize::from(compiled.index_of(pixel));
            assert!(plan.iter().all(|&(_, i)| i == solid));
        }
    }
}

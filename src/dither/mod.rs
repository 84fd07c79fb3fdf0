//! Contains the dithering strategies.
//!
//! Every strategy maps each visible pixel to a palette index using a [`CompiledPalette`],
//! and maps every pixel with an alpha below [`VISIBLE_ALPHA`](crate::VISIBLE_ALPHA)
//! to the sentinel index `0`. The strategies differ in how they perturb pixels before the lookup:
//! - [`Ditherer::Solid`] does not perturb pixels at all.
//! - [`Ordered`] adds an offset from a [`ThresholdPattern`].
//! - [`ErrorDiffusion`] spreads each pixel's quantization error to its neighbors.
//! - [`PatternDither`] picks one of several candidate colors using a [`ThresholdPattern`].

mod diffusion;
pub mod kernel;
mod ordered;
mod pattern;
mod solid;
mod threshold;

pub use diffusion::{ErrorDiffusion, NoiseDiffusion};
pub use kernel::Kernel;
pub use ordered::Ordered;
pub use pattern::PatternDither;
pub use threshold::{BayerOrder, ThresholdPattern, ThresholdTile};

use crate::{CompiledPalette, ImageRef, IndexWord, IndexedImage, Strength};
use palette::Srgba;
#[cfg(feature = "threads")]
use rayon::prelude::*;
use solid::Solid;

/// A ditherer whose rows can be processed independently of each other.
trait RowDitherer {
    /// Reusable per row working memory.
    type Scratch: Send;

    /// Allocates working memory for rows of the given width.
    fn scratch(&self, width: usize) -> Self::Scratch;

    /// Dithers row `y` of the image into `indices`.
    fn dither_row<I: IndexWord>(
        &self,
        y: u32,
        pixels: &[Srgba<u8>],
        compiled: &CompiledPalette<I>,
        strength: Strength,
        indices: &mut [I],
        scratch: &mut Self::Scratch,
    );
}

/// Dithers every row of `image` into `indices`, one row after another.
fn dither_rows<I: IndexWord>(
    ditherer: &impl RowDitherer,
    image: ImageRef,
    compiled: &CompiledPalette<I>,
    strength: Strength,
    indices: &mut [I],
) {
    let width = image.width() as usize;
    let mut scratch = ditherer.scratch(width);
    for (y, (indices, pixels)) in (0..).zip(
        indices
            .chunks_exact_mut(width)
            .zip(image.pixels().chunks_exact(width)),
    ) {
        ditherer.dither_row(y, pixels, compiled, strength, indices, &mut scratch);
    }
}

/// Dithers every row of `image` into `indices` in parallel.
#[cfg(feature = "threads")]
fn dither_rows_par<I: IndexWord>(
    ditherer: &(impl RowDitherer + Sync),
    image: ImageRef,
    compiled: &CompiledPalette<I>,
    strength: Strength,
    indices: &mut [I],
) {
    let width = image.width() as usize;
    indices
        .par_chunks_exact_mut(width)
        .zip(image.pixels().par_chunks_exact(width))
        .enumerate()
        .for_each_init(
            || ditherer.scratch(width),
            |scratch, (y, (indices, pixels))| {
                #[allow(clippy::cast_possible_truncation)]
                let y = y as u32;
                ditherer.dither_row(y, pixels, compiled, strength, indices, scratch);
            },
        );
}

/// A dithering strategy.
///
/// # Examples
/// ```
/// # use std::sync::Arc;
/// # use palettize::{
/// #     dither::{kernel, Ditherer, ErrorDiffusion},
/// #     CompiledPalette, ConfigError, ImageRef, Metric, Palette, Strength,
/// # };
/// # use palette::{Srgb, Srgba};
/// # fn main() -> Result<(), ConfigError> {
/// let palette = Palette::<u8>::with_sentinel([Srgb::new(0, 0, 0), Srgb::new(255, 255, 255)])?;
/// let compiled = CompiledPalette::build(palette, Arc::new(Metric::default()));
///
/// let pixels = vec![Srgba::new(128, 128, 128, 255); 4];
/// let image = ImageRef::new(2, 2, &pixels)?;
///
/// let ditherer = Ditherer::Diffusion(ErrorDiffusion::new(kernel::FLOYD_STEINBERG));
/// let output = ditherer.dither(image, &compiled, Strength::DEFAULT);
/// assert_eq!(output.indices(), &[2, 1, 1, 2]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Ditherer {
    /// Map each pixel to its nearest palette color without dithering.
    Solid,
    /// Ordered dithering.
    Ordered(Ordered),
    /// Error diffusion dithering.
    Diffusion(ErrorDiffusion),
    /// Pattern dithering.
    Pattern(PatternDither),
}

impl Default for Ditherer {
    fn default() -> Self {
        Self::Diffusion(ErrorDiffusion::new(kernel::FLOYD_STEINBERG))
    }
}

impl From<Ordered> for Ditherer {
    fn from(ordered: Ordered) -> Self {
        Self::Ordered(ordered)
    }
}

impl From<ErrorDiffusion> for Ditherer {
    fn from(diffusion: ErrorDiffusion) -> Self {
        Self::Diffusion(diffusion)
    }
}

impl From<PatternDither> for Ditherer {
    fn from(pattern: PatternDither) -> Self {
        Self::Pattern(pattern)
    }
}

impl Ditherer {
    /// Whether this ditherer processes rows independently and so benefits from row parallelism.
    #[must_use]
    pub const fn is_row_parallel(&self) -> bool {
        !matches!(self, Ditherer::Diffusion(_))
    }

    /// Maps `image` to palette indices.
    ///
    /// A `strength` of zero gives the same result as [`Ditherer::Solid`].
    #[must_use]
    pub fn dither<I: IndexWord>(
        &self,
        image: ImageRef,
        compiled: &CompiledPalette<I>,
        strength: Strength,
    ) -> IndexedImage<I> {
        let mut indices = vec![I::from_index(0); image.num_pixels()];

        if !image.is_empty() {
            match self {
                _ if strength.is_none() => {
                    dither_rows(&Solid, image, compiled, strength, &mut indices);
                }
                Ditherer::Solid => dither_rows(&Solid, image, compiled, strength, &mut indices),
                Ditherer::Ordered(ordered) => {
                    dither_rows(ordered, image, compiled, strength, &mut indices);
                }
                Ditherer::Diffusion(diffusion) => {
                    diffusion.dither_into(image, compiled, strength, &mut indices);
                }
                Ditherer::Pattern(pattern) => {
                    dither_rows(pattern, image, compiled, strength, &mut indices);
                }
            }
        }

        let (width, height) = image.dimensions();
        IndexedImage::new_unchecked(width, height, compiled.palette().shared(), indices)
    }
}

#[cfg(feature = "threads")]
impl Ditherer {
    /// Maps `image` to palette indices, processing rows in parallel where possible.
    ///
    /// Error diffusion runs sequentially, since each pixel depends on the ones before it.
    /// The result is identical to [`Ditherer::dither`].
    #[must_use]
    pub fn dither_par<I: IndexWord>(
        &self,
        image: ImageRef,
        compiled: &CompiledPalette<I>,
        strength: Strength,
    ) -> IndexedImage<I> {
        let mut indices = vec![I::from_index(0); image.num_pixels()];

        if !image.is_empty() {
            match self {
                _ if strength.is_none() => {
                    dither_rows_par(&Solid, image, compiled, strength, &mut indices);
                }
                Ditherer::Solid => dither_rows_par(&Solid, image, compiled, strength, &mut indices),
                Ditherer::Ordered(ordered) => {
                    dither_rows_par(ordered, image, compiled, strength, &mut indices);
                }
                Ditherer::Diffusion(diffusion) => {
                    diffusion.dither_into(image, compiled, strength, &mut indices);
                }
                Ditherer::Pattern(pattern) => {
                    dither_rows_par(pattern, image, compiled, strength, &mut indices);
                }
            }
        }

        let (width, height) = image.dimensions();
        IndexedImage::new_unchecked(width, height, compiled.palette().shared(), indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::*;
    use std::sync::Arc;

    #[allow(clippy::unwrap_used)]
    fn all_ditherers() -> Vec<Ditherer> {
        let values = [
            0, 136, 34, 170, 204, 68, 238, 102, 51, 187, 17, 153, 255, 119, 221, 85,
        ];
        let tile = Arc::new(ThresholdTile::from_u8(4, 4, &values).unwrap());

        vec![
            Ditherer::Solid,
            Ordered::new(ThresholdPattern::InterleavedGradient).into(),
            Ordered::new(ThresholdPattern::Bayer(BayerOrder::DEFAULT)).into(),
            Ordered::new(ThresholdPattern::Tile(tile)).into(),
            Ordered::new(ThresholdPattern::WhiteNoise { seed: 3 }).into(),
            ErrorDiffusion::new(kernel::FLOYD_STEINBERG).into(),
            ErrorDiffusion::new(kernel::ATKINSON).with_serpentine(false).into(),
            ErrorDiffusion::new(kernel::STUCKI).with_space(crate::ColorSpace::Oklab).into(),
            PatternDither::new(8, ThresholdPattern::Bayer(BayerOrder::DEFAULT)).unwrap().into(),
        ]
    }

    #[test]
    fn output_is_closed_over_palette() {
        let compiled = compiled_random(20, 4);
        let pixels = test_pixels_with_alpha(37 * 23, 6);
        let image = image_ref(37, 23, &pixels);

        for ditherer in all_ditherers() {
            let output = ditherer.dither(image, &compiled, Strength::DEFAULT);
            assert_eq!(output.dimensions(), (37, 23));
            assert_eq!(output.palette(), compiled.palette().colors());
            for (&pixel, &index) in pixels.iter().zip(output.indices()) {
                let index = usize::from(index);
                assert!(index < compiled.palette().len());
                if pixel.alpha < 128 {
                    assert_eq!(index, 0, "{ditherer:?}");
                } else {
                    assert!(crate::is_visible(compiled.palette().colors()[index]), "{ditherer:?}");
                }
            }
        }
    }

    #[test]
    fn zero_strength_is_solid() {
        let compiled = compiled_random(20, 5);
        let pixels = test_pixels_with_alpha(31 * 17, 7);
        let image = image_ref(31, 17, &pixels);
        let solid = Ditherer::Solid.dither(image, &compiled, Strength::DEFAULT);

        for ditherer in all_ditherers() {
            let output = ditherer.dither(image, &compiled, Strength::NONE);
            assert_eq!(output.indices(), solid.indices(), "{ditherer:?}");
        }
    }

    #[test]
    fn deterministic() {
        let compiled = compiled_random(16, 6);
        let pixels = test_pixels(29 * 19, 8);
        let image = image_ref(29, 19, &pixels);

        for ditherer in all_ditherers() {
            let a = ditherer.dither(image, &compiled, Strength::DEFAULT);
            let b = ditherer.dither(image, &compiled, Strength::DEFAULT);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn empty_image() {
        let compiled = compiled_black_white();
        let image = image_ref(0, 0, &[]);
        for ditherer in all_ditherers() {
            assert!(ditherer.dither(image, &compiled, Strength::DEFAULT).indices().is_empty());
        }
    }

    #[cfg(feature = "threads")]
    #[test]
    fn parallel_matches_serial() {
        let compiled = compiled_random(32, 9);
        let pixels = test_pixels_with_alpha(64 * 45, 10);
        let image = image_ref(64, 45, &pixels);

        for ditherer in all_ditherers() {
            let serial = ditherer.dither(image, &compiled, Strength::DEFAULT);
            let parallel = ditherer.dither_par(image, &compiled, Strength::DEFAULT);
            assert_eq!(serial, parallel, "{ditherer:?}");
        }
    }
}

//! Nearest color mapping without any dithering.

use super::RowDitherer;
use crate::{CompiledPalette, IndexWord, Strength};
use palette::Srgba;

/// Maps each pixel straight to its nearest palette color.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Solid;

impl RowDitherer for Solid {
    type Scratch = ();

    fn scratch(&self, _width: usize) -> Self::Scratch {}

    #[inline]
    fn dither_row<I: IndexWord>(
        &self,
        _y: u32,
        pixels: &[Srgba<u8>],
        compiled: &CompiledPalette<I>,
        _strength: Strength,
        indices: &mut [I],
        _scratch: &mut Self::Scratch,
    ) {
        for (index, &pixel) in indices.iter_mut().zip(pixels) {
            *index = compiled.index_of(pixel);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{dither::Ditherer, tests::*, Strength};

    #[test]
    fn solid_is_idempotent() {
        let compiled = compiled_web_safe();
        let pixels = test_pixels(64 * 48, 5);
        let image = image_ref(64, 48, &pixels);

        let once = Ditherer::Solid.dither(image, &compiled, Strength::DEFAULT);
        let colors = once.colors().collect::<Vec<_>>();
        let image = image_ref(64, 48, &colors);
        let twice = Ditherer::Solid.dither(image, &compiled, Strength::DEFAULT);

        assert_eq!(once.indices(), twice.indices());
    }

    #[test]
    fn transparent_pixels_map_to_sentinel() {
        let compiled = compiled_web_safe();
        let pixels = test_pixels_with_alpha(32 * 32, 9);
        let image = image_ref(32, 32, &pixels);
        let output = Ditherer::Solid.dither(image, &compiled, Strength::DEFAULT);

        for (&pixel, &index) in pixels.iter().zip(output.indices()) {
            assert_eq!(pixel.alpha < 128, index == 0);
        }
    }
}

#![allow(clippy::unwrap_used, clippy::missing_docs_in_private_items)]

use crate::{CompiledPalette, ImageRef, IndexWord, Metric, Palette};
use palette::{Srgb, Srgba};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoroshiro128PlusPlus;
use std::sync::Arc;

/// The 216 color web safe palette, preceded by the sentinel.
pub fn web_safe_palette<I: IndexWord>() -> Palette<I> {
    let steps = (0..=255).step_by(51);
    let colors = steps.clone().flat_map(|r| {
        let steps = steps.clone();
        steps.clone().flat_map(move |g| steps.clone().map(move |b| Srgb::new(r, g, b)))
    });
    Palette::with_sentinel(colors).unwrap()
}

/// `k` random opaque colors, preceded by the sentinel.
pub fn random_palette<I: IndexWord>(k: usize, seed: u64) -> Palette<I> {
    let mut rng = Xoroshiro128PlusPlus::seed_from_u64(seed);
    let colors = (0..k)
        .map(|_| Srgb::new(rng.gen(), rng.gen(), rng.gen()))
        .collect::<Vec<_>>();
    Palette::with_sentinel(colors).unwrap()
}

pub fn test_pixels(n: usize, seed: u64) -> Vec<Srgba<u8>> {
    let mut rng = Xoroshiro128PlusPlus::seed_from_u64(seed);
    (0..n)
        .map(|_| Srgba::new(rng.gen(), rng.gen(), rng.gen(), 255))
        .collect()
}

/// Random pixels where roughly a quarter are below the visibility threshold.
pub fn test_pixels_with_alpha(n: usize, seed: u64) -> Vec<Srgba<u8>> {
    let mut rng = Xoroshiro128PlusPlus::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let alpha = if rng.gen_ratio(1, 4) {
                rng.gen_range(0..128)
            } else {
                rng.gen_range(128..=255)
            };
            Srgba::new(rng.gen(), rng.gen(), rng.gen(), alpha)
        })
        .collect()
}

pub fn image_ref(width: u32, height: u32, pixels: &[Srgba<u8>]) -> ImageRef<'_> {
    ImageRef::new(width, height, pixels).unwrap()
}

pub fn compiled_web_safe() -> CompiledPalette<u8> {
    CompiledPalette::build(web_safe_palette(), Arc::new(Metric::default()))
}

/// The sentinel followed by black and white, compared with the redmean metric.
pub fn compiled_black_white() -> CompiledPalette<u8> {
    let palette = Palette::with_sentinel([Srgb::new(0, 0, 0), Srgb::new(255, 255, 255)]).unwrap();
    CompiledPalette::build(palette, Arc::new(Metric::WeightedRgb))
}

pub fn compiled_random(k: usize, seed: u64) -> CompiledPalette<u8> {
    CompiledPalette::build(random_palette(k, seed), Arc::new(Metric::default()))
}

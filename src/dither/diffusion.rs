//! Error diffusion dithering.
//!
//! Pixels are visited in scan order. The quantization error of each pixel is spread to its
//! unvisited neighbors according to a [`Kernel`], so error diffusion is inherently sequential
//! within an image.

use super::{Kernel, ThresholdPattern};
use crate::{types::is_visible, ColorSpace, CompiledPalette, ImageRef, IndexWord, Strength};
use palette::Srgba;
use std::array;

/// Extra threshold noise added to each pixel before error diffusion.
///
/// This breaks up the regular "worm" artifacts that error diffusion produces in flat regions.
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseDiffusion {
    /// The noise source.
    pub pattern: ThresholdPattern,
    /// The size of the noise range in 8-bit channel units.
    pub amount: f32,
}

/// Error diffusion with a configurable kernel, scan order, and working color space.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorDiffusion {
    /// The diffusion kernel.
    kernel: Kernel,
    /// Whether to alternate the scan direction on every other row.
    serpentine: bool,
    /// The color space the error accumulates in.
    space: ColorSpace,
    /// Optional noise added before each lookup.
    noise: Option<NoiseDiffusion>,
}

impl ErrorDiffusion {
    /// Creates a new serpentine [`ErrorDiffusion`] in sRGB without noise.
    #[must_use]
    pub const fn new(kernel: Kernel) -> Self {
        Self { kernel, serpentine: true, space: ColorSpace::Srgb, noise: None }
    }

    /// Sets whether odd rows are scanned right to left.
    #[must_use]
    pub const fn with_serpentine(mut self, serpentine: bool) -> Self {
        self.serpentine = serpentine;
        self
    }

    /// Sets the color space the error accumulates in.
    ///
    /// In [`ColorSpace::Oklab`], the error is perceptually weighted,
    /// and each perturbed color is converted back to sRGB for the palette lookup.
    #[must_use]
    pub const fn with_space(mut self, space: ColorSpace) -> Self {
        self.space = space;
        self
    }

    /// Adds noise to each pixel before its lookup.
    #[must_use]
    pub fn with_noise(mut self, noise: NoiseDiffusion) -> Self {
        self.noise = Some(noise);
        self
    }

    /// Returns the kernel.
    #[must_use]
    pub const fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    /// Whether odd rows are scanned right to left.
    #[must_use]
    pub const fn is_serpentine(&self) -> bool {
        self.serpentine
    }

    /// Returns the color space the error accumulates in.
    #[must_use]
    pub const fn space(&self) -> ColorSpace {
        self.space
    }

    /// Returns the noise options, if any.
    #[must_use]
    pub const fn noise(&self) -> Option<&NoiseDiffusion> {
        self.noise.as_ref()
    }
}

/// Rolling buffer of the error propagated to the current row and the rows below it.
///
/// Each row is padded on both sides by the kernel's reach,
/// so error that falls off the image is written to the padding and dropped.
struct ErrorRows {
    /// The horizontal padding on each side of a row.
    reach: usize,
    /// `max_dy + 1` rows, with the current row first.
    rows: Vec<Vec<[f32; 3]>>,
}

impl ErrorRows {
    /// Creates a zeroed buffer for rows of the given width.
    fn new(width: usize, kernel: &Kernel) -> Self {
        let reach = kernel.reach();
        let rows = (0..=kernel.max_dy())
            .map(|_| vec![[0.0; 3]; width + 2 * reach])
            .collect();

        Self { reach, rows }
    }

    /// Returns the error accumulated for pixel `x` of the current row.
    #[inline]
    fn get(&self, x: usize) -> [f32; 3] {
        self.rows[0][x + self.reach]
    }

    /// Adds `weight * err` to the pixel at `(x + dx, dy)` relative to the current row.
    #[inline]
    fn add(&mut self, x: usize, dx: i32, dy: usize, weight: f32, err: [f32; 3]) {
        let i = (x + self.reach).wrapping_add_signed(dx as isize);
        let slot = &mut self.rows[dy][i];
        for c in 0..3 {
            slot[c] += weight * err[c];
        }
    }

    /// Rotates the rows up by one and clears the new last row.
    #[inline]
    fn next_row(&mut self) {
        self.rows.rotate_left(1);
        if let Some(last) = self.rows.last_mut() {
            last.fill([0.0; 3]);
        }
    }
}

/// The per image state for diffusing one pixel at a time.
struct Diffuser<'a, I> {
    /// The palette and its lookup table.
    compiled: &'a CompiledPalette<I>,
    /// The working color space.
    space: ColorSpace,
    /// The forward kernel entries with normalized weights.
    taps: Vec<(i32, usize, f32)>,
    /// The bound on each residual component.
    limits: [f32; 3],
    /// The dither strength.
    strength: f32,
    /// The noise amount in working space units, already scaled by strength.
    noise: [f32; 3],
}

impl<'a, I: IndexWord> Diffuser<'a, I> {
    /// Prepares diffusion for one image.
    fn new(diffusion: &ErrorDiffusion, compiled: &'a CompiledPalette<I>, strength: f32) -> Self {
        let space = diffusion.space;
        let ranges = space.f32_component_ranges_from_srgb();
        let limits = ranges.map(|(low, high)| high - low);
        let divisor = f32::from(diffusion.kernel.divisor());

        let taps = diffusion
            .kernel
            .forward_entries()
            .map(|(dx, dy, weight)| (dx, dy.unsigned_abs() as usize, f32::from(weight) / divisor))
            .collect();

        let amount = diffusion.noise.as_ref().map_or(0.0, |noise| noise.amount) * strength;
        let noise = limits.map(|limit| amount * limit / 255.0);

        Self { compiled, space, taps, limits, strength, noise }
    }

    /// Dithers the pixel at `x` and diffuses its error. `flip` mirrors the horizontal offsets.
    #[inline]
    fn pixel(&self, x: usize, pixel: Srgba<u8>, t: f32, errors: &mut ErrorRows, flip: i32) -> I {
        if !is_visible(pixel) {
            return I::from_index(0);
        }

        let Self { compiled, space, limits, strength, noise, .. } = *self;

        let source = space.from_srgb(pixel.color);
        let err = errors.get(x);
        let offset = t - 0.5;
        let value = space.clamp(array::from_fn(|c| source[c] + err[c] + offset * noise[c]));

        let rgb = space.to_srgb(value);
        let index = compiled.index_of_rgb(rgb.red, rgb.green, rgb.blue);
        let chosen = space.from_srgb(compiled.color(index).color);

        let residual =
            array::from_fn(|c| (value[c] - chosen[c]).clamp(-limits[c], limits[c]) * strength);
        for &(dx, dy, weight) in &self.taps {
            errors.add(x, dx * flip, dy, weight, residual);
        }

        index
    }
}

impl ErrorDiffusion {
    /// Dithers `image` into `indices`, which must have one entry per pixel.
    pub(crate) fn dither_into<I: IndexWord>(
        &self,
        image: ImageRef,
        compiled: &CompiledPalette<I>,
        strength: Strength,
        indices: &mut [I],
    ) {
        let width = image.width() as usize;
        if width == 0 {
            return;
        }

        let diffuser = Diffuser::new(self, compiled, strength.get());
        let mut errors = ErrorRows::new(width, &self.kernel);
        let mut thresholds = vec![0.5; width];

        for (y, (indices, pixels)) in (0..).zip(
            indices
                .chunks_exact_mut(width)
                .zip(image.pixels().chunks_exact(width)),
        ) {
            if let Some(noise) = &self.noise {
                noise.pattern.fill_row(y, &mut thresholds);
            }

            if self.serpentine && y % 2 == 1 {
                for (x, (index, &pixel)) in indices.iter_mut().zip(pixels).enumerate().rev() {
                    *index = diffuser.pixel(x, pixel, thresholds[x], &mut errors, -1);
                }
            } else {
                for (x, (index, &pixel)) in indices.iter_mut().zip(pixels).enumerate() {
                    *index = diffuser.pixel(x, pixel, thresholds[x], &mut errors, 1);
                }
            }

            errors.next_row();
        }
    }
}

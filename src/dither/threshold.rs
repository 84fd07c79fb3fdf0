//! Threshold patterns shared by ordered dithering, noisy error diffusion, and pattern dithering.
//!
//! A pattern gives each pixel a threshold in `0.0..1.0`. Over a neighborhood the thresholds
//! are roughly uniformly distributed, so `t - 0.5` averages to zero.

use crate::ConfigError;
use rand::{prelude::Distribution, SeedableRng};
use rand_distr::Uniform;
use rand_xoshiro::Xoroshiro128PlusPlus;
use std::{fmt::Display, sync::Arc};

/// The order of a Bayer matrix, in `1..=6`.
///
/// A Bayer matrix of order `n` is `2^n` by `2^n` pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u32", into = "u32"))]
#[repr(transparent)]
pub struct BayerOrder(u32);

impl BayerOrder {
    /// The 8x8 Bayer matrix.
    pub const DEFAULT: Self = Self(3);

    /// The maximum supported order, giving a 64x64 matrix.
    pub const MAX: u32 = 6;

    /// Creates a new [`BayerOrder`].
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidBayerOrder`] if `order` is not in `1..=6`.
    pub const fn new(order: u32) -> Result<Self, ConfigError> {
        if 1 <= order && order <= Self::MAX {
            Ok(Self(order))
        } else {
            Err(ConfigError::InvalidBayerOrder(order))
        }
    }

    /// Gets the inner `u32` value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Returns the width and height of the matrix.
    #[must_use]
    pub const fn size(self) -> u32 {
        1 << self.0
    }
}

impl Default for BayerOrder {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u32> for BayerOrder {
    type Error = ConfigError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BayerOrder> for u32 {
    fn from(order: BayerOrder) -> Self {
        order.get()
    }
}

impl Display for BayerOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A tileable table of thresholds, for example a blue noise texture.
///
/// The tile is repeated across the image, so pixel `(x, y)` uses the value at
/// `(x mod width, y mod height)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdTile {
    /// The width of the tile.
    width: u32,
    /// The height of the tile.
    height: u32,
    /// The thresholds in row-major order, each in `0.0..=1.0`.
    values: Box<[f32]>,
}

impl ThresholdTile {
    /// Validates the dimensions of a tile.
    fn check(width: u32, height: u32, len: usize) -> Result<(), ConfigError> {
        if width == 0 || height == 0 || width as usize * height as usize != len {
            Err(ConfigError::InvalidThresholdTile { width, height, len })
        } else {
            Ok(())
        }
    }

    /// Creates a tile from 8-bit values, where `0` is the lowest and `255` the highest threshold.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidThresholdTile`] if the tile is empty
    /// or `values.len() != width * height`.
    pub fn from_u8(width: u32, height: u32, values: &[u8]) -> Result<Self, ConfigError> {
        Self::check(width, height, values.len())?;
        let values = values.iter().map(|&v| (f32::from(v) + 0.5) / 256.0).collect();
        Ok(Self { width, height, values })
    }

    /// Creates a tile from floating point values in `0.0..=1.0`.
    ///
    /// Values outside of this range are clamped, and `NAN` is replaced by `0.5`.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidThresholdTile`] if the tile is empty
    /// or `values.len() != width * height`.
    pub fn from_f32(width: u32, height: u32, values: &[f32]) -> Result<Self, ConfigError> {
        Self::check(width, height, values.len())?;
        let values = values
            .iter()
            .map(|&v| if v.is_nan() { 0.5 } else { v.clamp(0.0, 1.0) })
            .collect();

        Ok(Self { width, height, values })
    }

    /// Returns the width of the tile.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height of the tile.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Returns the threshold for the pixel at `(x, y)`.
    #[must_use]
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> f32 {
        let x = (x % self.width) as usize;
        let y = (y % self.height) as usize;
        self.values[y * self.width as usize + x]
    }
}

/// The source of per pixel thresholds.
#[derive(Debug, Clone, PartialEq)]
pub enum ThresholdPattern {
    /// Interleaved gradient noise (Jimenez): a cheap, aperiodic pattern
    /// with most of its energy at high frequencies.
    InterleavedGradient,
    /// A recursive Bayer matrix of the given order.
    Bayer(BayerOrder),
    /// A user provided tile, typically blue noise.
    Tile(Arc<ThresholdTile>),
    /// Uniform white noise, seeded separately for each row.
    WhiteNoise {
        /// The base seed. Each row mixes in its own `y` coordinate.
        seed: u64,
    },
}

/// Interleaved gradient noise.
#[inline]
fn interleaved_gradient(x: u32, y: u32) -> f32 {
    #[allow(clippy::cast_precision_loss)]
    let (x, y) = (x as f32, y as f32);
    (52.982_92 * (0.067_110_56 * x + 0.005_837_15 * y).fract()).fract()
}

/// The normalized value of a Bayer matrix of the given order at `(x, y)`.
///
/// The matrix entry is the bit reversal of the interleaved bits of `x ^ y` and `y`.
#[inline]
fn bayer(x: u32, y: u32, order: u32) -> f32 {
    let xor = x ^ y;
    let mut v = 0;
    for bit in 0..order {
        v = (v << 2) | (((xor >> bit) & 1) << 1) | ((y >> bit) & 1);
    }

    #[allow(clippy::cast_precision_loss)]
    {
        (v as f32 + 0.5) / (1u32 << (2 * order)) as f32
    }
}

impl ThresholdPattern {
    /// Writes the thresholds of row `y` into `row`, one value per pixel starting at `x = 0`.
    pub fn fill_row(&self, y: u32, row: &mut [f32]) {
        match self {
            ThresholdPattern::InterleavedGradient => {
                for (x, t) in (0..).zip(row) {
                    *t = interleaved_gradient(x, y);
                }
            }
            &ThresholdPattern::Bayer(order) => {
                let order = order.get();
                for (x, t) in (0..).zip(row) {
                    *t = bayer(x, y, order);
                }
            }
            ThresholdPattern::Tile(tile) => {
                for (x, t) in (0..).zip(row) {
                    *t = tile.get(x, y);
                }
            }
            &ThresholdPattern::WhiteNoise { seed } => {
                let rng = &mut Xoroshiro128PlusPlus::seed_from_u64(seed ^ u64::from(y));
                let distribution = Uniform::new(0.0, 1.0);
                for t in row {
                    *t = distribution.sample(rng);
                }
            }
        }
    }

    /// Returns the `(width, height)` after which this pattern repeats, if it is tileable.
    #[must_use]
    pub fn period(&self) -> Option<(u32, u32)> {
        match self {
            ThresholdPattern::Bayer(order) => Some((order.size(), order.size())),
            ThresholdPattern::Tile(tile) => Some((tile.width(), tile.height())),
            ThresholdPattern::InterleavedGradient | ThresholdPattern::WhiteNoise { .. } => None,
        }
    }
}

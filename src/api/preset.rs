//! Contains [`Preset`], the named ditherer configurations.

use crate::{
    dither::{
        kernel, BayerOrder, Ditherer, ErrorDiffusion, NoiseDiffusion, Ordered, PatternDither,
        ThresholdPattern, ThresholdTile,
    },
    ColorSpace, ConfigError,
};
use std::{fmt::Display, str::FromStr, sync::Arc};

/// The noise amount used by the noisy error diffusion presets.
const NOISE_AMOUNT: f32 = 32.0;

/// The number of candidates used by the larger pattern dither presets.
const KNOLL_CANDIDATES: usize = 16;

/// A named ditherer configuration.
///
/// Every preset maps to a [`Ditherer`] through [`Preset::ditherer`].
/// Presets can also be parsed from and displayed as their kebab-case names.
///
/// # Examples
/// ```
/// # use palettize::{Preset, ConfigError};
/// # fn main() -> Result<(), ConfigError> {
/// let preset: Preset = "sierra-lite".parse()?;
/// assert_eq!(preset, Preset::SierraLite);
/// assert_eq!(preset.to_string(), "sierra-lite");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Preset {
    /// No dithering.
    Solid,
    /// Floyd-Steinberg error diffusion.
    #[default]
    FloydSteinberg,
    /// Burkes error diffusion.
    Burkes,
    /// Sierra Lite error diffusion.
    SierraLite,
    /// Atkinson error diffusion, which only propagates 3/4 of the error.
    Atkinson,
    /// Jarvis, Judice, and Ninke error diffusion.
    Jarvis,
    /// Stucki error diffusion.
    Stucki,
    /// Sierra error diffusion.
    Sierra,
    /// Sierra two row error diffusion.
    SierraTwoRow,
    /// Floyd-Steinberg propagating 7/8 of the error.
    SoftFloydSteinberg,
    /// "False" Floyd-Steinberg with three neighbors.
    FalseFloydSteinberg,
    /// Floyd-Steinberg with the error accumulated in Oklab.
    OklabFloydSteinberg,
    /// Floyd-Steinberg with interleaved gradient noise.
    Neue,
    /// Burkes with Bayer matrix noise.
    Scatter,
    /// Ordered dithering with an 8x8 Bayer matrix.
    Bayer,
    /// Ordered dithering with a 4x4 Bayer matrix.
    #[cfg_attr(feature = "serde", serde(rename = "bayer-4"))]
    Bayer4,
    /// Ordered dithering with interleaved gradient noise.
    Gradient,
    /// Ordered dithering with white noise.
    WhiteNoise,
    /// Ordered dithering with the threshold tile set on the [`Reducer`](crate::Reducer).
    BlueNoise,
    /// Knoll pattern dithering with 16 candidates and an 8x8 Bayer matrix.
    Knoll,
    /// Knoll pattern dithering with 8 candidates and a 4x4 Bayer matrix.
    #[cfg_attr(feature = "serde", serde(rename = "knoll-8"))]
    Knoll8,
    /// Knoll pattern dithering with 16 candidates and the threshold tile set on the
    /// [`Reducer`](crate::Reducer).
    KnollBlue,
}

impl Preset {
    /// All of the presets.
    pub const ALL: [Self; 22] = [
        Preset::Solid,
        Preset::FloydSteinberg,
        Preset::Burkes,
        Preset::SierraLite,
        Preset::Atkinson,
        Preset::Jarvis,
        Preset::Stucki,
        Preset::Sierra,
        Preset::SierraTwoRow,
        Preset::SoftFloydSteinberg,
        Preset::FalseFloydSteinberg,
        Preset::OklabFloydSteinberg,
        Preset::Neue,
        Preset::Scatter,
        Preset::Bayer,
        Preset::Bayer4,
        Preset::Gradient,
        Preset::WhiteNoise,
        Preset::BlueNoise,
        Preset::Knoll,
        Preset::Knoll8,
        Preset::KnollBlue,
    ];

    /// Returns the name of this preset, as accepted by [`Preset::from_str`].
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Preset::Solid => "solid",
            Preset::FloydSteinberg => "floyd-steinberg",
            Preset::Burkes => "burkes",
            Preset::SierraLite => "sierra-lite",
            Preset::Atkinson => "atkinson",
            Preset::Jarvis => "jarvis",
            Preset::Stucki => "stucki",
            Preset::Sierra => "sierra",
            Preset::SierraTwoRow => "sierra-two-row",
            Preset::SoftFloydSteinberg => "soft-floyd-steinberg",
            Preset::FalseFloydSteinberg => "false-floyd-steinberg",
            Preset::OklabFloydSteinberg => "oklab-floyd-steinberg",
            Preset::Neue => "neue",
            Preset::Scatter => "scatter",
            Preset::Bayer => "bayer",
            Preset::Bayer4 => "bayer-4",
            Preset::Gradient => "gradient",
            Preset::WhiteNoise => "white-noise",
            Preset::BlueNoise => "blue-noise",
            Preset::Knoll => "knoll",
            Preset::Knoll8 => "knoll-8",
            Preset::KnollBlue => "knoll-blue",
        }
    }

    /// Whether this preset needs a [`ThresholdTile`].
    #[must_use]
    pub const fn needs_threshold_tile(self) -> bool {
        matches!(self, Preset::BlueNoise | Preset::KnollBlue)
    }

    /// Creates the [`Ditherer`] for this preset.
    ///
    /// # Errors
    /// Returns [`ConfigError::MissingThresholdTile`] if the preset needs a tile
    /// (see [`Preset::needs_threshold_tile`]) and `tile` is `None`.
    pub fn ditherer(self, tile: Option<&Arc<ThresholdTile>>) -> Result<Ditherer, ConfigError> {
        let diffusion = |kernel| Ditherer::Diffusion(ErrorDiffusion::new(kernel));
        let tile_pattern = || {
            tile.cloned()
                .map(ThresholdPattern::Tile)
                .ok_or(ConfigError::MissingThresholdTile)
        };
        let bayer4 = ThresholdPattern::Bayer(BayerOrder::new(2)?);
        let bayer8 = ThresholdPattern::Bayer(BayerOrder::DEFAULT);

        let ditherer = match self {
            Preset::Solid => Ditherer::Solid,
            Preset::FloydSteinberg => diffusion(kernel::FLOYD_STEINBERG),
            Preset::Burkes => diffusion(kernel::BURKES),
            Preset::SierraLite => diffusion(kernel::SIERRA_LITE),
            Preset::Atkinson => diffusion(kernel::ATKINSON),
            Preset::Jarvis => diffusion(kernel::JARVIS_JUDICE_NINKE),
            Preset::Stucki => diffusion(kernel::STUCKI),
            Preset::Sierra => diffusion(kernel::SIERRA),
            Preset::SierraTwoRow => diffusion(kernel::SIERRA_TWO_ROW),
            Preset::SoftFloydSteinberg => diffusion(kernel::SOFT_FLOYD_STEINBERG),
            Preset::FalseFloydSteinberg => diffusion(kernel::FALSE_FLOYD_STEINBERG),
            Preset::OklabFloydSteinberg => ErrorDiffusion::new(kernel::FLOYD_STEINBERG)
                .with_space(ColorSpace::Oklab)
                .into(),
            Preset::Neue => ErrorDiffusion::new(kernel::FLOYD_STEINBERG)
                .with_noise(NoiseDiffusion {
                    pattern: ThresholdPattern::InterleavedGradient,
                    amount: NOISE_AMOUNT,
                })
                .into(),
            Preset::Scatter => ErrorDiffusion::new(kernel::BURKES)
                .with_noise(NoiseDiffusion { pattern: bayer8, amount: NOISE_AMOUNT })
                .into(),
            Preset::Bayer => Ordered::new(bayer8).into(),
            Preset::Bayer4 => Ordered::new(bayer4).into(),
            Preset::Gradient => Ordered::new(ThresholdPattern::InterleavedGradient).into(),
            Preset::WhiteNoise => Ordered::new(ThresholdPattern::WhiteNoise { seed: 0 }).into(),
            Preset::BlueNoise => Ordered::new(tile_pattern()?).into(),
            Preset::Knoll => PatternDither::new(KNOLL_CANDIDATES, bayer8)?.into(),
            Preset::Knoll8 => PatternDither::new(8, bayer4)?.into(),
            Preset::KnollBlue => PatternDither::new(KNOLL_CANDIDATES, tile_pattern()?)?.into(),
        };

        Ok(ditherer)
    }
}

impl Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase().replace('_', "-");
        Preset::ALL
            .into_iter()
            .find(|preset| preset.name() == name)
            .ok_or_else(|| ConfigError::UnknownPreset(s.to_owned()))
    }
}

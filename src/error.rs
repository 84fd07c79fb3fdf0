//! Contains the error type shared across the crate.

use thiserror::Error;

/// A configuration error, reported before any pixel is processed.
///
/// Per-pixel anomalies (out of range channels, transparent pixels, and so on)
/// are always resolved locally and never produce an error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The palette has no visible color besides the reserved sentinel at index `0`.
    #[error("palette has no visible colors to map to")]
    EmptyPalette,

    /// The palette has more colors than the palette index type can address.
    #[error("palette length of {len} is above the maximum of {max} for this index width")]
    PaletteTooLarge {
        /// The provided palette length.
        len: usize,
        /// The maximum supported palette length.
        max: usize,
    },

    /// The dither strength was negative or `NAN`.
    #[error("dither strength must be a non-negative number, got {0}")]
    NegativeStrength(f32),

    /// The image dimensions do not match the number of pixels.
    #[error("image dimensions of ({width}, {height}) do not match the pixel count of {len}")]
    DimensionMismatch {
        /// The provided image width.
        width: u32,
        /// The provided image height.
        height: u32,
        /// The provided number of pixels.
        len: usize,
    },

    /// The image has more pixels than [`MAX_PIXELS`](crate::MAX_PIXELS).
    #[error("image is above the maximum of {} pixels", crate::MAX_PIXELS)]
    AboveMaxPixels,

    /// No dither preset has the given name.
    #[error("unknown dither preset: {0}")]
    UnknownPreset(String),

    /// No color metric has the given name.
    #[error("unknown color metric: {0}")]
    UnknownMetric(String),

    /// A preset needs a threshold tile, but none was provided.
    #[error("this dither preset needs a threshold tile, but none was set")]
    MissingThresholdTile,

    /// The threshold tile dimensions do not match its values.
    #[error("threshold tile of ({width}, {height}) does not match its {len} values")]
    InvalidThresholdTile {
        /// The provided tile width.
        width: u32,
        /// The provided tile height.
        height: u32,
        /// The provided number of values.
        len: usize,
    },

    /// The pattern ditherer candidate count is outside of `1..=256`.
    #[error("candidate count must be in 1..=256, got {0}")]
    InvalidCandidates(usize),

    /// An error diffusion kernel has a zero divisor or an entry too far away.
    #[error("diffusion kernel must have a positive divisor and offsets of at most 8")]
    InvalidKernel,

    /// The Bayer matrix order is outside of `1..=6`.
    #[error("bayer matrix order must be in 1..=6, got {0}")]
    InvalidBayerOrder(u32),
}

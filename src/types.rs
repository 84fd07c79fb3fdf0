//! Contains various types needed across the crate.

use crate::{ConfigError, IndexWord, MAX_PIXELS};
use palette::{Srgb, Srgba, WithAlpha};
use std::{fmt::Display, marker::PhantomData, sync::Arc};
#[cfg(feature = "image")]
use {
    image::RgbaImage,
    palette::cast::{ComponentsAs, IntoComponents},
};

/// The alpha value at and above which a color counts as visible.
pub const VISIBLE_ALPHA: u8 = 0x80;

/// Returns whether the given color is visible, that is, its alpha is at least [`VISIBLE_ALPHA`].
#[must_use]
#[inline]
pub fn is_visible(color: Srgba<u8>) -> bool {
    color.alpha >= VISIBLE_ALPHA
}

/// The color stored at the reserved index `0` by [`Palette::with_sentinel`].
#[must_use]
pub fn transparent() -> Srgba<u8> {
    Srgba::new(0, 0, 0, 0)
}

/// An immutable, ordered list of palette colors.
///
/// Index `0` is reserved as the "no color" sentinel: it is never chosen as the
/// nearest color for a visible pixel, and transparent pixels always map to it.
/// All other entries with an alpha of at least [`VISIBLE_ALPHA`] are the visible colors.
///
/// Colors need not be unique. The palette length is bounded by the width of
/// the index type `I` (256 colors for `u8`, 65536 for `u16`).
///
/// # Examples
/// ```
/// # use palettize::{Palette, ConfigError};
/// # use palette::Srgb;
/// # fn main() -> Result<(), ConfigError> {
/// let palette = Palette::<u8>::with_sentinel([Srgb::new(0, 0, 0), Srgb::new(255, 255, 255)])?;
/// assert_eq!(palette.len(), 3);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette<I = u8> {
    /// The palette colors, shared with every [`IndexedImage`] produced from this palette.
    colors: Arc<[Srgba<u8>]>,
    /// The index type must remain the same for each [`Palette`].
    _index: PhantomData<I>,
}

impl<I: IndexWord> Palette<I> {
    /// Creates a new [`Palette`] from the given colors, where `colors[0]` is the sentinel.
    ///
    /// # Errors
    /// Returns [`ConfigError::PaletteTooLarge`] if there are more than `I::MAX_COLORS` colors
    /// or [`ConfigError::EmptyPalette`] if no color besides the sentinel is visible.
    pub fn new(colors: Vec<Srgba<u8>>) -> Result<Self, ConfigError> {
        if colors.len() > I::MAX_COLORS {
            return Err(ConfigError::PaletteTooLarge {
                len: colors.len(),
                max: I::MAX_COLORS,
            });
        }

        if !colors.iter().skip(1).copied().any(is_visible) {
            return Err(ConfigError::EmptyPalette);
        }

        Ok(Self { colors: colors.into(), _index: PhantomData })
    }

    /// Creates a new [`Palette`] from opaque colors, inserting a transparent sentinel at index `0`.
    ///
    /// # Errors
    /// See [`Palette::new`].
    pub fn with_sentinel(
        colors: impl IntoIterator<Item = Srgb<u8>>,
    ) -> Result<Self, ConfigError> {
        let colors = std::iter::once(transparent())
            .chain(colors.into_iter().map(|c| c.with_alpha(u8::MAX)))
            .collect();

        Self::new(colors)
    }

    /// Returns the palette colors, including the sentinel.
    #[must_use]
    pub fn colors(&self) -> &[Srgba<u8>] {
        &self.colors
    }

    /// Returns a shared handle to the palette colors.
    #[must_use]
    pub fn shared(&self) -> Arc<[Srgba<u8>]> {
        Arc::clone(&self.colors)
    }

    /// Returns the number of colors, including the sentinel.
    #[must_use]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Always `false`: a valid palette has at least one visible color.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Returns the color at the given index.
    #[must_use]
    #[inline]
    pub fn get(&self, index: I) -> Srgba<u8> {
        self.colors[index.as_()]
    }

    /// Returns the visible colors (excluding the sentinel) alongside their indices.
    pub fn visible(&self) -> impl Iterator<Item = (usize, Srgba<u8>)> + '_ {
        self.colors
            .iter()
            .copied()
            .enumerate()
            .skip(1)
            .filter(|&(_, c)| is_visible(c))
    }
}

/// A borrowed, row-major image of `Srgba<u8>` pixels.
///
/// The invariant is that `pixels.len() == width * height` and that the image has
/// no more than [`MAX_PIXELS`] pixels.
///
/// # Examples
/// ```
/// # use palettize::{ImageRef, ConfigError};
/// # use palette::Srgba;
/// # fn main() -> Result<(), ConfigError> {
/// let pixels = vec![Srgba::new(128, 128, 128, 255); 4];
/// let image = ImageRef::new(2, 2, &pixels)?;
/// assert_eq!(image.dimensions(), (2, 2));
/// # Ok(())
/// # }
/// ```
///
/// From an image (needs the `image` feature to be enabled):
/// ```no_run
/// # use palettize::ImageRef;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let img = image::open("some image")?.into_rgba8();
/// let image = ImageRef::try_from(&img)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageRef<'a> {
    /// The width of the image.
    width: u32,
    /// The height of the image.
    height: u32,
    /// The pixels of the image in row-major order.
    pixels: &'a [Srgba<u8>],
}

impl<'a> ImageRef<'a> {
    /// Creates a new [`ImageRef`] from its dimensions and row-major pixels.
    ///
    /// # Errors
    /// Returns [`ConfigError::DimensionMismatch`] if `pixels.len() != width * height`
    /// or [`ConfigError::AboveMaxPixels`] if the image is too large.
    pub fn new(width: u32, height: u32, pixels: &'a [Srgba<u8>]) -> Result<Self, ConfigError> {
        if u64::from(width) * u64::from(height) != pixels.len() as u64 {
            return Err(ConfigError::DimensionMismatch { width, height, len: pixels.len() });
        }

        if pixels.len() > MAX_PIXELS as usize {
            return Err(ConfigError::AboveMaxPixels);
        }

        Ok(Self { width, height, pixels })
    }

    /// Returns the width of the image.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height of the image.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Returns the `(width, height)` of the image.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Returns the pixels of the image in row-major order.
    #[must_use]
    pub const fn pixels(&self) -> &'a [Srgba<u8>] {
        self.pixels
    }

    /// Returns the number of pixels in the image.
    #[must_use]
    pub const fn num_pixels(&self) -> usize {
        self.pixels.len()
    }

    /// Whether or not the image has zero pixels.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }
}

#[cfg(feature = "image")]
impl<'a> TryFrom<&'a RgbaImage> for ImageRef<'a> {
    type Error = ConfigError;

    fn try_from(image: &'a RgbaImage) -> Result<Self, Self::Error> {
        let pixels = image.pixels().len();
        let buf = &image.as_raw()[..(pixels * 4)];
        Self::new(image.width(), image.height(), buf.components_as())
    }
}

/// An image made of indices into a palette, as produced by the ditherers.
///
/// Every index refers to an entry of [`IndexedImage::palette`], and the palette
/// order is the order of the [`Palette`] it was reduced with, so index based
/// palette swaps downstream remain valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedImage<I = u8> {
    /// The width of the image.
    width: u32,
    /// The height of the image.
    height: u32,
    /// The palette colors of the image.
    palette: Arc<[Srgba<u8>]>,
    /// The indices into `palette` for each pixel in row-major order.
    indices: Vec<I>,
}

impl<I: IndexWord> IndexedImage<I> {
    /// Creates a new [`IndexedImage`] without validating invariants.
    pub(crate) fn new_unchecked(
        width: u32,
        height: u32,
        palette: Arc<[Srgba<u8>]>,
        indices: Vec<I>,
    ) -> Self {
        debug_assert_eq!(width as usize * height as usize, indices.len());
        debug_assert!(indices.iter().all(|i| i.as_() < palette.len()));
        Self { width, height, palette, indices }
    }

    /// Returns the width of the image.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height of the image.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Returns the `(width, height)` of the image.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Returns the palette colors, including the sentinel at index `0`.
    #[must_use]
    pub fn palette(&self) -> &[Srgba<u8>] {
        &self.palette
    }

    /// Returns the palette index of each pixel in row-major order.
    #[must_use]
    pub fn indices(&self) -> &[I] {
        &self.indices
    }

    /// Returns the color of each pixel in row-major order.
    pub fn colors(&self) -> impl Iterator<Item = Srgba<u8>> + '_ {
        let palette = &*self.palette;
        self.indices.iter().map(move |&i| palette[i.as_()])
    }

    /// Returns the palette and the indices of the image.
    #[must_use]
    pub fn into_parts(self) -> (Arc<[Srgba<u8>]>, Vec<I>) {
        (self.palette, self.indices)
    }
}

#[cfg(feature = "image")]
impl<I: IndexWord> IndexedImage<I> {
    /// Converts the indexed image into an [`RgbaImage`] of palette colors.
    #[must_use]
    pub fn to_rgba_image(&self) -> RgbaImage {
        let buf = self.colors().collect::<Vec<_>>().into_components();

        #[allow(clippy::expect_used)]
        {
            // indices.len() is equal to width * height,
            // so buf is large enough by nature of its construction
            RgbaImage::from_vec(self.width, self.height, buf).expect("large enough buffer")
        }
    }
}

/// A dither strength: a non-negative multiplier on the error or pattern offset
/// added to each pixel before it is mapped to the palette.
///
/// A strength of `0.0` disables dithering entirely, so every ditherer gives
/// the same result as [`Ditherer::Solid`](crate::dither::Ditherer::Solid).
///
/// # Examples
/// ```
/// # use palettize::{Strength, ConfigError};
/// # fn main() -> Result<(), ConfigError> {
/// let strength = Strength::try_from(0.75)?;
/// assert!(Strength::try_from(-1.0).is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[repr(transparent)]
pub struct Strength(f32);

impl Strength {
    /// The default strength of `1.0`.
    pub const DEFAULT: Self = Self(1.0);

    /// A strength of `0.0` which disables dithering.
    pub const NONE: Self = Self(0.0);

    /// Creates a new [`Strength`].
    ///
    /// # Errors
    /// Returns [`ConfigError::NegativeStrength`] if `value` is negative, `NAN`, or infinite.
    pub fn new(value: f32) -> Result<Self, ConfigError> {
        if value.is_finite() && value >= 0.0 {
            Ok(Self(value))
        } else {
            Err(ConfigError::NegativeStrength(value))
        }
    }

    /// Gets the inner `f32` value.
    #[must_use]
    pub const fn get(self) -> f32 {
        self.0
    }

    /// Whether or not this strength disables dithering.
    #[must_use]
    pub fn is_none(self) -> bool {
        self.0 == 0.0
    }
}

impl Default for Strength {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<f32> for Strength {
    type Error = ConfigError;

    fn try_from(value: f32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Strength> for f32 {
    fn from(val: Strength) -> Self {
        val.get()
    }
}

impl Display for Strength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

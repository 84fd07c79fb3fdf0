//! Contains the [`Reducer`] engine for the high level API.

use super::Preset;
use crate::{
    dither::{Ditherer, ThresholdTile},
    ColorMetric, CompiledPalette, ConfigError, ImageRef, IndexWord, IndexedImage, Metric, Palette,
    Strength,
};
#[cfg(feature = "threads")]
use rayon::prelude::*;
use std::{fmt::Debug, sync::Arc};
#[cfg(feature = "image")]
use image::RgbaImage;

/// The serializable configuration of a [`Reducer`].
///
/// # Examples
/// ```
/// # use palettize::{ReducerConfig, Metric, Preset};
/// let config = ReducerConfig {
///     metric: Metric::Ipt,
///     preset: Preset::Atkinson,
///     strength: 0.8,
/// };
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ReducerConfig {
    /// The color metric used to build the lookup table.
    pub metric: Metric,
    /// The ditherer preset used by [`Reducer::reduce_config`].
    pub preset: Preset,
    /// The dither strength, which must be non-negative.
    pub strength: f32,
}

impl Default for ReducerConfig {
    fn default() -> Self {
        Self {
            metric: Metric::default(),
            preset: Preset::default(),
            strength: Strength::DEFAULT.get(),
        }
    }
}

/// The engine that reduces images to a fixed palette.
///
/// A [`Reducer`] holds the palette, the color metric, the dither strength, and an optional
/// threshold tile. The lookup table ([`CompiledPalette`]) is built lazily on first use and
/// rebuilt after the palette or metric changes. Compiled palettes that were already handed out
/// are never modified.
///
/// # Examples
/// ```
/// # use palettize::{Reducer, Palette, ImageRef, Metric, Preset, ConfigError};
/// # use palette::{Srgb, Srgba};
/// # fn main() -> Result<(), ConfigError> {
/// let palette = Palette::<u8>::with_sentinel([
///     Srgb::new(0, 0, 0),
///     Srgb::new(255, 0, 0),
///     Srgb::new(255, 255, 255),
/// ])?;
///
/// let mut reducer = Reducer::new(palette);
/// reducer.set_metric(Metric::Ciede2000).set_strength(0.75)?;
///
/// let pixels = vec![Srgba::new(200, 60, 50, 255); 16];
/// let image = ImageRef::new(4, 4, &pixels)?;
/// let reduced = reducer.reduce_preset(image, Preset::Atkinson)?;
/// let reduced = reducer.reduce_named(image, "knoll")?;
/// # Ok(())
/// # }
/// ```
#[must_use]
pub struct Reducer<I = u8> {
    /// The palette to reduce to.
    palette: Palette<I>,
    /// The color metric used to build the lookup table.
    metric: Arc<dyn ColorMetric>,
    /// The built in metric behind `metric`, if it was set from a [`ReducerConfig`] or by default.
    builtin_metric: Option<Metric>,
    /// The dither strength.
    strength: Strength,
    /// The tile used by the presets that need one.
    tile: Option<Arc<ThresholdTile>>,
    /// The lookup table for the current palette and metric, if it was built.
    compiled: Option<Arc<CompiledPalette<I>>>,
}

impl<I: IndexWord> Reducer<I> {
    /// Creates a new [`Reducer`] for the given palette with default options.
    ///
    /// The default metric is [`Metric::OklabTable`], the default strength is `1.0`,
    /// and no threshold tile is set.
    pub fn new(palette: Palette<I>) -> Self {
        Self {
            palette,
            metric: Arc::new(Metric::default()),
            builtin_metric: Some(Metric::default()),
            strength: Strength::DEFAULT,
            tile: None,
            compiled: None,
        }
    }

    /// Creates a new [`Reducer`] for the given palette with the metric and strength of `config`.
    ///
    /// # Errors
    /// Returns [`ConfigError::NegativeStrength`] if the strength of `config` is invalid.
    pub fn with_config(palette: Palette<I>, config: &ReducerConfig) -> Result<Self, ConfigError> {
        let mut reducer = Self::new(palette);
        reducer.apply_config(config)?;
        Ok(reducer)
    }

    /// Sets the metric and strength of `config`.
    ///
    /// The lookup table is only rebuilt if the metric differs from the one set by
    /// the previous config. On error, the [`Reducer`] is left unchanged.
    ///
    /// # Errors
    /// Returns [`ConfigError::NegativeStrength`] if the strength of `config` is invalid.
    pub fn apply_config(&mut self, config: &ReducerConfig) -> Result<&mut Self, ConfigError> {
        let strength = Strength::new(config.strength)?;
        if self.builtin_metric != Some(config.metric) {
            self.set_metric(config.metric);
            self.builtin_metric = Some(config.metric);
        }
        self.strength = strength;
        Ok(self)
    }

    /// Drops the compiled palette so that it is rebuilt on next use.
    fn invalidate(&mut self) {
        if self.compiled.take().is_some() {
            log::trace!("palette or metric changed, dropping compiled palette");
        }
    }

    /// Sets the palette to reduce to.
    pub fn set_palette(&mut self, palette: Palette<I>) -> &mut Self {
        self.palette = palette;
        self.invalidate();
        self
    }

    /// Sets the color metric used to build the lookup table.
    ///
    /// See [`Metric`] for the built in metrics.
    pub fn set_metric(&mut self, metric: impl ColorMetric + 'static) -> &mut Self {
        self.metric = Arc::new(metric);
        self.builtin_metric = None;
        self.invalidate();
        self
    }

    /// Sets the dither strength.
    ///
    /// # Errors
    /// Returns [`ConfigError::NegativeStrength`] if `strength` is negative, `NAN`, or infinite.
    pub fn set_strength(&mut self, strength: f32) -> Result<&mut Self, ConfigError> {
        self.strength = Strength::new(strength)?;
        Ok(self)
    }

    /// Sets the threshold tile used by the blue noise presets.
    pub fn set_threshold_tile(&mut self, tile: ThresholdTile) -> &mut Self {
        self.tile = Some(Arc::new(tile));
        self
    }

    /// Returns the palette.
    #[must_use]
    pub fn palette(&self) -> &Palette<I> {
        &self.palette
    }

    /// Returns the dither strength.
    #[must_use]
    pub fn strength(&self) -> Strength {
        self.strength
    }

    /// Returns the threshold tile, if one was set.
    #[must_use]
    pub fn threshold_tile(&self) -> Option<&ThresholdTile> {
        self.tile.as_deref()
    }

    /// Returns the compiled palette, building it first if the palette or metric changed.
    #[must_use]
    pub fn compiled(&mut self) -> Arc<CompiledPalette<I>> {
        let Self { palette, metric, compiled, .. } = self;
        Arc::clone(compiled.get_or_insert_with(|| {
            Arc::new(CompiledPalette::build(palette.clone(), Arc::clone(metric)))
        }))
    }

    /// Creates the ditherer for a preset using the current threshold tile.
    fn preset_ditherer(&self, preset: Preset) -> Result<Ditherer, ConfigError> {
        preset.ditherer(self.tile.as_ref())
    }

    /// Reduces an image with the given ditherer.
    #[must_use]
    pub fn reduce(&mut self, image: ImageRef, ditherer: &Ditherer) -> IndexedImage<I> {
        ditherer.dither(image, &self.compiled(), self.strength)
    }

    /// Reduces an image with the ditherer of a [`Preset`].
    ///
    /// # Errors
    /// Returns [`ConfigError::MissingThresholdTile`] if the preset needs a threshold tile
    /// and none was set.
    pub fn reduce_preset(
        &mut self,
        image: ImageRef,
        preset: Preset,
    ) -> Result<IndexedImage<I>, ConfigError> {
        let ditherer = self.preset_ditherer(preset)?;
        Ok(self.reduce(image, &ditherer))
    }

    /// Reduces an image with the ditherer of the [`Preset`] with the given name.
    ///
    /// # Errors
    /// Returns [`ConfigError::UnknownPreset`] if no preset has the given name
    /// or [`ConfigError::MissingThresholdTile`] if the preset needs a threshold tile
    /// and none was set.
    pub fn reduce_named(
        &mut self,
        image: ImageRef,
        name: &str,
    ) -> Result<IndexedImage<I>, ConfigError> {
        self.reduce_preset(image, name.parse()?)
    }

    /// Applies a [`ReducerConfig`] (see [`Reducer::apply_config`]) and reduces an image
    /// with its preset.
    ///
    /// # Errors
    /// Returns [`ConfigError::NegativeStrength`] if the strength of `config` is invalid,
    /// otherwise see [`Reducer::reduce_preset`].
    pub fn reduce_config(
        &mut self,
        image: ImageRef,
        config: &ReducerConfig,
    ) -> Result<IndexedImage<I>, ConfigError> {
        self.apply_config(config)?;
        self.reduce_preset(image, config.preset)
    }
}

#[cfg(feature = "image")]
impl<I: IndexWord> Reducer<I> {
    /// Reduces an [`RgbaImage`] with the given ditherer and returns the palette colors as an image.
    ///
    /// # Errors
    /// Returns [`ConfigError::AboveMaxPixels`] if the image is too large.
    pub fn reduce_rgbaimage(
        &mut self,
        image: &RgbaImage,
        ditherer: &Ditherer,
    ) -> Result<RgbaImage, ConfigError> {
        let image = ImageRef::try_from(image)?;
        Ok(self.reduce(image, ditherer).to_rgba_image())
    }
}

#[cfg(feature = "threads")]
impl<I: IndexWord> Reducer<I> {
    /// Returns the compiled palette, building it in parallel first if the palette or metric changed.
    #[must_use]
    pub fn compiled_par(&mut self) -> Arc<CompiledPalette<I>> {
        let Self { palette, metric, compiled, .. } = self;
        Arc::clone(compiled.get_or_insert_with(|| {
            Arc::new(CompiledPalette::build_par(palette.clone(), Arc::clone(metric)))
        }))
    }

    /// Reduces an image with the given ditherer, in parallel where possible.
    ///
    /// See [`Ditherer::dither_par`] for details. The result is identical to [`Reducer::reduce`].
    #[must_use]
    pub fn reduce_par(&mut self, image: ImageRef, ditherer: &Ditherer) -> IndexedImage<I> {
        ditherer.dither_par(image, &self.compiled_par(), self.strength)
    }

    /// Reduces an image with the ditherer of a [`Preset`], in parallel where possible.
    ///
    /// # Errors
    /// See [`Reducer::reduce_preset`].
    pub fn reduce_preset_par(
        &mut self,
        image: ImageRef,
        preset: Preset,
    ) -> Result<IndexedImage<I>, ConfigError> {
        let ditherer = self.preset_ditherer(preset)?;
        Ok(self.reduce_par(image, &ditherer))
    }

    /// Reduces many images in parallel with the given ditherer, one task per image.
    ///
    /// Each image is processed with its own error buffer,
    /// so the results are identical to calling [`Reducer::reduce`] on each image.
    #[must_use]
    pub fn reduce_batch_par(
        &mut self,
        images: &[ImageRef],
        ditherer: &Ditherer,
    ) -> Vec<IndexedImage<I>> {
        let compiled = self.compiled_par();
        let strength = self.strength;
        images
            .par_iter()
            .map(|&image| ditherer.dither(image, &compiled, strength))
            .collect()
    }
}

impl<I: IndexWord> Debug for Reducer<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reducer")
            .field("palette", &self.palette)
            .field("metric", &self.builtin_metric.map(Metric::name))
            .field("strength", &self.strength)
            .field("tile", &self.tile)
            .field("compiled", &self.compiled.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dither::kernel, metric::FnMetric, tests::*};
    use palette::{Srgb, Srgba};

    #[allow(clippy::unwrap_used)]
    fn black_white_reducer() -> Reducer {
        let palette =
            Palette::with_sentinel([Srgb::new(0, 0, 0), Srgb::new(255, 255, 255)]).unwrap();
        let mut reducer = Reducer::new(palette);
        reducer.set_metric(Metric::WeightedRgb);
        reducer
    }

    #[test]
    fn mid_gray_scenario() {
        let mut reducer = black_white_reducer();
        let pixels = vec![Srgba::new(128, 128, 128, 255); 4];
        let image = image_ref(2, 2, &pixels);

        #[allow(clippy::unwrap_used)]
        let solid = reducer.reduce_named(image, "solid").unwrap();
        assert!(solid.indices().iter().all(|&i| i == solid.indices()[0]));
        assert_eq!(solid.indices()[0], 2);

        #[allow(clippy::unwrap_used)]
        let diffused = reducer.reduce_named(image, "floyd-steinberg").unwrap();
        let indices = diffused.indices();
        assert_ne!(indices[0], indices[1]);
        assert_eq!(indices, &[2, 1, 1, 2]);
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn compiled_is_cached_until_invalidated() {
        let mut reducer = black_white_reducer();
        let a = reducer.compiled();
        let b = reducer.compiled();
        assert!(Arc::ptr_eq(&a, &b));

        reducer.set_metric(Metric::Ipt);
        let c = reducer.compiled();
        assert!(!Arc::ptr_eq(&a, &c));

        reducer.set_palette(Palette::with_sentinel([Srgb::new(9, 9, 9)]).unwrap());
        let d = reducer.compiled();
        assert!(!Arc::ptr_eq(&c, &d));
        // handed out units are unchanged
        assert_eq!(a.palette().len(), 3);
        assert_eq!(d.palette().len(), 2);

        assert!(reducer.set_strength(0.5).is_ok());
        assert!(Arc::ptr_eq(&d, &reducer.compiled()));
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn configuration_errors() {
        let mut reducer = black_white_reducer();
        assert_eq!(reducer.set_strength(-1.0).err(), Some(ConfigError::NegativeStrength(-1.0)));
        assert!(reducer.set_strength(f32::NAN).is_err());
        assert_eq!(reducer.strength(), Strength::DEFAULT);

        let pixels = vec![Srgba::new(10, 10, 10, 255); 4];
        let image = image_ref(2, 2, &pixels);
        assert_eq!(
            reducer.reduce_named(image, "nope").err(),
            Some(ConfigError::UnknownPreset("nope".to_owned()))
        );
        assert_eq!(
            reducer.reduce_preset(image, Preset::BlueNoise).err(),
            Some(ConfigError::MissingThresholdTile)
        );

        reducer.set_threshold_tile(ThresholdTile::from_u8(2, 1, &[0, 255]).unwrap());
        assert!(reducer.reduce_preset(image, Preset::BlueNoise).is_ok());
        assert!(reducer.reduce_preset(image, Preset::KnollBlue).is_ok());
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn every_preset_reduces() {
        let mut reducer = Reducer::new(web_safe_palette::<u8>());
        reducer.set_threshold_tile(ThresholdTile::from_u8(2, 2, &[0, 128, 192, 64]).unwrap());
        let pixels = test_pixels_with_alpha(24 * 16, 13);
        let image = image_ref(24, 16, &pixels);

        for preset in Preset::ALL {
            let output = reducer.reduce_preset(image, preset).unwrap();
            assert_eq!(output.indices().len(), pixels.len());
            for (&pixel, &index) in pixels.iter().zip(output.indices()) {
                assert_eq!(pixel.alpha < 128, index == 0, "{preset}");
            }
        }
    }

    #[test]
    fn custom_metric() {
        let mut reducer = black_white_reducer();
        // everything is close to white
        reducer.set_metric(FnMetric(|a: [u8; 3], b: [u8; 3]| {
            if a == [255; 3] || b == [255; 3] {
                0.0
            } else {
                1.0
            }
        }));

        let pixels = vec![Srgba::new(8, 8, 8, 255); 4];
        let output = reducer.reduce(image_ref(2, 2, &pixels), &Ditherer::Solid);
        assert!(output.indices().iter().all(|&i| i == 2));
    }

    #[test]
    fn config_applies_metric_and_strength() {
        let config = ReducerConfig { metric: Metric::Ipt, preset: Preset::Bayer, strength: 0.0 };
        #[allow(clippy::unwrap_used)]
        let mut reducer = Reducer::with_config(web_safe_palette::<u8>(), &config).unwrap();
        assert_eq!(reducer.strength(), Strength::NONE);

        let pixels = test_pixels(16 * 16, 14);
        let image = image_ref(16, 16, &pixels);
        #[allow(clippy::unwrap_used)]
        let output = reducer.reduce_config(image, &config).unwrap();
        assert_eq!(output, reducer.reduce(image, &Ditherer::Solid));

        let invalid = ReducerConfig { strength: -2.0, ..config };
        assert!(Reducer::with_config(web_safe_palette::<u8>(), &invalid).is_err());
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn reduce_config_applies_metric_and_strength() {
        let mut reducer = black_white_reducer();
        let pixels = vec![Srgba::new(128, 128, 128, 255); 4];
        let image = image_ref(2, 2, &pixels);

        let solid = ReducerConfig {
            metric: Metric::WeightedRgb,
            preset: Preset::FloydSteinberg,
            strength: 0.0,
        };
        let output = reducer.reduce_config(image, &solid).unwrap();
        assert_eq!(reducer.strength(), Strength::NONE);
        assert_eq!(output.indices(), &[2, 2, 2, 2]);

        let compiled = reducer.compiled();
        let full = ReducerConfig { strength: 1.0, ..solid };
        let output = reducer.reduce_config(image, &full).unwrap();
        assert_eq!(output.indices(), &[2, 1, 1, 2]);
        // same metric as the previous config keeps the table
        assert!(Arc::ptr_eq(&compiled, &reducer.compiled()));

        let ipt = ReducerConfig { metric: Metric::Ipt, ..full };
        reducer.reduce_config(image, &ipt).unwrap();
        assert!(!Arc::ptr_eq(&compiled, &reducer.compiled()));

        let invalid = ReducerConfig { strength: f32::NAN, ..full };
        assert!(reducer.reduce_config(image, &invalid).is_err());
        assert_eq!(reducer.strength(), Strength::DEFAULT);
    }

    #[test]
    fn wide_palette() {
        let colors = (0..1000u32).map(|i| {
            #[allow(clippy::cast_possible_truncation)]
            Srgb::new((i * 37) as u8, (i * 101) as u8, (i * 211) as u8)
        });
        #[allow(clippy::unwrap_used)]
        let mut reducer = Reducer::new(Palette::<u16>::with_sentinel(colors).unwrap());
        let pixels = test_pixels(20 * 10, 15);
        let output = reducer.reduce(image_ref(20, 10, &pixels), &Ditherer::default());
        assert!(output.indices().iter().all(|&i| (1..=1000).contains(&i)));
    }

    #[cfg(feature = "threads")]
    #[test]
    fn parallel_matches_serial() {
        let mut reducer = Reducer::new(random_palette::<u8>(40, 16));
        let pixels = test_pixels_with_alpha(50 * 40, 17);
        let image = image_ref(50, 40, &pixels);

        for preset in [Preset::FloydSteinberg, Preset::Bayer, Preset::Knoll8, Preset::WhiteNoise] {
            #[allow(clippy::unwrap_used)]
            let ditherer = preset.ditherer(None).unwrap();
            let serial = reducer.reduce(image, &ditherer);
            assert_eq!(serial, reducer.reduce_par(image, &ditherer));

            let other = test_pixels(30 * 7, 18);
            let images = [image, image_ref(30, 7, &other)];
            let batch = reducer.reduce_batch_par(&images, &ditherer);
            assert_eq!(batch[0], serial);
            assert_eq!(batch[1], reducer.reduce(images[1], &ditherer));
        }
    }

    #[test]
    fn kernel_presets_use_their_kernel() {
        #[allow(clippy::unwrap_used)]
        let ditherer = Preset::Stucki.ditherer(None).unwrap();
        assert!(matches!(ditherer, Ditherer::Diffusion(d) if *d.kernel() == kernel::STUCKI));
    }
}

//! Color difference functions used to build a [`PaletteIndex`](crate::PaletteIndex).
//!
//! A [`ColorMetric`] only needs to order colors by closeness: smaller values are closer,
//! and the values need not satisfy the triangle inequality. Several presets are offered
//! through [`Metric`], each trading accuracy for speed differently.

use crate::{
    colorspace::{oklab_cell_table, to_ipt, to_lab, Ipt, TABLE_CELL_BITS},
    palette_index::cell_of,
    types::is_visible,
    ConfigError,
};
use palette::{color_difference::Ciede2000, Srgba};
use std::{fmt::Display, str::FromStr, sync::Arc};

/// A difference function between two colors.
///
/// Implementations must be total over all 8-bit inputs (no panics and no `NAN`)
/// and return non-negative values where smaller means closer.
pub trait ColorMetric: Send + Sync {
    /// Returns the difference between `color` and the opaque color `(r, g, b)`.
    ///
    /// This must return `f64::INFINITY` if `color` is not visible.
    fn difference_rgb(&self, color: Srgba<u8>, r: u8, g: u8, b: u8) -> f64;

    /// Returns the difference between two colors.
    ///
    /// If exactly one of the colors is invisible, they are infinitely far apart.
    /// Two invisible colors have a difference of `0.0`.
    fn difference(&self, a: Srgba<u8>, b: Srgba<u8>) -> f64 {
        match (is_visible(a), is_visible(b)) {
            (true, true) => self.difference_rgb(a, b.red, b.green, b.blue),
            (false, false) => 0.0,
            _ => f64::INFINITY,
        }
    }
}

impl<M: ColorMetric + ?Sized> ColorMetric for &M {
    fn difference_rgb(&self, color: Srgba<u8>, r: u8, g: u8, b: u8) -> f64 {
        (**self).difference_rgb(color, r, g, b)
    }
}

impl<M: ColorMetric + ?Sized> ColorMetric for Box<M> {
    fn difference_rgb(&self, color: Srgba<u8>, r: u8, g: u8, b: u8) -> f64 {
        (**self).difference_rgb(color, r, g, b)
    }
}

impl<M: ColorMetric + ?Sized> ColorMetric for Arc<M> {
    fn difference_rgb(&self, color: Srgba<u8>, r: u8, g: u8, b: u8) -> f64 {
        (**self).difference_rgb(color, r, g, b)
    }
}

/// Wraps a function of two opaque `[r, g, b]` colors as a [`ColorMetric`].
///
/// The visibility rule is applied before calling the function.
///
/// # Examples
/// ```
/// # use palettize::metric::{ColorMetric, FnMetric};
/// # use palette::Srgba;
/// let manhattan = FnMetric(|a: [u8; 3], b: [u8; 3]| {
///     (0..3).map(|i| f64::from(a[i].abs_diff(b[i]))).sum()
/// });
/// assert_eq!(manhattan.difference_rgb(Srgba::new(0, 0, 0, 255), 1, 2, 3), 6.0);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FnMetric<F>(pub F);

impl<F> ColorMetric for FnMetric<F>
where
    F: Fn([u8; 3], [u8; 3]) -> f64 + Send + Sync,
{
    fn difference_rgb(&self, color: Srgba<u8>, r: u8, g: u8, b: u8) -> f64 {
        if is_visible(color) {
            (self.0)([color.red, color.green, color.blue], [r, g, b])
        } else {
            f64::INFINITY
        }
    }
}

/// The set of built in color metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Metric {
    /// Weighted squared distance in Oklab, using precomputed Oklab coordinates
    /// for every 5-bit cell of both colors.
    ///
    /// This is fast, but slightly lossy because of the quantization of its inputs.
    #[default]
    OklabTable,
    /// CIEDE2000 on CIELAB coordinates computed on the fly.
    ///
    /// This is the most accurate and by far the slowest preset.
    Ciede2000,
    /// Weighted squared distance in IPT, which has more uniform hue lines than CIELAB
    /// and so gives smoother transitions between hues.
    Ipt,
    /// Squared "redmean" weighted sRGB distance.
    ///
    /// This is cheap, which makes it a good fit for iterative refinement.
    WeightedRgb,
}

impl Metric {
    /// All of the built in metrics.
    pub const ALL: [Self; 4] = [
        Metric::OklabTable,
        Metric::Ciede2000,
        Metric::Ipt,
        Metric::WeightedRgb,
    ];

    /// Returns the name of this metric, as accepted by [`Metric::from_str`].
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Metric::OklabTable => "oklab",
            Metric::Ciede2000 => "ciede2000",
            Metric::Ipt => "ipt",
            Metric::WeightedRgb => "rgb",
        }
    }
}

/// Weighted squared euclidean distance with the first component weighted by `2.0`.
#[inline]
fn lightness_weighted([l1, a1, b1]: [f32; 3], [l2, a2, b2]: [f32; 3]) -> f64 {
    let dl = f64::from(l1 - l2);
    let da = f64::from(a1 - a2);
    let db = f64::from(b1 - b2);
    2.0 * dl * dl + da * da + db * db
}

/// Squared redmean distance.
#[inline]
fn redmean([r1, g1, b1]: [u8; 3], [r2, g2, b2]: [u8; 3]) -> f64 {
    let dr = f64::from(r1) - f64::from(r2);
    let dg = f64::from(g1) - f64::from(g2);
    let db = f64::from(b1) - f64::from(b2);
    let r_mean = 0.5 * (f64::from(r1) + f64::from(r2));

    (2.0 + r_mean / 256.0) * dr * dr + 4.0 * dg * dg + (2.0 + (255.0 - r_mean) / 256.0) * db * db
}

impl ColorMetric for Metric {
    fn difference_rgb(&self, color: Srgba<u8>, r: u8, g: u8, b: u8) -> f64 {
        if !is_visible(color) {
            return f64::INFINITY;
        }

        let rgb = [color.red, color.green, color.blue];
        match self {
            Metric::OklabTable => {
                let table = oklab_cell_table();
                lightness_weighted(
                    table[cell_of(rgb, TABLE_CELL_BITS)],
                    table[cell_of([r, g, b], TABLE_CELL_BITS)],
                )
            }
            Metric::Ciede2000 => {
                let lab1 = to_lab(color.color);
                let lab2 = to_lab(palette::Srgb::new(r, g, b));
                f64::from(Ciede2000::difference(lab1, lab2)).max(0.0)
            }
            Metric::Ipt => {
                let Ipt { i: i1, p: p1, t: t1 } = to_ipt(color.color);
                let Ipt { i: i2, p: p2, t: t2 } = to_ipt(palette::Srgb::new(r, g, b));
                lightness_weighted([i1, p1, t1], [i2, p2, t2])
            }
            Metric::WeightedRgb => redmean(rgb, [r, g, b]),
        }
    }
}

impl Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "oklab" | "oklab-table" => Ok(Metric::OklabTable),
            "ciede2000" | "lab" => Ok(Metric::Ciede2000),
            "ipt" => Ok(Metric::Ipt),
            "rgb" | "redmean" | "weighted-rgb" => Ok(Metric::WeightedRgb),
            _ => Err(ConfigError::UnknownMetric(s.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opaque(r: u8, g: u8, b: u8) -> Srgba<u8> {
        Srgba::new(r, g, b, 255)
    }

    #[test]
    fn one_invisible_is_infinitely_far() {
        let clear = Srgba::new(10, 10, 10, 0);
        let solid = opaque(10, 10, 10);
        for metric in Metric::ALL {
            assert_eq!(metric.difference(clear, solid), f64::INFINITY);
            assert_eq!(metric.difference(solid, clear), f64::INFINITY);
            assert_eq!(metric.difference_rgb(clear, 10, 10, 10), f64::INFINITY);
            assert_eq!(metric.difference(clear, Srgba::new(200, 0, 0, 3)), 0.0);
        }
    }

    #[test]
    fn identical_colors_have_zero_difference() {
        for metric in Metric::ALL {
            for c in [opaque(0, 0, 0), opaque(255, 255, 255), opaque(12, 200, 99)] {
                assert!(metric.difference(c, c).abs() < 1e-9, "{metric}");
            }
        }
    }

    #[test]
    fn total_and_non_negative() {
        for metric in Metric::ALL {
            for r in (0..=255).step_by(51) {
                for g in (0..=255).step_by(51) {
                    for b in (0..=255).step_by(51) {
                        let d = metric.difference_rgb(opaque(r, g, b), b, r, g);
                        assert!(d.is_finite() && d >= 0.0, "{metric}: {d}");
                    }
                }
            }
        }
    }

    #[test]
    fn dark_gray_is_closer_to_black() {
        let black = opaque(0, 0, 0);
        let white = opaque(255, 255, 255);
        let gray = opaque(40, 40, 40);
        for metric in Metric::ALL {
            assert!(metric.difference(gray, black) < metric.difference(gray, white), "{metric}");
        }
    }

    #[test]
    fn names_round_trip() {
        for metric in Metric::ALL {
            assert_eq!(metric.to_string().parse::<Metric>(), Ok(metric));
        }
        assert_eq!("Lab".parse::<Metric>(), Ok(Metric::Ciede2000));
        assert_eq!(
            "cmyk".parse::<Metric>(),
            Err(ConfigError::UnknownMetric("cmyk".to_owned()))
        );
    }

    #[test]
    fn fn_metric_applies_visibility_rule() {
        let metric = FnMetric(|_: [u8; 3], _: [u8; 3]| 1.0);
        assert_eq!(metric.difference(opaque(0, 0, 0), opaque(1, 1, 1)), 1.0);
        assert_eq!(metric.difference(opaque(0, 0, 0), Srgba::new(1, 1, 1, 0)), f64::INFINITY);
    }

    #[test]
    fn smart_pointers_delegate() {
        let boxed: Box<dyn ColorMetric> = Box::new(Metric::WeightedRgb);
        let shared: Arc<dyn ColorMetric> = Arc::new(Metric::WeightedRgb);
        let a = opaque(1, 2, 3);
        let b = opaque(200, 100, 50);
        let expected = Metric::WeightedRgb.difference(a, b);
        assert_eq!(boxed.difference(a, b), expected);
        assert_eq!(shared.difference(a, b), expected);
        assert_eq!((&Metric::WeightedRgb).difference(a, b), expected);
    }
}

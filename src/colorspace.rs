//! Conversions between 8-bit sRGB and the perceptual color spaces used by the color metrics
//! and the ditherers.
//!
//! Every decoding function clamps to the sRGB gamut, and every encode/decode pair round trips
//! 8-bit sRGB colors exactly.

use crate::palette_index::cell_color;
use palette::{IntoColor, Lab, LinSrgb, Oklab, Srgb};
use std::{array, sync::OnceLock};

/// The number of bits per channel of the cells in [`oklab_cell_table`].
pub const TABLE_CELL_BITS: u32 = 5;

/// The color space that error diffusion accumulates its error in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ColorSpace {
    /// Gamma encoded sRGB with components in `0.0..=255.0`.
    #[default]
    Srgb,
    /// Oklab, a perceptually uniform color space.
    Oklab,
}

impl ColorSpace {
    /// The component ranges of sRGB colors.
    pub const SRGB_F32_COMPONENT_RANGES: [(f32, f32); 3] =
        [(0.0, 255.0), (0.0, 255.0), (0.0, 255.0)];

    /// The component ranges of sRGB colors converted to Oklab.
    pub const OKLAB_F32_COMPONENT_RANGES_FROM_SRGB: [(f32, f32); 3] = [
        (0.0, 1.0),
        (-0.2338874, 0.2762164),
        (-0.31152815, 0.19856972),
    ];

    /// Returns the range of each component for colors in the sRGB gamut.
    #[must_use]
    pub fn f32_component_ranges_from_srgb(self) -> [(f32, f32); 3] {
        match self {
            ColorSpace::Srgb => Self::SRGB_F32_COMPONENT_RANGES,
            ColorSpace::Oklab => Self::OKLAB_F32_COMPONENT_RANGES_FROM_SRGB,
        }
    }

    /// Converts an 8-bit sRGB color to components in this color space.
    #[must_use]
    #[inline]
    pub fn from_srgb(self, color: Srgb<u8>) -> [f32; 3] {
        match self {
            ColorSpace::Srgb => [color.red, color.green, color.blue].map(f32::from),
            ColorSpace::Oklab => {
                let Oklab { l, a, b } = to_oklab(color);
                [l, a, b]
            }
        }
    }

    /// Converts components in this color space back to an 8-bit sRGB color, clamping to the gamut.
    #[must_use]
    #[inline]
    pub fn to_srgb(self, components: [f32; 3]) -> Srgb<u8> {
        match self {
            ColorSpace::Srgb => {
                let [r, g, b] = components.map(clamp_u8);
                Srgb::new(r, g, b)
            }
            ColorSpace::Oklab => {
                let [l, a, b] = components;
                from_oklab(Oklab::new(l, a, b))
            }
        }
    }

    /// Clamps components to the ranges given by [`ColorSpace::f32_component_ranges_from_srgb`].
    #[must_use]
    #[inline]
    pub fn clamp(self, components: [f32; 3]) -> [f32; 3] {
        let ranges = self.f32_component_ranges_from_srgb();
        array::from_fn(|i| components[i].clamp(ranges[i].0, ranges[i].1))
    }
}

/// Rounds and clamps a component to the `u8` range.
#[inline]
pub(crate) fn clamp_u8(value: f32) -> u8 {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    {
        value.round().clamp(0.0, 255.0) as u8
    }
}

/// Converts an 8-bit sRGB component to linear light.
#[must_use]
#[inline]
pub fn srgb_to_linear(component: u8) -> f32 {
    Srgb::new(component, 0, 0).into_linear::<f32>().red
}

/// Converts a linear light component to 8-bit sRGB, clamping to `0..=255`.
#[must_use]
#[inline]
pub fn linear_to_srgb(linear: f32) -> u8 {
    LinSrgb::new(linear, 0.0, 0.0).into_encoding::<u8, palette::encoding::Srgb>().red
}

/// Converts an 8-bit sRGB color to linear sRGB.
#[must_use]
#[inline]
pub fn to_linear(color: Srgb<u8>) -> LinSrgb {
    color.into_linear()
}

/// Converts a linear sRGB color to 8-bit sRGB, clamping to the gamut.
#[must_use]
#[inline]
pub fn from_linear(color: LinSrgb) -> Srgb<u8> {
    color.into_encoding()
}

/// Converts an 8-bit sRGB color to CIELAB (D65).
#[must_use]
pub fn to_lab(color: Srgb<u8>) -> Lab {
    to_linear(color).into_color()
}

/// Converts a CIELAB (D65) color to 8-bit sRGB, clamping to the gamut.
#[must_use]
pub fn from_lab(color: Lab) -> Srgb<u8> {
    from_linear(color.into_color())
}

/// Converts an 8-bit sRGB color to Oklab.
#[must_use]
pub fn to_oklab(color: Srgb<u8>) -> Oklab {
    to_linear(color).into_color()
}

/// Converts an Oklab color to 8-bit sRGB, clamping to the gamut.
#[must_use]
pub fn from_oklab(color: Oklab) -> Srgb<u8> {
    from_linear(color.into_color())
}

/// A color in the IPT color space of Ebner and Fairchild.
///
/// `i` is the intensity, `p` the protan (red-green) axis, and `t` the tritan (yellow-blue) axis.
/// Hue is more uniform along lines of constant `p/t` than in CIELAB, which gives smoother
/// transitions between hues.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ipt {
    /// The intensity.
    pub i: f32,
    /// The protan (red-green) component.
    pub p: f32,
    /// The tritan (yellow-blue) component.
    pub t: f32,
}

/// A 3x3 row-major matrix.
type Mat3 = [[f64; 3]; 3];

/// Linear sRGB to CIE XYZ (D65).
const SRGB_TO_XYZ: Mat3 = [
    [0.4124564, 0.3575761, 0.1804375],
    [0.2126729, 0.7151522, 0.0721750],
    [0.0193339, 0.1191920, 0.9503041],
];

/// CIE XYZ (D65) to Hunt-Pointer-Estevez LMS.
const XYZ_TO_LMS: Mat3 = [
    [0.4002, 0.7075, -0.0807],
    [-0.2280, 1.1500, 0.0612],
    [0.0, 0.0, 0.9184],
];

/// Nonlinear LMS to IPT.
const LMS_TO_IPT: Mat3 = [
    [0.4000, 0.4000, 0.2000],
    [4.4550, -4.8510, 0.3960],
    [0.8056, 0.3572, -1.1628],
];

/// The exponent of the IPT compression.
const IPT_EXPONENT: f64 = 0.43;

/// The matrices needed for IPT conversions, including the inverses.
struct IptMatrices {
    /// Linear sRGB to LMS.
    rgb_to_lms: Mat3,
    /// LMS to linear sRGB.
    lms_to_rgb: Mat3,
    /// IPT to nonlinear LMS.
    ipt_to_lms: Mat3,
}

/// Returns the lazily computed IPT matrices.
fn ipt_matrices() -> &'static IptMatrices {
    static MATRICES: OnceLock<IptMatrices> = OnceLock::new();
    MATRICES.get_or_init(|| {
        let rgb_to_lms = mat_mul(XYZ_TO_LMS, SRGB_TO_XYZ);
        IptMatrices {
            rgb_to_lms,
            lms_to_rgb: mat_inverse(rgb_to_lms),
            ipt_to_lms: mat_inverse(LMS_TO_IPT),
        }
    })
}

/// Multiplies two matrices.
fn mat_mul(a: Mat3, b: Mat3) -> Mat3 {
    array::from_fn(|i| array::from_fn(|j| (0..3).map(|k| a[i][k] * b[k][j]).sum()))
}

/// Multiplies a matrix with a column vector.
fn mat_vec(m: Mat3, v: [f64; 3]) -> [f64; 3] {
    array::from_fn(|i| m[i][0] * v[0] + m[i][1] * v[1] + m[i][2] * v[2])
}

/// Inverts a non-singular 3x3 matrix using its adjugate.
fn mat_inverse(m: Mat3) -> Mat3 {
    let cofactor = |r: usize, c: usize| {
        let (r0, r1) = ((r + 1) % 3, (r + 2) % 3);
        let (c0, c1) = ((c + 1) % 3, (c + 2) % 3);
        m[r0][c0] * m[r1][c1] - m[r0][c1] * m[r1][c0]
    };

    let det = m[0][0] * cofactor(0, 0) + m[0][1] * cofactor(0, 1) + m[0][2] * cofactor(0, 2);
    array::from_fn(|i| array::from_fn(|j| cofactor(j, i) / det))
}

/// `x.abs().powf(e)` with the sign of `x`.
fn signed_pow(x: f64, e: f64) -> f64 {
    x.abs().powf(e).copysign(x)
}

/// Converts an 8-bit sRGB color to IPT.
#[must_use]
pub fn to_ipt(color: Srgb<u8>) -> Ipt {
    let lin = to_linear(color);
    let rgb = [lin.red, lin.green, lin.blue].map(f64::from);
    let lms = mat_vec(ipt_matrices().rgb_to_lms, rgb).map(|c| signed_pow(c, IPT_EXPONENT));
    #[allow(clippy::cast_possible_truncation)]
    let [i, p, t] = mat_vec(LMS_TO_IPT, lms).map(|c| c as f32);
    Ipt { i, p, t }
}

/// Converts an IPT color to 8-bit sRGB, clamping to the gamut.
#[must_use]
pub fn from_ipt(color: Ipt) -> Srgb<u8> {
    let matrices = ipt_matrices();
    let ipt = [color.i, color.p, color.t].map(f64::from);
    let lms = mat_vec(matrices.ipt_to_lms, ipt).map(|c| signed_pow(c, 1.0 / IPT_EXPONENT));
    #[allow(clippy::cast_possible_truncation)]
    let [r, g, b] = mat_vec(matrices.lms_to_rgb, lms).map(|c| c as f32);
    from_linear(LinSrgb::new(r, g, b))
}

/// Returns the Oklab coordinates of the representative color of every
/// [`TABLE_CELL_BITS`]-bit cell, indexed by cell.
///
/// This is the fast path for metrics that can tolerate the quantization of their inputs.
#[must_use]
pub fn oklab_cell_table() -> &'static [[f32; 3]] {
    static TABLE: OnceLock<Box<[[f32; 3]]>> = OnceLock::new();
    TABLE.get_or_init(|| {
        (0..(1 << (3 * TABLE_CELL_BITS)))
            .map(|cell| {
                let [r, g, b] = cell_color(cell, TABLE_CELL_BITS);
                let Oklab { l, a, b } = to_oklab(Srgb::new(r, g, b));
                [l, a, b]
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette_index::cell_of;

    fn grid(step: usize) -> impl Iterator<Item = Srgb<u8>> {
        #[allow(clippy::cast_possible_truncation)]
        let values = (0..=255).step_by(step).chain([255]).map(|c| c as u8);
        let values = values.collect::<Vec<_>>();
        let mut colors = Vec::new();
        for &r in &values {
            for &g in &values {
                for &b in &values {
                    colors.push(Srgb::new(r, g, b));
                }
            }
        }
        colors.into_iter()
    }

    #[test]
    fn linear_round_trip() {
        for c in 0..=255 {
            assert_eq!(linear_to_srgb(srgb_to_linear(c)), c);
        }
    }

    #[test]
    fn linear_clamps() {
        assert!(srgb_to_linear(0).abs() < 1e-6);
        assert!((srgb_to_linear(255) - 1.0).abs() < 1e-6);
        assert!((srgb_to_linear(188) - 0.5).abs() < 0.01);
        let gray = srgb_to_linear(188);
        assert_eq!(from_linear(LinSrgb::new(-1.0, gray, 2.0)), Srgb::new(0, 188, 255));
        assert_eq!(linear_to_srgb(-3.0), 0);
        assert_eq!(linear_to_srgb(7.5), 255);
    }

    #[test]
    fn lab_round_trip() {
        for color in grid(15) {
            assert_eq!(from_lab(to_lab(color)), color);
        }
    }

    #[test]
    fn oklab_round_trip() {
        for color in grid(15) {
            assert_eq!(from_oklab(to_oklab(color)), color);
        }
    }

    #[test]
    fn ipt_round_trip() {
        for color in grid(15) {
            assert_eq!(from_ipt(to_ipt(color)), color);
        }
    }

    #[test]
    fn out_of_gamut_is_clamped() {
        assert_eq!(from_oklab(Oklab::new(2.0, 0.0, 0.0)), Srgb::new(255, 255, 255));
        assert_eq!(from_oklab(Oklab::new(-1.0, 0.0, 0.0)), Srgb::new(0, 0, 0));
        assert_eq!(from_ipt(Ipt { i: 5.0, p: 0.0, t: 0.0 }), Srgb::new(255, 255, 255));
    }

    #[test]
    fn white_has_full_intensity() {
        let white = Srgb::new(255, 255, 255);
        assert!((to_lab(white).l - 100.0).abs() < 0.01);
        assert!((to_oklab(white).l - 1.0).abs() < 0.001);
        assert!((to_ipt(white).i - 1.0).abs() < 0.01);
    }

    #[test]
    fn oklab_table_matches_direct_conversion() {
        let table = oklab_cell_table();
        assert_eq!(table.len(), 0x8000);

        for color in grid(51) {
            let cell = cell_of([color.red, color.green, color.blue], TABLE_CELL_BITS);
            let [r, g, b] = cell_color(cell, TABLE_CELL_BITS);
            let Oklab { l, a, b } = to_oklab(Srgb::new(r, g, b));
            assert_eq!(table[cell], [l, a, b]);
        }
    }

    #[test]
    fn colorspace_components_round_trip() {
        for space in [ColorSpace::Srgb, ColorSpace::Oklab] {
            for color in grid(51) {
                assert_eq!(space.to_srgb(space.from_srgb(color)), color);
            }
        }
    }

    #[test]
    fn oklab_ranges_cover_gamut() {
        let ranges = ColorSpace::Oklab.f32_component_ranges_from_srgb();
        for color in grid(17) {
            let components = ColorSpace::Oklab.from_srgb(color);
            for (c, (lo, hi)) in components.into_iter().zip(ranges) {
                assert!(lo - 1e-4 <= c && c <= hi + 1e-4);
            }
        }
    }
}

//! A library for fast palette reduction and dithering against a fixed palette.
//!
//! `palettize` maps every pixel of an RGBA image to the index of a color in a user supplied palette.
//! Nearest color queries are answered by a dense lookup table, a [`PaletteIndex`],
//! built once per palette and color metric. Several dithering strategies are provided
//! on top of that table, see the [`dither`] module.
//!
//! Palette index `0` is reserved as a sentinel: pixels with an alpha below [`VISIBLE_ALPHA`]
//! always map to it, and it is never chosen for a visible pixel.
//!
//! # Features
//! `palettize` has several `cargo` features that can be turned off or on:
//! - `threads`: exposes parallel versions of the table build and the per-row ditherers via [`rayon`].
//! - `image`: enables integration with the [`image`] crate.
//! - `serde`: derives `Serialize` and `Deserialize` for the configuration types.
//!
//! # High-Level API
//! To get started with the high-level API, see [`Reducer`]. Here is a short example:
//! ```no_run
//! # use palettize::{Reducer, Palette, ImageRef, Metric, Preset};
//! # use palette::Srgb;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let img = image::open("some image")?.into_rgba8();
//!
//! let palette = Palette::<u8>::with_sentinel([
//!     Srgb::new(0x1a, 0x1c, 0x2c),
//!     Srgb::new(0x5d, 0x27, 0x5d),
//!     Srgb::new(0xb1, 0x3e, 0x53),
//!     Srgb::new(0xef, 0x7d, 0x57),
//!     Srgb::new(0xff, 0xcd, 0x75),
//!     Srgb::new(0xf4, 0xf4, 0xf4),
//! ])?;
//!
//! let mut reducer = Reducer::new(palette);
//! reducer.set_metric(Metric::Ciede2000).set_strength(0.8)?;
//!
//! let ditherer = Preset::Atkinson.ditherer(None)?;
//! let reduced = reducer.reduce_rgbaimage(&img, &ditherer)?;
//! # Ok(())
//! # }
//! ```
//!
//! Note that some of the functions above require certain features to be enabled.

#![deny(unsafe_code, unsafe_op_in_unsafe_fn)]
#![warn(
    clippy::pedantic,
    clippy::cargo,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used,
    clippy::unwrap_in_result,
    clippy::expect_used,
    clippy::unneeded_field_pattern,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::unnecessary_self_imports,
    clippy::str_to_string,
    clippy::string_to_string,
    clippy::string_slice,
    missing_docs,
    clippy::missing_docs_in_private_items,
    rustdoc::all,
    clippy::float_cmp_const,
    clippy::lossy_float_literal
)]
#![allow(
    clippy::doc_markdown,
    clippy::module_name_repetitions,
    clippy::many_single_char_names,
    clippy::missing_panics_doc,
    clippy::unreadable_literal,
    clippy::wildcard_imports
)]

mod api;
mod compiled;
mod error;
mod traits;
mod types;

pub mod colorspace;
pub mod dither;
pub mod metric;
pub mod palette_index;

#[cfg(test)]
mod tests;

pub use api::*;
pub use colorspace::ColorSpace;
pub use compiled::CompiledPalette;
pub use error::ConfigError;
pub use metric::{ColorMetric, Metric};
pub use palette_index::PaletteIndex;
pub use traits::*;
pub use types::*;

/// The maximum supported image size in number of pixels is `u32::MAX`.
pub const MAX_PIXELS: u32 = u32::MAX;

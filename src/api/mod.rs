//! Contains the types for the high level [`Reducer`] API.

mod preset;
mod reducer;

pub use preset::Preset;
pub use reducer::{Reducer, ReducerConfig};

//! Error diffusion kernels.
//!
//! A [`Kernel`] lists the not yet visited neighbors that receive a share of a pixel's
//! quantization error. Offsets are given for a left to right scan; on right to left
//! serpentine rows the horizontal offsets are mirrored.

use crate::ConfigError;

/// An error diffusion kernel.
///
/// Each entry is `(dx, dy, weight)`, and the neighbor at `(x + dx, y + dy)` receives
/// `error * weight / divisor`. Entries must point forward in scan order, so either
/// `dy > 0`, or `dy == 0` and `dx > 0`. Other entries are ignored.
///
/// Most kernels propagate all of the error (the weights sum to the divisor),
/// but some, like [`ATKINSON`], propagate less.
///
/// # Examples
/// ```
/// # use palettize::{dither::Kernel, ConfigError};
/// # fn main() -> Result<(), ConfigError> {
/// let right_and_down = Kernel::new(&[(1, 0, 1), (0, 1, 1)], 2)?;
/// assert_eq!(right_and_down.total_weight(), 1.0);
/// assert!(Kernel::new(&[(1, 0, 1)], 0).is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Kernel {
    /// The `(dx, dy, weight)` entries.
    entries: &'static [(i32, i32, u8)],
    /// The divisor for each weight.
    divisor: u8,
}

impl Kernel {
    /// The maximum absolute `dx` or `dy` of an entry.
    pub const MAX_OFFSET: u32 = 8;

    /// Creates a new [`Kernel`].
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidKernel`] if `divisor` is zero
    /// or an entry is more than [`Kernel::MAX_OFFSET`] away in either direction.
    pub fn new(entries: &'static [(i32, i32, u8)], divisor: u8) -> Result<Self, ConfigError> {
        let in_range = |d: i32| d.unsigned_abs() <= Self::MAX_OFFSET;
        if divisor > 0 && entries.iter().all(|&(dx, dy, _)| in_range(dx) && in_range(dy)) {
            Ok(Self { entries, divisor })
        } else {
            Err(ConfigError::InvalidKernel)
        }
    }

    /// Returns the `(dx, dy, weight)` entries.
    #[must_use]
    pub const fn entries(&self) -> &'static [(i32, i32, u8)] {
        self.entries
    }

    /// Returns the divisor for each weight.
    #[must_use]
    pub const fn divisor(&self) -> u8 {
        self.divisor
    }

    /// Returns the entries that point forward in scan order.
    pub fn forward_entries(&self) -> impl Iterator<Item = (i32, i32, u8)> + '_ {
        self.entries
            .iter()
            .copied()
            .filter(|&(dx, dy, _)| dy > 0 || (dy == 0 && dx > 0))
    }

    /// Returns the number of rows below the current one that receive error.
    #[must_use]
    pub fn max_dy(&self) -> usize {
        self.forward_entries()
            .map(|(_, dy, _)| dy.unsigned_abs() as usize)
            .max()
            .unwrap_or(0)
    }

    /// Returns the largest horizontal distance that receives error.
    #[must_use]
    pub fn reach(&self) -> usize {
        self.forward_entries()
            .map(|(dx, _, _)| dx.unsigned_abs() as usize)
            .max()
            .unwrap_or(0)
    }

    /// Returns the fraction of the error that is propagated in total.
    #[must_use]
    pub fn total_weight(&self) -> f32 {
        let sum = self.forward_entries().map(|(_, _, w)| u32::from(w)).sum::<u32>();
        #[allow(clippy::cast_precision_loss)]
        {
            sum as f32 / f32::from(self.divisor)
        }
    }
}

/// Floyd-Steinberg.
///
/// ```text
///        X   7
///    3   5   1
/// ```
pub const FLOYD_STEINBERG: Kernel = Kernel {
    entries: &[(1, 0, 7), (-1, 1, 3), (0, 1, 5), (1, 1, 1)],
    divisor: 16,
};

/// Floyd-Steinberg propagating only 7/8 of the error, which reduces bleeding
/// and noise in flat regions.
pub const SOFT_FLOYD_STEINBERG: Kernel = Kernel {
    entries: &[(1, 0, 49), (-1, 1, 21), (0, 1, 35), (1, 1, 7)],
    divisor: 128,
};

/// "False" Floyd-Steinberg, a cheaper three neighbor approximation.
///
/// ```text
///    X   3
///    3   2
/// ```
pub const FALSE_FLOYD_STEINBERG: Kernel = Kernel {
    entries: &[(1, 0, 3), (0, 1, 3), (1, 1, 2)],
    divisor: 8,
};

/// Burkes, a two row simplification of Stucki.
///
/// ```text
///            X   8   4
///    2   4   8   4   2
/// ```
pub const BURKES: Kernel = Kernel {
    entries: &[
        (1, 0, 8),
        (2, 0, 4),
        (-2, 1, 2),
        (-1, 1, 4),
        (0, 1, 8),
        (1, 1, 4),
        (2, 1, 2),
    ],
    divisor: 32,
};

/// Sierra Lite, the smallest of the Sierra kernels.
///
/// ```text
///    X   2
///    1   1
/// ```
pub const SIERRA_LITE: Kernel = Kernel {
    entries: &[(1, 0, 2), (-1, 1, 1), (0, 1, 1)],
    divisor: 4,
};

/// Sierra two row.
///
/// ```text
///            X   4   3
///    1   2   3   2   1
/// ```
pub const SIERRA_TWO_ROW: Kernel = Kernel {
    entries: &[
        (1, 0, 4),
        (2, 0, 3),
        (-2, 1, 1),
        (-1, 1, 2),
        (0, 1, 3),
        (1, 1, 2),
        (2, 1, 1),
    ],
    divisor: 16,
};

/// Sierra (also known as Sierra-3).
///
/// ```text
///            X   5   3
///    2   4   5   4   2
///        2   3   2
/// ```
pub const SIERRA: Kernel = Kernel {
    entries: &[
        (1, 0, 5),
        (2, 0, 3),
        (-2, 1, 2),
        (-1, 1, 4),
        (0, 1, 5),
        (1, 1, 4),
        (2, 1, 2),
        (-1, 2, 2),
        (0, 2, 3),
        (1, 2, 2),
    ],
    divisor: 32,
};

/// Atkinson, which only propagates 6/8 of the error.
///
/// ```text
///        X   1   1
///    1   1   1
///        1
/// ```
pub const ATKINSON: Kernel = Kernel {
    entries: &[(1, 0, 1), (2, 0, 1), (-1, 1, 1), (0, 1, 1), (1, 1, 1), (0, 2, 1)],
    divisor: 8,
};

/// Jarvis, Judice, and Ninke.
///
/// ```text
///            X   7   5
///    3   5   7   5   3
///    1   3   5   3   1
/// ```
pub const JARVIS_JUDICE_NINKE: Kernel = Kernel {
    entries: &[
        (1, 0, 7),
        (2, 0, 5),
        (-2, 1, 3),
        (-1, 1, 5),
        (0, 1, 7),
        (1, 1, 5),
        (2, 1, 3),
        (-2, 2, 1),
        (-1, 2, 3),
        (0, 2, 5),
        (1, 2, 3),
        (2, 2, 1),
    ],
    divisor: 48,
};

/// Stucki.
///
/// ```text
///            X   8   4
///    2   4   8   4   2
///    1   2   4   2   1
/// ```
pub const STUCKI: Kernel = Kernel {
    entries: &[
        (1, 0, 8),
        (2, 0, 4),
        (-2, 1, 2),
        (-1, 1, 4),
        (0, 1, 8),
        (1, 1, 4),
        (2, 1, 2),
        (-2, 2, 1),
        (-1, 2, 2),
        (0, 2, 4),
        (1, 2, 2),
        (2, 2, 1),
    ],
    divisor: 42,
};

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Kernel; 10] = [
        FLOYD_STEINBERG,
        SOFT_FLOYD_STEINBERG,
        FALSE_FLOYD_STEINBERG,
        BURKES,
        SIERRA_LITE,
        SIERRA_TWO_ROW,
        SIERRA,
        ATKINSON,
        JARVIS_JUDICE_NINKE,
        STUCKI,
    ];

    #[test]
    fn entries_point_forward() {
        for kernel in ALL {
            assert_eq!(kernel.forward_entries().count(), kernel.entries.len());
        }
    }

    #[test]
    fn total_weights() {
        for kernel in ALL {
            let total = kernel.total_weight();
            let expected = if kernel == ATKINSON {
                0.75
            } else if kernel == SOFT_FLOYD_STEINBERG {
                0.875
            } else {
                1.0
            };
            assert!((total - expected).abs() < 1e-6, "{kernel:?}");
        }
    }

    #[test]
    fn extents() {
        assert_eq!((FLOYD_STEINBERG.max_dy(), FLOYD_STEINBERG.reach()), (1, 1));
        assert_eq!((ATKINSON.max_dy(), ATKINSON.reach()), (2, 2));
        assert_eq!((STUCKI.max_dy(), STUCKI.reach()), (2, 2));
        assert_eq!((SIERRA_LITE.max_dy(), SIERRA_LITE.reach()), (1, 1));
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn backward_entries_are_ignored() {
        let kernel = Kernel::new(&[(-1, 0, 4), (0, 0, 4), (1, 0, 8)], 16).unwrap();
        assert_eq!(kernel.forward_entries().collect::<Vec<_>>(), vec![(1, 0, 8)]);
        assert_eq!(kernel.max_dy(), 0);
    }

    #[test]
    fn new_validates() {
        assert_eq!(Kernel::new(&[(1, 0, 1)], 0), Err(ConfigError::InvalidKernel));
        assert_eq!(Kernel::new(&[(9, 0, 1)], 1), Err(ConfigError::InvalidKernel));
        assert_eq!(Kernel::new(&[(1, i32::MAX, 1)], 1), Err(ConfigError::InvalidKernel));
        assert_eq!(Kernel::new(&[(-8, 8, 1)], 1).map(|k| k.max_dy()), Ok(8));
        assert_eq!(Kernel::new(STUCKI.entries(), STUCKI.divisor()), Ok(STUCKI));
    }
}

// SPDX-License-Identifier: MIT
//! # Fixed-Point Resize Ratio and Passband
//!
//! The engine's interpolator consumes, per axis, the ratio between the input
//! and output sample grids as a 12-bit mantissa plus a 12-bit fraction
//! (`ratio = mant + frac / 4096`). The ratio is computed between the *first and
//! last* samples of each axis, hence the `size - 1` terms:
//!
//! ```text
//! fixpoint = 4096 * (size_in - 1) / (size_out - 1)
//! mant     = fixpoint / 4096
//! frac     = fixpoint % 4096
//! ```
//!
//! ## Hardware Quirks
//!
//! - Older engines only honour fractions that are a multiple of 8. Those get
//!   [`FracRounding::Multiple8`]: a fraction with low bits set is truncated to
//!   the 8-grid and then moved one step down when enlarging or one step up
//!   when shrinking.
//! - An exact 1:1 axis always programs `mant = frac = 0`.
//! - Newer engines additionally need an anti-alias passband when shrinking
//!   (see [`AxisScale::passband`]).
//!
//! All register math stays in integers so the programmed bits match what the
//! hardware expects to the last bit.

/// Fixed-point representation of 1.0.
pub const FIXPOINT_ONE: u32 = 4096;

/// Passband value meaning "no additional filtering".
pub const PASSBAND_WIDEST: u32 = 64;

/// How the fractional part is post-processed for a given engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FracRounding {
    /// Keep the full 12-bit fraction.
    Exact,
    /// Force the fraction onto a multiple of 8, rounding toward the output
    /// grid (down when enlarging, up when shrinking).
    Multiple8,
}

/// Mantissa and fraction of one axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AxisScale {
    pub mant: u32,
    pub frac: u32,
}

impl AxisScale {
    /// Compute the ratio for `size_in` input samples mapped onto `size_out`
    /// output samples.
    ///
    /// Returns `None` when `size_out < 2` or `size_in == 0`, for which no ratio
    /// between the end samples exists.
    pub fn compute(size_in: u32, size_out: u32, rounding: FracRounding) -> Option<Self> {
        if size_in == 0 || size_out < 2 {
            return None;
        }

        let fixpoint = (FIXPOINT_ONE as u64 * (size_in as u64 - 1)) / (size_out as u64 - 1);
        let fixpoint = u32::try_from(fixpoint).ok()?;
        let mant = fixpoint / FIXPOINT_ONE;
        let mut frac = fixpoint % FIXPOINT_ONE;

        if rounding == FracRounding::Multiple8 && frac & 0x07 != 0 {
            frac &= !0x07;
            if size_out > size_in {
                frac = frac.saturating_sub(8);
            } else {
                frac += 8;
            }
        }

        if size_in == size_out {
            return Some(Self::default());
        }

        Some(Self { mant, frac })
    }

    /// The 16-bit `(mant << 12) | frac` field written into the resize filter
    /// control register. The fraction is OR-ed in, as the hardware expects, so
    /// a fraction rounded up to 4096 lands on bit 12.
    pub fn packed(self) -> u32 {
        ((self.mant << 12) | self.frac) & 0xffff
    }

    /// Anti-alias filter bandwidth for this axis.
    ///
    /// Enlarging or 1:1 uses [`PASSBAND_WIDEST`]. Shrinking picks a divisor from
    /// the mantissa range (`[8, 16)` -> 4, `[4, 8)` -> 2, otherwise 1) and returns
    /// `64 * 4096 * divisor / (4096 * mant + frac)`.
    pub fn passband(self, size_in: u32, size_out: u32) -> u32 {
        if size_out >= size_in {
            return PASSBAND_WIDEST;
        }

        let divisor = match self.mant {
            8..=15 => 4,
            4..=7 => 2,
            _ => 1,
        };

        let ratio = FIXPOINT_ONE * self.mant + self.frac;
        (PASSBAND_WIDEST * FIXPOINT_ONE * divisor)
            .checked_div(ratio)
            .unwrap_or(PASSBAND_WIDEST)
    }

    /// The ratio as a float, for diagnostics.
    pub fn ratio(self) -> f64 {
        self.mant as f64 + self.frac as f64 / FIXPOINT_ONE as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_to_one_is_zero() {
        for size in [2u32, 16, 17, 240, 480, 719, 720, 1080, 4092] {
            for rounding in [FracRounding::Exact, FracRounding::Multiple8] {
                let s = AxisScale::compute(size, size, rounding).unwrap();
                assert_eq!(s, AxisScale { mant: 0, frac: 0 }, "size {size}");
                assert_eq!(s.packed(), 0);
            }
        }
    }

    #[test]
    fn test_downscale_ratio() {
        // 720 -> 320: 4096 * 719 / 319 = 9232, already on the 8-grid
        let s = AxisScale::compute(720, 320, FracRounding::Exact).unwrap();
        assert_eq!(s, AxisScale { mant: 2, frac: 1040 });
        assert_eq!(s.packed(), (2 << 12) | 1040);
        assert_eq!(AxisScale::compute(720, 320, FracRounding::Multiple8).unwrap(), s);
        assert_eq!(s.ratio(), 2.0 + 1040.0 / 4096.0);

        // 720 -> 240: 4096 * 719 / 239 = 12322, fraction 34 truncates to 32
        // and moves up one step
        let exact = AxisScale::compute(720, 240, FracRounding::Exact).unwrap();
        assert_eq!(exact, AxisScale { mant: 3, frac: 34 });
        let grid = AxisScale::compute(720, 240, FracRounding::Multiple8).unwrap();
        assert_eq!(grid, AxisScale { mant: 3, frac: 40 });
    }

    #[test]
    fn test_upscale_rounds_down_on_grid() {
        // 320 -> 720: 4096 * 319 / 719 = 1817
        let exact = AxisScale::compute(320, 720, FracRounding::Exact).unwrap();
        assert_eq!(exact, AxisScale { mant: 0, frac: 1817 });

        let grid = AxisScale::compute(320, 720, FracRounding::Multiple8).unwrap();
        assert_eq!(grid, AxisScale { mant: 0, frac: 1808 });
        assert_eq!(grid.frac % 8, 0);
    }

    #[test]
    fn test_fraction_already_on_grid_is_kept() {
        // 4096 * 16 / 32 = 2048
        let s = AxisScale::compute(17, 33, FracRounding::Multiple8).unwrap();
        assert_eq!(s, AxisScale { mant: 0, frac: 2048 });
    }

    #[test]
    fn test_degenerate_sizes() {
        assert_eq!(AxisScale::compute(16, 1, FracRounding::Exact), None);
        assert_eq!(AxisScale::compute(0, 16, FracRounding::Exact), None);
    }

    #[test]
    fn test_passband() {
        let up = AxisScale::compute(320, 720, FracRounding::Exact).unwrap();
        assert_eq!(up.passband(320, 720), PASSBAND_WIDEST);

        let same = AxisScale::compute(480, 480, FracRounding::Exact).unwrap();
        assert_eq!(same.passband(480, 480), PASSBAND_WIDEST);

        // mant 2 -> divisor 1: 64 * 4096 / 9232 = 28
        let down = AxisScale::compute(720, 320, FracRounding::Exact).unwrap();
        assert_eq!(down.passband(720, 320), 28);

        // mant 4 -> divisor 2
        let quarter = AxisScale { mant: 4, frac: 0 };
        assert_eq!(quarter.passband(1024, 256), 32);

        // mant 8 -> divisor 4
        let eighth = AxisScale { mant: 8, frac: 0 };
        assert_eq!(eighth.passband(2048, 256), 32);

        // mant 16 falls back to divisor 1
        let sixteenth = AxisScale { mant: 16, frac: 0 };
        assert_eq!(sixteenth.passband(4096, 256), 4);
    }
}

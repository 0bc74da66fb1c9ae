//! core/bach-time/src/meter.rs
//! Meter (time signature) on the tick grid.

use crate::tick::{TICKS_PER_BEAT, Tick};

/// Time signature / meter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Meter {
    pub numerator: u8,
    pub denominator: u8,
}

impl Meter {
    /// Common 4/4 meter.
    pub const FOUR_FOUR: Meter = Meter { numerator: 4, denominator: 4 };
    /// 3/4 meter (chaconne, sarabande).
    pub const THREE_FOUR: Meter = Meter { numerator: 3, denominator: 4 };
    /// 6/8 compound meter.
    pub const SIX_EIGHT: Meter = Meter { numerator: 6, denominator: 8 };
    /// 3/8 meter (Goldberg aria).
    pub const THREE_EIGHT: Meter = Meter { numerator: 3, denominator: 8 };

    /// Construct a new meter.
    ///
    /// # Panics
    ///
    /// Panics if either `numerator` or `denominator` is zero.
    #[must_use]
    pub fn new(numerator: u8, denominator: u8) -> Self {
        assert!(numerator > 0, "numerator must be > 0");
        assert!(denominator > 0, "denominator must be > 0");
        Self { numerator, denominator }
    }

    /// Ticks in one bar of this meter: `num * 480 * 4 / den`.
    #[must_use]
    pub fn ticks_per_bar(&self) -> Tick {
        Tick::from(self.numerator) * TICKS_PER_BEAT * 4 / Tick::from(self.denominator)
    }

    /// The denominator expressed as a power of two, as SMF encodes it.
    #[must_use]
    pub fn denominator_log2(&self) -> u8 {
        let mut value = self.denominator;
        let mut log = 0;
        while value > 1 {
            value /= 2;
            log += 1;
        }
        log
    }
}

impl Default for Meter {
    fn default() -> Self {
        Self::FOUR_FOUR
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_per_bar_matches_common_meters() {
        assert_eq!(Meter::FOUR_FOUR.ticks_per_bar(), 1920);
        assert_eq!(Meter::THREE_FOUR.ticks_per_bar(), 1440);
        assert_eq!(Meter::SIX_EIGHT.ticks_per_bar(), 1440);
        assert_eq!(Meter::THREE_EIGHT.ticks_per_bar(), 720);
    }

    #[test]
    fn denominator_log_for_smf() {
        assert_eq!(Meter::FOUR_FOUR.denominator_log2(), 2);
        assert_eq!(Meter::SIX_EIGHT.denominator_log2(), 3);
    }
}

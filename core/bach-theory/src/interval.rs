//! core/bach-theory/src/interval.rs
//! Vertical interval classification for the consonance rules.

/// Simple interval (mod 12) between two pitches.
#[must_use]
pub fn simple_interval(a: u8, b: u8) -> u8 {
    a.abs_diff(b) % 12
}

/// Consonance class of a simple interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalClass {
    /// P1, P5, P8 (classes 0 and 7).
    PerfectConsonance,
    /// m3, M3, m6, M6 (classes 3, 4, 8, 9).
    ImperfectConsonance,
    /// P4 (class 5) — consonant only between upper voices.
    Fourth,
    /// M2, m7 (classes 2, 10).
    MildDissonance,
    /// m2, TT, M7 (classes 1, 6, 11).
    HarshDissonance,
}

impl IntervalClass {
    /// Classify a simple interval (0-11).
    #[must_use]
    pub fn of(simple: u8) -> Self {
        match simple % 12 {
            0 | 7 => Self::PerfectConsonance,
            3 | 4 | 8 | 9 => Self::ImperfectConsonance,
            5 => Self::Fourth,
            2 | 10 => Self::MildDissonance,
            _ => Self::HarshDissonance,
        }
    }

    /// Whether the interval is consonant between upper voices.
    #[must_use]
    pub fn is_consonant_between_upper(self) -> bool {
        matches!(self, Self::PerfectConsonance | Self::ImperfectConsonance | Self::Fourth)
    }

    /// Whether the interval is consonant against the bass.
    #[must_use]
    pub fn is_consonant_against_bass(self) -> bool {
        matches!(self, Self::PerfectConsonance | Self::ImperfectConsonance)
    }
}

//! core/bach-time/src/tick.rs
//! Tick constants and bar/beat arithmetic.
//!
//! A [`Tick`] is a non-negative count of 480ths of a quarter note. The grid
//! is independent of tempo: a bar at 4/4 is always 1920 ticks.

/// Integer time unit: 480 per quarter note.
pub type Tick = u32;

/// Ticks in one quarter-note beat.
pub const TICKS_PER_BEAT: Tick = 480;

/// Beats per bar at the default 4/4 meter.
pub const BEATS_PER_BAR: Tick = 4;

/// Ticks in one 4/4 bar.
pub const TICKS_PER_BAR: Tick = TICKS_PER_BEAT * BEATS_PER_BAR;

/// Half note (two beats).
pub const HALF_NOTE: Tick = TICKS_PER_BEAT * 2;
/// Quarter note (one beat).
pub const QUARTER_NOTE: Tick = TICKS_PER_BEAT;
/// Eighth note.
pub const EIGHTH_NOTE: Tick = TICKS_PER_BEAT / 2;
/// Sixteenth note.
pub const SIXTEENTH_NOTE: Tick = TICKS_PER_BEAT / 4;
/// Dotted half note.
pub const DOTTED_HALF: Tick = HALF_NOTE + QUARTER_NOTE;
/// Dotted quarter note.
pub const DOTTED_QUARTER: Tick = QUARTER_NOTE + EIGHTH_NOTE;
/// Dotted eighth note.
pub const DOTTED_EIGHTH: Tick = EIGHTH_NOTE + SIXTEENTH_NOTE;

/// Whether a tick falls on a strong beat of its 4/4 bar (beats 1 and 3).
#[must_use]
pub fn is_strong_beat(tick: Tick) -> bool {
    let pos = tick % TICKS_PER_BAR;
    pos == 0 || pos == TICKS_PER_BEAT * 2
}

/// Zero-based beat index within the tick's bar.
#[must_use]
pub fn beat_in_bar(tick: Tick) -> Tick {
    (tick % TICKS_PER_BAR) / TICKS_PER_BEAT
}

/// Zero-based bar index containing the tick.
#[must_use]
pub fn bar_of(tick: Tick) -> Tick {
    tick / TICKS_PER_BAR
}

/// Round a tick to the nearest sixteenth-note grid position.
#[must_use]
pub fn quantize_to_sixteenth(tick: Tick) -> Tick {
    let half = SIXTEENTH_NOTE / 2;
    ((tick + half) / SIXTEENTH_NOTE) * SIXTEENTH_NOTE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strong_beats_fall_on_one_and_three() {
        assert!(is_strong_beat(0));
        assert!(!is_strong_beat(TICKS_PER_BEAT));
        assert!(is_strong_beat(TICKS_PER_BEAT * 2));
        assert!(!is_strong_beat(TICKS_PER_BEAT * 3));
        assert!(is_strong_beat(TICKS_PER_BAR));
        assert!(is_strong_beat(TICKS_PER_BAR + TICKS_PER_BEAT * 2));
    }

    #[test]
    fn bar_and_beat_indices() {
        assert_eq!(bar_of(0), 0);
        assert_eq!(bar_of(TICKS_PER_BAR - 1), 0);
        assert_eq!(bar_of(TICKS_PER_BAR), 1);
        assert_eq!(beat_in_bar(TICKS_PER_BEAT * 3 + 10), 3);
    }

    #[test]
    fn sixteenth_quantization_rounds_to_nearest() {
        assert_eq!(quantize_to_sixteenth(0), 0);
        assert_eq!(quantize_to_sixteenth(59), 0);
        assert_eq!(quantize_to_sixteenth(60), 120);
        assert_eq!(quantize_to_sixteenth(130), 120);
        assert_eq!(quantize_to_sixteenth(185), 240);
    }
}

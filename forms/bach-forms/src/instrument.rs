//! forms/bach-forms/src/instrument.rs
//! Instrument profiles: GM program and playable range, plus per-voice
//! range bands. The instrument never changes generation logic.

use bach_api::Instrument;

/// GM program and playable range for one instrument.
#[derive(Debug, Clone, Copy)]
pub struct InstrumentProfile {
    /// 0-indexed GM program number.
    pub program: u8,
    pub register_low: u8,
    pub register_high: u8,
}

/// Profile table.
#[must_use]
pub fn instrument_profile(instrument: Instrument) -> InstrumentProfile {
    match instrument {
        Instrument::Organ => InstrumentProfile { program: 19, register_low: 36, register_high: 96 },
        Instrument::Violin => InstrumentProfile { program: 40, register_low: 55, register_high: 96 },
        Instrument::Cello => InstrumentProfile { program: 42, register_low: 36, register_high: 81 },
        Instrument::Guitar => InstrumentProfile { program: 24, register_low: 40, register_high: 83 },
        Instrument::Harpsichord => {
            InstrumentProfile { program: 6, register_low: 29, register_high: 89 }
        }
        Instrument::Piano => InstrumentProfile { program: 0, register_low: 21, register_high: 108 },
    }
}

/// Overlapping range bands for `num_voices` voices, lowest voice first.
///
/// Each voice gets roughly two octaves, stepped upward through the
/// instrument's register so neighboring voices overlap by about a fifth.
#[must_use]
pub fn voice_ranges(instrument: Instrument, num_voices: u8) -> Vec<(u8, u8)> {
    let profile = instrument_profile(instrument);
    let span = profile.register_high - profile.register_low;
    let band = 24u8.min(span);
    let voices = num_voices.max(1);
    let step = if voices > 1 {
        (span.saturating_sub(band)) / (voices - 1)
    } else {
        0
    };

    (0..voices)
        .map(|voice| {
            let low = profile.register_low + step * voice;
            let high = (low + band).min(profile.register_high);
            (low, high)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profiles_cover_known_instruments() {
        assert_eq!(instrument_profile(Instrument::Violin).program, 40);
        assert_eq!(instrument_profile(Instrument::Violin).register_low, 55);
        assert_eq!(instrument_profile(Instrument::Cello).register_high, 81);
        assert_eq!(instrument_profile(Instrument::Piano).program, 0);
    }

    #[test]
    fn voice_bands_ascend_and_stay_in_range() {
        for voices in 2..=5u8 {
            let ranges = voice_ranges(Instrument::Organ, voices);
            assert_eq!(ranges.len(), usize::from(voices));
            let profile = instrument_profile(Instrument::Organ);
            for window in ranges.windows(2) {
                assert!(window[1].0 >= window[0].0, "bands must ascend");
            }
            for (low, high) in ranges {
                assert!(low >= profile.register_low);
                assert!(high <= profile.register_high);
                assert!(low < high);
            }
        }
    }
}

//! texture/bach-texture/src/generate.rs
//! The texture generators.
//!
//! Every generator respects the context register, produces durations from
//! the rhythm profile (grace notes excepted), never emits a note at or
//! after the context end, and is deterministic in the seed.

use bach_harmony::{HarmonicTimeline, nearest_chord_tone};
use bach_score::{NoteEvent, NoteSource};
use bach_theory::scale::{ScaleKind, nearest_scale_tone, step_scale_degrees};
use bach_time::{TICKS_PER_BEAT, Tick, is_strong_beat};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::context::{TextureContext, TextureKind};
use crate::rhythm::{RhythmProfile, subdivisions};

/// Texture notes play in voice 1; voice 0 carries the ground bass.
const TEXTURE_VOICE: u8 = 1;
/// Grace-note length for chord rolls.
const GRACE_TICKS: Tick = 60;
/// Violin open strings, low to high.
const OPEN_STRINGS: [u8; 4] = [55, 62, 69, 76];

/// Render a texture over the timeline slice the context covers.
///
/// `FullChords` outside a climax returns an empty stream.
#[must_use]
pub fn generate_texture(ctx: &TextureContext, timeline: &HarmonicTimeline) -> Vec<NoteEvent> {
    let mut rng = ChaCha8Rng::seed_from_u64(u64::from(ctx.seed));
    let notes = match ctx.kind {
        TextureKind::SingleLine => single_line(ctx, timeline, &mut rng),
        TextureKind::ImpliedPolyphony => implied_polyphony(ctx, timeline, &mut rng),
        TextureKind::FullChords => full_chords(ctx, timeline, &mut rng),
        TextureKind::Arpeggiated => arpeggiated(ctx, timeline, &mut rng),
        TextureKind::ScalePassage => scale_passage(ctx, timeline, &mut rng),
        TextureKind::Bariolage => bariolage(ctx, timeline),
    };
    debug_assert!(notes.iter().all(|n| n.start_tick < ctx.end_tick()));
    notes
}

fn texture_note(tick: Tick, duration: Tick, pitch: u8, velocity: u8) -> NoteEvent {
    NoteEvent::new(tick, duration, pitch, velocity, TEXTURE_VOICE)
        .with_source(NoteSource::TextureNote)
}

/// Pull a pitch inside the register by octave shifts, then clamp.
fn into_register(pitch: u8, ctx: &TextureContext) -> u8 {
    let mut value = i32::from(pitch);
    while value < i32::from(ctx.register_low) {
        value += 12;
    }
    while value > i32::from(ctx.register_high) {
        value -= 12;
    }
    value.clamp(i32::from(ctx.register_low), i32::from(ctx.register_high)) as u8
}

/// Density throttle: restrained sections fall back to sparser profiles.
fn effective_profile(ctx: &TextureContext) -> RhythmProfile {
    if ctx.rhythm_density < 0.8 {
        match ctx.rhythm_profile {
            RhythmProfile::Sixteenth | RhythmProfile::Mixed8th16th => RhythmProfile::EighthNote,
            RhythmProfile::Triplet | RhythmProfile::DottedEighth => RhythmProfile::EighthNote,
            other => other,
        }
    } else {
        ctx.rhythm_profile
    }
}

/// One chord tone per beat, profile filler between, stepwise where the
/// chord allows.
fn single_line(
    ctx: &TextureContext,
    timeline: &HarmonicTimeline,
    rng: &mut ChaCha8Rng,
) -> Vec<NoteEvent> {
    let mut notes = Vec::new();
    let scale = ScaleKind::for_key(ctx.key);
    let profile = effective_profile(ctx);
    let mut previous = ctx.register_center();

    let mut beat = ctx.start_tick;
    while beat < ctx.end_tick() {
        let event = timeline.get_at(beat);
        let anchor = into_register(nearest_chord_tone(previous, &event), ctx);

        for (idx, (offset, duration)) in subdivisions(profile, TICKS_PER_BEAT).into_iter().enumerate()
        {
            let tick = beat + offset;
            if tick >= ctx.end_tick() {
                break;
            }
            let pitch = if idx == 0 {
                anchor
            } else {
                // Filler: a scale neighbor leaning up or down.
                let direction = if rng.gen_bool(0.5) { 1 } else { -1 };
                into_register(step_scale_degrees(anchor, direction, ctx.key, scale), ctx)
            };
            notes.push(texture_note(tick, duration, pitch, 72));
        }

        previous = anchor;
        beat += TICKS_PER_BEAT;
    }
    notes
}

/// Alternate between upper and lower register halves on each subdivision,
/// implying two voices on one line.
fn implied_polyphony(
    ctx: &TextureContext,
    timeline: &HarmonicTimeline,
    rng: &mut ChaCha8Rng,
) -> Vec<NoteEvent> {
    let mut notes = Vec::new();
    let center = ctx.register_center();
    let profile = effective_profile(ctx);
    let mut upper_first = rng.gen_bool(0.5);

    let mut beat = ctx.start_tick;
    while beat < ctx.end_tick() {
        let event = timeline.get_at(beat);

        for (idx, (offset, duration)) in subdivisions(profile, TICKS_PER_BEAT).into_iter().enumerate()
        {
            let tick = beat + offset;
            if tick >= ctx.end_tick() {
                break;
            }
            let use_upper = (idx % 2 == 0) == upper_first;
            let half_center = if use_upper {
                center + (ctx.register_high - center) / 2
            } else {
                ctx.register_low + (center - ctx.register_low) / 2
            };
            let pitch = into_register(nearest_chord_tone(half_center, &event), ctx);
            let pitch = if use_upper { pitch.max(center) } else { pitch.min(center) };
            notes.push(texture_note(tick, duration, pitch, 72));
        }

        // Flip the leading half each bar for variety.
        if beat % (TICKS_PER_BEAT * 4) == TICKS_PER_BEAT * 3 {
            upper_first = !upper_first;
        }
        beat += TICKS_PER_BEAT;
    }
    notes
}

/// Rolled chords: short grace notes then sustained tones at elevated
/// velocity. Climax variations only.
fn full_chords(
    ctx: &TextureContext,
    timeline: &HarmonicTimeline,
    rng: &mut ChaCha8Rng,
) -> Vec<NoteEvent> {
    if !ctx.is_climax {
        return Vec::new();
    }

    let mut notes = Vec::new();
    let mut tick = ctx.start_tick;
    while tick < ctx.end_tick() {
        let event = timeline.get_at(tick);
        let classes = event.chord.pitch_classes();
        let mut chord_pitches: Vec<u8> = classes
            .iter()
            .map(|&class| into_register(ctx.register_low.saturating_add(class), ctx))
            .collect();
        chord_pitches.sort_unstable();
        chord_pitches.dedup();

        let wants_two_graces = rng.gen_bool(0.5);
        let grace_count = usize::from(wants_two_graces) + 1;
        let grace_count = grace_count.min(chord_pitches.len());
        let sustained_count = (chord_pitches.len() - grace_count).clamp(1, 2);

        let mut roll_tick = tick;
        for &pitch in chord_pitches.iter().take(grace_count) {
            if roll_tick >= ctx.end_tick() {
                break;
            }
            notes.push(texture_note(roll_tick, GRACE_TICKS, pitch, 85));
            roll_tick += GRACE_TICKS;
        }
        for &pitch in chord_pitches.iter().skip(grace_count).take(sustained_count) {
            if roll_tick >= ctx.end_tick() {
                break;
            }
            let duration = TICKS_PER_BEAT.min(ctx.end_tick() - roll_tick);
            notes.push(texture_note(roll_tick, duration, pitch, 92));
        }

        tick += TICKS_PER_BEAT * 2;
    }
    notes
}

/// Sixteenth-note broken chords sweeping the register.
fn arpeggiated(
    ctx: &TextureContext,
    timeline: &HarmonicTimeline,
    rng: &mut ChaCha8Rng,
) -> Vec<NoteEvent> {
    let mut notes = Vec::new();
    let mut ascending = rng.gen_bool(0.5);

    let mut beat = ctx.start_tick;
    while beat < ctx.end_tick() {
        let event = timeline.get_at(beat);
        let classes = event.chord.pitch_classes();

        // Chord tones spread over the register from its lower third.
        let anchor = ctx.register_low + (ctx.register_high - ctx.register_low) / 3;
        let mut sweep: Vec<u8> = Vec::with_capacity(4);
        for step in 0..4u8 {
            let class = classes[usize::from(step) % classes.len()];
            let octave_lift = 12 * (u32::from(step) / classes.len() as u32);
            let raw = u32::from(anchor / 12) * 12 + u32::from(class) + octave_lift;
            sweep.push(into_register(raw.min(127) as u8, ctx));
        }
        sweep.sort_unstable();
        if !ascending {
            sweep.reverse();
        }

        for (idx, (offset, duration)) in
            subdivisions(RhythmProfile::Sixteenth, TICKS_PER_BEAT).into_iter().enumerate()
        {
            let tick = beat + offset;
            if tick >= ctx.end_tick() {
                break;
            }
            notes.push(texture_note(tick, duration, sweep[idx % sweep.len()], 70));
        }

        ascending = !ascending;
        beat += TICKS_PER_BEAT;
    }
    notes
}

/// Sixteenth runs from each beat's chord tone toward the next beat's,
/// alternating direction.
fn scale_passage(
    ctx: &TextureContext,
    timeline: &HarmonicTimeline,
    rng: &mut ChaCha8Rng,
) -> Vec<NoteEvent> {
    let mut notes = Vec::new();
    let scale = ScaleKind::for_key(ctx.key);
    let mut previous = into_register(
        nearest_chord_tone(ctx.register_center(), &timeline.get_at(ctx.start_tick)),
        ctx,
    );
    let mut ascending = rng.gen_bool(0.5);

    let mut beat = ctx.start_tick;
    while beat < ctx.end_tick() {
        let next_event = timeline.get_at(beat + TICKS_PER_BEAT);
        let target = into_register(nearest_chord_tone(previous, &next_event), ctx);

        let mut pitch = previous;
        for (offset, duration) in subdivisions(RhythmProfile::Sixteenth, TICKS_PER_BEAT) {
            let tick = beat + offset;
            if tick >= ctx.end_tick() {
                break;
            }
            notes.push(texture_note(tick, duration, pitch, 70));

            // Walk the scale toward the target, or keep sweeping in the
            // current direction when already there.
            let step = if pitch < target {
                1
            } else if pitch > target {
                -1
            } else if ascending {
                1
            } else {
                -1
            };
            pitch = into_register(step_scale_degrees(pitch, step, ctx.key, scale), ctx);
        }

        previous = into_register(nearest_scale_tone(target, ctx.key, scale), ctx);
        ascending = !ascending;
        beat += TICKS_PER_BEAT;
    }
    notes
}

/// Stopped-note / open-string oscillation. Within one beat the same two
/// pitches alternate; a stopped tone that coincides with its open string
/// keeps the plain chord tone on strong beats.
fn bariolage(ctx: &TextureContext, timeline: &HarmonicTimeline) -> Vec<NoteEvent> {
    let mut notes = Vec::new();

    let mut beat = ctx.start_tick;
    while beat < ctx.end_tick() {
        let event = timeline.get_at(beat);
        let stopped = into_register(nearest_chord_tone(ctx.register_center(), &event), ctx);
        let open = OPEN_STRINGS
            .iter()
            .copied()
            .filter(|&string| string >= ctx.register_low && string <= ctx.register_high)
            .min_by_key(|&string| string.abs_diff(stopped))
            .unwrap_or(stopped);

        let stopped = if stopped == open && !is_strong_beat(beat) {
            // Distinguish the pair off the strong beats by lifting the
            // stopped note to the next chord tone above the string.
            into_register(nearest_chord_tone(open.saturating_add(3), &event), ctx)
        } else {
            stopped
        };

        for (idx, (offset, duration)) in
            subdivisions(RhythmProfile::Sixteenth, TICKS_PER_BEAT).into_iter().enumerate()
        {
            let tick = beat + offset;
            if tick >= ctx.end_tick() {
                break;
            }
            let pitch = if idx % 2 == 0 { stopped } else { open };
            notes.push(texture_note(tick, duration, pitch, 74));
        }

        beat += TICKS_PER_BEAT;
    }
    notes
}

#[cfg(test)]
mod tests {
    use super::*;
    use bach_harmony::progression::{Resolution, create_standard};
    use bach_theory::pitch::{KeySignature, PitchClass};
    use bach_time::TICKS_PER_BAR;

    fn d_minor_timeline() -> (KeySignature, HarmonicTimeline) {
        let key = KeySignature::new(PitchClass::D, true);
        let timeline = create_standard(key, TICKS_PER_BAR * 4, Resolution::Bar);
        (key, timeline)
    }

    fn ctx(kind: TextureKind, key: KeySignature) -> TextureContext {
        let mut ctx = TextureContext::new(kind, key, 0, TICKS_PER_BAR);
        ctx.register_low = 55;
        ctx.register_high = 96;
        ctx.seed = 11;
        ctx
    }

    #[test]
    fn every_texture_respects_register_and_bounds() {
        let (key, timeline) = d_minor_timeline();
        for kind in [
            TextureKind::SingleLine,
            TextureKind::ImpliedPolyphony,
            TextureKind::Arpeggiated,
            TextureKind::ScalePassage,
            TextureKind::Bariolage,
        ] {
            let ctx = ctx(kind, key);
            let notes = generate_texture(&ctx, &timeline);
            assert!(!notes.is_empty(), "{kind:?}");
            for note in &notes {
                assert!(note.pitch >= 55 && note.pitch <= 96, "{kind:?} pitch {}", note.pitch);
                assert!(note.start_tick < ctx.end_tick(), "{kind:?}");
                assert!(note.duration > 0);
                assert_eq!(note.voice, TEXTURE_VOICE);
                assert_eq!(note.source, NoteSource::TextureNote);
            }
        }
    }

    #[test]
    fn textures_are_deterministic_in_the_seed() {
        let (key, timeline) = d_minor_timeline();
        let context = ctx(TextureKind::Arpeggiated, key);
        let first = generate_texture(&context, &timeline);
        let second = generate_texture(&context, &timeline);
        assert_eq!(first, second);
    }

    #[test]
    fn full_chords_require_a_climax() {
        let (key, timeline) = d_minor_timeline();
        let silent = generate_texture(&ctx(TextureKind::FullChords, key), &timeline);
        assert!(silent.is_empty());

        let mut climax = ctx(TextureKind::FullChords, key);
        climax.is_climax = true;
        let notes = generate_texture(&climax, &timeline);
        assert!(!notes.is_empty());
        assert!(notes.iter().all(|n| n.velocity >= 85));
        assert!(notes.iter().any(|n| n.duration == GRACE_TICKS));
    }

    #[test]
    fn bariolage_alternates_two_fixed_pitches_per_beat() {
        let (key, timeline) = d_minor_timeline();
        for seed in [1u32, 9, 42] {
            let mut context = ctx(TextureKind::Bariolage, key);
            context.seed = seed;
            let notes = generate_texture(&context, &timeline);

            for group in notes.chunks(4) {
                if group.len() < 4 {
                    continue;
                }
                assert_eq!(group[0].pitch, group[2].pitch, "even positions differ");
                assert_eq!(group[1].pitch, group[3].pitch, "odd positions differ");
            }
        }
    }

    #[test]
    fn scale_passages_stay_mostly_on_scale() {
        let (key, timeline) = d_minor_timeline();
        let notes = generate_texture(&ctx(TextureKind::ScalePassage, key), &timeline);
        let on_scale = notes
            .iter()
            .filter(|n| {
                bach_theory::scale::is_scale_tone(n.pitch, key, ScaleKind::HarmonicMinor)
                    || bach_theory::scale::is_scale_tone(n.pitch, key, ScaleKind::NaturalMinor)
            })
            .count();
        assert!(on_scale as f32 / notes.len() as f32 >= 0.8);
    }

    #[test]
    fn implied_polyphony_covers_both_register_halves() {
        let (key, timeline) = d_minor_timeline();
        let mut context = ctx(TextureKind::ImpliedPolyphony, key);
        context.duration_ticks = TICKS_PER_BAR * 4;
        let notes = generate_texture(&context, &timeline);
        let center = context.register_center();
        let upper = notes.iter().filter(|n| n.pitch >= center).count();
        let lower = notes.len() - upper;
        let ratio = upper.min(lower) as f32 / notes.len() as f32;
        assert!(ratio >= 0.2, "half representation {ratio}");
    }
}

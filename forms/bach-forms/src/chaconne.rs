//! forms/bach-forms/src/chaconne.rs
//! Chaconne assembly: an immutable ground bass cycling under textured
//! variations whose roles trace an establish → develop → destabilize →
//! illuminate → accumulate → resolve arc.

use bach_analysis::{FailIssue, FailKind, FailReport, FailSeverity};
use bach_api::{DurationScale, ValidatedConfig};
use bach_counterpoint::coordinate::{CoordinationConfig, coordinate_voices};
use bach_harmony::HarmonicTimeline;
use bach_harmony::progression::{CadenceKind, ProgressionKind, Resolution, apply_cadence};
use bach_score::{NoteEvent, NoteSource};
use bach_texture::{RhythmProfile, TextureContext, TextureKind, generate_texture};
use bach_theory::pitch::KeySignature;
use bach_theory::scale::{ScaleKind, step_scale_degrees};
use bach_time::{HALF_NOTE, Meter, TICKS_PER_BAR, TempoEvent, Tick};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::generate::{GeneratedPiece, append_progression, metadata_json, sub_seed,
    tracks_from_notes};
use crate::instrument::instrument_profile;

/// Bars in one ground-bass cycle.
const GROUND_BARS: Tick = 4;
/// Ticks in one cycle.
const CYCLE_TICKS: Tick = GROUND_BARS * TICKS_PER_BAR;

/// Structural role of one variation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VariationRole {
    Establish,
    Develop,
    Destabilize,
    Illuminate,
    Accumulate,
    Resolve,
}

/// Character type of one variation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VariationKind {
    Theme,
    Lyrical,
    Rhythmic,
    Virtuosic,
    Chordal,
}

/// One planned variation.
struct Variation {
    role: VariationRole,
    texture: TextureKind,
    rhythm: RhythmProfile,
    progression: ProgressionKind,
    is_major_section: bool,
}

fn variation_count(scale: DurationScale) -> usize {
    match scale {
        DurationScale::Short => 4,
        DurationScale::Standard => 8,
        DurationScale::Long => 12,
        DurationScale::Full => 16,
    }
}

/// Role arc across the set: establish at the head, resolve at the tail,
/// the climax about three quarters through, one major-mode island in the
/// middle of longer sets.
fn role_for(index: usize, total: usize) -> VariationRole {
    if index == 0 {
        return VariationRole::Establish;
    }
    if index + 1 == total {
        return VariationRole::Resolve;
    }
    let position = index as f32 / total as f32;
    if position >= 0.70 && position < 0.85 {
        VariationRole::Accumulate
    } else if total >= 8 && (0.45..0.60).contains(&position) {
        VariationRole::Illuminate
    } else if position >= 0.30 {
        VariationRole::Destabilize
    } else {
        VariationRole::Develop
    }
}

/// Weighted choice helper over a small option table.
fn select_weighted<T: Copy>(rng: &mut ChaCha8Rng, options: &[(T, f32)]) -> T {
    let total: f32 = options.iter().map(|&(_, weight)| weight).sum();
    let mut roll = rng.r#gen::<f32>() * total;
    for &(option, weight) in options {
        if roll < weight {
            return option;
        }
        roll -= weight;
    }
    options[options.len() - 1].0
}

/// Rhythm profile per role and kind.
fn select_rhythm(rng: &mut ChaCha8Rng, kind: VariationKind, role: VariationRole) -> RhythmProfile {
    use RhythmProfile as R;
    match role {
        VariationRole::Establish => {
            if rng.gen_bool(0.7) { R::QuarterNote } else { R::EighthNote }
        }
        VariationRole::Resolve => R::QuarterNote,
        _ => match kind {
            VariationKind::Theme => R::QuarterNote,
            VariationKind::Lyrical => select_weighted(
                rng,
                &[(R::EighthNote, 0.40), (R::DottedEighth, 0.35), (R::Triplet, 0.25)],
            ),
            VariationKind::Rhythmic => select_weighted(
                rng,
                &[(R::DottedEighth, 0.35), (R::Mixed8th16th, 0.40), (R::Triplet, 0.25)],
            ),
            VariationKind::Virtuosic => {
                select_weighted(rng, &[(R::Sixteenth, 0.60), (R::Mixed8th16th, 0.40)])
            }
            VariationKind::Chordal => {
                if rng.gen_bool(0.55) { R::QuarterNote } else { R::EighthNote }
            }
        },
    }
}

/// Progression template per role.
fn select_progression(
    rng: &mut ChaCha8Rng,
    role: VariationRole,
    is_minor: bool,
) -> ProgressionKind {
    use ProgressionKind as P;
    match role {
        VariationRole::Establish | VariationRole::Resolve => P::Basic,
        VariationRole::Develop => select_weighted(
            rng,
            &[(P::CircleOfFifths, 0.45), (P::Subdominant, 0.35), (P::Basic, 0.20)],
        ),
        VariationRole::Destabilize => {
            let borrowed = if is_minor { 0.30 } else { 0.15 };
            select_weighted(
                rng,
                &[
                    (P::ChromaticCircle, 0.40),
                    (P::DescendingFifths, 1.0 - 0.40 - borrowed),
                    (P::BorrowedChord, borrowed),
                ],
            )
        }
        VariationRole::Illuminate => select_weighted(
            rng,
            &[(P::Subdominant, 0.40), (P::CircleOfFifths, 0.35), (P::Basic, 0.25)],
        ),
        VariationRole::Accumulate => {
            select_weighted(rng, &[(P::DescendingFifths, 0.55), (P::ChromaticCircle, 0.45)])
        }
    }
}

fn texture_for(kind: VariationKind, role: VariationRole) -> TextureKind {
    match (role, kind) {
        (VariationRole::Accumulate, VariationKind::Chordal) => TextureKind::FullChords,
        (VariationRole::Accumulate, _) => TextureKind::Bariolage,
        (_, VariationKind::Theme) => TextureKind::SingleLine,
        (_, VariationKind::Lyrical) => TextureKind::SingleLine,
        (_, VariationKind::Rhythmic) => TextureKind::ImpliedPolyphony,
        (_, VariationKind::Virtuosic) => TextureKind::ScalePassage,
        (_, VariationKind::Chordal) => TextureKind::Arpeggiated,
    }
}

fn kind_for(rng: &mut ChaCha8Rng, role: VariationRole) -> VariationKind {
    use VariationKind as K;
    match role {
        VariationRole::Establish => K::Theme,
        VariationRole::Resolve => K::Theme,
        VariationRole::Accumulate => {
            if rng.gen_bool(0.5) { K::Chordal } else { K::Virtuosic }
        }
        _ => select_weighted(
            rng,
            &[(K::Lyrical, 0.35), (K::Rhythmic, 0.30), (K::Virtuosic, 0.25), (K::Chordal, 0.10)],
        ),
    }
}

/// The variation plan for one run.
fn build_plan(config: &ValidatedConfig) -> Vec<Variation> {
    let total = variation_count(config.duration_scale);
    let mut rng = ChaCha8Rng::seed_from_u64(u64::from(sub_seed(config.seed, 0x6368_6163)));

    (0..total)
        .map(|index| {
            let role = role_for(index, total);
            let kind = kind_for(&mut rng, role);
            Variation {
                role,
                texture: texture_for(kind, role),
                rhythm: select_rhythm(&mut rng, kind, role),
                progression: select_progression(&mut rng, role, config.key.is_minor),
                is_major_section: role == VariationRole::Illuminate && config.key.is_minor,
            }
        })
        .collect()
}

/// The descending ground: two half-note steps per bar walking from the
/// tonic down to the dominant and back.
fn ground_bass(key: KeySignature) -> Vec<NoteEvent> {
    let scale = ScaleKind::for_key(key);
    let anchor = 48 + u32::from(key.tonic.index());
    let tonic = anchor.min(127) as u8;

    // Bar-by-bar degrees of the lament tetrachord: 0, -1, -2, then the
    // dominant approach -3 / -4 closing back to 0.
    let degrees: [i32; 8] = [0, 0, -1, -1, -2, -2, -3, -4];
    degrees
        .iter()
        .enumerate()
        .map(|(idx, &degree)| {
            let pitch = step_scale_degrees(tonic, degree, key, scale);
            NoteEvent::new(idx as Tick * HALF_NOTE, HALF_NOTE, pitch, 82, 0)
                .with_source(NoteSource::CantusFixed)
        })
        .collect()
}

/// Assemble a complete chaconne.
pub(crate) fn assemble_chaconne(config: &ValidatedConfig) -> GeneratedPiece {
    let mut report = FailReport::new();
    let key = config.key;
    let plan = build_plan(config);
    let bass = ground_bass(key);
    let total_ticks = CYCLE_TICKS * plan.len() as Tick;
    let profile = instrument_profile(config.instrument);

    // Per-variation timelines concatenated, Perfect cadence at the end.
    let mut timeline = HarmonicTimeline::new();
    for (index, variation) in plan.iter().enumerate() {
        let variation_key = if variation.is_major_section {
            KeySignature::new(key.tonic, false)
        } else {
            key
        };
        append_progression(
            &mut timeline,
            variation_key,
            index as Tick * CYCLE_TICKS,
            CYCLE_TICKS,
            Resolution::Bar,
            variation.progression,
        );
    }
    apply_cadence(&mut timeline, CadenceKind::Perfect, key);

    // Ground bass placed immutably under every variation, textures above.
    let mut proposed: Vec<NoteEvent> = Vec::new();
    for (index, variation) in plan.iter().enumerate() {
        let offset = index as Tick * CYCLE_TICKS;
        for note in &bass {
            let mut placed = *note;
            placed.start_tick = note.start_tick + offset;
            proposed.push(placed);
        }

        let variation_key = if variation.is_major_section {
            KeySignature::new(key.tonic, false)
        } else {
            key
        };
        let mut ctx = TextureContext::new(variation.texture, variation_key, offset, CYCLE_TICKS);
        ctx.register_low = profile.register_low.max(50);
        ctx.register_high = profile.register_high;
        ctx.rhythm_profile = variation.rhythm;
        ctx.is_major_section = variation.is_major_section;
        ctx.is_climax = variation.role == VariationRole::Accumulate;
        ctx.rhythm_density = if variation.is_major_section { 0.6 } else { 1.0 };
        ctx.seed = sub_seed(config.seed, index as u32 + 1);

        let notes = generate_texture(&ctx, &timeline);
        if notes.is_empty() && variation.texture != TextureKind::FullChords {
            report.add(FailIssue::global(
                FailKind::Musical,
                FailSeverity::Warning,
                "empty-variation",
                format!("variation {index} produced no texture notes"),
            ));
        }
        proposed.extend(notes);
    }

    let ranges = [
        (profile.register_low, profile.register_high),
        (profile.register_low.max(50), profile.register_high),
    ];
    let coordination = CoordinationConfig {
        num_voices: 2,
        timeline: &timeline,
        voice_ranges: &ranges,
        immutable_sources: &[NoteSource::CantusFixed, NoteSource::PedalPoint],
        lightweight_sources: &[NoteSource::ArpeggioFlow],
        use_next_pitch_map: false,
        check_cross_relations: false,
        weak_beat_allow: None,
        form_name: "Chaconne",
    };
    let result = coordinate_voices(proposed, &coordination);

    for dropped in &result.dropped {
        report.add(FailIssue {
            kind: FailKind::Musical,
            severity: FailSeverity::Info,
            bar: dropped.tick / TICKS_PER_BAR + 1,
            beat: ((dropped.tick % TICKS_PER_BAR) / 480 + 1) as u8,
            voice_a: dropped.voice,
            voice_b: 0,
            rule: "coordination-drop".to_owned(),
            description: format!("{:?} note dropped: {:?}", dropped.source, dropped.reason),
        });
    }

    let tracks = tracks_from_notes(&result.notes, 2, config);
    GeneratedPiece {
        tracks,
        tempo_events: vec![TempoEvent::new(0, config.bpm)],
        meter: Meter::FOUR_FOUR,
        timeline,
        total_ticks,
        report,
        metadata: metadata_json(config, total_ticks / TICKS_PER_BAR),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bach_api::{Character, Form, GenerateConfig, Instrument};

    fn chaconne_config(seed: u32) -> ValidatedConfig {
        GenerateConfig {
            form: Form::Chaconne,
            tonic: "D".to_owned(),
            is_minor: true,
            num_voices: 2,
            bpm: 72,
            seed,
            character: Character::Noble,
            instrument: Instrument::Violin,
            ..GenerateConfig::default()
        }
        .validate()
        .expect("valid")
    }

    #[test]
    fn ground_bass_descends_from_the_tonic() {
        let key = KeySignature::new(bach_theory::pitch::PitchClass::D, true);
        let bass = ground_bass(key);
        assert_eq!(bass.len(), 8);
        assert_eq!(bass[0].pitch % 12, 2); // D
        assert!(bass.iter().all(|n| n.source == NoteSource::CantusFixed));
        assert!(bass.last().expect("notes").pitch < bass[0].pitch);
        assert_eq!(bass.last().expect("notes").end_tick(), CYCLE_TICKS);
    }

    #[test]
    fn variation_count_follows_the_duration_scale() {
        let piece = assemble_chaconne(&chaconne_config(5));
        assert_eq!(piece.total_ticks, CYCLE_TICKS * 8); // Standard = 8
        assert_eq!(piece.total_ticks % TICKS_PER_BAR, 0);
    }

    #[test]
    fn ground_bass_repeats_unchanged_in_every_cycle() {
        let piece = assemble_chaconne(&chaconne_config(21));
        let bass = ground_bass(piece.timeline.key_at(0));
        let placed: Vec<&NoteEvent> = piece.tracks[0]
            .notes
            .iter()
            .filter(|n| n.source == NoteSource::CantusFixed)
            .collect();
        assert_eq!(placed.len(), bass.len() * 8);
        for (idx, note) in placed.iter().enumerate() {
            let original = &bass[idx % bass.len()];
            let cycle = (idx / bass.len()) as Tick;
            assert_eq!(note.pitch, original.pitch);
            assert_eq!(note.duration, original.duration);
            assert_eq!(note.start_tick, original.start_tick + cycle * CYCLE_TICKS);
        }
    }

    #[test]
    fn chaconne_is_deterministic() {
        let a = assemble_chaconne(&chaconne_config(9));
        let b = assemble_chaconne(&chaconne_config(9));
        for (track_a, track_b) in a.tracks.iter().zip(&b.tracks) {
            assert_eq!(track_a.notes, track_b.notes);
        }
    }

    #[test]
    fn texture_notes_stay_inside_the_violin_register() {
        let piece = assemble_chaconne(&chaconne_config(33));
        for note in &piece.tracks[1].notes {
            assert!(note.pitch >= 50 && note.pitch <= 96, "pitch {}", note.pitch);
        }
    }
}

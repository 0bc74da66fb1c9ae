//! forms/bach-forms/src/fugue_form.rs
//! The fugue recipe: exposition entries, episodes from the Kopfmotiv,
//! middle entries in the dominant, optional stretto, pedal-point coda.

use bach_analysis::{FailIssue, FailKind, FailReport, FailSeverity};
use bach_api::{DurationScale, ValidatedConfig};
use bach_counterpoint::coordinate::{CoordinationConfig, coordinate_voices};
use bach_fugue::analyzer::analyze_obligations;
use bach_fugue::answer::make_answer;
use bach_fugue::obligation::{ObligationKind, ObligationNode, ObligationStrength};
use bach_fugue::policy::{archetype_for_character, archetype_policy};
use bach_fugue::structure::{FuguePhase, FugueStructure, SectionType};
use bach_fugue::subject::{Subject, SubjectGenerator, SubjectRequest, VoiceGrid};
use bach_harmony::HarmonicTimeline;
use bach_harmony::progression::{CadenceKind, ProgressionKind, Resolution, apply_cadence};
use bach_score::{NoteEvent, NoteSource};
use bach_theory::pitch::{KeySignature, PitchClass};
use bach_theory::scale::{ScaleKind, step_scale_degrees};
use bach_time::{Meter, TICKS_PER_BAR, TempoEvent, Tick};

use crate::generate::{
    GeneratedPiece, append_progression, metadata_json, round_up_to_bar, shift_into_band,
    sub_seed, subject_character, tracks_from_notes,
};
use crate::instrument::voice_ranges;

/// Weak-beat exception: passing motion may carry a harsh interval when it
/// approaches the clash by step.
fn passing_tone_allowed(
    _tick: Tick,
    _voice: u8,
    candidate: u8,
    _other: u8,
    _interval: u8,
    prev: u8,
) -> bool {
    prev != 0 && candidate.abs_diff(prev) <= 2
}

/// Assemble a complete fugue.
pub(crate) fn assemble_fugue(config: &ValidatedConfig) -> GeneratedPiece {
    let mut report = FailReport::new();
    let key = config.key;
    let character = subject_character(config.character);
    let archetype = archetype_for_character(character);
    let policy = archetype_policy(archetype);
    let generator = SubjectGenerator;

    // The subject everything grows from.
    let subject = generator.generate(&SubjectRequest {
        key,
        character,
        bars: 2,
        seed: config.seed,
        archetype: Some(archetype),
    });
    if subject.degraded {
        report.add(FailIssue::global(
            FailKind::Musical,
            FailSeverity::Warning,
            "subject-hard-gate",
            "no subject candidate passed the archetype gate; best raw candidate used",
        ));
    }

    let profile = analyze_obligations(&subject.notes, key);
    if !profile.feasible_for(config.num_voices) {
        report.add(FailIssue::global(
            FailKind::Musical,
            FailSeverity::Warning,
            "obligation-density",
            format!(
                "subject obligation profile is tight for {} voices (peak {:.1})",
                config.num_voices, profile.peak_density
            ),
        ));
    }

    // Section plan.
    let entry_stride = round_up_to_bar(subject.length_ticks);
    let structure = build_structure(config, key, entry_stride, &profile);
    let total_ticks = structure.total_duration_ticks();

    // Timeline per section, Perfect cadence on the tail.
    let mut timeline = HarmonicTimeline::new();
    for section in &structure.sections {
        let kind = match section.section_type {
            SectionType::Exposition | SectionType::Coda => ProgressionKind::Basic,
            SectionType::Episode => ProgressionKind::CircleOfFifths,
            SectionType::MiddleEntry => ProgressionKind::Subdominant,
            SectionType::Stretto => ProgressionKind::DescendingFifths,
        };
        append_progression(
            &mut timeline,
            section.key,
            section.start_tick,
            section.duration_ticks(),
            Resolution::Bar,
            kind,
        );
    }
    apply_cadence(&mut timeline, CadenceKind::Perfect, key);

    // Proposed notes from every section.
    let ranges = voice_ranges(config.instrument, config.num_voices);
    let mut proposed: Vec<NoteEvent> = Vec::new();

    for (section_idx, section) in structure.sections.iter().enumerate() {
        match section.section_type {
            SectionType::Exposition => {
                propose_exposition(
                    &subject,
                    policy.preferred_answer,
                    config.num_voices,
                    entry_stride,
                    &ranges,
                    &mut proposed,
                );
                // Each voice continues in free counterpoint beneath the
                // later entries.
                for entry in 0..config.num_voices.saturating_sub(1) {
                    let voice = config.num_voices - 1 - entry;
                    let from = entry_stride * Tick::from(entry + 1);
                    let duration = section.end_tick.saturating_sub(from);
                    if duration >= TICKS_PER_BAR {
                        propose_free_line(
                            &generator,
                            config,
                            &timeline,
                            from,
                            duration,
                            voice,
                            64 + u32::from(entry),
                            &ranges,
                            &mut proposed,
                        );
                    }
                }
            }
            SectionType::Episode => {
                propose_episode(
                    &subject,
                    section.start_tick,
                    section.duration_ticks(),
                    section.key,
                    &ranges,
                    &mut proposed,
                );
                propose_free_voices(
                    &generator,
                    config,
                    &timeline,
                    section.start_tick,
                    section.duration_ticks(),
                    section_idx,
                    &ranges,
                    1, // voice 0 rests under the episode's sequences
                    &mut proposed,
                );
            }
            SectionType::MiddleEntry => {
                // The subject returns in the dominant, mid voice.
                let entry_voice = config.num_voices / 2;
                propose_entry(
                    &subject.notes,
                    section.start_tick,
                    entry_voice,
                    ranges[usize::from(entry_voice)],
                    NoteSource::FugueSubject,
                    &mut proposed,
                );
                propose_free_voices(
                    &generator,
                    config,
                    &timeline,
                    section.start_tick,
                    section.duration_ticks(),
                    section_idx,
                    &ranges,
                    0,
                    &mut proposed,
                );
            }
            SectionType::Stretto => {
                let offset = profile
                    .min_safe_stretto_offset(2)
                    .unwrap_or(TICKS_PER_BAR);
                for voice in 0..config.num_voices {
                    let entry_tick = section.start_tick + offset * Tick::from(voice);
                    propose_entry(
                        &subject.notes,
                        entry_tick,
                        voice,
                        ranges[usize::from(voice)],
                        NoteSource::FugueSubject,
                        &mut proposed,
                    );
                }
            }
            SectionType::Coda => {
                propose_coda(
                    &generator,
                    config,
                    &timeline,
                    section.start_tick,
                    section.duration_ticks(),
                    &ranges,
                    &mut proposed,
                );
            }
        }
    }

    // Trim anything that leaked past the end of the plan.
    proposed.retain(|note| note.start_tick < total_ticks);
    for note in &mut proposed {
        if note.end_tick() > total_ticks {
            note.duration = total_ticks - note.start_tick;
        }
    }

    // The coordination pass.
    let coordination = CoordinationConfig {
        num_voices: config.num_voices,
        timeline: &timeline,
        voice_ranges: &ranges,
        immutable_sources: &[NoteSource::PedalPoint, NoteSource::CantusFixed],
        lightweight_sources: &[NoteSource::EpisodeMaterial, NoteSource::ArpeggioFlow],
        use_next_pitch_map: true,
        check_cross_relations: true,
        weak_beat_allow: Some(&passing_tone_allowed),
        form_name: "Fugue",
    };
    let result = coordinate_voices(proposed, &coordination);

    // Every planned entry is an imitation obligation: the voice must
    // actually begin its statement at the planned tick.
    for node in imitation_obligations(config.num_voices, entry_stride, &profile) {
        if node.kind != ObligationKind::ImitationEntry {
            continue;
        }
        let voice = node.voice_mask.trailing_zeros() as u8;
        let begun = result.notes.iter().any(|note| {
            note.voice == voice
                && matches!(note.source, NoteSource::FugueSubject | NoteSource::FugueAnswer)
                && note.start_tick >= node.start_tick
                && note.start_tick <= node.deadline
        });
        if !begun {
            report.add(FailIssue {
                kind: FailKind::Structural,
                severity: FailSeverity::Warning,
                bar: node.start_tick / TICKS_PER_BAR + 1,
                beat: 1,
                voice_a: voice,
                voice_b: 0,
                rule: "imitation-entry".to_owned(),
                description: format!("voice {voice} missed its exposition entry"),
            });
        }
    }

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

    let tracks = tracks_from_notes(&result.notes, config.num_voices, config);
    if tracks.iter().any(|track| track.notes.is_empty()) {
        report.add(FailIssue::global(
            FailKind::Structural,
            FailSeverity::Critical,
            "empty-voice",
            "a voice ended up with no notes after coordination",
        ));
    }

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

/// Imitation obligations for the exposition plan: one entry per voice
/// plus the minimum stretto distance for two voices.
fn imitation_obligations(
    num_voices: u8,
    entry_stride: Tick,
    profile: &bach_fugue::SubjectProfile,
) -> Vec<ObligationNode> {
    let mut nodes = Vec::new();
    for entry in 0..num_voices {
        let voice = num_voices - 1 - entry;
        let entry_tick = entry_stride * Tick::from(entry);
        let mut node = ObligationNode::new(
            u16::from(entry),
            ObligationKind::ImitationEntry,
            entry_tick,
            entry_tick,
            entry_tick + 480,
        );
        node.voice_mask = 1u8 << voice;
        node.strength = ObligationStrength::Structural;
        nodes.push(node);
    }

    if let Some(offset) = profile.min_safe_stretto_offset(2) {
        let mut node = ObligationNode::new(
            u16::from(num_voices),
            ObligationKind::ImitationDistance,
            0,
            offset,
            offset,
        );
        node.strength = ObligationStrength::Soft;
        nodes.push(node);
    }
    nodes
}

/// Section plan per duration scale and target-bar override.
fn build_structure(
    config: &ValidatedConfig,
    key: KeySignature,
    entry_stride: Tick,
    profile: &bach_fugue::SubjectProfile,
) -> FugueStructure {
    let mut structure = FugueStructure::default();
    let dominant = KeySignature::new(
        PitchClass::from_index(key.dominant_class().index()),
        key.is_minor,
    );

    let exposition_len = entry_stride * Tick::from(config.num_voices);
    let mut episode_len = TICKS_PER_BAR * 4;

    // A target-bar override stretches the first episode.
    if let Some(target_bars) = config.target_bars {
        let base_bars = (exposition_len + episode_len + TICKS_PER_BAR * 2) / TICKS_PER_BAR;
        if Tick::from(target_bars) > base_bars {
            episode_len += (Tick::from(target_bars) - base_bars) * TICKS_PER_BAR;
        }
    }

    let mut cursor = 0;
    structure.add_section(
        SectionType::Exposition,
        FuguePhase::Establish,
        cursor,
        cursor + exposition_len,
        key,
    );
    cursor += exposition_len;

    structure.add_section(
        SectionType::Episode,
        FuguePhase::Develop,
        cursor,
        cursor + episode_len,
        key,
    );
    cursor += episode_len;

    if config.duration_scale != DurationScale::Short {
        structure.add_section(
            SectionType::MiddleEntry,
            FuguePhase::Develop,
            cursor,
            cursor + entry_stride,
            dominant,
        );
        cursor += entry_stride;
    }

    if matches!(config.duration_scale, DurationScale::Long | DurationScale::Full) {
        structure.add_section(
            SectionType::Episode,
            FuguePhase::Intensify,
            cursor,
            cursor + TICKS_PER_BAR * 4,
            key,
        );
        cursor += TICKS_PER_BAR * 4;
    }

    if config.duration_scale == DurationScale::Full && profile.min_safe_stretto_offset(2).is_some()
    {
        let stretto_len = round_up_to_bar(
            entry_stride
                + profile.min_safe_stretto_offset(2).unwrap_or(TICKS_PER_BAR)
                    * Tick::from(config.num_voices - 1),
        );
        structure.add_section(
            SectionType::Stretto,
            FuguePhase::Intensify,
            cursor,
            cursor + stretto_len,
            key,
        );
        cursor += stretto_len;
    }

    structure.add_section(
        SectionType::Coda,
        FuguePhase::Resolve,
        cursor,
        cursor + TICKS_PER_BAR * 2,
        key,
    );
    structure
}

/// Place one subject/answer statement into a voice's band.
fn propose_entry(
    material: &[NoteEvent],
    entry_tick: Tick,
    voice: u8,
    band: (u8, u8),
    source: NoteSource,
    proposed: &mut Vec<NoteEvent>,
) {
    for note in material {
        let mut placed = *note;
        placed.start_tick = note.start_tick + entry_tick;
        placed.voice = voice;
        placed.pitch = shift_into_band(note.pitch, band);
        placed.source = source;
        proposed.push(placed);
    }
}

/// Exposition: voices enter top-down, alternating subject and answer,
/// one entry stride apart.
fn propose_exposition(
    subject: &Subject,
    answer_kind: bach_fugue::policy::AnswerKind,
    num_voices: u8,
    entry_stride: Tick,
    ranges: &[(u8, u8)],
    proposed: &mut Vec<NoteEvent>,
) {
    let answer = make_answer(subject, answer_kind);
    for entry in 0..num_voices {
        let voice = num_voices - 1 - entry;
        let entry_tick = entry_stride * Tick::from(entry);
        let (material, source): (&[NoteEvent], NoteSource) = if entry % 2 == 0 {
            (&subject.notes, NoteSource::FugueSubject)
        } else {
            (&answer, NoteSource::FugueAnswer)
        };
        propose_entry(
            material,
            entry_tick,
            voice,
            ranges[usize::from(voice)],
            source,
            proposed,
        );
    }
}

/// Episode: the Kopfmotiv sequenced down one degree per bar in the top
/// voice.
fn propose_episode(
    subject: &Subject,
    start_tick: Tick,
    duration: Tick,
    key: KeySignature,
    ranges: &[(u8, u8)],
    proposed: &mut Vec<NoteEvent>,
) {
    let kopf = subject.kopfmotiv(4);
    if kopf.is_empty() {
        return;
    }
    let scale = ScaleKind::for_key(key);
    let top_voice = (ranges.len() - 1) as u8;
    let band = ranges[ranges.len() - 1];
    let bars = duration / TICKS_PER_BAR;

    for bar in 0..bars {
        let bar_tick = start_tick + bar * TICKS_PER_BAR;
        let mut cursor = bar_tick;
        for note in kopf {
            if cursor >= bar_tick + TICKS_PER_BAR {
                break;
            }
            let duration = note.duration.min(bar_tick + TICKS_PER_BAR - cursor);
            let sequenced = step_scale_degrees(note.pitch, -(bar as i32), key, scale);
            proposed.push(
                NoteEvent::new(cursor, duration, shift_into_band(sequenced, band), 76, top_voice)
                    .with_source(NoteSource::EpisodeMaterial),
            );
            cursor += duration;
        }
    }
}

/// One voice of free counterpoint over `[start_tick, start_tick+duration)`.
#[allow(clippy::too_many_arguments)]
fn propose_free_line(
    generator: &SubjectGenerator,
    config: &ValidatedConfig,
    timeline: &HarmonicTimeline,
    start_tick: Tick,
    duration: Tick,
    voice: u8,
    seed_tag: u32,
    ranges: &[(u8, u8)],
    proposed: &mut Vec<NoteEvent>,
) {
    let character = subject_character(config.character);
    let bars = (duration / TICKS_PER_BAR).clamp(1, 4) as u8;
    let grid = VoiceGrid {
        timeline,
        cadence_target_class: config.key.tonic.index(),
        intensify_bars: (0, u32::from(bars) / 2),
    };
    let line = generator.generate_voice(
        &SubjectRequest {
            key: config.key,
            character,
            bars,
            seed: sub_seed(config.seed, seed_tag),
            archetype: None,
        },
        &grid,
    );
    let band = ranges[usize::from(voice)];
    for note in &line.notes {
        if note.start_tick >= duration {
            continue;
        }
        let mut placed = *note;
        placed.start_tick = note.start_tick + start_tick;
        placed.duration = placed.duration.min(duration - note.start_tick);
        placed.voice = voice;
        placed.pitch = shift_into_band(note.pitch, band);
        placed.source = NoteSource::FreeCounterpoint;
        proposed.push(placed);
    }
}

/// Free counterpoint for the voices `[from_voice, top)` of a section.
#[allow(clippy::too_many_arguments)]
fn propose_free_voices(
    generator: &SubjectGenerator,
    config: &ValidatedConfig,
    timeline: &HarmonicTimeline,
    start_tick: Tick,
    duration: Tick,
    section_idx: usize,
    ranges: &[(u8, u8)],
    from_voice: u8,
    proposed: &mut Vec<NoteEvent>,
) {
    let top_voice = config.num_voices - 1;
    for voice in from_voice..top_voice {
        propose_free_line(
            generator,
            config,
            timeline,
            start_tick,
            duration,
            voice,
            (section_idx as u32 + 2) * 16 + u32::from(voice),
            ranges,
            proposed,
        );
    }
}

/// Coda: tonic pedal in the bass, cadential lines above.
fn propose_coda(
    generator: &SubjectGenerator,
    config: &ValidatedConfig,
    timeline: &HarmonicTimeline,
    start_tick: Tick,
    duration: Tick,
    ranges: &[(u8, u8)],
    proposed: &mut Vec<NoteEvent>,
) {
    let band = ranges[0];
    let pedal_pitch = shift_into_band(48 + config.key.tonic.index(), band);
    proposed.push(
        NoteEvent::new(start_tick, duration, pedal_pitch, 84, 0)
            .with_source(NoteSource::PedalPoint),
    );

    propose_free_voices(
        generator,
        config,
        timeline,
        start_tick,
        duration,
        99, // coda-specific seed lane
        ranges,
        1,
        proposed,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use bach_api::{Character, Form, GenerateConfig};
    use bach_theory::scale::is_scale_tone;

    fn fugue_config(seed: u32) -> ValidatedConfig {
        GenerateConfig {
            form: Form::Fugue,
            tonic: "C".to_owned(),
            is_minor: false,
            num_voices: 3,
            bpm: 120,
            seed,
            character: Character::Severe,
            ..GenerateConfig::default()
        }
        .validate()
        .expect("valid")
    }

    #[test]
    fn fugue_has_one_track_per_voice_and_bar_aligned_length() {
        let piece = assemble_fugue(&fugue_config(42));
        assert_eq!(piece.tracks.len(), 3);
        assert!(piece.tracks.iter().all(|track| !track.notes.is_empty()));
        assert_eq!(piece.total_ticks % TICKS_PER_BAR, 0);
        assert!(piece.total_ticks > 0);
    }

    #[test]
    fn first_bass_note_is_a_scale_tone() {
        let piece = assemble_fugue(&fugue_config(42));
        let first = piece.tracks[0].notes.first().expect("bass notes");
        let key = KeySignature::c_major();
        assert!(is_scale_tone(first.pitch, key, ScaleKind::Major));
    }

    #[test]
    fn fugue_is_deterministic() {
        let a = assemble_fugue(&fugue_config(7));
        let b = assemble_fugue(&fugue_config(7));
        for (track_a, track_b) in a.tracks.iter().zip(&b.tracks) {
            assert_eq!(track_a.notes, track_b.notes);
        }
    }

    #[test]
    fn pedal_point_survives_coordination_unchanged() {
        let piece = assemble_fugue(&fugue_config(11));
        let pedal: Vec<&NoteEvent> = piece.tracks[0]
            .notes
            .iter()
            .filter(|note| note.source == NoteSource::PedalPoint)
            .collect();
        assert_eq!(pedal.len(), 1);
        assert_eq!(pedal[0].duration, TICKS_PER_BAR * 2);
        assert_eq!(pedal[0].pitch % 12, 0); // tonic pedal in C
    }

    #[test]
    fn seeds_one_hundred_through_one_ten_succeed_in_g_minor() {
        for seed in 100..=110 {
            let config = GenerateConfig {
                form: Form::Fugue,
                tonic: "G".to_owned(),
                is_minor: true,
                num_voices: 3,
                bpm: 110,
                seed,
                character: Character::Restless,
                ..GenerateConfig::default()
            }
            .validate()
            .expect("valid");
            let piece = assemble_fugue(&config);
            assert!(!piece.report.has_critical(), "seed {seed} critical");
        }
    }
}

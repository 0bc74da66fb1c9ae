//! forms/bach-forms/src/goldberg.rs
//! Goldberg-style variation set: a fixed 32-entry plan (aria, thirty
//! variations with every third a canon at a rising interval, da capo
//! aria) rendered over the immutable fundamental bass.

use bach_analysis::{FailIssue, FailKind, FailReport, FailSeverity};
use bach_api::{DurationScale, ValidatedConfig};
use bach_counterpoint::coordinate::{CoordinationConfig, coordinate_voices};
use bach_harmony::{HarmonicEvent, HarmonicTimeline};
use bach_score::{NoteEvent, NoteSource};
use bach_texture::{RhythmProfile, TextureContext, TextureKind, generate_texture};
use bach_theory::chord::{Chord, ChordDegree};
use bach_theory::pitch::KeySignature;
use bach_theory::scale::{ScaleKind, pitch_to_scale_degree, step_scale_degrees};
use bach_time::{Meter, TICKS_PER_BAR, TempoEvent, Tick};

use crate::generate::{GeneratedPiece, metadata_json, sub_seed, tracks_from_notes};
use crate::instrument::instrument_profile;

/// Bars in one soggetto statement.
const SOGGETTO_BARS: Tick = 8;
/// Ticks per variation (one soggetto statement).
const VARIATION_TICKS: Tick = SOGGETTO_BARS * TICKS_PER_BAR;

/// Kind of one plan entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GoldbergKind {
    Aria,
    /// Canon at the given diatonic interval (1 = unison … 9 = ninth).
    Canon(u8),
    Dance,
    Ornamental,
    HandCrossing,
    Overture,
    Virtuoso,
    /// The minor-mode "black pearl" adagio.
    BlackPearl,
    Quodlibet,
    AriaDaCapo,
}

/// One variation descriptor.
pub(crate) struct VariationDescriptor {
    pub number: u8,
    pub kind: GoldbergKind,
    pub is_minor: bool,
    /// Tempo multiplier on the aria tempo.
    pub tempo_ratio: f32,
}

/// The fixed 32-entry plan: aria, variations 1-30, da capo.
pub(crate) fn build_plan() -> Vec<VariationDescriptor> {
    let mut plan = Vec::with_capacity(32);
    plan.push(VariationDescriptor {
        number: 0,
        kind: GoldbergKind::Aria,
        is_minor: false,
        tempo_ratio: 1.0,
    });

    for number in 1u8..=30 {
        let kind = match number {
            n if n % 3 == 0 => GoldbergKind::Canon(n / 3),
            2 | 11 | 17 => GoldbergKind::HandCrossing,
            16 => GoldbergKind::Overture,
            25 => GoldbergKind::BlackPearl,
            5 | 8 | 14 | 20 | 23 | 26 | 28 | 29 => GoldbergKind::Virtuoso,
            1 | 7 | 10 | 19 | 22 => GoldbergKind::Dance,
            _ => GoldbergKind::Ornamental,
        };
        let is_minor = matches!(number, 15 | 21 | 25);
        let tempo_ratio = match kind {
            GoldbergKind::BlackPearl => 0.5,
            GoldbergKind::Overture => 0.8,
            GoldbergKind::Virtuoso => 1.4,
            GoldbergKind::Dance => 1.2,
            _ => 1.0,
        };
        plan.push(VariationDescriptor { number, kind, is_minor, tempo_ratio });
    }

    // Variation 30 is the quodlibet.
    if let Some(last) = plan.iter_mut().find(|desc| desc.number == 30) {
        last.kind = GoldbergKind::Quodlibet;
        last.tempo_ratio = 1.0;
    }

    plan.push(VariationDescriptor {
        number: 31,
        kind: GoldbergKind::AriaDaCapo,
        is_minor: false,
        tempo_ratio: 1.0,
    });
    plan
}

/// Indices into the plan for a duration scale. The aria and the da capo
/// frame every selection.
fn select_variations(plan: &[VariationDescriptor], scale: DurationScale) -> Vec<usize> {
    match scale {
        DurationScale::Full => (0..plan.len()).collect(),
        DurationScale::Long => {
            let mut picked: Vec<usize> = (0..plan.len() - 1).step_by(2).collect();
            picked.push(plan.len() - 1);
            picked
        }
        DurationScale::Standard => {
            let mut picked = vec![0usize];
            picked.extend([1, 3, 5, 9, 16, 25, 30].map(|n| n as usize));
            picked.push(plan.len() - 1);
            picked
        }
        DurationScale::Short => vec![0, 1, 3, 30, 31],
    }
}

/// The fundamental bass: one degree per bar, the famous descent from the
/// tonic through the submediant to the cadence.
fn soggetto(key: KeySignature) -> Vec<NoteEvent> {
    let scale = ScaleKind::for_key(key);
    let anchor = (36 + u32::from(key.tonic.index())).min(127) as u8;

    // Bar degrees: G F# E D | B C D G in G major terms.
    let degrees: [i32; 8] = [0, -1, -2, -3, -5, -4, -3, -7];
    degrees
        .iter()
        .enumerate()
        .map(|(bar, &degree)| {
            let pitch = step_scale_degrees(anchor, degree + 7, key, scale);
            NoteEvent::new(bar as Tick * TICKS_PER_BAR, TICKS_PER_BAR, pitch, 78, 0)
                .with_source(NoteSource::GoldbergSoggetto)
        })
        .collect()
}

/// Derive the bar-level timeline from the soggetto: each bar's chord is
/// the diatonic triad rooted on the bass degree.
fn timeline_from_soggetto(
    timeline: &mut HarmonicTimeline,
    bass: &[NoteEvent],
    key: KeySignature,
    offset: Tick,
) {
    let scale = ScaleKind::for_key(key);
    for note in bass {
        let (degree, _) = pitch_to_scale_degree(note.pitch, key, scale);
        let chord_degree = ChordDegree::ALL[usize::from(degree % 7)];
        let chord = Chord::diatonic(key, chord_degree, 4);
        let weight = if note.start_tick % (TICKS_PER_BAR * 4) == 0 { 1.0 } else { 0.75 };
        let mut event = HarmonicEvent::new(
            note.start_tick + offset,
            note.end_tick() + offset,
            key,
            chord,
            note.pitch,
            weight,
        );
        event.is_immutable = true;
        timeline.push(event);
    }
}

/// Texture selection per variation kind.
fn texture_for(kind: GoldbergKind) -> (TextureKind, RhythmProfile) {
    match kind {
        GoldbergKind::Aria | GoldbergKind::AriaDaCapo => {
            (TextureKind::SingleLine, RhythmProfile::DottedEighth)
        }
        GoldbergKind::Canon(_) => (TextureKind::SingleLine, RhythmProfile::EighthNote),
        GoldbergKind::Dance => (TextureKind::SingleLine, RhythmProfile::Triplet),
        GoldbergKind::Ornamental => (TextureKind::SingleLine, RhythmProfile::Mixed8th16th),
        GoldbergKind::HandCrossing => (TextureKind::ImpliedPolyphony, RhythmProfile::Sixteenth),
        GoldbergKind::Overture => (TextureKind::SingleLine, RhythmProfile::DottedEighth),
        GoldbergKind::Virtuoso => (TextureKind::Arpeggiated, RhythmProfile::Sixteenth),
        GoldbergKind::BlackPearl => (TextureKind::SingleLine, RhythmProfile::EighthNote),
        GoldbergKind::Quodlibet => (TextureKind::FullChords, RhythmProfile::QuarterNote),
    }
}

/// Realize a canon: the leader line echoed one bar later, transposed up
/// the canon interval diatonically, in the voice above.
fn canon_follower(
    leader: &[NoteEvent],
    interval: u8,
    key: KeySignature,
    end_limit: Tick,
) -> Vec<NoteEvent> {
    let scale = ScaleKind::for_key(key);
    let degrees = i32::from(interval.saturating_sub(1));
    leader
        .iter()
        .filter(|note| note.start_tick + TICKS_PER_BAR < end_limit)
        .map(|note| {
            let mut follower = *note;
            follower.start_tick = note.start_tick + TICKS_PER_BAR;
            follower.duration = follower.duration.min(end_limit - follower.start_tick);
            follower.pitch = step_scale_degrees(note.pitch, degrees, key, scale);
            follower.voice = 2;
            follower.source = NoteSource::FreeCounterpoint;
            follower
        })
        .collect()
}

/// Assemble a Goldberg-style variation set.
pub(crate) fn assemble_goldberg(config: &ValidatedConfig) -> GeneratedPiece {
    let mut report = FailReport::new();
    let plan = build_plan();
    let selection = select_variations(&plan, config.duration_scale);
    let profile = instrument_profile(config.instrument);

    let mut timeline = HarmonicTimeline::new();
    let mut proposed: Vec<NoteEvent> = Vec::new();
    let mut tempo_events: Vec<TempoEvent> = Vec::new();

    for (slot, &plan_idx) in selection.iter().enumerate() {
        let descriptor = &plan[plan_idx];
        let offset = slot as Tick * VARIATION_TICKS;
        let variation_key = KeySignature::new(
            config.key.tonic,
            config.key.is_minor || descriptor.is_minor,
        );

        // The soggetto anchors both the harmony and the bass voice.
        let bass = soggetto(variation_key);
        timeline_from_soggetto(&mut timeline, &bass, variation_key, offset);
        for note in &bass {
            let mut placed = *note;
            placed.start_tick = note.start_tick + offset;
            proposed.push(placed);
        }

        // Per-variation tempo from the aria tempo and the plan ratio.
        let bpm = ((f32::from(config.bpm) * descriptor.tempo_ratio) as u16).max(20);
        tempo_events.push(TempoEvent::new(offset, bpm));

        // Upper texture.
        let (texture, rhythm) = texture_for(descriptor.kind);
        let mut ctx = TextureContext::new(texture, variation_key, offset, VARIATION_TICKS);
        ctx.register_low = profile.register_low.max(48);
        ctx.register_high = profile.register_high;
        ctx.rhythm_profile = rhythm;
        ctx.is_climax = descriptor.kind == GoldbergKind::Quodlibet;
        ctx.seed = sub_seed(config.seed, u32::from(descriptor.number) + 1);

        let upper = generate_texture(&ctx, &timeline);
        if upper.is_empty() {
            report.add(FailIssue::global(
                FailKind::Musical,
                FailSeverity::Warning,
                "empty-variation",
                format!("variation {} produced no notes", descriptor.number),
            ));
        }

        if let GoldbergKind::Canon(interval) = descriptor.kind {
            let follower =
                canon_follower(&upper, interval, variation_key, offset + VARIATION_TICKS);
            proposed.extend(follower);
        }
        proposed.extend(upper);
    }

    let total_ticks = selection.len() as Tick * VARIATION_TICKS;
    let num_voices = config.num_voices.max(3);
    let ranges: Vec<(u8, u8)> = (0..num_voices)
        .map(|voice| match voice {
            0 => (profile.register_low, 72),
            _ => (profile.register_low.max(48), profile.register_high),
        })
        .collect();

    let coordination = CoordinationConfig {
        num_voices,
        timeline: &timeline,
        voice_ranges: &ranges,
        immutable_sources: &[NoteSource::GoldbergSoggetto, NoteSource::PedalPoint],
        lightweight_sources: &[NoteSource::ArpeggioFlow],
        use_next_pitch_map: false,
        check_cross_relations: false,
        weak_beat_allow: None,
        form_name: "Goldberg",
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

    let tracks = tracks_from_notes(&result.notes, num_voices, config);
    GeneratedPiece {
        tracks,
        tempo_events,
        meter: Meter::FOUR_FOUR,
        timeline,
        total_ticks,
        report,
        metadata: metadata_json(config, total_ticks / TICKS_PER_BAR),
    }
}

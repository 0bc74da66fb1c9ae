//! fugue/bach-fugue/src/answer.rs
//! Real and tonal answers: the subject restated at the dominant.

use bach_score::{NoteEvent, NoteSource};
use bach_theory::scale::{ScaleKind, nearest_scale_tone, pitch_to_scale_degree};

use crate::policy::AnswerKind;
use crate::subject::Subject;

/// Transpose the subject up a perfect fifth, snapped back to the scale.
#[must_use]
pub fn real_answer(subject: &Subject) -> Vec<NoteEvent> {
    let scale = ScaleKind::for_key(subject.key);
    subject
        .notes
        .iter()
        .map(|note| {
            let raw = i32::from(note.pitch) + 7;
            let mut answer = *note;
            answer.pitch = nearest_scale_tone(raw.clamp(0, 127) as u8, subject.key, scale);
            answer.source = NoteSource::FugueAnswer;
            answer
        })
        .collect()
}

/// Tonal answer: like the real answer, but an opening dominant maps to
/// the tonic (a fourth up) so the tonic-dominant axis is preserved.
#[must_use]
pub fn tonal_answer(subject: &Subject) -> Vec<NoteEvent> {
    let scale = ScaleKind::for_key(subject.key);
    let mut notes = real_answer(subject);

    // Adjust head notes that sit on the dominant degree.
    for (answer, original) in notes.iter_mut().zip(subject.notes.iter()).take(2) {
        let (degree, on_scale) = pitch_to_scale_degree(original.pitch, subject.key, scale);
        if on_scale && degree == 4 {
            let raw = i32::from(original.pitch) + 5;
            answer.pitch = nearest_scale_tone(raw.clamp(0, 127) as u8, subject.key, scale);
        }
    }
    notes
}

/// Build the answer the archetype asks for. `Auto` picks tonal when the
/// subject opens on the dominant and real otherwise.
#[must_use]
pub fn make_answer(subject: &Subject, kind: AnswerKind) -> Vec<NoteEvent> {
    let scale = ScaleKind::for_key(subject.key);
    match kind {
        AnswerKind::Real => real_answer(subject),
        AnswerKind::Tonal => tonal_answer(subject),
        AnswerKind::Auto => {
            let opens_on_dominant = subject.notes.first().is_some_and(|note| {
                let (degree, on_scale) = pitch_to_scale_degree(note.pitch, subject.key, scale);
                on_scale && degree == 4
            });
            if opens_on_dominant { tonal_answer(subject) } else { real_answer(subject) }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subject::SubjectCharacter;
    use bach_theory::pitch::KeySignature;
    use bach_time::{QUARTER_NOTE, TICKS_PER_BAR};

    fn subject(pitches: &[u8]) -> Subject {
        let notes = pitches
            .iter()
            .enumerate()
            .map(|(idx, &pitch)| {
                NoteEvent::new(idx as u32 * QUARTER_NOTE, QUARTER_NOTE, pitch, 80, 0)
                    .with_source(NoteSource::FugueSubject)
            })
            .collect();
        Subject {
            key: KeySignature::c_major(),
            character: SubjectCharacter::Severe,
            notes,
            length_ticks: TICKS_PER_BAR,
            anacrusis_ticks: 0,
            degraded: false,
        }
    }

    #[test]
    fn real_answer_lands_a_fifth_up() {
        let subject = subject(&[60, 62, 64, 65]);
        let answer = real_answer(&subject);
        let pitches: Vec<u8> = answer.iter().map(|n| n.pitch).collect();
        assert_eq!(pitches, vec![67, 69, 71, 72]);
        assert!(answer.iter().all(|n| n.source == NoteSource::FugueAnswer));
    }

    #[test]
    fn tonal_answer_bends_an_opening_dominant_to_the_tonic() {
        // Subject opens G (dominant of C): the answer opens C, not D.
        let subject = subject(&[67, 64, 62, 60]);
        let tonal = tonal_answer(&subject);
        assert_eq!(tonal[0].pitch, 72);
        let real = real_answer(&subject);
        assert_eq!(real[0].pitch, 74);
    }

    #[test]
    fn auto_answer_picks_by_the_opening_degree() {
        let dominant_opening = subject(&[67, 64, 62, 60]);
        let tonic_opening = subject(&[60, 62, 64, 65]);
        assert_eq!(make_answer(&dominant_opening, AnswerKind::Auto)[0].pitch, 72);
        assert_eq!(make_answer(&tonic_opening, AnswerKind::Auto)[0].pitch, 67);
    }
}

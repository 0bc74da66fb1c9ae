//! Benchmark for the obligation analyzer hot path (detectors plus the
//! stretto feasibility matrix).

use bach_fugue::analyze_obligations;
use bach_score::NoteEvent;
use bach_theory::pitch::{KeySignature, PitchClass};
use criterion::{Criterion, criterion_group, criterion_main};

fn subject_notes() -> Vec<NoteEvent> {
    let pitches =
        [67u8, 74, 70, 69, 70, 67, 66, 67, 69, 66, 67, 62, 64, 65, 67, 69, 70, 72, 71, 67];
    pitches
        .iter()
        .enumerate()
        .map(|(idx, &pitch)| NoteEvent::new(idx as u32 * 240, 240, pitch, 80, 0))
        .collect()
}

fn bench_analyze(criterion: &mut Criterion) {
    let notes = subject_notes();
    let key = KeySignature::new(PitchClass::G, true);
    criterion.bench_function("analyze_obligations_20_notes", |bencher| {
        bencher.iter(|| analyze_obligations(std::hint::black_box(&notes), key));
    });
}

criterion_group!(benches, bench_analyze);
criterion_main!(benches);

mod args;

use std::fs;
use std::process::ExitCode;

use anyhow::{Context, Result};
use bach_analysis::{analyze_organ_dissonance, compute_counterpoint_metrics};
use bach_api::GenerateConfig;
use bach_forms::{GeneratedPiece, generate};
use bach_midi::write_midi;
use bach_score::NoteEvent;
use clap::Parser;

use crate::args::{Cli, Commands, GenerateArgs};

fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli.command {
        Commands::Generate(args) => match run_generate(&args) {
            Ok(code) => code,
            Err(err) => {
                eprintln!("error: {err:#}");
                ExitCode::FAILURE
            }
        },
    }
}

fn run_generate(args: &GenerateArgs) -> Result<ExitCode> {
    let config = build_config(args)?;
    let piece = generate(&config).with_context(|| "configuration rejected")?;

    // Diagnostics go to stderr regardless of outcome.
    for issue in &piece.report.issues {
        eprintln!(
            "[{:?}/{:?}] {}: {}",
            issue.kind, issue.severity, issue.rule, issue.description
        );
    }

    let metadata = serde_json::to_string(&piece.metadata)
        .with_context(|| "serializing metadata payload")?;
    let bytes = write_midi(&piece.tracks, &piece.tempo_events, piece.meter, 0, &metadata);
    fs::write(&args.output, &bytes)
        .with_context(|| format!("writing {}", args.output.display()))?;
    println!(
        "wrote {} ({} tracks, {} bars)",
        args.output.display(),
        piece.tracks.len() + 1,
        piece.total_ticks / 1920
    );

    if let Some(path) = &args.analysis {
        let report = analysis_report(&config, &piece);
        let json = serde_json::to_string_pretty(&report)
            .with_context(|| "serializing analysis report")?;
        fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        println!("wrote {}", path.display());
    }

    if piece.report.has_critical() {
        eprintln!("generation completed with critical diagnostics");
        return Ok(ExitCode::FAILURE);
    }
    if args.strict && !piece.report.issues.is_empty() {
        eprintln!("strict mode: diagnostics present");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// Flags build the config; `--config file.json` replaces it wholesale.
fn build_config(args: &GenerateArgs) -> Result<GenerateConfig> {
    if let Some(path) = &args.config {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        return GenerateConfig::from_json(&text)
            .with_context(|| format!("parsing {}", path.display()));
    }

    Ok(GenerateConfig {
        form: args.form.into(),
        tonic: args.key.clone(),
        is_minor: args.minor,
        num_voices: args.voices,
        bpm: args.bpm,
        seed: args.seed,
        character: args.character.into(),
        instrument: args.instrument.into(),
        duration_scale: args.scale.into(),
        target_bars: args.target_bars,
    })
}

/// Analysis payload: dissonance phases, counterpoint metrics, and the
/// generation diagnostics.
fn analysis_report(config: &GenerateConfig, piece: &GeneratedPiece) -> serde_json::Value {
    let validated = config.validate().expect("config validated during generation");
    let all_notes: Vec<NoteEvent> =
        piece.tracks.iter().flat_map(|track| track.notes.iter().copied()).collect();
    let num_voices = piece.tracks.len() as u8;

    let dissonance =
        analyze_organ_dissonance(&all_notes, num_voices, &piece.timeline, validated.key, None);
    let metrics = compute_counterpoint_metrics(&all_notes, num_voices);

    serde_json::json!({
        "metadata": piece.metadata,
        "dissonance": dissonance,
        "counterpoint": metrics,
        "diagnostics": piece.report.to_json(),
    })
}

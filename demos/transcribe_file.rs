//! Example: Transcribe chords from a single audio file
//!
//! Usage:
//!   cargo run --release --example transcribe_file -- [--json] [--beats t1,t2,...] <audio_file>
//!
//! Prints one `start - end : label` line per segment, or the full result as JSON.

use stratum_chords::io::decode_audio;
use stratum_chords::{ChordTranscriber, FixedBeatGrid, TranscriptionConfig};
use std::env;

fn parse_beats(list: &str) -> Result<Vec<f32>, std::num::ParseFloatError> {
    list.split(',').map(|t| t.trim().parse::<f32>()).collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args: Vec<String> = env::args().skip(1).collect();
    let mut json = false;
    let mut beats: Option<Vec<f32>> = None;
    let mut path: Option<String> = None;

    while let Some(a) = args.first().cloned() {
        args.remove(0);
        match a.as_str() {
            "--json" => json = true,
            "--beats" => {
                let v = args.first().ok_or("--beats requires a value")?;
                beats = Some(parse_beats(v)?);
                args.remove(0);
            }
            "--help" | "-h" => {
                eprintln!(
                    "Usage: transcribe_file [--json] [--beats t1,t2,...] <audio_file>\n\
                     \n\
                     --json     Emit the transcription as JSON\n\
                     --beats    Use these beat times (seconds) instead of beat tracking\n"
                );
                return Ok(());
            }
            _ => path = Some(a),
        }
    }

    let Some(path) = path else {
        eprintln!("ERROR: Provide an audio file path. Use --help for usage.");
        std::process::exit(2);
    };

    let (samples, sample_rate) = decode_audio(&path)?;
    eprintln!(
        "Decoded {}: {} samples at {} Hz ({:.2}s)",
        path,
        samples.len(),
        sample_rate,
        samples.len() as f32 / sample_rate as f32
    );

    let mut transcriber = ChordTranscriber::new(TranscriptionConfig::default())?;
    if let Some(times) = beats {
        transcriber = transcriber.with_beat_tracker(Box::new(FixedBeatGrid::new(times, 0.0)));
    }

    let result = transcriber.transcribe(&samples, sample_rate)?;

    if json {
        println!("{}", result.to_json()?);
    } else {
        for segment in &result.segments {
            println!("{:.3} - {:.3} : {}", segment.start, segment.end, segment.label);
        }
        eprintln!(
            "{} segments, {} beats, tempo={:.2} BPM, time={:.2}ms",
            result.segments.len(),
            result.beats.len(),
            result.tempo_bpm,
            result.metadata.processing_time_ms
        );
    }

    Ok(())
}

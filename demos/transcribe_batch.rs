//! Example: Transcribe multiple audio files in parallel
//!
//! Usage:
//!   cargo run --release --example transcribe_batch -- [--jobs N] [--json] <file1> <file2> ...
//!
//! Notes:
//! - Parallelism is across files. Each transcription is single-threaded.
//! - One transcriber (and template bank) is shared by all workers.
//! - Default workers: (available CPU threads - 1).

use rayon::prelude::*;
use serde::Serialize;
use stratum_chords::io::decode_audio;
use stratum_chords::{AnalysisError, ChordTranscriber, ChordTranscription, TranscriptionConfig};
use std::env;
use std::time::Instant;

fn default_jobs() -> usize {
    let n = std::thread::available_parallelism().map(|v| v.get()).unwrap_or(1);
    std::cmp::max(1, n.saturating_sub(1))
}

#[derive(Serialize)]
struct ItemOut {
    file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<ChordTranscription>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn transcribe_path(transcriber: &ChordTranscriber, path: &str) -> Result<ChordTranscription, AnalysisError> {
    let (samples, sample_rate) = decode_audio(path)?;
    transcriber.transcribe(&samples, sample_rate)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args: Vec<String> = env::args().skip(1).collect();
    let mut json = false;
    let mut jobs: Option<usize> = None;
    let mut paths: Vec<String> = Vec::new();

    while let Some(a) = args.first().cloned() {
        args.remove(0);
        match a.as_str() {
            "--json" => json = true,
            "--jobs" => {
                let v = args
                    .first()
                    .ok_or("--jobs requires a value")?
                    .parse::<usize>()?;
                args.remove(0);
                jobs = Some(std::cmp::max(1, v));
            }
            "--help" | "-h" => {
                eprintln!(
                    "Usage: transcribe_batch [--jobs N] [--json] <file1> <file2> ...\n\
                     \n\
                     --jobs N   Parallel workers (default: CPU-1)\n\
                     --json     Emit one JSON object per line (JSONL)\n"
                );
                return Ok(());
            }
            _ => paths.push(a),
        }
    }

    if paths.is_empty() {
        eprintln!("ERROR: Provide at least one audio file path. Use --help for usage.");
        std::process::exit(2);
    }

    let jobs = jobs.unwrap_or_else(default_jobs);
    eprintln!("Batch: {} files, jobs={}", paths.len(), jobs);

    let transcriber = ChordTranscriber::new(TranscriptionConfig::default())?;

    let t0 = Instant::now();
    let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;

    let outs: Vec<ItemOut> = pool.install(|| {
        paths
            .par_iter()
            .map(|path| match transcribe_path(&transcriber, path) {
                Ok(result) => ItemOut {
                    file: path.clone(),
                    result: Some(result),
                    error: None,
                },
                Err(e) => ItemOut {
                    file: path.clone(),
                    result: None,
                    error: Some(e.to_string()),
                },
            })
            .collect()
    });

    let mut ok = 0usize;
    for (idx, o) in outs.iter().enumerate() {
        if o.result.is_some() {
            ok += 1;
        }
        if json {
            println!("{}", serde_json::to_string(o)?);
            continue;
        }
        match (&o.result, &o.error) {
            (Some(r), _) => {
                let changes = r.segments.iter().filter(|s| !s.is_no_chord()).count();
                println!(
                    "[{}/{}] {}: {} segments ({} chords) tempo={:.2} time={:.2}ms",
                    idx + 1,
                    outs.len(),
                    o.file,
                    r.segments.len(),
                    changes,
                    r.tempo_bpm,
                    r.metadata.processing_time_ms
                );
            }
            (None, err) => println!(
                "[{}/{}] {}: ERROR: {}",
                idx + 1,
                outs.len(),
                o.file,
                err.as_deref().unwrap_or("unknown error")
            ),
        }
    }

    eprintln!(
        "Done: ok={}/{} wall={:.0}ms",
        ok,
        outs.len(),
        t0.elapsed().as_secs_f64() * 1000.0
    );

    Ok(())
}

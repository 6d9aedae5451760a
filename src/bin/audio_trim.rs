// src/bin/audio_trim.rs

use std::path::PathBuf;

use anyhow::Context;
use audiocut::{
    AudioInfo, Engine, EngineConfig, TrimRange, WaveformPeaks, WaveformPreview, WAV_MIME_TYPE,
};
use clap::Parser;
use serde::Serialize;

/// Command-line tool for trimming audio files
#[derive(Parser, Debug)]
#[command(name = "audio-trim")]
#[command(about = "Trim audio files to a specific time range", long_about = None)]
struct Args {
    /// Input audio file (MP3, FLAC, WAV, OGG, etc.)
    #[arg(short, long)]
    input: PathBuf,

    /// Output WAV file (defaults to the configured export file name)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Start time in seconds (defaults to 0)
    #[arg(short, long)]
    start: Option<f64>,

    /// End time in seconds (defaults to the full duration)
    #[arg(short, long)]
    end: Option<f64>,

    /// JSON engine config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the number of undo steps kept
    #[arg(long)]
    history_limit: Option<usize>,

    /// Compute waveform peaks of the trimmed audio
    #[arg(short, long)]
    waveform: bool,

    /// Number of waveform peaks (implies --waveform; defaults to the config value)
    #[arg(long)]
    peaks: Option<usize>,

    /// Play the trimmed audio through the default output device
    #[cfg(feature = "playback")]
    #[arg(short, long, conflicts_with_all = ["waveform", "peaks"])]
    play: bool,

    /// Print a JSON summary instead of text
    #[arg(long)]
    json: bool,

    /// Show detailed information
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Serialize)]
struct Summary {
    input: AudioInfo,
    range: TrimRange,
    output: AudioInfo,
    output_path: PathBuf,
    mime_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    peaks: Option<WaveformPeaks>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "audiocut=debug" } else { "audiocut=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &args.config {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };
    if args.history_limit.is_some() {
        config.history_limit = args.history_limit;
    }

    let num_peaks = match args.peaks {
        Some(0) => anyhow::bail!("--peaks must be greater than 0"),
        Some(n) => Some(n),
        None => args.waveform.then_some(config.preview_peaks),
    };

    let mut engine = Engine::new(config);

    let peaks_rx = num_peaks.map(|n| {
        let preview = WaveformPreview::new(n);
        let rx = preview.subscribe();
        engine.attach_preview(Box::new(preview));
        rx
    });

    #[cfg(feature = "playback")]
    let player = args.play.then(|| {
        let player = audiocut::AudioPlayer::new();
        engine.attach_preview(Box::new(player.clone()));
        player
    });

    // Step 1: Decode
    let started = std::time::Instant::now();
    let input = engine
        .load_file(&args.input)
        .with_context(|| format!("failed to load {}", args.input.display()))?
        .info();

    if !args.json {
        println!("🎵 Audio Trimmer");
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        println!("\n📊 Input File: {}", args.input.display());
        println!(
            "   Duration: {:.2} seconds ({:.2} minutes)",
            input.duration_seconds,
            input.duration_seconds / 60.0
        );
        println!("   Sample Rate: {} Hz", input.sample_rate);
        println!("   Channels: {}", input.channels);
        if args.verbose {
            println!("   Frames: {}", input.frame_count);
            println!("   Decode time: {:.2}s", started.elapsed().as_secs_f64());
        }
    }

    // Step 2: Trim
    let full = engine
        .default_range()
        .context("no audio loaded after decoding")?;
    let range = TrimRange::new(
        args.start.unwrap_or(full.start_seconds),
        args.end.unwrap_or(full.end_seconds),
    );

    if args.end.is_some_and(|end| end > input.duration_seconds) {
        tracing::warn!(
            "Trim end {:.2}s exceeds duration {:.2}s; clamping",
            range.end_seconds,
            input.duration_seconds
        );
    }

    engine.trim(range.start_seconds, range.end_seconds);
    let output = engine.info().context("no audio loaded after trimming")?;

    if !args.json {
        println!("\n✂️  Trim Range:");
        println!("   Start: {:.2}s", range.start_seconds);
        println!("   End: {:.2}s", range.end_seconds);
        println!("   Duration: {:.2}s", output.duration_seconds);
        if args.verbose {
            println!("   Trimmed to {} frames", output.frame_count);
        }
    }

    // Step 3: Encode
    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(engine.export_file_name()));
    engine
        .save_wav(&output_path)
        .with_context(|| format!("failed to write {}", output_path.display()))?;

    let peaks = peaks_rx.as_ref().and_then(|rx| rx.borrow().clone());

    if args.json {
        let summary = Summary {
            input,
            range,
            output,
            output_path,
            mime_type: WAV_MIME_TYPE,
            peaks,
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    if let Some(peaks) = &peaks {
        let loudest = peaks
            .max_peaks
            .iter()
            .chain(peaks.min_peaks.iter())
            .fold(0.0f32, |acc, p| acc.max(p.abs()));
        println!("\n📈 Waveform: {} peaks, max amplitude {:.3}", peaks.num_peaks, loudest);
    }

    println!("\n✅ Done! Output saved to: {}", output_path.display());
    println!("   Total time: {:.2}s", started.elapsed().as_secs_f64());

    #[cfg(feature = "playback")]
    if let Some(player) = player {
        println!("\n▶️  Playing {:.2}s...", output.duration_seconds);
        player.play()?;
        while player.get_state().0 {
            std::thread::sleep(std::time::Duration::from_millis(100));
        }
    }

    Ok(())
}

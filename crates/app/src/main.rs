use std::{
    io::Write,
    path::{Path, PathBuf},
    sync::Arc,
    thread,
    time::Duration,
};

use clap::{Parser, Subcommand};
use karaoke_sync_core::{
    load_lyric_file, AppConfig, ClockPhase, KaraokeError, LrcParser, Lyric, LyricParser,
    PlaybackCoordinator, RenderSink, SimulatedTransport, TrackDescriptor,
};
use tracing_subscriber::EnvFilter;

const FONT_SIZE: f64 = 16.0;
const CHAR_WIDTH_FACTOR: f64 = 0.55;

fn main() -> karaoke_sync_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect { lyric, json } => run_inspect(&lyric, json),
        Commands::Play {
            lyric,
            track,
            config,
            rate,
        } => run_play(lyric, track.as_deref(), config.as_deref(), rate),
        Commands::Tracks { config } => run_tracks(&config),
    }
}

fn run_inspect(path: &Path, json: bool) -> karaoke_sync_core::Result<()> {
    let raw = std::fs::read_to_string(path)?;
    let (lyric, warnings) = LrcParser::new().parse_with_warnings(&raw);
    tracing::info!(?path, skipped = warnings.len(), "inspected lyric");

    if json {
        let encoded = serde_json::to_string_pretty(&lyric)
            .map_err(|err| KaraokeError::msg(format!("cannot encode lyric: {err}")))?;
        println!("{encoded}");
        return Ok(());
    }

    let metadata = lyric.metadata();
    println!("title:       {}", metadata.title);
    println!("artist:      {}", metadata.artist);
    println!("album:       {}", metadata.album);
    println!("contributor: {}", metadata.contributor);
    for segment in lyric.timeline().segments() {
        println!("{:>8.2}  {}", segment.timestamp, segment.text);
    }
    for warning in &warnings {
        println!("line {}: {}", warning.line, warning.issue);
    }
    Ok(())
}

fn run_play(
    lyric: Option<PathBuf>,
    track: Option<&str>,
    config: Option<&Path>,
    rate: f64,
) -> karaoke_sync_core::Result<()> {
    let config = match config {
        Some(config) => AppConfig::load(config)?,
        None => AppConfig::default(),
    };
    let path = lyric_source(&config, lyric, track)?;
    let lyric = Arc::new(load_lyric_file(&LrcParser::new(), &path)?);
    let duration = track_length(&lyric, config.sync.final_segment_hold);
    tracing::info!(?path, duration, rate, "starting playback");

    let mut transport = SimulatedTransport::new(duration).with_rate(rate);
    let sink = TerminalSink::new(Arc::clone(&lyric));
    let mut coordinator = PlaybackCoordinator::new(Arc::clone(&lyric), sink, estimate_text_width)
        .with_config(config.sync.clone())?;

    transport.play()?;
    coordinator.play()?;
    let interval = Duration::from_millis(config.sync.tick_interval_ms);
    while coordinator.phase() != ClockPhase::Stopped {
        coordinator.sync_with(&transport)?;
        thread::sleep(interval);
    }

    tracing::info!("playback finished");
    Ok(())
}

fn run_tracks(config: &Path) -> karaoke_sync_core::Result<()> {
    let config = AppConfig::load(config)?;
    let parser = LrcParser::new();

    for track in &config.tracks {
        let lines = match segment_count(&parser, &track.lyric_path) {
            Ok(lines) => lines.to_string(),
            Err(err) => {
                tracing::warn!(track = %track.title, error = %err, "cannot read lyric file");
                "-".to_string()
            }
        };
        println!(
            "{}  {}  ({} lines)  {}",
            track.title, track.artist, lines, track.audio_path
        );
    }
    Ok(())
}

/// Picks the lyric to play: an explicit path, or the lyric of a catalog
/// track looked up by title.
fn lyric_source(
    config: &AppConfig,
    lyric: Option<PathBuf>,
    track: Option<&str>,
) -> karaoke_sync_core::Result<PathBuf> {
    match (lyric, track) {
        (Some(path), None) => Ok(path),
        (None, Some(title)) => {
            let track: &TrackDescriptor = config.track(title).ok_or_else(|| {
                KaraokeError::msg(format!("no track titled {title:?} in the catalog"))
            })?;
            tracing::info!(track = %track.title, audio = %track.audio_path, "selected catalog track");
            Ok(PathBuf::from(&track.lyric_path))
        }
        (Some(_), Some(_)) => Err(KaraokeError::msg(
            "pass either a lyric path or --track, not both",
        )),
        (None, None) => Err(KaraokeError::msg("pass a lyric path or --track")),
    }
}

fn segment_count(parser: &impl LyricParser, path: &str) -> karaoke_sync_core::Result<usize> {
    Ok(load_lyric_file(parser, path)?.timeline().len())
}

/// Last timestamp plus the final-segment hold, so the demo track ends once
/// the last line has been fully revealed.
fn track_length(lyric: &Lyric, final_hold: f64) -> f64 {
    let timeline = lyric.timeline();
    match timeline.len().checked_sub(1) {
        Some(last) => {
            let window = timeline.reveal_window(last, final_hold).unwrap_or(0.0);
            timeline.sorted_timestamps()[last] + window
        }
        None => 0.0,
    }
}

/// Estimated rendered width of `text` in pixels.
fn estimate_text_width(text: &str) -> f64 {
    text.chars().count() as f64 * FONT_SIZE * CHAR_WIDTH_FACTOR
}

/// Prints the active line with its revealed part in brackets.
struct TerminalSink {
    lyric: Arc<Lyric>,
}

impl TerminalSink {
    fn new(lyric: Arc<Lyric>) -> Self {
        Self { lyric }
    }

    fn text(&self, index: usize) -> &str {
        self.lyric
            .timeline()
            .segment(index)
            .map(|segment| segment.text.as_str())
            .unwrap_or_default()
    }
}

impl RenderSink for TerminalSink {
    fn on_segment_start(&mut self, index: usize) {
        tracing::debug!(index, "segment start");
    }

    fn on_fill_update(&mut self, index: usize, fill_width: f64, _is_final: bool) {
        let text = self.text(index);
        let revealed = (fill_width / (FONT_SIZE * CHAR_WIDTH_FACTOR)).round() as usize;
        let split = text
            .char_indices()
            .nth(revealed)
            .map(|(offset, _)| offset)
            .unwrap_or(text.len());
        let (done, rest) = text.split_at(split);
        let mut stdout = std::io::stdout();
        let _ = write!(stdout, "\r\x1b[2K[{done}]{rest}");
        let _ = stdout.flush();
    }

    fn on_segment_end(&mut self, _index: usize) {
        println!();
    }

    fn on_stopped(&mut self) {
        println!();
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Karaoke lyric synchroniser", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse an LRC file and print its metadata and timeline.
    Inspect {
        /// Path to the LRC file.
        lyric: PathBuf,
        /// Print the parsed lyric as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Reveal an LRC file in the terminal against a simulated audio track.
    Play {
        /// Path to the LRC file.
        #[arg(required_unless_present = "track")]
        lyric: Option<PathBuf>,
        /// Play a catalog track by title instead of a lyric path.
        #[arg(short, long, conflicts_with = "lyric", requires = "config")]
        track: Option<String>,
        /// Optional JSON configuration with sync tuning and the catalog.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Playback rate of the simulated audio, to exercise drift correction.
        #[arg(long, default_value_t = 1.0)]
        rate: f64,
    },
    /// List the tracks of a catalog configuration.
    Tracks {
        /// Path to the JSON configuration holding the catalog.
        config: PathBuf,
    },
}

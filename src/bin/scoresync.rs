use clap::{Parser, Subcommand};
use scoresync::session::{FrameHandle, FrameScheduler, SyncSession};
use scoresync::{
    format_clock, locate, parse_file, timemap, CursorError, ScoreCursor, SyncConfig, SyncOffset,
    Transition,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "scoresync")]
#[command(about = "Inspect how a MusicXML melody score lines up with playback time")]
struct Cli {
    /// JSON sync configuration (step threshold, offset bounds, defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the time model of a score
    Inspect {
        file: PathBuf,

        /// Print the model as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the cursor index for one or more playback times
    Locate {
        file: PathBuf,

        #[arg(required = true, allow_negative_numbers = true)]
        times: Vec<f64>,

        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        offset: f64,
    },
    /// Simulate playback frame by frame and print every cursor move
    Follow {
        file: PathBuf,

        #[arg(long, default_value = "60")]
        fps: f64,

        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        offset: f64,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let config = match &cli.config {
        Some(path) => SyncConfig::from_file(path)?,
        None => SyncConfig::default(),
    };

    match cli.command {
        Commands::Inspect { file, json } => {
            let score = parse_file(&file)?;
            let model = timemap::build_with_defaults(
                &score,
                config.default_tempo_bpm,
                config.default_divisions,
            );
            if json {
                println!("{}", scoresync::time_model_to_json(&model)?);
                return Ok(());
            }

            println!("{}", score.title.as_deref().unwrap_or("(untitled)"));
            println!(
                "tempo {} bpm, {} divisions/quarter, {} events ({} notes), {}",
                model.tempo_bpm,
                model.divisions_per_quarter,
                model.elements.len(),
                model.pitched_count(),
                format_clock(model.total_duration_seconds)
            );
            for element in &model.elements {
                let label = match (element.pitched_index, &element.pitch_name) {
                    (Some(i), Some(name)) => format!("note {i} ({name})"),
                    (Some(i), None) => format!("note {i}"),
                    (None, _) => "rest".to_string(),
                };
                println!(
                    "  m{:<4} {:>9.3}s  +{:.3}s  {label}",
                    element.measure_number, element.onset_seconds, element.duration_seconds
                );
            }
        }
        Commands::Locate { file, times, offset } => {
            let score = parse_file(&file)?;
            let model = timemap::build_with_defaults(
                &score,
                config.default_tempo_bpm,
                config.default_divisions,
            );
            let offset = SyncOffset::with_bounds(
                offset,
                config.offset_limit_seconds,
                config.offset_step_seconds,
            );
            for t in times {
                println!("{t:.3}s ({offset}) -> {}", locate(&model, offset.apply(t)));
            }
        }
        Commands::Follow { file, fps, offset } => {
            check_fps(fps)?;
            let score = parse_file(&file)?;
            let mut session = SyncSession::with_config(config, PrintCursor, NextFrame::default());
            session.load_document(&score);
            session.set_offset(offset);

            let total = session.total_seconds();
            session.play();
            let mut frame = 0u64;
            loop {
                let t = frame as f64 / fps;
                if t > total {
                    break;
                }
                let handle = session.scheduler().pending;
                if let Some(update) = handle.and_then(|h| session.on_frame(h, t)) {
                    if update.transition != Transition::Hold {
                        println!(
                            "{} {:>5.1}%  note {:<5} {:?}",
                            format_clock(update.audio_seconds),
                            update.playhead_percent,
                            update.index,
                            update.transition
                        );
                    }
                }
                frame += 1;
            }
            session.pause();
        }
    }

    Ok(())
}

/// Cursor that only logs what a renderer would be asked to do.
struct PrintCursor;

impl ScoreCursor for PrintCursor {
    fn reset(&mut self) -> Result<(), CursorError> {
        log::debug!("cursor reset");
        Ok(())
    }

    fn advance_one(&mut self) -> Result<(), CursorError> {
        log::trace!("cursor next");
        Ok(())
    }

    fn set_visible(&mut self, visible: bool) -> Result<(), CursorError> {
        log::debug!("cursor visible={visible}");
        Ok(())
    }
}

/// Scheduler for a simulated clock: at most one frame is ever pending.
#[derive(Default)]
struct NextFrame {
    counter: u64,
    pending: Option<FrameHandle>,
}

impl FrameScheduler for NextFrame {
    fn request_frame(&mut self) -> FrameHandle {
        self.counter += 1;
        let handle = FrameHandle(self.counter);
        self.pending = Some(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if self.pending == Some(handle) {
            self.pending = None;
        }
    }
}

fn check_fps(fps: f64) -> Result<(), String> {
    if fps > 0.0 && fps.is_finite() {
        Ok(())
    } else {
        Err(format!("fps must be a positive finite number, got {fps}"))
    }
}

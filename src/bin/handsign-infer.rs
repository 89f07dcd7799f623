//! Replay recorded landmark frames through a saved model and print gesture changes.

use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};

use handsign::GestureSession;
use handsign::artifact::DEFAULT_MODEL_NAME;
use handsign::events::GestureEvent;
use handsign::landmarks::ReplayDetector;
use handsign::{app_dirs, config, logging};

/// How long to keep classifying after the recording ends.
const DRAIN_GRACE: Duration = Duration::from_millis(500);
const EVENT_POLL: Duration = Duration::from_millis(50);

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let options = parse_args(std::env::args().skip(1).collect())?;
    let mut app_config = config::load_or_default().map_err(|err| err.to_string())?;
    if let Some(interval) = options.tick_interval_ms {
        app_config.inference.tick_interval_ms = interval;
    }
    if let Err(err) = logging::init(app_config.model.debug || options.debug) {
        eprintln!("File logging unavailable: {err}");
    }
    let model_dir = match options.model_dir {
        Some(dir) => dir,
        None => match app_config.inference.model_dir.clone() {
            Some(dir) => dir,
            None => app_dirs::models_dir().map_err(|err| err.to_string())?,
        },
    };

    let detector = ReplayDetector::from_path(&options.frames_path).map_err(|err| err.to_string())?;
    println!("Replaying {} frames", detector.remaining());

    let (tx, rx) = mpsc::channel();
    let mut session = GestureSession::new(app_config, tx);
    session
        .load_model_from_dir(&model_dir, &options.name)
        .map_err(|err| err.to_string())?;
    session.start_testing().map_err(|err| err.to_string())?;
    session.enable_camera(detector).map_err(|err| err.to_string())?;

    let mut replay_ended: Option<Instant> = None;
    loop {
        if !session.is_camera_enabled() {
            let ended = *replay_ended.get_or_insert_with(Instant::now);
            if ended.elapsed() >= DRAIN_GRACE {
                break;
            }
        }
        match rx.recv_timeout(EVENT_POLL) {
            Ok(GestureEvent::LabelChanged { previous, current }) => match previous {
                Some(previous) => println!("{previous} -> {current}"),
                None => println!("{current}"),
            },
            Ok(GestureEvent::Error { message, .. }) => {
                session.stop_testing();
                return Err(message);
            }
            Ok(_) | Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    session.stop_testing();
    Ok(())
}

#[derive(Debug, Clone)]
struct CliOptions {
    frames_path: PathBuf,
    model_dir: Option<PathBuf>,
    name: String,
    tick_interval_ms: Option<u64>,
    debug: bool,
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut frames_path: Option<PathBuf> = None;
    let mut model_dir: Option<PathBuf> = None;
    let mut name = DEFAULT_MODEL_NAME.to_string();
    let mut tick_interval_ms = None;
    let mut debug = false;

    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => return Err(help_text()),
            "--frames" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--frames requires a value".to_string())?;
                frames_path = Some(PathBuf::from(value));
            }
            "--model-dir" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--model-dir requires a value".to_string())?;
                model_dir = Some(PathBuf::from(value));
            }
            "--name" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--name requires a value".to_string())?;
                name = value.clone();
            }
            "--tick-ms" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--tick-ms requires a value".to_string())?;
                tick_interval_ms = Some(
                    value
                        .parse::<u64>()
                        .map_err(|_| format!("Invalid --tick-ms value: {value}"))?,
                );
            }
            "--debug" => {
                debug = true;
            }
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }

    let frames_path = frames_path.ok_or_else(help_text)?;
    Ok(CliOptions {
        frames_path,
        model_dir,
        name,
        tick_interval_ms,
        debug,
    })
}

fn help_text() -> String {
    [
        "handsign-infer",
        "",
        "Classifies recorded hand frames with a saved model and prints label changes.",
        "",
        "Usage:",
        "  handsign-infer --frames <frames.jsonl> [--model-dir <dir>] [--name model]",
        "",
        "Options:",
        "  --frames <file>       JSON Lines file, one {timestampMs, landmarks} frame per line (required).",
        "  --model-dir <dir>     Directory holding the model files (default: configured model dir).",
        "  --name <name>         Base file name (default model).",
        "  --tick-ms <n>         Classification interval in milliseconds (default 125).",
        "  --debug               Verbose logging.",
    ]
    .join("\n")
}

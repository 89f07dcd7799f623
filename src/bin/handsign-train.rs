//! Train a gesture classifier from an upload JSON file and write the model files.

use std::io::Write;
use std::path::PathBuf;

use handsign::artifact::{self, ArtifactOrigin, DEFAULT_MODEL_NAME, ModelArtifact};
use handsign::dataset::Dataset;
use handsign::training::Trainer;
use handsign::{app_dirs, config, logging};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let options = parse_args(std::env::args().skip(1).collect())?;
    let mut app_config = match &options.config_path {
        Some(path) => config::load_from_path(path),
        None => config::load_or_default(),
    }
    .map_err(|err| err.to_string())?;
    if options.debug {
        app_config.model.debug = true;
    }
    if let Err(err) = logging::init(app_config.model.debug) {
        eprintln!("File logging unavailable: {err}");
    }

    let mut train_options = app_config.train_options();
    if let Some(epochs) = options.epochs {
        train_options.epochs = epochs;
    }
    if let Some(batch_size) = options.batch_size {
        train_options.batch_size = batch_size;
    }
    if let Some(learning_rate) = options.learning_rate {
        train_options.learning_rate = learning_rate;
    }
    if let Some(hidden) = options.hidden_units {
        train_options.hidden_units = hidden;
    }
    if let Some(seed) = options.seed {
        train_options.seed = seed;
    }

    let dataset = Dataset::load(&options.data_path).map_err(|err| err.to_string())?;
    println!("Data loaded: {}", dataset.summary());

    let total = train_options.epochs;
    let mut trainer = Trainer::new(train_options);
    let classifier = trainer
        .train(&dataset, |epoch, loss| {
            print!("\rEpoch {epoch}/{total}  loss={loss:.5}");
            let _ = std::io::stdout().flush();
        })
        .map_err(|err| {
            println!();
            err.to_string()
        })?;
    println!();

    let out_dir = match options.out_dir {
        Some(dir) => dir,
        None => match app_config.inference.model_dir.clone() {
            Some(dir) => dir,
            None => app_dirs::models_dir().map_err(|err| err.to_string())?,
        },
    };
    let model = ModelArtifact::new(classifier, 1, ArtifactOrigin::Trained);
    let written =
        artifact::save_to_dir(&model, &out_dir, &options.name).map_err(|err| err.to_string())?;
    for path in written {
        println!("wrote {}", path.display());
    }
    Ok(())
}

#[derive(Debug, Clone)]
struct CliOptions {
    data_path: PathBuf,
    out_dir: Option<PathBuf>,
    name: String,
    config_path: Option<PathBuf>,
    epochs: Option<usize>,
    batch_size: Option<usize>,
    learning_rate: Option<f32>,
    hidden_units: Option<usize>,
    seed: Option<u64>,
    debug: bool,
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut data_path: Option<PathBuf> = None;
    let mut out_dir: Option<PathBuf> = None;
    let mut name = DEFAULT_MODEL_NAME.to_string();
    let mut config_path: Option<PathBuf> = None;
    let mut epochs = None;
    let mut batch_size = None;
    let mut learning_rate = None;
    let mut hidden_units = None;
    let mut seed = None;
    let mut debug = false;

    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => return Err(help_text()),
            "--data" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--data requires a value".to_string())?;
                data_path = Some(PathBuf::from(value));
            }
            "--out" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--out requires a value".to_string())?;
                out_dir = Some(PathBuf::from(value));
            }
            "--name" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--name requires a value".to_string())?;
                name = value.clone();
            }
            "--config" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--config requires a value".to_string())?;
                config_path = Some(PathBuf::from(value));
            }
            "--epochs" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--epochs requires a value".to_string())?;
                epochs = Some(
                    value
                        .parse::<usize>()
                        .map_err(|_| format!("Invalid --epochs value: {value}"))?,
                );
            }
            "--batch" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--batch requires a value".to_string())?;
                batch_size = Some(
                    value
                        .parse::<usize>()
                        .map_err(|_| format!("Invalid --batch value: {value}"))?,
                );
            }
            "--learning-rate" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--learning-rate requires a value".to_string())?;
                learning_rate = Some(
                    value
                        .parse::<f32>()
                        .map_err(|_| format!("Invalid --learning-rate value: {value}"))?,
                );
            }
            "--hidden" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--hidden requires a value".to_string())?;
                hidden_units = Some(
                    value
                        .parse::<usize>()
                        .map_err(|_| format!("Invalid --hidden value: {value}"))?,
                );
            }
            "--seed" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--seed requires a value".to_string())?;
                seed = Some(
                    value
                        .parse::<u64>()
                        .map_err(|_| format!("Invalid --seed value: {value}"))?,
                );
            }
            "--debug" => {
                debug = true;
            }
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }

    let data_path = data_path.ok_or_else(help_text)?;
    Ok(CliOptions {
        data_path,
        out_dir,
        name,
        config_path,
        epochs,
        batch_size,
        learning_rate,
        hidden_units,
        seed,
        debug,
    })
}

fn help_text() -> String {
    [
        "handsign-train",
        "",
        "Trains a gesture classifier on uploaded landmark samples and writes the model files.",
        "",
        "Usage:",
        "  handsign-train --data <samples.json> [--out <dir>] [--name model]",
        "",
        "Options:",
        "  --data <file>         Training data: label -> {samples: [{landmarks: [...]}]} (required).",
        "  --out <dir>           Output directory (default: configured model dir).",
        "  --name <name>         Base file name without `_meta` or `weights` (default model).",
        "  --config <file>       Read settings from this config.toml.",
        "  --epochs <n>          Training epochs (default 50)",
        "  --batch <n>           Batch size (default 32)",
        "  --learning-rate <f>   Learning rate (default 0.2)",
        "  --hidden <n>          Hidden layer size (default 16)",
        "  --seed <n>            RNG seed (default 42)",
        "  --debug               Verbose logging.",
    ]
    .join("\n")
}

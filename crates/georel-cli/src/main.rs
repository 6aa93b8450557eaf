//! georel CLI - located-in relation demo
//!
//! Usage:
//!   georel [MODEL]
//!
//! Loads the annotation model (default `en_core_web_sm`), runs the demo texts
//! through it and prints one line per relation found.
//!
//! A relative model directory (default `models`) is looked up in the working
//! directory first, then next to the executable.
//!
//! Environment:
//!   GEOREL_CONFIG     optional TOML config file
//!   GEOREL_MODEL_DIR  directory holding `<model>.json` files
//!   LOG_LEVEL         log level when RUST_LOG is unset
//!   LOG_FORMAT        `text` or `json`

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use georel_core::{AppConfig, LoggingConfig};
use georel_extractor::{extract_location_relations, load};

const TEXTS: &[&str] = &[
    "BizLink has 9 facilities located in China. 3 facilities in Kunshan and Shenzen are disclosed. 6 facilities are excluded.",
    "Sales offices and research lab in Springfield, MO",
];

#[derive(Parser)]
#[command(name = "georel")]
#[command(about = "Extract located-in relations from demo texts")]
#[command(version)]
#[command(after_help = "Models are read from <model_dir>/<MODEL>.json. A relative model_dir \
(default `models`, set with GEOREL_MODEL_DIR) is looked up in the working directory first, \
then next to the georel executable.")]
struct Cli {
    /// Model to load (needs parser and NER)
    model: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = load_config()?;
    if let Some(model) = cli.model {
        config = config.with_model(model);
    }

    if let Some(exe_dir) = executable_dir() {
        config.pipeline = config.pipeline.resolve_model_dir(&exe_dir);
    }

    init_tracing(&config.logging);

    let nlp = load(&config.pipeline)
        .with_context(|| format!("failed to load model '{}'", config.pipeline.model))?;
    println!("Loaded model '{}'", nlp.name());
    println!("Processing {} texts", TEXTS.len());

    for text in TEXTS {
        let doc = nlp
            .process(text)
            .with_context(|| format!("failed to process text: {text:?}"))?;
        let relations = extract_location_relations(&doc)?;
        tracing::info!(tokens = doc.len(), relations = relations.len(), "text done");

        for relation in relations {
            println!("{}", relation);
        }
    }

    Ok(())
}

/// Config file named by `GEOREL_CONFIG` (if any), then environment overrides
fn load_config() -> anyhow::Result<AppConfig> {
    let config = match std::env::var("GEOREL_CONFIG") {
        Ok(path) => AppConfig::from_file(&path)
            .with_context(|| format!("failed to load config from {path}"))?
            .with_env_override()?,
        Err(_) => AppConfig::from_env()?,
    };
    Ok(config)
}

fn executable_dir() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    exe.parent().map(Path::to_path_buf)
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.as_str()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_file(logging.include_location)
        .with_line_number(logging.include_location);

    if logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

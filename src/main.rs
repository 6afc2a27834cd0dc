//! Diagram Critic CLI
//!
//! Usage:
//!   diagram-critic [OPTIONS] [FILE]
//!
//! Options:
//!   -c, --config <FILE>     Critique thresholds and palette (TOML format)
//!   -r, --raster <FILE>     Rendered diagram image (PNG, JPEG, GIF, PNM)
//!   -m, --mode <MODE>       Evaluation mode: heuristic or ai-hybrid
//!   --run-dir <DIR>         Document exchange directory for ai-hybrid mode
//!   --by-dimension          Emit one report per critique dimension
//!   -h, --help              Print help

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use diagram_critic::{
    evaluate_by_dimension, evaluate_with_config, CritiqueConfig, EvalConfig, EvalMode, Raster,
};

#[derive(Parser)]
#[command(name = "diagram-critic")]
#[command(about = "Layout, routing, and critique for JSON diagram specs")]
struct Cli {
    /// Input spec file (reads from stdin if not provided)
    input: Option<PathBuf>,

    /// Critique thresholds and palette (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Rendered diagram image for visual checks (PNG, JPEG, GIF, PNM)
    #[arg(short, long)]
    raster: Option<PathBuf>,

    /// Evaluation mode
    #[arg(short, long, value_enum, default_value_t = Mode::Heuristic)]
    mode: Mode,

    /// Document exchange directory for ai-hybrid mode
    #[arg(long)]
    run_dir: Option<PathBuf>,

    /// Emit one report per critique dimension instead of a single verdict
    #[arg(long)]
    by_dimension: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Heuristic,
    AiHybrid,
}

fn main() {
    let cli = Cli::parse();

    let critique = match &cli.config {
        Some(path) => match CritiqueConfig::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => CritiqueConfig::with_defaults(),
    };

    let raster = match &cli.raster {
        Some(path) => match fs::read(path) {
            Ok(bytes) => match Raster::from_bytes(&bytes) {
                Ok(r) => Some(r),
                Err(e) => {
                    eprintln!("Error decoding raster '{}': {}", path.display(), e);
                    std::process::exit(1);
                }
            },
            Err(e) => {
                eprintln!("Error reading raster '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => None,
    };

    let json = match &cli.input {
        Some(path) => match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                eprintln!("Error reading file '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => {
            let mut buffer = String::new();
            match io::stdin().read_to_string(&mut buffer) {
                Ok(_) => buffer,
                Err(e) => {
                    eprintln!("Error reading from stdin: {}", e);
                    std::process::exit(1);
                }
            }
        }
    };

    let mut config = EvalConfig::new().with_critique(critique).with_mode(match cli.mode {
        Mode::Heuristic => EvalMode::Heuristic,
        Mode::AiHybrid => EvalMode::AiHybrid,
    });
    if let Some(run_dir) = cli.run_dir {
        config = config.with_run_dir(run_dir);
    }

    let rendered = if cli.by_dimension {
        match evaluate_by_dimension(&json, raster.as_ref(), &config) {
            Ok(reports) => serde_json::to_string_pretty(&reports),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        match evaluate_with_config(&json, raster.as_ref(), &config) {
            Ok(report) => serde_json::to_string_pretty(&report),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    };

    match rendered {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing report: {}", e);
            std::process::exit(1);
        }
    }
}

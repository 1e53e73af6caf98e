//! Crop diagnosis CLI
//!
//! Prints exactly one JSON result object on stdout; all logging goes to
//! stderr (and the debug log when configured).
//!
//! Usage:
//!   crop_diagnose image '[0.01, 0.93, 0.06]'
//!   crop_diagnose image @scores.json
//!   crop_diagnose soil 1
//!   crop_diagnose soil --features 138,8.6,560,7.46,0.62,0.7,5.9,0.24,0.31,0.77,8.71,0.11 --class-id 0

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crop_diagnosis_rust::tabular::{report_for_class, PrecomputedClass};
use crop_diagnosis_rust::utils::init_tracing;
use crop_diagnosis_rust::{
    adjudicate_soil, parse_scores, Adjudicator, ArtifactPaths, InferenceResponse, PipelineConfig,
};

#[derive(Parser)]
#[command(author, version, about = "Crop disease and soil inference adjudicator", long_about = None)]
struct Cli {
    /// Pipeline configuration JSON
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding class_indices.json and disease_info.json
    #[arg(long, env = "MODELS_DIR", global = true)]
    models_dir: Option<PathBuf>,

    /// Append log lines to this file as well as stderr
    #[arg(long, env = "DEBUG_LOG", global = true)]
    debug_log: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Adjudicate an image classifier score vector
    Image {
        /// JSON array, comma-separated list, or @file containing either
        scores: Option<String>,
    },
    /// Map a soil classifier result to a recommendation
    Soil {
        /// Class id emitted by the external soil model
        #[arg(value_name = "CLASS_ID", allow_negative_numbers = true)]
        class: Option<i64>,

        /// Same as CLASS_ID, as a flag
        #[arg(long, allow_negative_numbers = true, conflicts_with = "class")]
        class_id: Option<i64>,

        /// Soil test values: N,P,K,pH,EC,OC,S,Zn,Fe,Cu,Mn,B
        #[arg(long)]
        features: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.debug_log.as_deref()) {
        eprintln!("Logging disabled: {:#}", e);
    }

    let response = run(&cli);
    println!("{}", response.to_json());
}

fn run(cli: &Cli) -> InferenceResponse {
    match &cli.command {
        None | Some(Commands::Image { scores: None }) => {
            InferenceResponse::model_error("No image scores provided")
        }
        Some(Commands::Image { scores: Some(raw) }) => run_image(cli, raw).unwrap_or_else(|e| {
            tracing::error!("IMAGE ERROR: {:#}", e);
            InferenceResponse::from_error(&e)
        }),
        Some(Commands::Soil {
            class,
            class_id,
            features,
        }) => run_soil((*class).or(*class_id), features.as_deref()),
    }
}

fn run_image(cli: &Cli, raw: &str) -> Result<InferenceResponse> {
    tracing::info!("{}", "=".repeat(60));
    tracing::info!("IMAGE: Starting crop disease inference");

    let config = load_config(cli)?;
    let adjudicator = Adjudicator::new(config)?;

    let scores = read_scores(raw)?;
    tracing::info!("IMAGE: Received {} scores", scores.len());

    Ok(adjudicator.respond(&scores))
}

fn run_soil(class_id: Option<i64>, features: Option<&str>) -> InferenceResponse {
    match (class_id, features) {
        (Some(id), Some(raw)) => adjudicate_soil(raw, &PrecomputedClass(id)),
        (Some(id), None) => InferenceResponse::soil(report_for_class(id)),
        (None, Some(_)) => InferenceResponse::model_error(
            "Soil model not available: pass CLASS_ID from the external soil classifier",
        ),
        (None, None) => InferenceResponse::model_error("No soil features provided"),
    }
}

fn load_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    config.apply_env()?;

    if let Some(dir) = &cli.models_dir {
        config.artifacts = ArtifactPaths::in_dir(dir);
    }

    tracing::info!("Configuration:");
    tracing::info!("  class_indices: {:?}", config.artifacts.class_indices);
    tracing::info!("  disease_info: {:?}", config.artifacts.disease_info);
    tracing::info!("  confidence_threshold: {}", config.confidence_threshold);
    tracing::info!("  top_k: {}", config.top_k);

    Ok(config)
}

fn read_scores(raw: &str) -> Result<Vec<f64>> {
    match raw.strip_prefix('@') {
        Some(path) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read scores file: {}", path))?;
            parse_scores(&contents)
        }
        None => parse_scores(raw),
    }
}

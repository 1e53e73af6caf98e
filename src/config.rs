//! Pipeline Configuration
//!
//! Thresholds, candidate policy and artifact locations, passed to the
//! adjudicator at construction time.
//!
//! Sources, lowest precedence first:
//! - `PipelineConfig::default()`
//! - a JSON file via `PipelineConfig::load()`
//! - environment variables via `PipelineConfig::apply_env()`

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Peak score below which an image is treated as out-of-domain.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.15;

/// Number of ranked candidates inspected before the unfiltered fallback.
pub const DEFAULT_TOP_K: usize = 5;

/// Labels that are data-collection artifacts of the PlantVillage training set.
pub const DEFAULT_EXCLUDED_LABELS: [&str; 2] = ["PlantVillage", "Unknown"];

pub const DEFAULT_MODELS_DIR: &str = "models";
pub const DEFAULT_MODEL_NAME: &str = "crop_disease_model.h5 (Local CNN)";

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Not yet calibrated against real model output
    pub confidence_threshold: f64,
    pub top_k: usize,
    pub excluded_labels: Vec<String>,
    /// Human-readable model description echoed as `modelUsed`
    pub model_name: String,
    pub artifacts: ArtifactPaths,
}

/// Locations of the lookup tables shipped next to the model weights
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ArtifactPaths {
    /// label → index JSON (Keras `class_indices` orientation)
    pub class_indices: PathBuf,
    /// label → disease record JSON
    pub disease_info: PathBuf,
}

impl ArtifactPaths {
    pub fn in_dir(models_dir: impl AsRef<Path>) -> Self {
        let dir = models_dir.as_ref();
        Self {
            class_indices: dir.join("class_indices.json"),
            disease_info: dir.join("disease_info.json"),
        }
    }
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self::in_dir(DEFAULT_MODELS_DIR)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            top_k: DEFAULT_TOP_K,
            excluded_labels: DEFAULT_EXCLUDED_LABELS.iter().map(|s| s.to_string()).collect(),
            model_name: DEFAULT_MODEL_NAME.to_string(),
            artifacts: ArtifactPaths::default(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a JSON file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: PipelineConfig = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config JSON: {:?}", path))?;

        config.validate()?;
        Ok(config)
    }

    /// Defaults overlaid with environment variables.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Overlay `MODELS_DIR`, `CONFIDENCE_THRESHOLD` and `TOP_K` when set.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    fn apply_vars(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(dir) = var("MODELS_DIR") {
            self.artifacts = ArtifactPaths::in_dir(dir);
        }

        if let Some(raw) = var("CONFIDENCE_THRESHOLD") {
            self.confidence_threshold = raw
                .trim()
                .parse()
                .with_context(|| format!("CONFIDENCE_THRESHOLD is not a number: '{}'", raw))?;
        }

        if let Some(raw) = var("TOP_K") {
            self.top_k = raw
                .trim()
                .parse()
                .with_context(|| format!("TOP_K is not a positive integer: '{}'", raw))?;
        }

        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            anyhow::bail!(
                "confidence_threshold must be within [0, 1], got {}",
                self.confidence_threshold
            );
        }
        if self.top_k == 0 {
            anyhow::bail!("top_k must be at least 1");
        }
        Ok(())
    }
}

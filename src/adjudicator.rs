//! Adjudicator - coordinator for the image decision pipeline
//!
//! Owns the configuration and the read-only lookup tables, runs
//! validate → gate → resolve → decompose → assemble for one score vector,
//! and converts every failure into the `model_error` response shape.
//!
//! Holds no mutable state after construction; share it behind an `Arc` when
//! serving concurrent invocations.

use anyhow::{Context, Result};
use std::time::Instant;

use crate::config::PipelineConfig;
use crate::data::{ClassIndexMap, MetadataStore};
use crate::error::PipelineError;
use crate::pipeline::{assemble, decompose, gate, resolve, CandidatePolicy, GateOutcome};
use crate::response::{Diagnosis, InferenceResponse};

/// Terminal artifact of the image pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Out-of-domain input; not an error
    Rejected { top_confidence: f64, message: String },
    Resolved(Box<Diagnosis>),
}

impl Decision {
    pub fn into_response(self) -> InferenceResponse {
        match self {
            Decision::Rejected { message, .. } => InferenceResponse::invalid_image(message),
            Decision::Resolved(diagnosis) => InferenceResponse::diagnosis(*diagnosis),
        }
    }
}

pub struct Adjudicator {
    config: PipelineConfig,
    policy: CandidatePolicy,
    class_map: ClassIndexMap,
    metadata: MetadataStore,
}

impl Adjudicator {
    /// Load lookup tables from the configured artifact paths.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;

        tracing::info!("Loading class indices from {:?}", config.artifacts.class_indices);
        let class_map = ClassIndexMap::load(&config.artifacts.class_indices)?;

        tracing::info!("Loading disease info from {:?}", config.artifacts.disease_info);
        let metadata = MetadataStore::load(&config.artifacts.disease_info)?;

        Ok(Self::from_parts(config, class_map, metadata))
    }

    /// Build from tables already in memory.
    pub fn from_parts(config: PipelineConfig, class_map: ClassIndexMap, metadata: MetadataStore) -> Self {
        let policy = CandidatePolicy::new(config.top_k, config.excluded_labels.iter().cloned());

        tracing::debug!(
            "Adjudicator ready: {} classes{}, {} disease records, threshold {}, top-{}",
            class_map.len(),
            if class_map.is_degraded() { " (fallback)" } else { "" },
            metadata.len(),
            config.confidence_threshold,
            config.top_k
        );

        Self {
            config,
            policy,
            class_map,
            metadata,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn class_map(&self) -> &ClassIndexMap {
        &self.class_map
    }

    pub fn metadata(&self) -> &MetadataStore {
        &self.metadata
    }

    /// Reject empty, non-finite or mis-sized score vectors.
    fn validate(&self, scores: &[f64]) -> Result<(), PipelineError> {
        if scores.is_empty() {
            return Err(PipelineError::EmptyScores);
        }

        if let Some((index, &value)) = scores.iter().enumerate().find(|(_, s)| !s.is_finite()) {
            return Err(PipelineError::NonFiniteScore { index, value });
        }

        if self.class_map.is_authoritative() && scores.len() != self.class_map.len() {
            return Err(PipelineError::LengthMismatch {
                scores: scores.len(),
                classes: self.class_map.len(),
            });
        }

        Ok(())
    }

    /// Run the image pipeline on one score vector.
    pub fn adjudicate(&self, scores: &[f64]) -> Result<Decision, PipelineError> {
        let started = Instant::now();
        self.validate(scores)?;

        let outcome = gate(scores, self.config.confidence_threshold);
        tracing::debug!(
            "IMAGE: Top raw confidence {:.4} (accepted: {})",
            outcome.top(),
            outcome.is_accepted()
        );

        if let GateOutcome::Reject { top, message } = outcome {
            tracing::info!(
                "IMAGE: Low confidence ({:.4}), classifying as non-agricultural image",
                top
            );
            return Ok(Decision::Rejected {
                top_confidence: top,
                message,
            });
        }

        let resolved = resolve(scores, &self.class_map, &self.policy)
            .ok_or(PipelineError::EmptyScores)?;

        tracing::info!(
            "IMAGE: Predicted class '{}' | Confidence {:.4} ({:.1}%)",
            resolved.label,
            resolved.confidence,
            resolved.confidence * 100.0
        );

        let record = self.metadata.get(&resolved.label);
        let names = decompose(&resolved.label, record);
        tracing::info!(
            "IMAGE: Resolved crop='{}', disease='{}'{}",
            names.crop,
            names.condition,
            if record.is_some() { "" } else { " (from label)" }
        );

        let mut diagnosis = assemble(&resolved, names, record, &self.config.model_name);
        diagnosis.execution_time_ms = started.elapsed().as_millis() as u64;
        tracing::debug!(
            "IMAGE: Reported confidence {} (raw {})",
            diagnosis.confidence,
            diagnosis.raw_confidence
        );

        Ok(Decision::Resolved(Box::new(diagnosis)))
    }

    /// Boundary for the image pipeline: never returns an error.
    pub fn respond(&self, scores: &[f64]) -> InferenceResponse {
        match self.adjudicate(scores) {
            Ok(decision) => decision.into_response(),
            Err(e) => {
                tracing::error!("IMAGE ERROR: {}", e);
                InferenceResponse::from_error(&anyhow::Error::new(e))
            }
        }
    }
}

/// Parse a score vector given as a JSON array or a comma-separated list.
pub fn parse_scores(raw: &str) -> Result<Vec<f64>> {
    let trimmed = raw.trim();

    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed).context("Score vector is not a JSON array of numbers");
    }

    trimmed
        .split(',')
        .enumerate()
        .map(|(i, s)| {
            s.trim()
                .parse::<f64>()
                .with_context(|| format!("Score {} is not a number: '{}'", i, s.trim()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DiseaseRecord;
    use approx::assert_relative_eq;

    fn adjudicator(class_map: ClassIndexMap, metadata: MetadataStore) -> Adjudicator {
        Adjudicator::from_parts(PipelineConfig::default(), class_map, metadata)
    }

    #[test]
    fn test_tomato_healthy_scenario() {
        let adj = adjudicator(ClassIndexMap::new([(0, "Tomato___Healthy")]), MetadataStore::default());

        match adj.adjudicate(&[0.9, 0.05, 0.03, 0.01, 0.01]).unwrap() {
            Decision::Resolved(d) => {
                assert_eq!(d.predicted_class, "Tomato___Healthy");
                assert_eq!(d.crop, "Tomato");
                assert_eq!(d.disease, "Healthy");
                assert_eq!(d.plant_health, "Healthy");
                assert_relative_eq!(d.confidence, 0.9);
            }
            other => panic!("expected resolved decision, got {:?}", other),
        }
    }

    #[test]
    fn test_low_confidence_rejected() {
        let adj = adjudicator(ClassIndexMap::fallback(), MetadataStore::default());
        let decision = adj.adjudicate(&[0.05, 0.06, 0.04]).unwrap();

        assert!(matches!(decision, Decision::Rejected { top_confidence, .. } if top_confidence == 0.06));

        let value = serde_json::to_value(adj.respond(&[0.05, 0.06, 0.04])).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["status"], "invalid_image");
    }

    #[test]
    fn test_metadata_enriches_result() {
        let record = DiseaseRecord {
            crop: Some("Wheat".to_string()),
            disease: Some("Stem Rust".to_string()),
            irrigation_advice: Some("Avoid overhead irrigation.".to_string()),
            ..Default::default()
        };
        let adj = adjudicator(
            ClassIndexMap::new([(0, "PlantVillage"), (1, "Wheat___Rust")]),
            MetadataStore::new([("Wheat___Rust", record)]),
        );

        let Decision::Resolved(d) = adj.adjudicate(&[0.55, 0.4]).unwrap() else {
            panic!("expected resolved decision");
        };
        assert_eq!(d.predicted_class, "Wheat___Rust");
        assert_eq!(d.disease, "Stem Rust");
        assert_eq!(d.recommendations.irrigation_advice, "Avoid overhead irrigation.");
        assert_eq!(d.plant_health, "Diseased");
    }

    #[test]
    fn test_length_mismatch_with_loaded_map() {
        let map = ClassIndexMap::from_json(r#"{"A___x": 0, "A___y": 1, "A___z": 2}"#).unwrap();
        let adj = adjudicator(map, MetadataStore::default());

        let err = adj.adjudicate(&[0.5, 0.5]).unwrap_err();
        assert!(matches!(err, PipelineError::LengthMismatch { scores: 2, classes: 3 }));
    }

    #[test]
    fn test_corrupt_scores_are_model_errors() {
        let adj = adjudicator(ClassIndexMap::fallback(), MetadataStore::default());

        let value = serde_json::to_value(adj.respond(&[])).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["status"], "model_error");
        assert_eq!(value["error"], "score vector is empty");

        let value = serde_json::to_value(adj.respond(&[0.2, f64::NAN])).unwrap();
        let message = value["error"].as_str().unwrap();
        assert!(message.contains("index 1 is not a finite number"));
        assert!(!message.contains("Image inference failed"));
    }

    #[test]
    fn test_configured_threshold_and_model_name() {
        let config = PipelineConfig {
            confidence_threshold: 0.5,
            model_name: "mobilenet_v2".to_string(),
            ..Default::default()
        };
        let adj = Adjudicator::from_parts(
            config,
            ClassIndexMap::new([(0, "Apple___Cedar_apple_rust")]),
            MetadataStore::default(),
        );

        assert!(matches!(adj.adjudicate(&[0.45]).unwrap(), Decision::Rejected { .. }));

        let value = serde_json::to_value(adj.respond(&[0.75])).unwrap();
        assert_eq!(value["data"]["modelUsed"], "mobilenet_v2");
        assert_eq!(value["data"]["crop"], "Apple");
    }

    #[test]
    fn test_parse_scores() {
        assert_eq!(parse_scores("[0.9, 0.1]").unwrap(), vec![0.9, 0.1]);
        assert_eq!(parse_scores(" 0.2,0.3 , 0.5 ").unwrap(), vec![0.2, 0.3, 0.5]);

        let err = parse_scores("0.2,abc").unwrap_err();
        assert!(format!("{:#}", err).contains("Score 1 is not a number: 'abc'"));
        assert!(parse_scores("[0.2, \"x\"]").is_err());
    }
}

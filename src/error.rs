//! Pipeline Errors
//!
//! Validation failures raised while adjudicating a single invocation.
//! Artifact loading uses `anyhow` with context instead; both end up in the
//! `model_error` response shape at the boundary.

use std::num::ParseFloatError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("score vector is empty")]
    EmptyScores,

    #[error("score at index {index} is not a finite number ({value})")]
    NonFiniteScore { index: usize, value: f64 },

    #[error("score vector has {scores} entries but class index map has {classes} classes")]
    LengthMismatch { scores: usize, classes: usize },

    #[error("expected {expected} soil features (N,P,K,pH,EC,OC,S,Zn,Fe,Cu,Mn,B), got {found}")]
    FeatureCount { expected: usize, found: usize },

    #[error("invalid soil feature {name}='{value}'")]
    InvalidFeature {
        name: &'static str,
        value: String,
        #[source]
        source: ParseFloatError,
    },

    #[error("soil classifier unavailable: {0}")]
    ClassifierUnavailable(String),
}

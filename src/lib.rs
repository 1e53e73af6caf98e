//! Crop Diagnosis Adjudicator
//!
//! Turns raw classifier output into a structured, always fully populated
//! diagnostic result.
//!
//! - `pipeline/`: image decision stages (gate, resolver, decomposer, assembler)
//! - `adjudicator`: runs the image pipeline and owns the lookup tables
//! - `tabular`: independent soil class → recommendation pipeline
//! - `data`: class index map and disease record loading
//! - `response`: the JSON result shapes emitted to callers
//! - `config`: thresholds, candidate policy and artifact paths
//!
//! Model loading, image download and preprocessing stay outside this crate;
//! callers hand over a score vector or a soil class id.

pub mod config;
pub mod error;
pub mod data;
pub mod pipeline;
pub mod adjudicator;
pub mod tabular;
pub mod response;
pub mod utils;

// Re-export commonly used types
pub use config::{ArtifactPaths, PipelineConfig};
pub use error::PipelineError;
pub use data::{ClassIndexMap, DiseaseRecord, MetadataStore};
pub use adjudicator::{parse_scores, Adjudicator, Decision};
pub use tabular::{adjudicate_soil, map_tabular, SoilFeatures, TabularClassifier, TabularOutcome};
pub use response::{Diagnosis, InferenceResponse};

//! Image decision pipeline
//!
//! Each stage is a pure function in its own module:
//! - `confidence_gate`: reject out-of-domain inputs on peak score
//! - `candidate_resolver`: filtered top-k, then unfiltered argmax
//! - `label_decomposer`: crop / condition names from record or label
//! - `result_assembler`: merge record over computed defaults
//!
//! `crate::adjudicator::Adjudicator` runs them in order.

pub mod confidence_gate;
pub mod candidate_resolver;
pub mod label_decomposer;
pub mod result_assembler;

pub use confidence_gate::{gate, peak_score, GateOutcome, INVALID_IMAGE_MESSAGE};
pub use candidate_resolver::{resolve, top_k_indices, argmax, CandidatePolicy, ResolvedCandidate};
pub use label_decomposer::{decompose, decompose_label, CropCondition, LABEL_SEPARATOR};
pub use result_assembler::{assemble, health_from_condition};

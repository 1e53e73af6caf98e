//! Soil (tabular) decision pipeline
//!
//! Independent of the image pipeline. A 12-value soil test is classified by
//! an external model into a nutrient-balance class, which is mapped to a
//! status / recommendation pair. Unknown class ids degrade to a generic
//! outcome instead of failing.

use anyhow::Result;
use std::time::Instant;

use crate::error::PipelineError;
use crate::response::{InferenceResponse, SoilReport};

/// Feature order expected by the soil classifier
pub const SOIL_FEATURE_NAMES: [&str; 12] =
    ["N", "P", "K", "pH", "EC", "OC", "S", "Zn", "Fe", "Cu", "Mn", "B"];

pub const SOIL_TYPE_LABEL: &str = "Analysed via ML Model";
pub const GENERIC_SOIL_RECOMMENDATION: &str = "Consult an agronomist.";

/// Known classes: (status, recommendation)
static SOIL_OUTCOMES: [(&str, &str); 3] = [
    (
        "Balanced Soil",
        "Soil is well-balanced. Maintain regular composting and pH monitoring.",
    ),
    (
        "Nutrient Deficient — Low Nitrogen / Organic Matter",
        "Apply organic compost or urea to restore nitrogen levels. Consider green manure.",
    ),
    (
        "Nutrient Deficient — Low Phosphorus / Potassium",
        "Apply DAP (Di-ammonium Phosphate) or MOP (Muriate of Potash) as appropriate.",
    ),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabularOutcome {
    pub status: String,
    pub recommendation: String,
    pub class_id: i64,
}

impl TabularOutcome {
    /// Whether the id was one of the known classes
    pub fn is_known(&self) -> bool {
        known_outcome(self.class_id).is_some()
    }
}

fn known_outcome(class_id: i64) -> Option<&'static (&'static str, &'static str)> {
    usize::try_from(class_id)
        .ok()
        .and_then(|i| SOIL_OUTCOMES.get(i))
}

/// Total over all ids.
pub fn map_tabular(class_id: i64) -> TabularOutcome {
    match known_outcome(class_id) {
        Some((status, recommendation)) => TabularOutcome {
            status: status.to_string(),
            recommendation: recommendation.to_string(),
            class_id,
        },
        None => TabularOutcome {
            status: format!("Class {}", class_id),
            recommendation: GENERIC_SOIL_RECOMMENDATION.to_string(),
            class_id,
        },
    }
}

/// Parsed soil test in `SOIL_FEATURE_NAMES` order
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoilFeatures(pub [f64; 12]);

impl SoilFeatures {
    /// Parse `"N,P,K,pH,EC,OC,S,Zn,Fe,Cu,Mn,B"`.
    pub fn parse(raw: &str) -> Result<Self, PipelineError> {
        let fields: Vec<&str> = raw.split(',').map(str::trim).collect();

        if fields.len() != SOIL_FEATURE_NAMES.len() {
            return Err(PipelineError::FeatureCount {
                expected: SOIL_FEATURE_NAMES.len(),
                found: fields.len(),
            });
        }

        let mut values = [0.0; 12];
        for (i, (field, name)) in fields.iter().zip(SOIL_FEATURE_NAMES).enumerate() {
            values[i] = field.parse().map_err(|source| PipelineError::InvalidFeature {
                name,
                value: field.to_string(),
                source,
            })?;
        }

        Ok(SoilFeatures(values))
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        SOIL_FEATURE_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|i| self.0[i])
    }
}

/// External soil classifier
pub trait TabularClassifier {
    fn classify(&self, features: &SoilFeatures) -> Result<i64>;
}

/// Class id already computed by the external model (e.g. passed on the
/// command line); ignores the features.
#[derive(Debug, Clone, Copy)]
pub struct PrecomputedClass(pub i64);

impl TabularClassifier for PrecomputedClass {
    fn classify(&self, _features: &SoilFeatures) -> Result<i64> {
        Ok(self.0)
    }
}

/// Parse, classify and map a soil test into a report.
pub fn classify_soil(raw_features: &str, classifier: &dyn TabularClassifier) -> Result<SoilReport> {
    let started = Instant::now();
    tracing::info!("SOIL: Starting soil inference. Features: {}", raw_features);

    let features = SoilFeatures::parse(raw_features)?;

    let class_id = classifier
        .classify(&features)
        .map_err(|e| PipelineError::ClassifierUnavailable(format!("{:#}", e)))?;

    Ok(report(class_id, started))
}

/// Report for a class id produced without a feature vector at hand.
pub fn report_for_class(class_id: i64) -> SoilReport {
    report(class_id, Instant::now())
}

fn report(class_id: i64, started: Instant) -> SoilReport {
    let outcome = map_tabular(class_id);
    let elapsed = started.elapsed().as_millis() as u64;

    if outcome.is_known() {
        tracing::info!("SOIL: Predicted class={} ({}) in {}ms", class_id, outcome.status, elapsed);
    } else {
        tracing::warn!("SOIL: Classifier returned unmapped class {}", class_id);
    }

    SoilReport {
        soil_type: SOIL_TYPE_LABEL.to_string(),
        status: outcome.status,
        prediction_class: outcome.class_id,
        recommendation: outcome.recommendation,
        execution_time_ms: elapsed,
    }
}

/// Boundary for the soil pipeline: never returns an error.
pub fn adjudicate_soil(raw_features: &str, classifier: &dyn TabularClassifier) -> InferenceResponse {
    match classify_soil(raw_features, classifier) {
        Ok(report) => InferenceResponse::soil(report),
        Err(e) => {
            tracing::error!("SOIL ERROR: {:#}", e);
            InferenceResponse::from_error(&e)
        }
    }
}

//! Result Assembler
//!
//! Merges a resolved candidate, its crop/condition names and an optional
//! disease record into a complete `Diagnosis`. Every field has a computed or
//! templated default, so the output shape never depends on which record
//! fields happen to exist.
//!
//! Confidence is rounded here and nowhere earlier.

use serde_json::Value;

use crate::data::DiseaseRecord;
use crate::pipeline::candidate_resolver::ResolvedCandidate;
use crate::pipeline::label_decomposer::CropCondition;
use crate::response::{Diagnosis, GrowthStage, Recommendations, SoilInsights, WeatherImpact};
use crate::utils::{confidence_percent, round_confidence};

pub const DEFAULT_TREATMENT: &str = "Consult a local agronomist for treatment advice.";
pub const DEFAULT_ORGANIC_TREATMENT: &str =
    "Apply neem-based organic pesticide as a general precaution.";
pub const DEFAULT_IRRIGATION_ADVICE: &str = "Monitor soil moisture; avoid waterlogging.";
pub const DEFAULT_FERTILIZER_ADVICE: &str = "Maintain balanced NPK nutrition.";
pub const DEFAULT_GROWTH_STAGE: &str = "Unknown";

const SOIL_TIPS: [&str; 2] = [
    "Ensure soil is well-drained.",
    "Check and maintain appropriate pH levels.",
];
const WEATHER_RISK_LEVEL: &str = "Monitor";
const WEATHER_ADVICE: &str =
    "Monitor local weather forecasts for humidity spikes which promote fungal spread.";

/// Values used for any field the record does not supply
#[derive(Debug, Clone)]
struct Defaults {
    plant_health: String,
    diagnosis: String,
    treatment: Vec<String>,
    organic_treatment: Vec<String>,
    irrigation_advice: String,
    fertilizer_advice: String,
    growth_stage: String,
    days_to_harvest: Value,
    tutorial: Vec<Value>,
}

impl Defaults {
    fn computed(names: &CropCondition, confidence: f64) -> Self {
        Self {
            plant_health: health_from_condition(&names.condition).to_string(),
            diagnosis: format!(
                "ML model detected {} in {} with {:.1}% confidence.",
                names.condition,
                names.crop,
                confidence_percent(confidence)
            ),
            treatment: vec![DEFAULT_TREATMENT.to_string()],
            organic_treatment: vec![DEFAULT_ORGANIC_TREATMENT.to_string()],
            irrigation_advice: DEFAULT_IRRIGATION_ADVICE.to_string(),
            fertilizer_advice: DEFAULT_FERTILIZER_ADVICE.to_string(),
            growth_stage: DEFAULT_GROWTH_STAGE.to_string(),
            days_to_harvest: Value::from(0u32),
            tutorial: Vec::new(),
        }
    }
}

/// "Healthy" when the condition mentions healthy (any case), else "Diseased"
pub fn health_from_condition(condition: &str) -> &'static str {
    if condition.to_lowercase().contains("healthy") {
        "Healthy"
    } else {
        "Diseased"
    }
}

/// Build the diagnosis payload.
///
/// `execution_time_ms` is left at 0 for the caller to stamp.
pub fn assemble(
    resolved: &ResolvedCandidate,
    names: CropCondition,
    record: Option<&DiseaseRecord>,
    model_used: &str,
) -> Diagnosis {
    let defaults = Defaults::computed(&names, resolved.confidence);
    let empty = DiseaseRecord::default();
    let record = record.unwrap_or(&empty);

    Diagnosis {
        model_used: model_used.to_string(),
        predicted_class: resolved.label.clone(),
        crop: names.crop,
        disease: names.condition,
        confidence: round_confidence(resolved.confidence),
        plant_health: record.health_status.clone().unwrap_or(defaults.plant_health),
        execution_time_ms: 0,
        recommendations: Recommendations {
            diagnosis: record.diagnosis.clone().unwrap_or(defaults.diagnosis),
            treatment: record.chemical_treatment.clone().unwrap_or(defaults.treatment),
            organic_treatment: record
                .organic_treatment
                .clone()
                .unwrap_or(defaults.organic_treatment),
            irrigation_advice: record
                .irrigation_advice
                .clone()
                .unwrap_or(defaults.irrigation_advice),
            fertilizer_advice: record
                .fertilizer_advice
                .clone()
                .unwrap_or(defaults.fertilizer_advice),
        },
        growth_stage: GrowthStage {
            stage: record.growth_stage.clone().unwrap_or(defaults.growth_stage),
            days_to_harvest: record
                .days_to_harvest
                .clone()
                .unwrap_or(defaults.days_to_harvest),
        },
        tutorial: record.tutorial.clone().unwrap_or(defaults.tutorial),
        soil_insights: SoilInsights {
            tips: SOIL_TIPS.iter().map(|s| s.to_string()).collect(),
        },
        weather_impact: WeatherImpact {
            risk_level: WEATHER_RISK_LEVEL.to_string(),
            advice: WEATHER_ADVICE.to_string(),
        },
        raw_confidence: resolved.confidence,
    }
}

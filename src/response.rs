//! Response Contract
//!
//! The only output channel: exactly one of these objects per invocation,
//! serialized as JSON on stdout.
//!
//! ```text
//! image, resolved   {success: true,  data: {predictedClass, crop, disease, ...}}
//! image, rejected   {success: true,  status: "invalid_image", message}
//! soil              {success: true,  data: {status, predictionClass, recommendation, ...}}
//! any failure       {success: false, status: "model_error", error}
//! ```

use serde::Serialize;
use serde_json::Value;

pub const STATUS_INVALID_IMAGE: &str = "invalid_image";
pub const STATUS_MODEL_ERROR: &str = "model_error";

/// Fully populated diagnosis for a resolved image
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnosis {
    pub model_used: String,
    pub predicted_class: String,
    pub crop: String,
    pub disease: String,
    /// Rounded to 4 decimal places
    pub confidence: f64,
    pub plant_health: String,
    pub execution_time_ms: u64,
    pub recommendations: Recommendations,
    pub growth_stage: GrowthStage,
    pub tutorial: Vec<Value>,
    pub soil_insights: SoilInsights,
    pub weather_impact: WeatherImpact,

    /// Unrounded score, kept for logging and tests
    #[serde(skip)]
    pub raw_confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendations {
    pub diagnosis: String,
    pub treatment: Vec<String>,
    pub organic_treatment: Vec<String>,
    pub irrigation_advice: String,
    pub fertilizer_advice: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthStage {
    pub stage: String,
    /// Number of days, or the record's text when it gives a range
    pub days_to_harvest: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SoilInsights {
    pub tips: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherImpact {
    pub risk_level: String,
    pub advice: String,
}

/// Soil classifier outcome
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SoilReport {
    pub soil_type: String,
    pub status: String,
    pub prediction_class: i64,
    pub recommendation: String,
    pub execution_time_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum InferenceResponse {
    Diagnosis {
        success: bool,
        data: Box<Diagnosis>,
    },
    InvalidImage {
        success: bool,
        status: &'static str,
        message: String,
    },
    Soil {
        success: bool,
        data: SoilReport,
    },
    ModelError {
        success: bool,
        status: &'static str,
        error: String,
    },
}

impl InferenceResponse {
    pub fn diagnosis(data: Diagnosis) -> Self {
        InferenceResponse::Diagnosis {
            success: true,
            data: Box::new(data),
        }
    }

    pub fn invalid_image(message: impl Into<String>) -> Self {
        InferenceResponse::InvalidImage {
            success: true,
            status: STATUS_INVALID_IMAGE,
            message: message.into(),
        }
    }

    pub fn soil(data: SoilReport) -> Self {
        InferenceResponse::Soil { success: true, data }
    }

    pub fn model_error(error: impl Into<String>) -> Self {
        InferenceResponse::ModelError {
            success: false,
            status: STATUS_MODEL_ERROR,
            error: error.into(),
        }
    }

    /// Failure shape for any error, keeping the full cause chain
    pub fn from_error(err: &anyhow::Error) -> Self {
        Self::model_error(format!("{:#}", err))
    }

    pub fn is_success(&self) -> bool {
        match self {
            InferenceResponse::Diagnosis { success, .. }
            | InferenceResponse::InvalidImage { success, .. }
            | InferenceResponse::Soil { success, .. }
            | InferenceResponse::ModelError { success, .. } => *success,
        }
    }

    pub fn to_json(&self) -> String {
        // Only strings, numbers and JSON values; not expected to fail
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(
                r#"{{"success":false,"status":"{}","error":{}}}"#,
                STATUS_MODEL_ERROR,
                Value::String(e.to_string())
            )
        })
    }
}

//! Label Decomposer
//!
//! Derives display crop and condition names for a resolved label. A disease
//! record wins when one exists; otherwise the PlantVillage naming convention
//! `<Crop>___<Condition>` is parsed, e.g. `Corn_(maize)___Common_rust_`
//! → ("Corn (maize)", "Common rust ").

use crate::data::{DiseaseRecord, UNKNOWN_LABEL};

/// Separator between crop and condition in structured labels
pub const LABEL_SEPARATOR: &str = "___";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CropCondition {
    pub crop: String,
    pub condition: String,
}

/// Total: every label yields a pair.
pub fn decompose(label: &str, record: Option<&DiseaseRecord>) -> CropCondition {
    match record {
        Some(record) => CropCondition {
            crop: record.crop.clone().unwrap_or_else(|| UNKNOWN_LABEL.to_string()),
            condition: record.disease.clone().unwrap_or_else(|| UNKNOWN_LABEL.to_string()),
        },
        None => decompose_label(label),
    }
}

/// Parse the naming convention alone.
///
/// Only the first two segments are used; anything after a second separator
/// is dropped.
pub fn decompose_label(label: &str) -> CropCondition {
    if !label.contains(LABEL_SEPARATOR) {
        return CropCondition {
            crop: label.to_string(),
            condition: label.to_string(),
        };
    }

    let mut segments = label.split(LABEL_SEPARATOR);
    let crop = segments.next().unwrap_or_default();
    let condition = segments.next().unwrap_or_default();

    CropCondition {
        crop: crop.replace('_', " "),
        condition: condition.replace('_', " "),
    }
}

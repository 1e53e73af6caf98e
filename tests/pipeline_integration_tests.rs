//! Pipeline Integration Tests
//!
//! Drives the adjudicator end to end from artifact files on disk to the JSON
//! response, covering the degraded modes (missing index file, missing or
//! partial disease info) alongside the normal path.

use crop_diagnosis_rust::{
    adjudicate_soil, map_tabular, Adjudicator, ArtifactPaths, ClassIndexMap, Decision,
    MetadataStore, PipelineConfig, SoilFeatures, TabularClassifier,
};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;

const CLASS_INDICES: &str = r#"{
    "Apple___Apple_scab": 0,
    "Apple___healthy": 1,
    "PlantVillage": 2,
    "Potato___Late_blight": 3,
    "Tomato___Leaf_Mold": 4,
    "Tomato___healthy": 5
}"#;

const DISEASE_INFO: &str = r#"{
    "Potato___Late_blight": {
        "crop": "Potato",
        "disease": "Late Blight",
        "health_status": "Diseased",
        "diagnosis": "Phytophthora infestans lesions detected.",
        "chemical_treatment": ["Mancozeb", "Chlorothalonil"],
        "organic_treatment": ["Copper hydroxide spray"],
        "irrigation_advice": "Water at the base in the morning.",
        "fertilizer_advice": "Reduce nitrogen; add potassium.",
        "growth_stage": "Tuber bulking",
        "days_to_harvest": 30,
        "tutorial": [
            {"step": 1, "title": "Remove infected foliage"},
            {"step": 2, "title": "Apply fungicide"}
        ]
    },
    "Tomato___healthy": {}
}"#;

const REQUIRED_DATA_KEYS: [&str; 12] = [
    "modelUsed",
    "predictedClass",
    "crop",
    "disease",
    "confidence",
    "plantHealth",
    "executionTimeMs",
    "recommendations",
    "growthStage",
    "tutorial",
    "soilInsights",
    "weatherImpact",
];

fn write_artifacts(dir: &Path, class_indices: Option<&str>, disease_info: Option<&str>) -> PipelineConfig {
    if let Some(contents) = class_indices {
        fs::write(dir.join("class_indices.json"), contents).unwrap();
    }
    if let Some(contents) = disease_info {
        fs::write(dir.join("disease_info.json"), contents).unwrap();
    }
    PipelineConfig {
        artifacts: ArtifactPaths::in_dir(dir),
        ..Default::default()
    }
}

fn respond(adjudicator: &Adjudicator, scores: &[f64]) -> Value {
    serde_json::to_value(adjudicator.respond(scores)).unwrap()
}

fn assert_fully_populated(value: &Value) {
    assert_eq!(value["success"], true);
    let data = &value["data"];
    for key in REQUIRED_DATA_KEYS {
        assert!(!data[key].is_null(), "missing data.{}", key);
    }
    for key in ["diagnosis", "treatment", "organicTreatment", "irrigationAdvice", "fertilizerAdvice"] {
        assert!(!data["recommendations"][key].is_null(), "missing recommendations.{}", key);
    }
    assert!(data["growthStage"]["stage"].is_string());
    let days = &data["growthStage"]["daysToHarvest"];
    assert!(days.is_u64() || days.is_string(), "daysToHarvest = {}", days);
}

#[test]
fn test_enriched_diagnosis_from_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_artifacts(dir.path(), Some(CLASS_INDICES), Some(DISEASE_INFO));
    let adjudicator = Adjudicator::new(config).unwrap();

    assert_eq!(adjudicator.class_map().len(), 6);
    assert_eq!(adjudicator.metadata().len(), 2);

    let value = respond(&adjudicator, &[0.01, 0.02, 0.05, 0.81234567, 0.06, 0.05]);
    assert_fully_populated(&value);

    let data = &value["data"];
    assert_eq!(data["predictedClass"], "Potato___Late_blight");
    assert_eq!(data["crop"], "Potato");
    assert_eq!(data["disease"], "Late Blight");
    assert_eq!(data["confidence"], json!(0.8123));
    assert_eq!(data["recommendations"]["treatment"], json!(["Mancozeb", "Chlorothalonil"]));
    assert_eq!(data["growthStage"]["daysToHarvest"], 30);
    assert_eq!(data["tutorial"].as_array().unwrap().len(), 2);
    assert_eq!(data["weatherImpact"]["riskLevel"], "Monitor");
}

#[test]
fn test_artifact_class_skipped_even_when_top() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_artifacts(dir.path(), Some(CLASS_INDICES), Some(DISEASE_INFO));
    let adjudicator = Adjudicator::new(config).unwrap();

    let value = respond(&adjudicator, &[0.05, 0.1, 0.6, 0.05, 0.15, 0.05]);
    let data = &value["data"];
    assert_eq!(data["predictedClass"], "Tomato___Leaf_Mold");
    assert_eq!(data["crop"], "Tomato");
    assert_eq!(data["disease"], "Leaf Mold");
    assert_eq!(data["plantHealth"], "Diseased");
    assert_eq!(data["confidence"], json!(0.15));
}

#[test]
fn test_empty_record_uses_label_fallback() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_artifacts(dir.path(), Some(CLASS_INDICES), Some(DISEASE_INFO));
    let adjudicator = Adjudicator::new(config).unwrap();

    let value = respond(&adjudicator, &[0.0, 0.0, 0.0, 0.0, 0.0, 0.97]);
    assert_fully_populated(&value);

    let data = &value["data"];
    assert_eq!(data["crop"], "Tomato");
    assert_eq!(data["disease"], "healthy");
    assert_eq!(data["plantHealth"], "Healthy");
    assert_eq!(
        data["recommendations"]["diagnosis"],
        "ML model detected healthy in Tomato with 97.0% confidence."
    );
    assert_eq!(data["tutorial"], json!([]));
}

#[test]
fn test_no_disease_info_still_fully_populated() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_artifacts(dir.path(), Some(CLASS_INDICES), None);
    let adjudicator = Adjudicator::new(config).unwrap();
    assert!(adjudicator.metadata().is_empty());

    for top in 0..6 {
        let mut scores = vec![0.02; 6];
        scores[top] = 0.9;
        let value = respond(&adjudicator, &scores);
        assert_fully_populated(&value);
        assert_ne!(value["data"]["predictedClass"], "PlantVillage");
    }
}

#[test]
fn test_missing_class_indices_degrades() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_artifacts(dir.path(), None, None);
    let adjudicator = Adjudicator::new(config).unwrap();
    assert!(adjudicator.class_map().is_degraded());

    // Every index maps to "Unknown", so the unfiltered fallback answers
    let value = respond(&adjudicator, &[0.1, 0.7, 0.2]);
    assert_fully_populated(&value);
    assert_eq!(value["data"]["predictedClass"], "Unknown");
    assert_eq!(value["data"]["crop"], "Unknown");
    assert_eq!(value["data"]["confidence"], json!(0.7));
}

#[test]
fn test_corrupt_disease_info_fails_construction() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_artifacts(dir.path(), Some(CLASS_INDICES), Some("[1, 2, 3]"));

    let err = Adjudicator::new(config).err().expect("corrupt disease info must fail");
    assert!(format!("{:#}", err).contains("Failed to parse disease info"));
}

#[test]
fn test_mis_sized_scores_are_model_errors() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_artifacts(dir.path(), Some(CLASS_INDICES), None);
    let adjudicator = Adjudicator::new(config).unwrap();

    let value = respond(&adjudicator, &[0.5, 0.5]);
    assert_eq!(value["success"], false);
    assert_eq!(value["status"], "model_error");
    assert!(value["error"]
        .as_str()
        .unwrap()
        .contains("score vector has 2 entries but class index map has 6 classes"));
}

#[test]
fn test_rejection_regardless_of_argmax() {
    let adjudicator = Adjudicator::from_parts(
        PipelineConfig::default(),
        ClassIndexMap::new((0..8).map(|i| (i, format!("Crop___Condition_{}", i)))),
        MetadataStore::default(),
    );

    for top in 0..8 {
        let mut scores = vec![0.1; 8];
        scores[top] = 0.1499;
        match adjudicator.adjudicate(&scores).unwrap() {
            Decision::Rejected { top_confidence, .. } => assert_eq!(top_confidence, 0.1499),
            other => panic!("expected rejection with max at {}, got {:?}", top, other),
        }
    }
}

#[test]
fn test_documented_scenarios() {
    let adjudicator = Adjudicator::from_parts(
        PipelineConfig::default(),
        ClassIndexMap::new([(0, "Tomato___Healthy")]),
        MetadataStore::default(),
    );
    let value = respond(&adjudicator, &[0.9, 0.05, 0.03, 0.01, 0.01]);
    assert_eq!(value["data"]["predictedClass"], "Tomato___Healthy");
    assert_eq!(value["data"]["crop"], "Tomato");
    assert_eq!(value["data"]["disease"], "Healthy");
    assert_eq!(value["data"]["plantHealth"], "Healthy");

    let value = respond(&adjudicator, &[0.05, 0.06, 0.04]);
    assert_eq!(
        value,
        json!({
            "success": true,
            "status": "invalid_image",
            "message": "Non-agricultural image detected. Please upload a clear photo of a crop leaf, plant, or soil."
        })
    );

    let adjudicator = Adjudicator::from_parts(
        PipelineConfig::default(),
        ClassIndexMap::new([(0, "PlantVillage"), (1, "Unknown"), (2, "Wheat___Rust")]),
        MetadataStore::default(),
    );
    let value = respond(&adjudicator, &[0.3, 0.3, 0.4]);
    assert_eq!(value["data"]["predictedClass"], "Wheat___Rust");
    let value = respond(&adjudicator, &[0.5, 0.45, 0.4]);
    assert_eq!(value["data"]["predictedClass"], "Wheat___Rust");
    assert_eq!(value["data"]["crop"], "Wheat");
    assert_eq!(value["data"]["disease"], "Rust");
}

#[test]
fn test_shared_across_threads() {
    let adjudicator = std::sync::Arc::new(Adjudicator::from_parts(
        PipelineConfig::default(),
        ClassIndexMap::new([(0, "Corn___Northern_Leaf_Blight"), (1, "Corn___healthy")]),
        MetadataStore::default(),
    ));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let adjudicator = adjudicator.clone();
            std::thread::spawn(move || {
                let scores = if i % 2 == 0 { [0.8, 0.2] } else { [0.3, 0.7] };
                respond(&adjudicator, &scores)["data"]["predictedClass"].clone()
            })
        })
        .collect();

    let labels: Vec<Value> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(labels[0], "Corn___Northern_Leaf_Blight");
    assert_eq!(labels[1], "Corn___healthy");
    assert_eq!(labels[0], labels[2]);
}

struct PhosphorusRule;

impl TabularClassifier for PhosphorusRule {
    fn classify(&self, features: &SoilFeatures) -> anyhow::Result<i64> {
        Ok(match features.get("P") {
            Some(p) if p < 5.0 => 2,
            _ => 0,
        })
    }
}

#[test]
fn test_soil_pipeline() {
    for (id, expected) in [(0, "Balanced Soil"), (99, "Class 99")] {
        assert_eq!(map_tabular(id).status, expected);
    }

    let value = serde_json::to_value(adjudicate_soil(
        "270,3.1,500,7.2,0.4,0.8,9.1,0.3,0.9,1.1,7.4,0.8",
        &PhosphorusRule,
    ))
    .unwrap();
    assert_eq!(value["success"], true);
    assert_eq!(value["data"]["predictionClass"], 2);
    assert_eq!(value["data"]["soilType"], "Analysed via ML Model");
    assert!(value["data"]["recommendation"].as_str().unwrap().contains("Muriate of Potash"));

    let value = serde_json::to_value(adjudicate_soil("270,3.1", &PhosphorusRule)).unwrap();
    assert_eq!(value["status"], "model_error");
    assert!(value["error"].as_str().unwrap().contains("expected 12 soil features"));
}

#[test]
fn test_mistyped_record_still_fully_populated() {
    let dir = tempfile::tempdir().unwrap();
    let disease_info = r#"{
        "Tomato___healthy": {
            "crop": "Tomato",
            "disease": "Healthy",
            "days_to_harvest": "90-110",
            "organic_treatment": "Compost tea",
            "tutorial": {"step": 1}
        },
        "Potato___Late_blight": {"crop": "Potato", "disease": "Late Blight"}
    }"#;
    let config = write_artifacts(dir.path(), Some(CLASS_INDICES), Some(disease_info));
    let adjudicator = Adjudicator::new(config).unwrap();

    let value = respond(&adjudicator, &[0.01, 0.02, 0.05, 0.02, 0.05, 0.85]);
    assert_fully_populated(&value);

    let data = &value["data"];
    assert_eq!(data["crop"], "Tomato");
    assert_eq!(data["plantHealth"], "Healthy");
    assert_eq!(data["growthStage"]["daysToHarvest"], "90-110");
    assert!(data["recommendations"]["organicTreatment"].is_array());
    assert_eq!(data["tutorial"], json!([]));

    // Other labels are unaffected by the mistyped record
    let value = respond(&adjudicator, &[0.01, 0.02, 0.05, 0.85, 0.05, 0.02]);
    assert_eq!(value["data"]["disease"], "Late Blight");
}

#[test]
fn test_exact_tie_confidences_round_to_even() {
    let adjudicator = Adjudicator::from_parts(
        PipelineConfig::default(),
        ClassIndexMap::new([(0, "Corn___Northern_Leaf_Blight")]),
        MetadataStore::default(),
    );

    let value = respond(&adjudicator, &[0.40625]);
    assert_eq!(value["data"]["confidence"], json!(0.4062));

    let value = respond(&adjudicator, &[0.8125]);
    assert_eq!(value["data"]["confidence"], json!(0.8125));
    assert_eq!(
        value["data"]["recommendations"]["diagnosis"],
        "ML model detected Northern Leaf Blight in Corn with 81.2% confidence."
    );
}

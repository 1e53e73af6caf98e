//! Lookup Table Loading
//!
//! The two read-only tables shipped next to the classifier weights:
//! - `class_indices.json`: label → output index, inverted here to index → label
//! - `disease_info.json`: label → descriptive disease record
//!
//! Both are loaded once per process and never mutated. A missing file is a
//! degraded mode, not an error; a file that exists but does not parse is.

use anyhow::{Context, Result};
use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Label substituted for any index the map does not know.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Classifier output index → class label
#[derive(Debug, Clone)]
pub struct ClassIndexMap {
    labels: FxHashMap<usize, String>,

    /// Loaded from the classifier's own index file, so its size is the
    /// classifier's class count.
    authoritative: bool,

    /// Index file was missing and the `{0: "Unknown"}` fallback is in use
    degraded: bool,
}

impl ClassIndexMap {
    /// Build a partial, in-memory map. Not length-checked against scores.
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (usize, S)>,
        S: Into<String>,
    {
        Self {
            labels: entries.into_iter().map(|(i, l)| (i, l.into())).collect(),
            authoritative: false,
            degraded: false,
        }
    }

    /// The single-entry map used when no index file is available
    pub fn fallback() -> Self {
        Self {
            degraded: true,
            ..Self::new([(0, UNKNOWN_LABEL)])
        }
    }

    /// Load from a Keras-style `{"label": index, ...}` JSON file.
    ///
    /// Returns the fallback map when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::warn!("Class indices not found at {:?}, using fallback map", path);
            return Ok(Self::fallback());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read class indices: {:?}", path))?;

        let map = Self::from_json(&contents)
            .with_context(|| format!("Failed to parse class indices: {:?}", path))?;

        tracing::info!("Class indices loaded: {} classes", map.len());
        Ok(map)
    }

    /// Parse label → index JSON and invert it.
    ///
    /// Indices must be unique and contiguous from 0.
    pub fn from_json(contents: &str) -> Result<Self> {
        let by_label: HashMap<String, usize> = serde_json::from_str(contents)?;

        let mut labels = FxHashMap::default();
        for (label, index) in by_label {
            if let Some(previous) = labels.insert(index, label.clone()) {
                anyhow::bail!(
                    "Index {} assigned to both '{}' and '{}'",
                    index, previous, label
                );
            }
        }

        if let Some(gap) = (0..labels.len()).find(|i| !labels.contains_key(i)) {
            anyhow::bail!("Class indices are not contiguous: index {} is missing", gap);
        }

        Ok(Self {
            labels,
            authoritative: true,
            degraded: false,
        })
    }

    /// Label for an index, `"Unknown"` when absent
    pub fn label(&self, index: usize) -> &str {
        self.labels
            .get(&index)
            .map(|s| s.as_str())
            .unwrap_or(UNKNOWN_LABEL)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn is_authoritative(&self) -> bool {
        self.authoritative
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }
}

/// A field of the wrong JSON type reads as absent.
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Descriptive record for one class label.
///
/// Every field is optional; the result assembler supplies defaults.
/// Mistyped fields are dropped rather than failing the whole file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DiseaseRecord {
    #[serde(deserialize_with = "lenient")]
    pub crop: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub disease: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub health_status: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub diagnosis: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub chemical_treatment: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient")]
    pub organic_treatment: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient")]
    pub irrigation_advice: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub fertilizer_advice: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub growth_stage: Option<String>,
    /// Number or free text ("90-110"), passed through as written
    pub days_to_harvest: Option<Value>,
    /// Step objects are passed through untouched
    #[serde(deserialize_with = "lenient")]
    pub tutorial: Option<Vec<Value>>,
}

impl DiseaseRecord {
    /// `{}` in the source file; treated exactly like a missing record
    pub fn is_empty(&self) -> bool {
        *self == DiseaseRecord::default()
    }
}

/// Class label → disease record
#[derive(Debug, Clone, Default)]
pub struct MetadataStore {
    records: FxHashMap<String, DiseaseRecord>,
}

impl MetadataStore {
    pub fn new<I, S>(records: I) -> Self
    where
        I: IntoIterator<Item = (S, DiseaseRecord)>,
        S: Into<String>,
    {
        Self {
            records: records.into_iter().map(|(l, r)| (l.into(), r)).collect(),
        }
    }

    /// Load `disease_info.json`. An absent file yields an empty store.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("Disease info not found at {:?}, records will use defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read disease info: {:?}", path))?;

        let raw: FxHashMap<String, Value> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse disease info: {:?}", path))?;

        let mut records = FxHashMap::default();
        for (label, value) in raw {
            match DiseaseRecord::deserialize(value) {
                Ok(record) => {
                    records.insert(label, record);
                }
                Err(e) => tracing::warn!("Ignoring disease record '{}': {}", label, e),
            }
        }

        tracing::info!("Disease info loaded: {} entries", records.len());
        Ok(Self { records })
    }

    /// Record for a label, skipping empty records
    pub fn get(&self, label: &str) -> Option<&DiseaseRecord> {
        self.records.get(label).filter(|r| !r.is_empty())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

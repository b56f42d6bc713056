use crate::error::{LensError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Normative stage durations: stage label -> expected minutes.
///
/// Values are externally supplied, never derived from data. The built-in
/// defaults can be replaced wholesale from a JSON object file. Lookup is by
/// exact stage label; iteration is label-sorted so downstream tables are
/// deterministic regardless of file key order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormativeDurations {
    expected: BTreeMap<String, f64>,
}

impl Default for NormativeDurations {
    fn default() -> Self {
        let mut expected = BTreeMap::new();
        expected.insert("Assembly".to_string(), 30.0);
        expected.insert("Packaging".to_string(), 10.0);
        expected.insert("Delivery".to_string(), 45.0);
        expected.insert("Courier handoff".to_string(), 5.0);
        Self { expected }
    }
}

impl NormativeDurations {
    /// Load an override table from a JSON file of the form
    /// `{"Assembly": 30, "Packaging": 10, ...}`.
    ///
    /// Returns [`LensError::Config`] when any expected duration is negative.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| LensError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let norms: Self = serde_json::from_str(&content)?;
        for (stage, minutes) in &norms.expected {
            if *minutes < 0.0 {
                return Err(LensError::Config(format!(
                    "normative duration for \"{}\" must be non-negative, got {}",
                    stage, minutes
                )));
            }
        }
        Ok(norms)
    }

    /// Expected duration in minutes for `stage`, if the lookup names it.
    pub fn expected(&self, stage: &str) -> Option<f64> {
        self.expected.get(stage).copied()
    }

    /// Label-sorted iteration over (stage, expected minutes).
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.expected.iter().map(|(stage, v)| (stage.as_str(), *v))
    }

    /// Number of stages named by the lookup.
    pub fn len(&self) -> usize {
        self.expected.len()
    }

    /// Whether the lookup names no stages at all.
    pub fn is_empty(&self) -> bool {
        self.expected.is_empty()
    }
}

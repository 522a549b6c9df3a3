use std::fs;
use std::path::Path;

use bizscore_core::{feature_names, FEATURE_WIDTH, VOCABULARY_VERSION};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    #[serde(default)]
    pub vocabulary_version: Option<u32>,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
    pub n_features_in: usize,
    pub model: ModelSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelSpec {
    Linear(LinearSpec),
    TreeEnsemble(TreeEnsembleSpec),
}

impl ModelSpec {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Linear(_) => "linear",
            Self::TreeEnsemble(_) => "tree_ensemble",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearSpec {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Average of leaf values (random forest).
    Mean,
    /// `base_score + learning_rate * sum(leaves)` (gradient boosting).
    Sum,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeEnsembleSpec {
    pub aggregation: Aggregation,
    #[serde(default)]
    pub base_score: f64,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    pub trees: Vec<TreeSpec>,
}

const fn default_learning_rate() -> f64 {
    1.0
}

/// Flat node arrays; a node whose `children_left` is `-1` is a leaf.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeSpec {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<f64>,
}

impl ModelArtifact {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| ModelError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_slice(&bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, ModelError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn display_name(&self) -> &str {
        self.model_name.as_deref().unwrap_or("unnamed")
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(ModelError::UnsupportedFormat {
                found: self.format_version,
                supported: ARTIFACT_FORMAT_VERSION,
            });
        }

        if self.n_features_in != FEATURE_WIDTH {
            return Err(ModelError::WidthMismatch {
                expected: FEATURE_WIDTH,
                found: self.n_features_in,
            });
        }

        if let Some(version) = self.vocabulary_version {
            if version != VOCABULARY_VERSION {
                return Err(ModelError::VocabularyMismatch(format!(
                    "artifact trained on vocabulary v{version}, service ships v{VOCABULARY_VERSION}"
                )));
            }
        }

        if let Some(names) = &self.feature_names {
            check_feature_names(names)?;
        }

        Ok(())
    }
}

fn check_feature_names(names: &[String]) -> Result<(), ModelError> {
    let expected = feature_names();
    if names.len() != expected.len() {
        return Err(ModelError::WidthMismatch {
            expected: expected.len(),
            found: names.len(),
        });
    }
    if let Some((pos, (want, got))) = expected
        .iter()
        .zip(names)
        .enumerate()
        .find(|(_, (want, got))| want != got)
    {
        return Err(ModelError::VocabularyMismatch(format!(
            "feature column {pos} is {got:?}, expected {want:?}"
        )));
    }
    Ok(())
}

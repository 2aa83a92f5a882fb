//! Model bundle persistence
//!
//! The trained classifier and the feature schema it was fit on travel together
//! in one JSON file. The serving process loads it once and never recomputes
//! the schema.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::classifier::{Classifier, ClassifierError, DecisionTree};
use crate::features::{CategoricalGroup, FeatureSchema};
use crate::metrics::EvaluationReport;

/// Current bundle format version
pub const BUNDLE_FORMAT_VERSION: u32 = 1;

/// Bundle load/save errors
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid bundle JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported bundle format {found} (expected {expected})")]
    UnsupportedFormat { found: u32, expected: u32 },

    #[error("Schema has {schema} columns but model expects {model} features")]
    SchemaMismatch { schema: usize, model: usize },

    #[error("Invalid model: {0}")]
    InvalidModel(#[from] ClassifierError),
}

/// What a bundle contains, without the tree itself
#[derive(Debug, Clone, PartialEq)]
pub struct BundleSummary {
    pub format_version: u32,
    pub trained_at: DateTime<Utc>,
    pub feature_count: usize,
    /// Categories seen in training, per group
    pub vocabulary: Vec<(CategoricalGroup, Vec<String>)>,
    pub labels: Vec<String>,
    pub node_count: usize,
    pub leaf_count: usize,
    pub depth: usize,
}

/// Trained model plus the schema it was fit on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelBundle {
    pub format_version: u32,
    pub trained_at: DateTime<Utc>,
    pub schema: FeatureSchema,
    pub model: DecisionTree,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<EvaluationReport>,
}

impl ModelBundle {
    /// Create a bundle, checking that schema and model agree on width
    pub fn new(
        schema: FeatureSchema,
        model: DecisionTree,
        evaluation: Option<EvaluationReport>,
    ) -> Result<Self, ArtifactError> {
        let bundle = Self {
            format_version: BUNDLE_FORMAT_VERSION,
            trained_at: Utc::now(),
            schema,
            model,
            evaluation,
        };
        bundle.validate()?;
        Ok(bundle)
    }

    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.format_version != BUNDLE_FORMAT_VERSION {
            return Err(ArtifactError::UnsupportedFormat {
                found: self.format_version,
                expected: BUNDLE_FORMAT_VERSION,
            });
        }
        if self.schema.len() != self.model.n_features() {
            return Err(ArtifactError::SchemaMismatch {
                schema: self.schema.len(),
                model: self.model.n_features(),
            });
        }
        self.model.validate()?;
        Ok(())
    }

    pub fn summary(&self) -> BundleSummary {
        let vocabulary = CategoricalGroup::ALL
            .iter()
            .map(|&group| {
                let values = self
                    .schema
                    .categories(group)
                    .into_iter()
                    .map(str::to_string)
                    .collect();
                (group, values)
            })
            .collect();

        BundleSummary {
            format_version: self.format_version,
            trained_at: self.trained_at,
            feature_count: self.schema.len(),
            vocabulary,
            labels: self.model.labels().to_vec(),
            node_count: self.model.node_count(),
            leaf_count: self.model.leaf_count(),
            depth: self.model.depth(),
        }
    }

    /// Write the bundle as pretty JSON, creating parent directories
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ArtifactError> {
        let path = path.as_ref();
        let io_err = |source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(io_err)?;

        info!("Saved model bundle to {:?}", path);
        Ok(())
    }

    /// Read and validate a bundle
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ArtifactError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let bundle: ModelBundle = serde_json::from_str(&content)?;
        bundle.validate()?;

        info!(
            "Loaded model bundle from {:?} ({} features, {} labels, trained {})",
            path,
            bundle.schema.len(),
            bundle.model.labels().len(),
            bundle.trained_at
        );
        Ok(bundle)
    }
}

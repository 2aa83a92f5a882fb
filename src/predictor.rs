//! Prediction service
//!
//! Owns the frozen schema and the trained classifier for the lifetime of the
//! process. Both are read-only after construction, so one service instance can
//! be shared across request handlers without locking.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{info, warn};

use crate::artifact::ModelBundle;
use crate::classifier::{Classifier, DecisionTree};
use crate::error::PredictionError;
use crate::features::{encode, CategoricalGroup, EncodedRow, FeatureSchema, RawRecord};
use crate::models::OutOfVocabularyCounts;

enum ModelState<C> {
    Ready { schema: FeatureSchema, classifier: C },
    Unavailable { reason: String },
}

/// Encodes raw records and forwards them to the classifier
pub struct PredictionService<C: Classifier = DecisionTree> {
    state: ModelState<C>,
    stroke_oov: AtomicU64,
    gender_oov: AtomicU64,
    distance_fallbacks: AtomicU64,
}

impl PredictionService<DecisionTree> {
    pub fn from_bundle(bundle: ModelBundle) -> Self {
        Self::new(bundle.schema, bundle.model)
    }

    /// Load a bundle; a load failure yields a service that rejects every request
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match ModelBundle::load(path) {
            Ok(bundle) => {
                info!("Model ready: {:?}", bundle.schema.column_names());
                Self::from_bundle(bundle)
            }
            Err(e) => {
                warn!("Failed to load model from {:?}: {}. Predictions disabled.", path, e);
                Self::unavailable(e.to_string())
            }
        }
    }
}

impl<C: Classifier> PredictionService<C> {
    pub fn new(schema: FeatureSchema, classifier: C) -> Self {
        Self::with_state(ModelState::Ready { schema, classifier })
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::with_state(ModelState::Unavailable {
            reason: reason.into(),
        })
    }

    fn with_state(state: ModelState<C>) -> Self {
        Self {
            state,
            stroke_oov: AtomicU64::new(0),
            gender_oov: AtomicU64::new(0),
            distance_fallbacks: AtomicU64::new(0),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, ModelState::Ready { .. })
    }

    pub fn schema(&self) -> Option<&FeatureSchema> {
        match &self.state {
            ModelState::Ready { schema, .. } => Some(schema),
            ModelState::Unavailable { .. } => None,
        }
    }

    pub fn unavailable_reason(&self) -> Option<&str> {
        match &self.state {
            ModelState::Ready { .. } => None,
            ModelState::Unavailable { reason } => Some(reason.as_str()),
        }
    }

    /// Encode a record against the loaded schema
    pub fn encode(&self, record: &RawRecord) -> Result<EncodedRow, PredictionError> {
        let schema = match &self.state {
            ModelState::Ready { schema, .. } => schema,
            ModelState::Unavailable { reason } => {
                return Err(PredictionError::ModelUnavailable(reason.clone()))
            }
        };

        let row = encode(record, schema);
        self.observe(&row);
        Ok(row)
    }

    /// Predict the winning team for one record
    pub fn predict(&self, record: &RawRecord) -> Result<String, PredictionError> {
        self.predict_encoded(record).map(|(_, team)| team)
    }

    /// Encode once and predict, returning the row the classifier saw
    pub fn predict_encoded(&self, record: &RawRecord) -> Result<(EncodedRow, String), PredictionError> {
        let (schema, classifier) = match &self.state {
            ModelState::Ready { schema, classifier } => (schema, classifier),
            ModelState::Unavailable { reason } => {
                return Err(PredictionError::ModelUnavailable(reason.clone()))
            }
        };

        let row = encode(record, schema);
        self.observe(&row);

        schema
            .check_width(row.as_slice())
            .map_err(|e| PredictionError::InferenceFailure(e.to_string()))?;
        let team = classifier
            .predict_row(row.as_slice())
            .map_err(|e| PredictionError::InferenceFailure(e.to_string()))?;

        Ok((row, team))
    }

    pub fn out_of_vocabulary_counts(&self) -> OutOfVocabularyCounts {
        OutOfVocabularyCounts {
            stroke: self.stroke_oov.load(Ordering::Relaxed),
            gender: self.gender_oov.load(Ordering::Relaxed),
        }
    }

    pub fn distance_fallbacks(&self) -> u64 {
        self.distance_fallbacks.load(Ordering::Relaxed)
    }

    fn observe(&self, row: &EncodedRow) {
        for oov in &row.out_of_vocabulary {
            warn!(
                "Unseen {} category '{}', encoding as all-zero indicators",
                oov.group, oov.value
            );
            let counter = match oov.group {
                CategoricalGroup::Stroke => &self.stroke_oov,
                CategoricalGroup::Gender => &self.gender_oov,
            };
            counter.fetch_add(1, Ordering::Relaxed);
        }
        if row.distance_fallback {
            self.distance_fallbacks.fetch_add(1, Ordering::Relaxed);
        }
    }
}

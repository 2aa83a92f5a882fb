//! Classifier abstraction
//!
//! The prediction service only needs something that maps an encoded row to a
//! team label; training only needs something that fits rows and labels.

pub mod tree;

pub use tree::{DecisionTree, DecisionTreeConfig};

use thiserror::Error;

/// Classifier training and inference errors
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("cannot fit on an empty training set")]
    EmptyTrainingSet,

    #[error("{rows} rows but {labels} labels")]
    LabelCountMismatch { rows: usize, labels: usize },

    #[error("row {row} has {actual} features, expected {expected}")]
    RaggedMatrix {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("model expects {expected} features, got {actual}")]
    FeatureMismatch { expected: usize, actual: usize },

    #[error("corrupt model: {0}")]
    CorruptModel(String),
}

/// A fitted model that predicts one label per feature row
pub trait Classifier: Send + Sync {
    /// Row width the model was fit on
    fn n_features(&self) -> usize;

    /// Known labels, sorted
    fn labels(&self) -> &[String];

    fn predict_row(&self, row: &[f64]) -> Result<String, ClassifierError>;

    fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<String>, ClassifierError> {
        rows.iter().map(|row| self.predict_row(row)).collect()
    }
}

/// Something that fits a [`Classifier`] from a feature matrix
pub trait Trainer {
    type Model: Classifier;

    fn fit(&self, rows: &[Vec<f64>], labels: &[String]) -> Result<Self::Model, ClassifierError>;
}

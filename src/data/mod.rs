//! Results dataset loading and training set preparation

pub mod prepare;
pub mod results;

use polars::prelude::PolarsError;
use thiserror::Error;

// Re-export commonly used types
pub use prepare::{
    prepare_training_set, rank_teams, DropStats, PrepareOptions, PreparedDataset, TrainingExample,
};
pub use results::{load_results, ResultRow};

/// Dataset errors
#[derive(Debug, Error)]
pub enum DataError {
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    #[error("Missing required column '{0}'")]
    MissingColumn(String),

    #[error("No training examples left after filtering")]
    EmptyTrainingSet,
}

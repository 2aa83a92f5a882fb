//! Swim Podium - Olympic swimming winner prediction
//!
//! This library provides:
//! - Distance descriptor parsing and category canonicalization
//! - A versioned feature schema derived from training data and frozen with the model
//! - Serving-time row encoding that reproduces that schema exactly
//! - A deterministic decision tree classifier and the offline training pipeline
//! - The prediction service used by the HTTP API
//!
//! # Example
//!
//! ```no_run
//! use swim_podium::features::RawRecord;
//! use swim_podium::predictor::PredictionService;
//!
//! let service = PredictionService::load("models/swimming_winner_model.json");
//!
//! let record = RawRecord::new()
//!     .with("Year", 2028)
//!     .with("Distance (in meters)", "4x100m")
//!     .with("Stroke", "Freestyle")
//!     .with("Gender", "Women");
//!
//! match service.predict(&record) {
//!     Ok(team) => println!("Predicted winner: {}", team),
//!     Err(e) => eprintln!("{}", e),
//! }
//! ```

pub mod artifact;
pub mod classifier;
pub mod config;
pub mod data;
pub mod error;
pub mod features;
pub mod metrics;
pub mod models;
pub mod predictor;
pub mod training;

// Re-export commonly used types
pub use artifact::{ArtifactError, BundleSummary, ModelBundle};
pub use classifier::{Classifier, DecisionTree, DecisionTreeConfig, Trainer};
pub use error::PredictionError;
pub use features::{encode, EncodedRow, FeatureColumn, FeatureSchema, RawRecord};
pub use models::{ErrorResponse, HealthResponse, PredictResponse};
pub use predictor::PredictionService;
pub use training::{train, train_from_csv, TrainingConfig, TrainingOutcome};

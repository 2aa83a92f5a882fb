use serde::{Deserialize, Serialize};

pub const STATUS_SUCCESS: &str = "success";
pub const STATUS_ERROR: &str = "error";

/// Successful prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    pub status: String,
    pub predicted_team: String,
    pub message: String,
}

impl PredictResponse {
    pub fn new(predicted_team: String) -> Self {
        Self {
            status: STATUS_SUCCESS.to_string(),
            predicted_team,
            message: "Prediction made by the decision tree model.".to_string(),
        }
    }
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: STATUS_ERROR.to_string(),
            message: message.into(),
        }
    }
}

/// Out-of-vocabulary request counts per categorical group
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutOfVocabularyCounts {
    pub stroke: u64,
    pub gender: u64,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub model_loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unavailable_reason: Option<String>,
    pub out_of_vocabulary: OutOfVocabularyCounts,
    pub distance_fallbacks: u64,
}

use thiserror::Error;

/// Errors that cross the prediction service boundary
///
/// Encoding problems never show up here: unparsable distances and unseen
/// categories are absorbed by the encoder's defaults.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PredictionError {
    /// Model bundle failed to load at startup; persists until restart
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),
    /// The classifier rejected the encoded row
    #[error("Inference failed: {0}")]
    InferenceFailure(String),
}

#[cfg(feature = "api")]
mod http {
    use actix_web::{http::StatusCode, HttpResponse, ResponseError};

    use super::PredictionError;
    use crate::models::ErrorResponse;

    impl ResponseError for PredictionError {
        fn status_code(&self) -> StatusCode {
            match self {
                PredictionError::ModelUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
                PredictionError::InferenceFailure(_) => StatusCode::BAD_REQUEST,
            }
        }

        fn error_response(&self) -> HttpResponse {
            HttpResponse::build(self.status_code()).json(ErrorResponse::new(self.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PredictionError::ModelUnavailable("file not found".to_string());
        assert_eq!(err.to_string(), "Model unavailable: file not found");

        let err = PredictionError::InferenceFailure("model expects 11 features, got 9".to_string());
        assert!(err.to_string().contains("11 features"));
    }

    #[cfg(feature = "api")]
    #[test]
    fn test_error_status_codes() {
        use actix_web::{http::StatusCode, ResponseError};

        assert_eq!(
            PredictionError::ModelUnavailable("".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            PredictionError::InferenceFailure("".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }
}

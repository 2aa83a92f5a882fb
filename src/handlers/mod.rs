pub mod health;
pub mod predict;

use actix_web::{error::InternalError, web, HttpResponse};
use swim_podium::models::ErrorResponse;

/// JSON extractor config that reports malformed bodies in the API's error shape
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let body = ErrorResponse::new(format!("Invalid request body: {}", err));
        InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
    })
}

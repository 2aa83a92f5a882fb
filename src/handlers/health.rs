use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;

use crate::AppState;
use swim_podium::models::HealthResponse;

/// Health check endpoint
pub async fn health_check(state: web::Data<Arc<AppState>>) -> impl Responder {
    let service = &state.service;
    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model_loaded: service.is_ready(),
        feature_count: service.schema().map(|s| s.len()),
        unavailable_reason: service.unavailable_reason().map(str::to_string),
        out_of_vocabulary: service.out_of_vocabulary_counts(),
        distance_fallbacks: service.distance_fallbacks(),
    };

    HttpResponse::Ok().json(response)
}

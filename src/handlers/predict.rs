use actix_web::{web, HttpResponse};
use std::sync::Arc;
use tracing::info;

use crate::AppState;
use swim_podium::error::PredictionError;
use swim_podium::features::RawRecord;
use swim_podium::models::PredictResponse;

/// Predict the winning team for one event
pub async fn predict_winner(
    state: web::Data<Arc<AppState>>,
    req: web::Json<RawRecord>,
) -> Result<HttpResponse, PredictionError> {
    let team = state.service.predict(&req)?;
    info!("Predicted {} for {:?}", team, req.into_inner());

    Ok(HttpResponse::Ok().json(PredictResponse::new(team)))
}

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod handlers;

use handlers::{health, json_config, predict};
use swim_podium::config::ServerConfig;
use swim_podium::PredictionService;

/// Application state shared across handlers
pub struct AppState {
    pub service: PredictionService,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::from_env();
    let addr = config.bind_address();

    info!("Loading model bundle from {:?}", config.model_path);
    let service = PredictionService::load(&config.model_path);
    if service.is_ready() {
        info!("Model bundle loaded");
    }

    let app_state = Arc::new(AppState { service });

    info!("Starting Swim Podium API server at http://{}", addr);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(json_config())
            .wrap(Cors::permissive())
            .wrap(middleware::Logger::default())
            .route("/health", web::get().to(health::health_check))
            .route("/predict_winner", web::post().to(predict::predict_winner))
    })
    .bind(&addr)?
    .run()
    .await
}

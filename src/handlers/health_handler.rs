//! handlers/health_handler.rs
use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde_json::json;

use crate::config::app_config::AppConfig;

pub const API_NAME: &str = "Detector de Boletos Falsos API";

/// GET /
pub async fn root_endpoint(config: web::Data<AppConfig>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "message": API_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "status": "online",
        "features": [
            "Autenticação JWT",
            format!("Acesso rápido ({} análises/dia)", config.anon_daily_limit),
            "Análises ilimitadas para usuários autenticados",
            "Histórico de análises"
        ]
    }))
}

/// GET /health
pub async fn health_endpoint(config: web::Data<AppConfig>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "environment": config.environment
    }))
}

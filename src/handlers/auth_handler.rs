//! handlers/auth_handler.rs
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use serde_json::json;

use crate::config::app_config::AppConfig;
use crate::errors::ApiError;
use crate::middleware::{auth_middleware::RequiredAuth, client_ip::client_ip};
use crate::models::{
    access_model::QuickAccessResponse,
    user_model::{LoginRequest, RegisterRequest, TokenResponse},
};
use crate::services::{
    access_service::AccessService, token_service::TokenService, user_service::UserService,
};

/// POST /auth/register
pub async fn register_endpoint(
    users: web::Data<UserService>,
    tokens: web::Data<TokenService>,
    body: web::Json<RegisterRequest>,
) -> Result<HttpResponse, ApiError> {
    let user = users.register(&body).await?;
    let token = tokens.issue(&user.id);
    Ok(HttpResponse::Created().json(TokenResponse::bearer(token, user)))
}

/// POST /auth/login
pub async fn login_endpoint(
    users: web::Data<UserService>,
    tokens: web::Data<TokenService>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let user = users.login(&body).await?;
    let token = tokens.issue(&user.id);
    Ok(HttpResponse::Ok().json(TokenResponse::bearer(token, user)))
}

/// GET /auth/me
pub async fn me_endpoint(
    users: web::Data<UserService>,
    auth: RequiredAuth,
) -> Result<HttpResponse, ApiError> {
    let user = users
        .get_user(auth.user_id())
        .await
        .map_err(|e| ApiError::internal("Erro ao buscar dados do usuário", format!("{:#}", e)))?
        .ok_or_else(|| ApiError::NotFound("Usuário não encontrado".into()))?;
    Ok(HttpResponse::Ok().json(user))
}

/// POST /auth/quick-access
/// Ante un error de base se permite el acceso.
pub async fn quick_access_endpoint(
    req: HttpRequest,
    access: web::Data<AccessService>,
    config: web::Data<AppConfig>,
) -> HttpResponse {
    let ip = client_ip(&req, config.trust_proxy_headers);
    let response = match access.check(&ip, Utc::now()).await {
        Ok(response) => response,
        Err(e) => {
            log::error!("Error al verificar acceso anónimo: {:#}", e);
            QuickAccessResponse {
                allowed: true,
                remaining: access.daily_limit(),
                message: "Acesso liberado".to_string(),
            }
        }
    };
    HttpResponse::Ok().json(response)
}

/// POST /auth/quick-access/register
pub async fn quick_access_register_endpoint(
    req: HttpRequest,
    access: web::Data<AccessService>,
    config: web::Data<AppConfig>,
) -> HttpResponse {
    let ip = client_ip(&req, config.trust_proxy_headers);
    let success = match access.record(&ip, Utc::now()).await {
        Ok(()) => true,
        Err(e) => {
            log::error!("Error al registrar análisis anónimo: {:#}", e);
            false
        }
    };
    HttpResponse::Ok().json(json!({ "success": success }))
}

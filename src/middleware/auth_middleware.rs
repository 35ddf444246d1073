//! middleware/auth_middleware.rs
//! Autenticación por token Bearer como extractores de actix.

use std::future::{ready, Ready};

use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};

use crate::errors::ApiError;
use crate::models::user_model::Claims;
use crate::services::token_service::TokenService;

/// Usuario autenticado si hay un token válido; si no, anónimo.
#[derive(Debug, Clone)]
pub struct OptionalAuth(pub Option<Claims>);

impl OptionalAuth {
    pub fn user_id(&self) -> Option<&str> {
        self.0.as_ref().map(|claims| claims.sub.as_str())
    }
}

/// Exige un token válido; responde 401 en cualquier otro caso.
#[derive(Debug, Clone)]
pub struct RequiredAuth(pub Claims);

impl RequiredAuth {
    pub fn user_id(&self) -> &str {
        &self.0.sub
    }
}

fn authenticate(req: &HttpRequest) -> Result<Claims, ApiError> {
    let tokens = req
        .app_data::<web::Data<TokenService>>()
        .ok_or_else(|| ApiError::Internal("TokenService no configurado".into()))?;

    let raw = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or_else(|| ApiError::Unauthorized("Token de autenticação não fornecido".into()))?
        .to_str()
        .map_err(|_| ApiError::Unauthorized("Formato de token inválido".into()))?;

    let token = match raw.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => token.trim(),
        _ => {
            return Err(ApiError::Unauthorized(
                "Formato de autenticação inválido".into(),
            ))
        }
    };

    let claims = tokens.verify(token).map_err(|e| {
        log::warn!("Token rechazado: {}", e);
        ApiError::Unauthorized("Token inválido ou expirado".into())
    })?;

    if claims.sub.is_empty() {
        return Err(ApiError::Unauthorized("Token inválido".into()));
    }
    Ok(claims)
}

impl FromRequest for OptionalAuth {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        if !req.headers().contains_key(header::AUTHORIZATION) {
            return ready(Ok(OptionalAuth(None)));
        }
        ready(Ok(OptionalAuth(authenticate(req).ok())))
    }
}

impl FromRequest for RequiredAuth {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(authenticate(req).map(RequiredAuth))
    }
}

//! errors.rs
//! Errores de la capa HTTP. Cada variante sabe su código de estado.

use actix_web::{
    http::{header, StatusCode},
    HttpResponse, ResponseError,
};
use serde_json::json;
use thiserror::Error;

use crate::services::{access_service::QuotaError, user_service::AuthError};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Registra el error real y devuelve un 500 con un mensaje para el cliente.
    pub fn internal(public_message: &str, err: impl std::fmt::Display) -> Self {
        log::error!("{}: {}", public_message, err);
        ApiError::Internal(format!("{}: {}", public_message, err))
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        if let ApiError::Unauthorized(_) = self {
            builder.insert_header((header::WWW_AUTHENTICATE, "Bearer"));
        }
        builder.json(json!({ "detail": self.to_string() }))
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Invalid(message) => ApiError::BadRequest(message),
            AuthError::EmailTaken => ApiError::BadRequest(err.to_string()),
            AuthError::InvalidCredentials => ApiError::Unauthorized(err.to_string()),
            AuthError::Internal(e) => ApiError::internal("Erro interno", format!("{:#}", e)),
        }
    }
}

impl From<QuotaError> for ApiError {
    fn from(err: QuotaError) -> Self {
        match err {
            QuotaError::LimitReached => ApiError::Forbidden(err.to_string()),
            QuotaError::Internal(e) => {
                ApiError::internal("Erro ao verificar acesso", format!("{:#}", e))
            }
        }
    }
}

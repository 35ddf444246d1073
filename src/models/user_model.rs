//! models/user_model.rs
//! Usuarios, credenciales y tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PLAN: &str = "gratuito";

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    #[serde(rename = "nome")]
    pub name: String,
    pub email: String,
    #[serde(rename = "senha")]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    #[serde(rename = "senha")]
    pub password: String,
}

/// Fila de la tabla `users`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: String,
    pub analyses_count: i64,
    pub plan: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserResponse {
    pub id: String,
    #[serde(rename = "nome")]
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "analises_realizadas")]
    pub analyses_count: i64,
    #[serde(rename = "plano")]
    pub plan: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: UserResponse,
}

impl TokenResponse {
    pub fn bearer(access_token: String, user: UserResponse) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
            user,
        }
    }
}

/// Claims del JWT
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

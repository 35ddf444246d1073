//! models/access_model.rs
//! Control de acceso anónimo (cuota diaria por IP).

use serde::Serialize;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AnonymousAccess {
    pub analyses_today: i64,
    pub last_analysis: Option<String>,
}

/// Respuesta de `POST /auth/quick-access`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuickAccessResponse {
    #[serde(rename = "permitido")]
    pub allowed: bool,
    #[serde(rename = "analises_restantes")]
    pub remaining: u32,
    #[serde(rename = "mensagem")]
    pub message: String,
}

//! models/job_model.rs
//! Trabajo encolado para el worker.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPayload {
    #[serde(rename = "analise_id")]
    pub analysis_id: String,
    #[serde(
        rename = "file_base64",
        serialize_with = "serialize_base64",
        deserialize_with = "deserialize_base64"
    )]
    pub file: Vec<u8>,
    pub file_type: String,
    pub user_id: Option<String>,
    pub is_authenticated: bool,
}

fn serialize_base64<S>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&STANDARD.encode(data))
}

fn deserialize_base64<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    STANDARD.decode(s).map_err(serde::de::Error::custom)
}

/// Trabajo reclamado de la cola
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct QueuedJob {
    pub id: i64,
    pub analysis_id: String,
    pub payload: String,
}

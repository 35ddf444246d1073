//! services/analysis_service.rs
//! Persistencia de los análisis (tabla `analyses`).

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use serde::de::DeserializeOwned;
use sqlx::{Pool, Sqlite};
use uuid::Uuid;

use crate::database::{parse_timestamp, timestamp};
use crate::models::analysis_model::{
    AnalysisRecord, AnalysisStatus, CompletedAnalysis, NewAnalysis,
};

const SELECT_COLUMNS: &str = r#"
    SELECT id, status, uploaded_at, file_type, file_size, file_name,
           is_authenticated, user_id, ip_address, processed_at, processing_time,
           extracted_data, validation, prediction, fraud_analysis,
           error_message, failed_at
    FROM analyses
"#;

#[derive(Clone, Debug)]
pub struct AnalysisService {
    db_pool: Pool<Sqlite>,
}

/// Fila cruda de `analyses`; los documentos JSON vienen como texto
#[derive(Debug, sqlx::FromRow)]
struct AnalysisRow {
    id: String,
    status: String,
    uploaded_at: String,
    file_type: String,
    file_size: i64,
    file_name: Option<String>,
    is_authenticated: i64,
    user_id: Option<String>,
    ip_address: Option<String>,
    processed_at: Option<String>,
    processing_time: Option<f64>,
    extracted_data: Option<String>,
    validation: Option<String>,
    prediction: Option<String>,
    fraud_analysis: Option<String>,
    error_message: Option<String>,
    failed_at: Option<String>,
}

fn parse_json<T: DeserializeOwned>(raw: Option<String>, column: &str) -> Result<Option<T>> {
    raw.map(|text| {
        serde_json::from_str(&text)
            .with_context(|| format!("JSON inválido en la columna {}", column))
    })
    .transpose()
}

impl TryFrom<AnalysisRow> for AnalysisRecord {
    type Error = anyhow::Error;

    fn try_from(row: AnalysisRow) -> Result<Self> {
        Ok(AnalysisRecord {
            status: AnalysisStatus::parse(&row.status)
                .ok_or_else(|| anyhow!("Estado desconocido: {}", row.status))?,
            uploaded_at: parse_timestamp(&row.uploaded_at)?,
            processed_at: row.processed_at.as_deref().map(parse_timestamp).transpose()?,
            failed_at: row.failed_at.as_deref().map(parse_timestamp).transpose()?,
            extracted: parse_json(row.extracted_data, "extracted_data")?,
            validation: parse_json(row.validation, "validation")?,
            prediction: parse_json(row.prediction, "prediction")?,
            verdict: parse_json(row.fraud_analysis, "fraud_analysis")?,
            id: row.id,
            file_type: row.file_type,
            file_size: row.file_size,
            file_name: row.file_name,
            is_authenticated: row.is_authenticated != 0,
            user_id: row.user_id,
            ip_address: row.ip_address,
            processing_time: row.processing_time,
            error_message: row.error_message,
        })
    }
}

impl AnalysisService {
    pub fn new(db_pool: Pool<Sqlite>) -> Self {
        AnalysisService { db_pool }
    }

    /// Crea el análisis en estado "processing" y devuelve su id.
    pub async fn create_analysis(&self, new: &NewAnalysis) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let now = timestamp(Utc::now());

        sqlx::query(
            r#"
            INSERT INTO analyses (
                id, status, uploaded_at, file_type, file_size, file_name,
                is_authenticated, user_id, ip_address
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&id)
        .bind(AnalysisStatus::Processing.as_str())
        .bind(&now)
        .bind(&new.file_type)
        .bind(new.file_size)
        .bind(&new.file_name)
        .bind(new.user_id.is_some() as i64)
        .bind(&new.user_id)
        .bind(&new.ip_address)
        .execute(&self.db_pool)
        .await
        .context("Fallo al insertar análisis")?;

        log::info!("Análisis {} creado ({})", id, new.file_type);
        Ok(id)
    }

    pub async fn mark_processing(&self, id: &str) -> Result<()> {
        sqlx::query("UPDATE analyses SET status = ?2 WHERE id = ?1")
            .bind(id)
            .bind(AnalysisStatus::Processing.as_str())
            .execute(&self.db_pool)
            .await
            .context("Fallo al actualizar análisis")?;
        Ok(())
    }

    pub async fn mark_completed(&self, id: &str, result: &CompletedAnalysis) -> Result<()> {
        let to_json = |value: serde_json::Result<String>| value.context("Fallo al serializar");

        sqlx::query(
            r#"
            UPDATE analyses
            SET status = ?2,
                processed_at = ?3,
                processing_time = ?4,
                extracted_data = ?5,
                validation = ?6,
                prediction = ?7,
                fraud_analysis = ?8,
                error_message = NULL,
                failed_at = NULL
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(AnalysisStatus::Completed.as_str())
        .bind(timestamp(Utc::now()))
        .bind(result.processing_time)
        .bind(to_json(serde_json::to_string(&result.extracted))?)
        .bind(to_json(serde_json::to_string(&result.validation))?)
        .bind(to_json(serde_json::to_string(&result.prediction))?)
        .bind(to_json(serde_json::to_string(&result.verdict))?)
        .execute(&self.db_pool)
        .await
        .context("Fallo al guardar resultado del análisis")?;

        Ok(())
    }

    pub async fn mark_failed(&self, id: &str, error_message: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE analyses
            SET status = ?2, error_message = ?3, failed_at = ?4
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(AnalysisStatus::Failed.as_str())
        .bind(error_message)
        .bind(timestamp(Utc::now()))
        .execute(&self.db_pool)
        .await
        .context("Fallo al marcar análisis como fallido")?;

        Ok(())
    }

    pub async fn get_analysis(&self, id: &str) -> Result<Option<AnalysisRecord>> {
        let row: Option<AnalysisRow> =
            sqlx::query_as(&format!("{} WHERE id = ?1", SELECT_COLUMNS))
                .bind(id)
                .fetch_optional(&self.db_pool)
                .await
                .context("Fallo al consultar análisis")?;

        row.map(AnalysisRecord::try_from).transpose()
    }

    /// Historial del usuario, del más reciente al más antiguo.
    pub async fn list_by_user(
        &self,
        user_id: &str,
        limit: i64,
        skip: i64,
    ) -> Result<Vec<AnalysisRecord>> {
        let rows: Vec<AnalysisRow> = sqlx::query_as(&format!(
            "{} WHERE user_id = ?1 ORDER BY uploaded_at DESC, rowid DESC LIMIT ?2 OFFSET ?3",
            SELECT_COLUMNS
        ))
        .bind(user_id)
        .bind(limit)
        .bind(skip)
        .fetch_all(&self.db_pool)
        .await
        .context("Fallo al listar análisis")?;

        rows.into_iter().map(AnalysisRecord::try_from).collect()
    }

    pub async fn count_by_user(&self, user_id: &str) -> Result<i64> {
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM analyses WHERE user_id = ?1")
            .bind(user_id)
            .fetch_one(&self.db_pool)
            .await
            .context("Fallo al contar análisis")?;
        Ok(total)
    }
}

//! services/queue_service.rs
//! Cola de trabajos persistida en la tabla `jobs`.

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{Pool, Sqlite};
use tokio::sync::Notify;

use crate::database::timestamp;
use crate::models::job_model::{JobPayload, QueuedJob};

#[derive(Clone, Debug)]
pub struct JobQueue {
    db_pool: Pool<Sqlite>,
    notify: Arc<Notify>,
}

impl JobQueue {
    pub fn new(db_pool: Pool<Sqlite>) -> Self {
        JobQueue {
            db_pool,
            notify: Arc::new(Notify::new()),
        }
    }

    pub async fn enqueue(&self, payload: &JobPayload) -> Result<i64> {
        let body = serde_json::to_string(payload).context("Fallo al serializar trabajo")?;

        let result = sqlx::query(
            r#"
            INSERT INTO jobs (analysis_id, payload, status, enqueued_at)
            VALUES (?1, ?2, 'queued', ?3)
            "#,
        )
        .bind(&payload.analysis_id)
        .bind(body)
        .bind(timestamp(Utc::now()))
        .execute(&self.db_pool)
        .await
        .context("Fallo al encolar trabajo")?;

        let job_id = result.last_insert_rowid();
        log::info!(
            "Trabajo {} encolado para análisis {}",
            job_id,
            payload.analysis_id
        );
        self.notify.notify_one();
        Ok(job_id)
    }

    /// Toma el trabajo más antiguo en cola y lo pasa a "running".
    pub async fn claim_next(&self) -> Result<Option<QueuedJob>> {
        sqlx::query_as(
            r#"
            UPDATE jobs
            SET status = 'running', started_at = ?1
            WHERE id = (
                SELECT id FROM jobs WHERE status = 'queued' ORDER BY id LIMIT 1
            )
            RETURNING id, analysis_id, payload
            "#,
        )
        .bind(timestamp(Utc::now()))
        .fetch_optional(&self.db_pool)
        .await
        .context("Fallo al reclamar trabajo")
    }

    pub async fn complete(&self, job_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM jobs WHERE id = ?1")
            .bind(job_id)
            .execute(&self.db_pool)
            .await
            .context("Fallo al borrar trabajo")?;
        Ok(())
    }

    /// Al arrancar, lo que quedó "running" de una ejecución anterior vuelve a la cola.
    pub async fn requeue_stale(&self) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE jobs SET status = 'queued', started_at = NULL WHERE status = 'running'",
        )
        .execute(&self.db_pool)
        .await
        .context("Fallo al reencolar trabajos")?;

        let count = result.rows_affected();
        if count > 0 {
            log::warn!("{} trabajos interrumpidos vuelven a la cola", count);
        }
        Ok(count)
    }

    pub async fn pending(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM jobs WHERE status = 'queued'")
            .fetch_one(&self.db_pool)
            .await
            .context("Fallo al contar trabajos")?;
        Ok(count)
    }

    /// Espera un aviso de `enqueue` o, como mucho, `poll_interval`.
    pub async fn wait_for_work(&self, poll_interval: Duration) {
        let _ = tokio::time::timeout(poll_interval, self.notify.notified()).await;
    }
}

//! services/access_service.rs
//! Cuota diaria de análisis anónimos por IP. El día es el día UTC.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{Pool, Sqlite};
use thiserror::Error;

use crate::database::timestamp;
use crate::models::access_model::{AnonymousAccess, QuickAccessResponse};

pub const LIMIT_REACHED_MESSAGE: &str =
    "Limite diário atingido. Faça login para análises ilimitadas!";

#[derive(Debug, Error)]
pub enum QuotaError {
    #[error("{}", LIMIT_REACHED_MESSAGE)]
    LimitReached,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Clone, Debug)]
pub struct AccessService {
    db_pool: Pool<Sqlite>,
    daily_limit: u32,
}

/// "2025-01-31T12:00:00.000Z" -> "2025-01-31"
fn day_key(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d").to_string()
}

fn same_day(last_analysis: Option<&str>, today: &str) -> bool {
    last_analysis.and_then(|raw| raw.get(..10)) == Some(today)
}

impl AccessService {
    pub fn new(db_pool: Pool<Sqlite>, daily_limit: u32) -> Self {
        AccessService {
            db_pool,
            daily_limit,
        }
    }

    pub fn daily_limit(&self) -> u32 {
        self.daily_limit
    }

    /// Consulta la cuota sin consumirla. Registra la IP en la primera visita
    /// y reinicia el contador si cambió el día.
    pub async fn check(&self, ip: &str, now: DateTime<Utc>) -> Result<QuickAccessResponse> {
        let today = day_key(now);

        let access = match self.find(ip).await? {
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO anonymous_access (ip_address, analyses_today, last_analysis, registered_at)
                    VALUES (?1, 0, NULL, ?2)
                    ON CONFLICT(ip_address) DO NOTHING
                    "#,
                )
                .bind(ip)
                .bind(timestamp(now))
                .execute(&self.db_pool)
                .await
                .context("Fallo al registrar acceso anónimo")?;

                log::info!("Nuevo acceso anónimo: {}", ip);
                return Ok(QuickAccessResponse {
                    allowed: self.daily_limit > 0,
                    remaining: self.daily_limit,
                    message: format!(
                        "Bem-vindo! Você tem {} análises gratuitas hoje.",
                        self.daily_limit
                    ),
                });
            }
            Some(access) => access,
        };

        if access.last_analysis.is_some() && !same_day(access.last_analysis.as_deref(), &today) {
            sqlx::query("UPDATE anonymous_access SET analyses_today = 0 WHERE ip_address = ?1")
                .bind(ip)
                .execute(&self.db_pool)
                .await
                .context("Fallo al reiniciar contador anónimo")?;

            return Ok(QuickAccessResponse {
                allowed: self.daily_limit > 0,
                remaining: self.daily_limit,
                message: format!(
                    "Novo dia! Você tem {} análises gratuitas hoje.",
                    self.daily_limit
                ),
            });
        }

        let remaining = self.remaining_for(access.analyses_today);
        if remaining == 0 {
            return Ok(QuickAccessResponse {
                allowed: false,
                remaining: 0,
                message: LIMIT_REACHED_MESSAGE.to_string(),
            });
        }

        Ok(QuickAccessResponse {
            allowed: true,
            remaining,
            message: format!(
                "Você ainda tem {} análise(s) gratuita(s) hoje.",
                remaining
            ),
        })
    }

    /// Consume una análisis de la cuota en una sola sentencia. Devuelve las
    /// que quedan, o `LimitReached` si ya no hay.
    pub async fn try_consume(&self, ip: &str, now: DateTime<Utc>) -> Result<u32, QuotaError> {
        if self.daily_limit == 0 {
            return Err(QuotaError::LimitReached);
        }

        let today = day_key(now);
        let row: Option<(i64,)> = sqlx::query_as(
            r#"
            INSERT INTO anonymous_access (ip_address, analyses_today, last_analysis, registered_at)
            VALUES (?1, 1, ?2, ?2)
            ON CONFLICT(ip_address) DO UPDATE SET
                analyses_today = CASE
                    WHEN substr(COALESCE(anonymous_access.last_analysis, ''), 1, 10) = ?3
                    THEN anonymous_access.analyses_today + 1
                    ELSE 1
                END,
                last_analysis = ?2
            WHERE substr(COALESCE(anonymous_access.last_analysis, ''), 1, 10) <> ?3
               OR anonymous_access.analyses_today < ?4
            RETURNING analyses_today
            "#,
        )
        .bind(ip)
        .bind(timestamp(now))
        .bind(&today)
        .bind(i64::from(self.daily_limit))
        .fetch_optional(&self.db_pool)
        .await
        .context("Fallo al consumir cuota anónima")?;

        match row {
            Some((used,)) => {
                let remaining = self.remaining_for(used);
                log::info!("Acceso anónimo {}: quedan {} análisis", ip, remaining);
                Ok(remaining)
            }
            None => {
                log::warn!("Acceso anónimo {}: límite diario alcanzado", ip);
                Err(QuotaError::LimitReached)
            }
        }
    }

    /// Incrementa el contador sin comprobar el límite.
    pub async fn record(&self, ip: &str, now: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO anonymous_access (ip_address, analyses_today, last_analysis, registered_at)
            VALUES (?1, 1, ?2, ?2)
            ON CONFLICT(ip_address) DO UPDATE SET
                analyses_today = CASE
                    WHEN substr(COALESCE(anonymous_access.last_analysis, ''), 1, 10) = ?3
                    THEN anonymous_access.analyses_today + 1
                    ELSE 1
                END,
                last_analysis = ?2
            "#,
        )
        .bind(ip)
        .bind(timestamp(now))
        .bind(day_key(now))
        .execute(&self.db_pool)
        .await
        .context("Fallo al registrar análisis anónimo")?;
        Ok(())
    }

    pub async fn remaining(&self, ip: &str, now: DateTime<Utc>) -> Result<u32> {
        let today = day_key(now);
        Ok(match self.find(ip).await? {
            Some(access) if same_day(access.last_analysis.as_deref(), &today) => {
                self.remaining_for(access.analyses_today)
            }
            _ => self.daily_limit,
        })
    }

    fn remaining_for(&self, used: i64) -> u32 {
        let used = u32::try_from(used.max(0)).unwrap_or(u32::MAX);
        self.daily_limit.saturating_sub(used)
    }

    async fn find(&self, ip: &str) -> Result<Option<AnonymousAccess>> {
        sqlx::query_as(
            r#"
            SELECT analyses_today, last_analysis
            FROM anonymous_access
            WHERE ip_address = ?1
            "#,
        )
        .bind(ip)
        .fetch_optional(&self.db_pool)
        .await
        .context("Fallo al consultar acceso anónimo")
    }
}

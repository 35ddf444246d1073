//! config/app_config.rs
//! Configuración global leída de variables de entorno (y de `.env`, vía dotenv).

use std::{ops::RangeInclusive, path::PathBuf, str::FromStr, time::Duration};

use anyhow::{anyhow, bail, Result};

/// Solo para desarrollo local. En producción JWT_SECRET es obligatorio.
const DEV_JWT_SECRET: &str = "dev-only-secret-change-me";
const PRODUCTION: &str = "production";
/// Un año
const MAX_JWT_EXPIRE_MINUTES: i64 = 60 * 24 * 365;
const MAX_INTERVAL_SECS: u64 = 3600;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub api_host: String,
    pub api_port: u16,
    pub environment: String,
    pub allowed_origins: Vec<String>,
    pub jwt_secret: String,
    pub jwt_expire_minutes: i64,
    pub bcrypt_cost: u32,
    /// None = buscar `tesseract` en el PATH
    pub tesseract_path: Option<PathBuf>,
    pub ocr_language: String,
    pub ocr_timeout: Duration,
    pub model_path: PathBuf,
    pub worker_concurrency: usize,
    pub worker_poll_interval: Duration,
    pub anon_daily_limit: u32,
    pub max_upload_bytes: usize,
    /// Tomar la IP del cliente de X-Forwarded-For (detrás de un proxy)
    pub trust_proxy_headers: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            database_url: "sqlite://data/boletos.db".to_string(),
            api_host: "0.0.0.0".to_string(),
            api_port: 8000,
            environment: "development".to_string(),
            allowed_origins: vec![
                "http://localhost:8100".to_string(),
                "http://localhost:4200".to_string(),
                "https://detectabb.netlify.app".to_string(),
            ],
            jwt_secret: DEV_JWT_SECRET.to_string(),
            jwt_expire_minutes: 60 * 24 * 7,
            bcrypt_cost: 12,
            tesseract_path: None,
            ocr_language: "por".to_string(),
            ocr_timeout: Duration::from_secs(120),
            model_path: PathBuf::from("models/fraud_model.json"),
            worker_concurrency: 4,
            worker_poll_interval: Duration::from_secs(5),
            anon_daily_limit: 2,
            max_upload_bytes: 10 * 1024 * 1024,
            trust_proxy_headers: false,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Construye la configuración a partir de una función de búsqueda,
    /// así los tests no tocan el entorno del proceso.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AppConfig::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = get("ENVIRONMENT").unwrap_or(defaults.environment);
        let jwt_secret = match get("JWT_SECRET") {
            Some(secret) => secret,
            None if environment == PRODUCTION => {
                bail!("JWT_SECRET es obligatorio cuando ENVIRONMENT=production")
            }
            None => {
                log::warn!("JWT_SECRET no definido, usando secreto de desarrollo");
                defaults.jwt_secret
            }
        };

        let allowed_origins = match get("ALLOWED_ORIGINS") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect(),
            None => defaults.allowed_origins,
        };

        let bcrypt_cost = parse_in_range(&get, "BCRYPT_COST", defaults.bcrypt_cost, 4..=31)?;
        let worker_concurrency = parse_in_range(
            &get,
            "WORKER_CONCURRENCY",
            defaults.worker_concurrency,
            1..=usize::MAX,
        )?;
        let jwt_expire_minutes = parse_in_range(
            &get,
            "JWT_EXPIRE_MINUTES",
            defaults.jwt_expire_minutes,
            1..=MAX_JWT_EXPIRE_MINUTES,
        )?;
        let ocr_timeout_secs = parse_in_range(
            &get,
            "OCR_TIMEOUT_SECS",
            defaults.ocr_timeout.as_secs(),
            1..=MAX_INTERVAL_SECS,
        )?;
        let worker_poll_secs = parse_in_range(
            &get,
            "WORKER_POLL_SECS",
            defaults.worker_poll_interval.as_secs(),
            1..=MAX_INTERVAL_SECS,
        )?;

        Ok(AppConfig {
            database_url: get("DATABASE_URL").unwrap_or(defaults.database_url),
            api_host: get("API_HOST").unwrap_or(defaults.api_host),
            api_port: parse_or(&get, "API_PORT", defaults.api_port)?,
            environment,
            allowed_origins,
            jwt_secret,
            jwt_expire_minutes,
            bcrypt_cost,
            tesseract_path: get("TESSERACT_PATH").map(PathBuf::from),
            ocr_language: get("OCR_LANGUAGE").unwrap_or(defaults.ocr_language),
            ocr_timeout: Duration::from_secs(ocr_timeout_secs),
            model_path: get("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_path),
            worker_concurrency,
            worker_poll_interval: Duration::from_secs(worker_poll_secs),
            anon_daily_limit: parse_or(&get, "ANON_DAILY_LIMIT", defaults.anon_daily_limit)?,
            max_upload_bytes: parse_or(&get, "MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
            trust_proxy_headers: parse_or(
                &get,
                "TRUST_PROXY_HEADERS",
                defaults.trust_proxy_headers,
            )?,
        })
    }
}

/// Como `parse_or`, pero fuera de `range` es un error que nombra la variable.
fn parse_in_range<T, G>(get: &G, key: &str, default: T, range: RangeInclusive<T>) -> Result<T>
where
    T: FromStr + PartialOrd + std::fmt::Display,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    let value = parse_or(get, key, default)?;
    if !range.contains(&value) {
        bail!(
            "{} debe estar entre {} y {} (recibido {})",
            key,
            range.start(),
            range.end(),
            value
        );
    }
    Ok(value)
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("Valor inválido para {}: {:?} ({})", key, raw, e)),
        None => Ok(default),
    }
}

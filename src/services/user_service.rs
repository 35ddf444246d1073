//! services/user_service.rs
//! Registro, login y consulta de usuarios.

use std::sync::OnceLock;

use anyhow::{Context, Result};
use chrono::Utc;
use regex::Regex;
use sqlx::{Pool, Sqlite};
use thiserror::Error;
use uuid::Uuid;

use crate::database::{parse_timestamp, timestamp};
use crate::models::user_model::{
    LoginRequest, RegisterRequest, UserRecord, UserResponse, DEFAULT_PLAN,
};

const SPECIAL_CHARS: &str = "!@#$%^&*(),.?\":{}|<>";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Invalid(String),
    #[error("Email já cadastrado")]
    EmailTaken,
    #[error("Email ou senha incorretos")]
    InvalidCredentials,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Clone, Debug)]
pub struct UserService {
    db_pool: Pool<Sqlite>,
    bcrypt_cost: u32,
}

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("patrón de email inválido")
    })
}

/// Normaliza y valida los datos de registro. Devuelve (nombre, email).
pub fn validate_registration(req: &RegisterRequest) -> Result<(String, String), AuthError> {
    let name = req.name.trim();
    let name_len = name.chars().count();
    if name_len == 0 {
        return Err(AuthError::Invalid("Nome não pode estar vazio".into()));
    }
    if name_len < 3 {
        return Err(AuthError::Invalid(
            "Nome deve ter no mínimo 3 caracteres".into(),
        ));
    }
    if name_len > 100 {
        return Err(AuthError::Invalid(
            "Nome deve ter no máximo 100 caracteres".into(),
        ));
    }

    let email = req.email.trim().to_lowercase();
    if !email_re().is_match(&email) {
        return Err(AuthError::Invalid("Email inválido".into()));
    }

    validate_password(&req.password)?;
    Ok((name.to_string(), email))
}

pub fn validate_password(password: &str) -> Result<(), AuthError> {
    let rules: [(bool, &str); 5] = [
        (
            password.chars().count() >= 8,
            "Senha deve ter no mínimo 8 caracteres",
        ),
        (
            password.chars().any(|c| c.is_ascii_uppercase()),
            "Senha deve conter pelo menos uma letra maiúscula",
        ),
        (
            password.chars().any(|c| c.is_ascii_lowercase()),
            "Senha deve conter pelo menos uma letra minúscula",
        ),
        (
            password.chars().any(|c| c.is_ascii_digit()),
            "Senha deve conter pelo menos um número",
        ),
        (
            password.chars().any(|c| SPECIAL_CHARS.contains(c)),
            "Senha deve conter pelo menos um caractere especial",
        ),
    ];

    match rules.iter().find(|(ok, _)| !ok) {
        Some((_, message)) => Err(AuthError::Invalid(message.to_string())),
        None => Ok(()),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map_or(false, |db_err| db_err.is_unique_violation())
}

impl TryFrom<UserRecord> for UserResponse {
    type Error = anyhow::Error;

    fn try_from(record: UserRecord) -> Result<Self> {
        Ok(UserResponse {
            created_at: parse_timestamp(&record.created_at)?,
            id: record.id,
            name: record.name,
            email: record.email,
            analyses_count: record.analyses_count,
            plan: record.plan,
        })
    }
}

impl UserService {
    pub fn new(db_pool: Pool<Sqlite>, bcrypt_cost: u32) -> Self {
        UserService {
            db_pool,
            bcrypt_cost,
        }
    }

    pub async fn register(&self, req: &RegisterRequest) -> Result<UserResponse, AuthError> {
        let (name, email) = validate_registration(req)?;

        if self.find_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let password = req.password.clone();
        let cost = self.bcrypt_cost;
        // bcrypt es costoso: fuera del executor
        let password_hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .context("Fallo la tarea de hash")?
            .context("Fallo al generar hash de la contraseña")?;

        let record = UserRecord {
            id: Uuid::new_v4().to_string(),
            name,
            email,
            password_hash,
            created_at: timestamp(Utc::now()),
            analyses_count: 0,
            plan: DEFAULT_PLAN.to_string(),
        };

        let inserted = sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, created_at, analyses_count, plan)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&record.id)
        .bind(&record.name)
        .bind(&record.email)
        .bind(&record.password_hash)
        .bind(&record.created_at)
        .bind(record.analyses_count)
        .bind(&record.plan)
        .execute(&self.db_pool)
        .await;

        match inserted {
            Ok(_) => {}
            // Dos registros simultáneos con el mismo email
            Err(e) if is_unique_violation(&e) => return Err(AuthError::EmailTaken),
            Err(e) => return Err(anyhow::Error::new(e).context("Fallo al insertar usuario").into()),
        }

        log::info!("Usuario registrado: {}", record.email);
        Ok(UserResponse::try_from(record)?)
    }

    pub async fn login(&self, req: &LoginRequest) -> Result<UserResponse, AuthError> {
        let email = req.email.trim().to_lowercase();
        let record = self
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let password = req.password.clone();
        let hash = record.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .context("Fallo la tarea de verificación")?
            .unwrap_or_else(|e| {
                log::error!("Error al verificar contraseña: {}", e);
                false
            });

        if !matches {
            log::warn!("Login fallido para {}", email);
            return Err(AuthError::InvalidCredentials);
        }

        log::info!("Login: {}", email);
        Ok(UserResponse::try_from(record)?)
    }

    pub async fn get_user(&self, id: &str) -> Result<Option<UserResponse>> {
        let record: Option<UserRecord> = sqlx::query_as(
            r#"
            SELECT id, name, email, password_hash, created_at, analyses_count, plan
            FROM users
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db_pool)
        .await
        .context("Fallo al consultar usuario")?;

        record.map(UserResponse::try_from).transpose()
    }

    pub async fn increment_analyses(&self, id: &str) -> Result<()> {
        sqlx::query("UPDATE users SET analyses_count = analyses_count + 1 WHERE id = ?1")
            .bind(id)
            .execute(&self.db_pool)
            .await
            .context("Fallo al incrementar contador de análisis")?;
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        sqlx::query_as(
            r#"
            SELECT id, name, email, password_hash, created_at, analyses_count, plan
            FROM users
            WHERE email = ?1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db_pool)
        .await
        .context("Fallo al buscar usuario por email")
    }
}

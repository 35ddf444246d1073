//! tests/mod.rs
//! Pruebas del servicio y utilidades compartidas (pool en memoria, OCR falso).

mod analysis_tests;
mod config_tests;
mod database_tests;
mod explanation_tests;
mod user_tests;
mod worker_tests;

use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};

use crate::database::run_migrations;
use crate::services::{
    fraud_service::ScorecardModel, ocr_service::TextExtractor, pipeline_service::AnalysisPipeline,
};

/// Boleto Itaú real de prueba: R$ 54,01
pub const ITAU_LINE: &str = "34191.09008 00000.150128 84123.456786 4 98760000005401";
pub const ITAU_BARCODE: &str = "34194987600000054011090000000150128412345678";
/// Boleto Bradesco de prueba: R$ 1.500,00
pub const BRADESCO_LINE: &str = "23790.12343 56789.012343 56789.012343 1 12340000150000";
pub const BRADESCO_BARCODE: &str = "23791123400001500000123456789012345678901234";
pub const VALID_CNPJ: &str = "11.222.333/0001-81";

pub fn itau_text() -> String {
    format!(
        "Itaú Unibanco S.A.\n\
         Beneficiário: Loja Exemplo Ltda CNPJ: {VALID_CNPJ}\n\
         Agência/Código do Beneficiário: 1234-5 / 12345-6\n\
         Vencimento: 15/03/2025\n\
         Valor do Documento: R$ 54,01\n\
         {ITAU_LINE}\n\
         {ITAU_BARCODE}\n"
    )
}

/// Mismo boleto con el DV del primer campo adulterado (8 -> 7).
pub fn tampered_itau_text() -> String {
    itau_text()
        .replace("34191.09008", "34191.09007")
        .replace(ITAU_BARCODE, "")
}

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
}

/// SQLite en memoria con las migraciones reales. Una sola conexión que
/// nunca se recicla, para que la base no desaparezca.
pub async fn test_pool() -> Pool<Sqlite> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("pool en memoria");
    run_migrations(&pool).await.expect("migraciones");
    pool
}

/// OCR falso: devuelve siempre el mismo texto.
pub struct FakeExtractor(pub String);

#[async_trait]
impl TextExtractor for FakeExtractor {
    async fn extract_text(&self, _bytes: &[u8]) -> Result<String> {
        Ok(self.0.clone())
    }
}

pub struct FailingExtractor;

#[async_trait]
impl TextExtractor for FailingExtractor {
    async fn extract_text(&self, _bytes: &[u8]) -> Result<String> {
        Err(anyhow!("Erro ao extrair texto: tesseract falló"))
    }
}

pub fn fake_pipeline(text: String) -> AnalysisPipeline {
    AnalysisPipeline::new(
        Arc::new(FakeExtractor(text)),
        Arc::new(ScorecardModel::default()),
    )
}

//! models/analysis_model.rs
//! Registro de una análisis y las respuestas HTTP que lo exponen.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{
    boleto_model::BoletoData, explanation_model::Explanation, prediction_model::Prediction,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Processing,
    Completed,
    Failed,
}

impl AnalysisStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AnalysisStatus::Processing => "processing",
            AnalysisStatus::Completed => "completed",
            AnalysisStatus::Failed => "failed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "processing" => Some(AnalysisStatus::Processing),
            "completed" => Some(AnalysisStatus::Completed),
            "failed" => Some(AnalysisStatus::Failed),
            _ => None,
        }
    }
}

/// Explicación completa, o el aviso que ve un usuario anónimo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExplanationView {
    Full(Box<Explanation>),
    Restricted { mensagem: String },
}

/// Veredicto combinado (validación FEBRABAN + modelo).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraudVerdict {
    #[serde(rename = "isFraudulento")]
    pub is_fraudulent: bool,
    pub score: u8,
    #[serde(rename = "confianca")]
    pub confidence: f64,
    /// "validacao_febraban" y/o "modelo_ml"
    #[serde(rename = "metodos")]
    pub methods: Vec<String>,
    #[serde(rename = "motivos", default, skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<String>,
    #[serde(rename = "explicacao", default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<ExplanationView>,
}

/// Datos con los que se crea una análisis en estado "processing"
#[derive(Debug, Clone)]
pub struct NewAnalysis {
    pub file_type: String,
    pub file_size: i64,
    pub file_name: Option<String>,
    pub user_id: Option<String>,
    pub ip_address: Option<String>,
}

/// Resultado del pipeline que se guarda al completar
#[derive(Debug, Clone)]
pub struct CompletedAnalysis {
    pub processing_time: f64,
    pub extracted: BoletoData,
    pub validation: serde_json::Value,
    pub prediction: Prediction,
    pub verdict: FraudVerdict,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: String,
    pub status: AnalysisStatus,
    #[serde(rename = "uploadedAt")]
    pub uploaded_at: DateTime<Utc>,
    #[serde(rename = "fileType")]
    pub file_type: String,
    #[serde(rename = "fileSize")]
    pub file_size: i64,
    #[serde(rename = "fileName")]
    pub file_name: Option<String>,
    pub is_authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(rename = "processedAt", skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
    #[serde(rename = "processingTime", skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<f64>,
    #[serde(rename = "dadosExtraidos", skip_serializing_if = "Option::is_none")]
    pub extracted: Option<BoletoData>,
    #[serde(rename = "validacaoTecnica", skip_serializing_if = "Option::is_none")]
    pub validation: Option<serde_json::Value>,
    #[serde(rename = "predicaoML", skip_serializing_if = "Option::is_none")]
    pub prediction: Option<Prediction>,
    #[serde(rename = "fraudeAnalise", skip_serializing_if = "Option::is_none")]
    pub verdict: Option<FraudVerdict>,
    #[serde(rename = "error", skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(rename = "failedAt", skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<DateTime<Utc>>,
}

/// Vista de una análisis para `GET /api/analise/{id}`
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisView {
    #[serde(flatten)]
    pub record: AnalysisRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acesso_limitado: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mensagem: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadResponse {
    pub id: String,
    pub status: AnalysisStatus,
    pub message: String,
    #[serde(rename = "fileName")]
    pub file_name: Option<String>,
    #[serde(rename = "fileSize")]
    pub file_size: i64,
    #[serde(rename = "fileType")]
    pub file_type: String,
    pub is_authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analises_restantes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mensagem_acesso: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
    pub skip: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryResponse {
    pub total: i64,
    pub analises: Vec<AnalysisRecord>,
    pub limit: i64,
    pub skip: i64,
}

/// Respuesta de `POST /api/test-ocr`
#[derive(Debug, Clone, Serialize)]
pub struct TestOcrResponse {
    pub success: bool,
    pub dados_extraidos: BoletoData,
    pub resultado_final: FraudVerdict,
    pub is_authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mensagem: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analises_restantes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub historico_disponivel: Option<bool>,
}

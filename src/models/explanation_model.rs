//! models/explanation_model.rs
//! Explicación legible del resultado, tal como la muestra el frontend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::prediction_model::ClassProbabilities;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    #[serde(rename = "simples")]
    pub simple: SimpleExplanation,
    #[serde(rename = "avancado")]
    pub advanced: AdvancedExplanation,
    #[serde(rename = "razoes")]
    pub reasons: Vec<Reason>,
    #[serde(rename = "recomendacao")]
    pub recommendation: Recommendation,
    #[serde(rename = "gerado_em")]
    pub generated_at: DateTime<Utc>,
}

/// Versión para usuarios sin conocimientos técnicos
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleExplanation {
    pub status: String,
    #[serde(rename = "confianca")]
    pub confidence_level: String,
    #[serde(rename = "resumo")]
    pub summary: String,
    #[serde(rename = "principal_motivo")]
    pub main_reason: String,
    #[serde(rename = "acao_recomendada")]
    pub recommended_action: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvancedExplanation {
    #[serde(rename = "analise_tecnica")]
    pub technical: TechnicalAnalysis,
    #[serde(rename = "metricas")]
    pub metrics: ExplanationMetrics,
    #[serde(rename = "detalhes_tecnicos")]
    pub details: TechnicalDetails,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalAnalysis {
    pub modelo_ml: String,
    /// 0..=100
    pub score_fraude: f64,
    pub confianca_percentual: f64,
    pub probabilidades: ClassProbabilities,
    pub limiar_decisao: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplanationMetrics {
    pub features_analisadas: usize,
    pub validacoes_tecnicas: usize,
    pub peso_validacao: f64,
    pub peso_ml: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalDetails {
    pub validacao_febraban: bool,
    pub erros_encontrados: Vec<String>,
    pub features_importantes: Vec<ImportantFeature>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportantFeature {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "importancia")]
    pub importance: f64,
    #[serde(rename = "impacto_percentual")]
    pub impact_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reason {
    #[serde(rename = "gravidade")]
    pub severity: String,
    #[serde(rename = "categoria")]
    pub category: String,
    #[serde(rename = "categoria_nome")]
    pub category_name: String,
    #[serde(rename = "cor")]
    pub color: String,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "descricao_simples")]
    pub simple_description: String,
    #[serde(rename = "descricao_avancada")]
    pub advanced_description: String,
    #[serde(rename = "impacto")]
    pub impact: u8,
    #[serde(rename = "fonte")]
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(rename = "nivel_risco")]
    pub risk_level: String,
    #[serde(rename = "cor")]
    pub color: String,
    #[serde(rename = "acao_principal")]
    pub main_action: String,
    #[serde(rename = "mensagem")]
    pub message: String,
    #[serde(rename = "proximos_passos")]
    pub next_steps: Vec<String>,
}

//! services/fraud_service.rs
//! Modelo de fraude: scorecard logístico sobre indicadores de consistencia
//! del boleto. Los pesos salen de un JSON; si no existe se usan los de fábrica.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::models::prediction_model::{
    ClassProbabilities, FeatureContribution, FeatureVector, Prediction,
};
use crate::services::validation_service::KNOWN_BANK_CODES;

/// Probabilidad de fraude a partir de la cual el boleto se clasifica falso
pub const DECISION_THRESHOLD: f64 = 0.5;

pub trait FraudModel: Send + Sync {
    fn name(&self) -> &str;
    fn predict(&self, features: &FeatureVector) -> Prediction;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorecardWeights {
    pub bias: f64,
    pub line_missing: f64,
    pub bank_mismatch: f64,
    pub invalid_currency: f64,
    pub amount_mismatch: f64,
    pub amount_missing: f64,
    pub agency_missing: f64,
    pub unknown_bank: f64,
}

impl Default for ScorecardWeights {
    fn default() -> Self {
        Self {
            bias: -3.0,
            line_missing: 2.5,
            bank_mismatch: 4.0,
            invalid_currency: 4.0,
            amount_mismatch: 3.5,
            amount_missing: 1.0,
            agency_missing: 0.5,
            unknown_bank: 2.0,
        }
    }
}

/// Formato del archivo apuntado por `MODEL_PATH`
#[derive(Debug, Deserialize)]
struct ScorecardFile {
    #[serde(default = "default_model_name")]
    name: String,
    #[serde(default)]
    weights: ScorecardWeights,
}

fn default_model_name() -> String {
    "Scorecard Logístico".to_string()
}

#[derive(Debug, Clone)]
pub struct ScorecardModel {
    name: String,
    weights: ScorecardWeights,
}

impl Default for ScorecardModel {
    fn default() -> Self {
        Self::new(ScorecardWeights::default())
    }
}

impl ScorecardModel {
    pub fn new(weights: ScorecardWeights) -> Self {
        Self {
            name: default_model_name(),
            weights,
        }
    }

    /// Carga los pesos desde disco. Un archivo ausente no es error; uno mal
    /// formado sí.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::warn!(
                "Modelo no encontrado en {:?}, usando pesos por defecto",
                path
            );
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("No se pudo leer el modelo en {:?}", path))?;
        let file: ScorecardFile = serde_json::from_str(&raw)
            .with_context(|| format!("Modelo inválido en {:?}", path))?;

        log::info!("Modelo '{}' cargado desde {:?}", file.name, path);
        Ok(Self {
            name: file.name,
            weights: file.weights,
        })
    }

    fn indicators(&self, f: &FeatureVector) -> Vec<(&'static str, bool, f64)> {
        let w = &self.weights;
        let has_line = f.line_bank_code != 0;
        let known_bank = KNOWN_BANK_CODES
            .iter()
            .any(|code| code.parse::<i64>().ok() == Some(f.bank_code));

        vec![
            ("linha_ausente", !has_line, w.line_missing),
            (
                "banco_divergente",
                has_line && f.bank_code != 0 && f.bank_code != f.line_bank_code,
                w.bank_mismatch,
            ),
            (
                "moeda_invalida",
                has_line && f.line_currency != 9,
                w.invalid_currency,
            ),
            (
                "valor_divergente",
                has_line && f.amount > 0.0 && f.line_amount > 0 && f.line_amount != f.amount_cents(),
                w.amount_mismatch,
            ),
            ("valor_ausente", f.amount <= 0.0, w.amount_missing),
            ("agencia_ausente", f.agency == 0, w.agency_missing),
            (
                "banco_desconhecido",
                f.bank_code != 0 && !known_bank,
                w.unknown_bank,
            ),
        ]
    }
}

impl FraudModel for ScorecardModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, features: &FeatureVector) -> Prediction {
        let contributions: Vec<FeatureContribution> = self
            .indicators(features)
            .into_iter()
            .map(|(name, active, weight)| FeatureContribution {
                name: name.to_string(),
                active,
                contribution: if active { weight } else { 0.0 },
            })
            .collect();

        let z = self.weights.bias + contributions.iter().map(|c| c.contribution).sum::<f64>();
        let p_fake = sigmoid(z);
        let p_genuine = 1.0 - p_fake;
        let is_fraudulent = p_fake >= DECISION_THRESHOLD;

        log::info!(
            "Predicción: {} (p_falso={:.3})",
            if is_fraudulent { "FALSO" } else { "VERDADERO" },
            p_fake
        );

        Prediction {
            is_fraudulent,
            predicted_class: if is_fraudulent { 0 } else { 1 },
            fraud_score: (p_fake * 100.0).floor().clamp(0.0, 100.0) as u8,
            confidence: p_fake.max(p_genuine),
            probabilities: ClassProbabilities {
                fake: p_fake,
                genuine: p_genuine,
            },
            features: features.clone(),
            contributions,
        }
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

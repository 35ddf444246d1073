//! models/prediction_model.rs
//! Entrada y salida del modelo de fraude.

use serde::{Deserialize, Serialize};

use crate::models::boleto_model::BoletoData;

/// Variables que consume el modelo. Los nombres JSON coinciden con las
/// columnas del dataset de entrenamiento.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    #[serde(rename = "banco")]
    pub bank: i64,
    #[serde(rename = "codigoBanco")]
    pub bank_code: i64,
    #[serde(rename = "agencia")]
    pub agency: i64,
    #[serde(rename = "valor")]
    pub amount: f64,
    #[serde(rename = "linha_codBanco")]
    pub line_bank_code: i64,
    #[serde(rename = "linha_moeda")]
    pub line_currency: i64,
    /// Centavos, tomados de los últimos 10 dígitos de la línea
    #[serde(rename = "linha_valor")]
    pub line_amount: i64,
}

impl FeatureVector {
    pub const LEN: usize = 7;

    /// Arma el vector a partir de los datos del parser. Lo que falta queda en 0.
    pub fn from_boleto(data: &BoletoData) -> Self {
        let line = data.digitable_line_digits();
        let digits_at = |range: std::ops::Range<usize>| -> i64 {
            line.get(range).and_then(|d| d.parse().ok()).unwrap_or(0)
        };

        let bank = data
            .bank_code
            .as_deref()
            .and_then(|c| c.parse().ok())
            .unwrap_or(0);
        // El banco del código de barras se compara contra el de la línea
        let barcode = data.barcode_digits();
        let bank_code = barcode
            .get(0..3)
            .and_then(|c| c.parse().ok())
            .unwrap_or(bank);
        let agency = data
            .agency
            .as_deref()
            .and_then(|a| a.split('-').next())
            .and_then(|a| a.trim().parse().ok())
            .unwrap_or(0);

        Self {
            bank,
            bank_code,
            agency,
            amount: data.amount.unwrap_or(0.0),
            line_bank_code: digits_at(0..3),
            line_currency: digits_at(3..4),
            line_amount: if line.len() >= 47 { digits_at(37..47) } else { 0 },
        }
    }

    /// Valor en centavos, para compararlo con `line_amount`.
    pub fn amount_cents(&self) -> i64 {
        (self.amount * 100.0).round() as i64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassProbabilities {
    #[serde(rename = "falso")]
    pub fake: f64,
    #[serde(rename = "verdadeiro")]
    pub genuine: f64,
}

/// Aporte de un indicador al score final.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureContribution {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "ativo")]
    pub active: bool,
    #[serde(rename = "contribuicao")]
    pub contribution: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(rename = "is_fraudulento")]
    pub is_fraudulent: bool,
    /// 0 = falso, 1 = verdadero
    #[serde(rename = "classe_predita")]
    pub predicted_class: u8,
    /// Probabilidad de fraude en porcentaje entero (0..=100)
    #[serde(rename = "score_fraude")]
    pub fraud_score: u8,
    #[serde(rename = "confianca")]
    pub confidence: f64,
    #[serde(rename = "probabilidades")]
    pub probabilities: ClassProbabilities,
    #[serde(rename = "features_usadas")]
    pub features: FeatureVector,
    #[serde(rename = "contribuicoes", default, skip_serializing_if = "Vec::is_empty")]
    pub contributions: Vec<FeatureContribution>,
}

//! models/boleto_model.rs
//! Campos estructurados que el parser reconoce en el texto OCR de un boleto.

use serde::{Deserialize, Serialize};

/// Datos extraídos de un boleto. Todo es opcional: el OCR casi nunca
/// entrega el documento completo.
///
/// Los nombres JSON se mantienen en portugués porque el frontend ya los consume.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoletoData {
    #[serde(rename = "codigo_barras")]
    pub barcode: Option<String>,
    #[serde(rename = "linha_digitavel")]
    pub digitable_line: Option<String>,
    #[serde(rename = "valor")]
    pub amount: Option<f64>,
    /// Siempre en formato dd/mm/aaaa
    #[serde(rename = "vencimento")]
    pub due_date: Option<String>,
    #[serde(rename = "beneficiario_nome")]
    pub beneficiary_name: Option<String>,
    #[serde(rename = "beneficiario_cnpj")]
    pub beneficiary_cnpj: Option<String>,
    #[serde(rename = "codigo_banco")]
    pub bank_code: Option<String>,
    #[serde(rename = "banco_nome")]
    pub bank_name: Option<String>,
    /// "1234" o "1234-5"
    #[serde(rename = "agencia")]
    pub agency: Option<String>,
}

impl BoletoData {
    /// Dígitos de la línea digitable, sin puntos ni espacios.
    pub fn digitable_line_digits(&self) -> String {
        self.digitable_line
            .as_deref()
            .unwrap_or_default()
            .chars()
            .filter(|c| c.is_ascii_digit())
            .collect()
    }

    pub fn barcode_digits(&self) -> String {
        self.barcode
            .as_deref()
            .unwrap_or_default()
            .chars()
            .filter(|c| c.is_ascii_digit())
            .collect()
    }
}

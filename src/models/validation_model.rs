//! models/validation_model.rs
//! Resultado de la validación FEBRABAN.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

/// Gravedad de una inconsistencia. Define color e impacto en la explicación.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critica,
    Alta,
    Media,
    Baixa,
}

impl Severity {
    pub fn impact(self) -> u8 {
        match self {
            Severity::Critica => 95,
            Severity::Alta => 80,
            Severity::Media => 60,
            Severity::Baixa => 30,
        }
    }

    /// Color Ionic que usa el frontend
    pub fn color(self) -> &'static str {
        match self {
            Severity::Critica => "danger",
            Severity::Alta => "warning",
            Severity::Media => "medium",
            Severity::Baixa => "primary",
        }
    }
}

/// Un error de validación. En JSON se serializa solo como su mensaje.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }

    pub fn critical(message: impl Into<String>) -> Self {
        Self::new(Severity::Critica, message)
    }

    pub fn high(message: impl Into<String>) -> Self {
        Self::new(Severity::Alta, message)
    }

    pub fn medium(message: impl Into<String>) -> Self {
        Self::new(Severity::Media, message)
    }

    pub fn low(message: impl Into<String>) -> Self {
        Self::new(Severity::Baixa, message)
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl Serialize for ValidationIssue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.message)
    }
}

/// Resultado de una verificación individual (línea, código de barras, CNPJ...).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldCheck {
    #[serde(rename = "valido")]
    pub valid: bool,
    #[serde(rename = "erros")]
    pub errors: Vec<ValidationIssue>,
}

impl FieldCheck {
    pub fn from_errors(errors: Vec<ValidationIssue>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    #[serde(rename = "valido")]
    pub valid: bool,
    #[serde(rename = "erros")]
    pub errors: Vec<ValidationIssue>,
    #[serde(rename = "detalhes")]
    pub details: BTreeMap<&'static str, FieldCheck>,
}

impl ValidationReport {
    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.message.clone()).collect()
    }
}

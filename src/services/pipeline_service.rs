//! services/pipeline_service.rs
//! OCR -> parser -> validación FEBRABAN -> modelo -> veredicto -> explicación.

use std::{sync::Arc, time::Instant};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::models::{
    analysis_model::{CompletedAnalysis, ExplanationView, FraudVerdict},
    boleto_model::BoletoData,
    prediction_model::{FeatureVector, Prediction},
    validation_model::ValidationReport,
};
use crate::services::{
    explanation_service, fraud_service::FraudModel, ocr_service::TextExtractor, parser_service,
    validation_service,
};

pub const METHOD_VALIDATION: &str = "validacao_febraban";
pub const METHOD_MODEL: &str = "modelo_ml";

#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub text: String,
    pub extracted: BoletoData,
    pub validation: ValidationReport,
    pub prediction: Prediction,
    pub verdict: FraudVerdict,
}

impl PipelineOutcome {
    pub fn into_completed(self, processing_time: f64) -> Result<CompletedAnalysis> {
        Ok(CompletedAnalysis {
            processing_time,
            validation: serde_json::to_value(&self.validation)
                .context("No se pudo serializar la validación")?,
            extracted: self.extracted,
            prediction: self.prediction,
            verdict: self.verdict,
        })
    }
}

#[derive(Clone)]
pub struct AnalysisPipeline {
    extractor: Arc<dyn TextExtractor>,
    model: Arc<dyn FraudModel>,
}

impl AnalysisPipeline {
    pub fn new(extractor: Arc<dyn TextExtractor>, model: Arc<dyn FraudModel>) -> Self {
        Self { extractor, model }
    }

    /// Corre el pipeline completo sobre el archivo subido. Devuelve también
    /// el tiempo total en segundos.
    pub async fn run(&self, bytes: &[u8]) -> Result<(PipelineOutcome, f64)> {
        let start = Instant::now();

        log::info!("Etapa 1: OCR");
        let text = self.extractor.extract_text(bytes).await?;

        let outcome = self.analyze_text(text, Utc::now());
        let elapsed = start.elapsed().as_secs_f64();
        log::info!(
            "Pipeline concluido en {:.2}s: {}",
            elapsed,
            if outcome.verdict.is_fraudulent {
                "FRAUDULENTO"
            } else {
                "VÁLIDO"
            }
        );
        Ok((outcome, elapsed))
    }

    /// Todo lo que sigue al OCR. No toca disco ni procesos.
    pub fn analyze_text(&self, text: String, now: DateTime<Utc>) -> PipelineOutcome {
        log::info!("Etapa 2: parser");
        let extracted = parser_service::parse_boleto(&text);

        log::info!("Etapa 3: validación FEBRABAN");
        let validation = validation_service::validate_boleto(&extracted, now.date_naive());

        log::info!("Etapa 4: modelo {}", self.model.name());
        let prediction = self.model.predict(&FeatureVector::from_boleto(&extracted));

        log::info!("Etapa 5: explicación");
        let mut verdict = build_verdict(&validation, &prediction);
        let explanation = explanation_service::explain(
            &extracted,
            &validation,
            &prediction,
            verdict.is_fraudulent,
            self.model.name(),
            now,
        );
        verdict.explanation = Some(ExplanationView::Full(Box::new(explanation)));

        PipelineOutcome {
            text,
            extracted,
            validation,
            prediction,
            verdict,
        }
    }
}

/// Fraudulento si la validación falla o si el modelo lo clasifica falso.
pub fn build_verdict(validation: &ValidationReport, prediction: &Prediction) -> FraudVerdict {
    let mut methods = Vec::new();
    if !validation.valid {
        methods.push(METHOD_VALIDATION.to_string());
    }
    if prediction.is_fraudulent {
        methods.push(METHOD_MODEL.to_string());
    }

    FraudVerdict {
        is_fraudulent: !validation.valid || prediction.is_fraudulent,
        score: prediction.fraud_score,
        confidence: prediction.confidence,
        methods,
        reasons: if validation.valid {
            Vec::new()
        } else {
            validation.error_messages()
        },
        explanation: None,
    }
}

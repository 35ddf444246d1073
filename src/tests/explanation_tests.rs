//! tests/explanation_tests.rs

use chrono::Utc;

use crate::models::{boleto_model::BoletoData, prediction_model::FeatureVector};
use crate::services::{
    explanation_service::{confidence_level, explain, format_brl, recommendation},
    fraud_service::{FraudModel, ScorecardModel},
    parser_service::parse_boleto,
    pipeline_service::build_verdict,
    validation_service::validate_boleto,
};
use crate::tests::{itau_text, tampered_itau_text, today};

fn explain_text(text: &str) -> crate::models::explanation_model::Explanation {
    let data = parse_boleto(text);
    let validation = validate_boleto(&data, today());
    let model = ScorecardModel::default();
    let prediction = model.predict(&FeatureVector::from_boleto(&data));
    let verdict = build_verdict(&validation, &prediction);
    explain(
        &data,
        &validation,
        &prediction,
        verdict.is_fraudulent,
        model.name(),
        Utc::now(),
    )
}

#[test]
fn genuine_boleto_explanation() {
    let explanation = explain_text(&itau_text());

    assert_eq!(explanation.simple.status, "POSSIVELMENTE AUTÊNTICO");
    assert_eq!(explanation.simple.confidence_level, "Muito Alta");
    assert_eq!(
        explanation.simple.main_reason,
        "Todas as verificações sugerem autenticidade"
    );
    assert_eq!(explanation.recommendation.risk_level, "BAIXO");
    assert_eq!(explanation.reasons.len(), 1);
    assert_eq!(explanation.reasons[0].title, "Padrão Aparentemente Normal");
    assert!(explanation.advanced.details.validacao_febraban);
    assert!(explanation.advanced.details.features_importantes.is_empty());
    assert_eq!(explanation.advanced.metrics.features_analisadas, 7);
}

#[test]
fn tampered_boleto_explanation_follows_verdict() {
    let explanation = explain_text(&tampered_itau_text());

    assert_eq!(explanation.simple.status, "POSSIVELMENTE FALSO");
    assert_eq!(
        explanation.simple.main_reason,
        "Possível irregularidade detectada: DV1 inválido (esperado: 8, encontrado: 7)"
    );
    // El modelo no ve fraude: la confianza en "falso" es baja
    assert_eq!(explanation.simple.confidence_level, "Baixa");
    assert_eq!(explanation.recommendation.risk_level, "MÉDIO");

    let first = &explanation.reasons[0];
    assert_eq!(first.severity, "critica");
    assert_eq!(first.color, "danger");
    assert_eq!(first.impact, 95);
    assert_eq!(explanation.advanced.metrics.validacoes_tecnicas, 1);
}

#[test]
fn empty_boleto_lists_model_features() {
    let explanation = explain_text("");

    let features = &explanation.advanced.details.features_importantes;
    assert_eq!(features[0].name, "linha_ausente");
    let total: f64 = features.iter().map(|f| f.impact_percent).sum();
    assert!((total - 100.0).abs() < 0.1);
}

#[test]
fn high_amount_adds_reason() {
    let data = BoletoData {
        amount: Some(12_345.6),
        ..BoletoData::default()
    };
    let validation = validate_boleto(&data, today());
    let prediction = ScorecardModel::default().predict(&FeatureVector::from_boleto(&data));
    let explanation = explain(&data, &validation, &prediction, true, "x", Utc::now());

    let reason = explanation
        .reasons
        .iter()
        .find(|r| r.category == "valor")
        .expect("razón de valor");
    assert!(reason.simple_description.contains("R$ 12.345,60"));
}

#[test]
fn confidence_levels() {
    assert_eq!(confidence_level(0.95), "Muito Alta");
    assert_eq!(confidence_level(0.8), "Alta");
    assert_eq!(confidence_level(0.6), "Média");
    assert_eq!(confidence_level(0.3), "Baixa");
}

#[test]
fn recommendation_levels() {
    assert_eq!(recommendation(true, 0.9).risk_level, "ALTO");
    assert_eq!(recommendation(true, 0.7).risk_level, "MÉDIO-ALTO");
    assert_eq!(recommendation(false, 0.9).risk_level, "BAIXO");
    assert_eq!(recommendation(false, 0.7).risk_level, "BAIXO-MÉDIO");
    assert_eq!(recommendation(false, 0.5).risk_level, "INCERTO");
    assert_eq!(recommendation(false, 0.5).next_steps.len(), 4);
}

#[test]
fn brl_formatting() {
    assert_eq!(format_brl(54.01), "54,01");
    assert_eq!(format_brl(1_500.0), "1.500,00");
    assert_eq!(format_brl(9_999_999.99), "9.999.999,99");
}

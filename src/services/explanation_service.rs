//! services/explanation_service.rs
//! Explicación legible del veredicto: versión simple, versión técnica,
//! razones y recomendación final.

use chrono::{DateTime, Utc};

use crate::models::{
    boleto_model::BoletoData,
    explanation_model::{
        AdvancedExplanation, Explanation, ExplanationMetrics, ImportantFeature, Reason,
        Recommendation, SimpleExplanation, TechnicalAnalysis, TechnicalDetails,
    },
    prediction_model::{FeatureVector, Prediction},
    validation_model::{Severity, ValidationReport},
};
use crate::services::fraud_service::DECISION_THRESHOLD;

const VALIDATION_WEIGHT: f64 = 0.4;
const MODEL_WEIGHT: f64 = 0.6;
const HIGH_AMOUNT: f64 = 10_000.0;
const TOP_FEATURES: usize = 5;

pub fn explain(
    data: &BoletoData,
    validation: &ValidationReport,
    prediction: &Prediction,
    is_fraudulent: bool,
    model_name: &str,
    generated_at: DateTime<Utc>,
) -> Explanation {
    let p_fake = prediction.probabilities.fake;
    // Confianza en el veredicto combinado, no en la clase del modelo
    let confidence = if is_fraudulent {
        p_fake
    } else {
        prediction.probabilities.genuine
    };

    let (status, summary, action) = if is_fraudulent {
        (
            "POSSIVELMENTE FALSO",
            "Este boleto apresenta características suspeitas que sugerem possível falsificação.",
            "Recomendamos NÃO efetuar o pagamento sem verificação adicional",
        )
    } else {
        (
            "POSSIVELMENTE AUTÊNTICO",
            "Este boleto aparenta ser autêntico, mas sempre confira os dados com o emissor.",
            "Você pode prosseguir com cautela, mas sempre verifique os dados",
        )
    };

    Explanation {
        simple: SimpleExplanation {
            status: status.to_string(),
            confidence_level: confidence_level(confidence).to_string(),
            summary: summary.to_string(),
            main_reason: main_reason(validation, p_fake),
            recommended_action: action.to_string(),
        },
        advanced: AdvancedExplanation {
            technical: TechnicalAnalysis {
                modelo_ml: model_name.to_string(),
                score_fraude: round2(p_fake * 100.0),
                confianca_percentual: round2(prediction.confidence * 100.0),
                probabilidades: prediction.probabilities,
                limiar_decisao: DECISION_THRESHOLD,
            },
            metrics: ExplanationMetrics {
                features_analisadas: FeatureVector::LEN,
                validacoes_tecnicas: validation.errors.len(),
                peso_validacao: VALIDATION_WEIGHT,
                peso_ml: MODEL_WEIGHT,
            },
            details: TechnicalDetails {
                validacao_febraban: validation.valid,
                erros_encontrados: validation.error_messages(),
                features_importantes: important_features(prediction),
            },
        },
        reasons: reasons(data, validation, p_fake, model_name),
        recommendation: recommendation(is_fraudulent, confidence),
        generated_at,
    }
}

pub fn confidence_level(confidence: f64) -> &'static str {
    if confidence >= 0.9 {
        "Muito Alta"
    } else if confidence >= 0.75 {
        "Alta"
    } else if confidence >= 0.6 {
        "Média"
    } else {
        "Baixa"
    }
}

fn main_reason(validation: &ValidationReport, p_fake: f64) -> String {
    if let Some(critical) = validation
        .errors
        .iter()
        .find(|e| e.severity == Severity::Critica)
    {
        return format!("Possível irregularidade detectada: {}", critical);
    }
    if let Some(first) = validation.errors.first() {
        return format!("Inconsistência identificada: {}", first);
    }

    let reason = if p_fake > 0.8 {
        "Modelo de ML identificou padrão suspeito com alta confiança"
    } else if p_fake > 0.6 {
        "Modelo de ML identificou características atípicas"
    } else if p_fake < 0.3 {
        "Todas as verificações sugerem autenticidade"
    } else {
        "Análise inconclusiva - recomenda-se verificação manual"
    };
    reason.to_string()
}

fn reasons(
    data: &BoletoData,
    validation: &ValidationReport,
    p_fake: f64,
    model_name: &str,
) -> Vec<Reason> {
    let mut reasons: Vec<Reason> = validation
        .errors
        .iter()
        .map(|issue| Reason {
            severity: severity_name(issue.severity).to_string(),
            category: "validacao_tecnica".to_string(),
            category_name: "Validação Técnica".to_string(),
            color: issue.severity.color().to_string(),
            title: "Possível Inconsistência Técnica".to_string(),
            simple_description: format!("Foi identificada uma possível irregularidade: {}", issue),
            advanced_description: format!(
                "Validação FEBRABAN: {}. Isso pode indicar adulteração ou erro na geração do boleto.",
                issue
            ),
            impact: issue.severity.impact(),
            source: "Validação FEBRABAN".to_string(),
        })
        .collect();

    if p_fake > 0.7 {
        reasons.push(Reason {
            severity: "alta".to_string(),
            category: "machine_learning".to_string(),
            category_name: "Análise de Padrões".to_string(),
            color: "danger".to_string(),
            title: "Padrão Suspeito Identificado".to_string(),
            simple_description: format!(
                "O modelo de IA identificou características que sugerem possível fraude (confiança: {:.0}%)",
                p_fake * 100.0
            ),
            advanced_description: format!(
                "Score de fraude: {:.2}. O modelo {} identificou inconsistências entre os campos do boleto que podem indicar falsificação.",
                p_fake, model_name
            ),
            impact: 85,
            source: "Machine Learning".to_string(),
        });
    } else if p_fake < 0.3 {
        reasons.push(Reason {
            severity: "baixa".to_string(),
            category: "machine_learning".to_string(),
            category_name: "Análise de Padrões".to_string(),
            color: "success".to_string(),
            title: "Padrão Aparentemente Normal".to_string(),
            simple_description: format!(
                "O modelo de IA não identificou características suspeitas significativas (confiança: {:.0}%)",
                (1.0 - p_fake) * 100.0
            ),
            advanced_description: format!(
                "Score de autenticidade: {:.2}. As características analisadas sugerem conformidade com padrões de boletos legítimos.",
                1.0 - p_fake
            ),
            impact: 15,
            source: "Machine Learning".to_string(),
        });
    }

    if let Some(amount) = data.amount.filter(|a| *a > HIGH_AMOUNT) {
        reasons.push(Reason {
            severity: "media".to_string(),
            category: "valor".to_string(),
            category_name: "Análise de Valor".to_string(),
            color: "warning".to_string(),
            title: "Valor Elevado".to_string(),
            simple_description: format!(
                "O valor do boleto é elevado (R$ {}). Recomenda-se verificação adicional.",
                format_brl(amount)
            ),
            advanced_description: "Boletos com valores acima de R$ 10.000,00 merecem atenção extra. Em caso de fraude, o prejuízo seria significativo.".to_string(),
            impact: 60,
            source: "Análise de Risco".to_string(),
        });
    }

    if reasons.is_empty() {
        reasons.push(Reason {
            severity: "baixa".to_string(),
            category: "geral".to_string(),
            category_name: "Análise Geral".to_string(),
            color: "primary".to_string(),
            title: "Análise Completa Realizada".to_string(),
            simple_description: "Todas as verificações de segurança foram executadas.".to_string(),
            advanced_description: "O boleto passou por validação FEBRABAN, análise de Machine Learning e verificações de padrões suspeitos.".to_string(),
            impact: 30,
            source: "Sistema DetectaBB".to_string(),
        });
    }

    reasons
}

fn severity_name(severity: Severity) -> &'static str {
    match severity {
        Severity::Critica => "critica",
        Severity::Alta => "alta",
        Severity::Media => "media",
        Severity::Baixa => "baixa",
    }
}

pub fn recommendation(is_fraudulent: bool, confidence: f64) -> Recommendation {
    let (risk_level, color, main_action, message, next_steps): (_, _, _, _, Vec<&str>) =
        match (is_fraudulent, confidence) {
            (true, c) if c >= 0.85 => (
                "ALTO",
                "danger",
                "NÃO PAGAR (Alta Probabilidade de Fraude)",
                "Este boleto apresenta FORTES indícios de falsificação. Recomendamos fortemente não efetuar o pagamento.",
                vec![
                    "NÃO efetue o pagamento deste boleto",
                    "Entre em contato DIRETAMENTE com a empresa emissora pelos canais oficiais",
                    "Reporte este possível boleto falso às autoridades competentes",
                    "Solicite um novo boleto através de canais seguros e oficiais",
                    "Verifique se o e-mail/site de origem é legítimo",
                ],
            ),
            (true, c) if c >= 0.65 => (
                "MÉDIO-ALTO",
                "warning",
                "VERIFICAR ANTES DE PAGAR",
                "Este boleto apresenta características suspeitas. É necessária verificação adicional antes do pagamento.",
                vec![
                    "Aguarde! Não pague ainda",
                    "Confirme os dados com a empresa emissora pelos canais oficiais",
                    "Verifique se os dados bancários correspondem aos oficiais",
                    "Confirme a autenticidade do e-mail/site de origem",
                    "Solicite nova via por canal seguro, se necessário",
                ],
            ),
            (true, _) => (
                "MÉDIO",
                "warning",
                "PROCEDER COM CAUTELA",
                "Algumas irregularidades foram detectadas. Recomendamos verificação antes do pagamento.",
                vec![
                    "Confira cuidadosamente todos os dados do boleto",
                    "Em caso de dúvida, contate a empresa emissora",
                    "Verifique se o valor e vencimento estão corretos",
                    "Confirme se o banco é o esperado para este tipo de cobrança",
                ],
            ),
            (false, c) if c >= 0.85 => (
                "BAIXO",
                "success",
                "PODE PAGAR (Com Verificação)",
                "Este boleto aparenta ser autêntico. Mesmo assim, sempre confira os dados antes do pagamento.",
                vec![
                    "Boleto aparenta ser legítimo",
                    "Confira os dados: valor, vencimento e beneficiário",
                    "Verifique se o banco corresponde ao esperado",
                    "Em caso de qualquer dúvida, contate o emissor",
                    "Proceda com o pagamento normalmente",
                ],
            ),
            (false, c) if c >= 0.65 => (
                "BAIXO-MÉDIO",
                "success",
                "PROVÁVEL AUTENTICIDADE",
                "O boleto passou nas verificações básicas, mas sempre confirme os dados importantes.",
                vec![
                    "Verificações de segurança aprovadas",
                    "Confira valor e vencimento",
                    "Em caso de dúvida, confirme com o emissor",
                    "Você pode prosseguir com o pagamento",
                ],
            ),
            (false, _) => (
                "INCERTO",
                "medium",
                "VERIFICAR MANUALMENTE",
                "Não foi possível determinar com certeza. Recomendamos verificação manual cuidadosa.",
                vec![
                    "Analise cuidadosamente todos os dados",
                    "Confirme a autenticidade com o emissor",
                    "Verifique os dados bancários",
                    "Proceda somente após confirmação",
                ],
            ),
        };

    Recommendation {
        risk_level: risk_level.to_string(),
        color: color.to_string(),
        main_action: main_action.to_string(),
        message: message.to_string(),
        next_steps: next_steps.into_iter().map(String::from).collect(),
    }
}

/// Los indicadores que más empujaron hacia "falso", de mayor a menor.
fn important_features(prediction: &Prediction) -> Vec<ImportantFeature> {
    let mut active: Vec<_> = prediction
        .contributions
        .iter()
        .filter(|c| c.active && c.contribution > 0.0)
        .collect();
    active.sort_by(|a, b| b.contribution.total_cmp(&a.contribution));
    active.truncate(TOP_FEATURES);

    let total: f64 = active.iter().map(|c| c.contribution).sum();
    active
        .into_iter()
        .map(|c| ImportantFeature {
            name: c.name.clone(),
            importance: c.contribution,
            impact_percent: round2(c.contribution / total * 100.0),
        })
        .collect()
}

/// 12345.6 -> "12.345,60"
pub fn format_brl(amount: f64) -> String {
    let cents = (amount * 100.0).round() as i64;
    let units = (cents / 100).to_string();
    let mut grouped = String::new();
    for (i, ch) in units.chars().enumerate() {
        if i > 0 && (units.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    format!("{},{:02}", grouped, cents % 100)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

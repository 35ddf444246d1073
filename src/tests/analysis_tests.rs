//! tests/analysis_tests.rs

use crate::models::analysis_model::{AnalysisStatus, ExplanationView, NewAnalysis};
use crate::services::analysis_service::AnalysisService;
use crate::tests::{fake_pipeline, itau_text, tampered_itau_text, test_pool};

fn new_analysis(user_id: Option<&str>) -> NewAnalysis {
    NewAnalysis {
        file_type: "image/png".to_string(),
        file_size: 1024,
        file_name: Some("boleto.png".to_string()),
        user_id: user_id.map(str::to_string),
        ip_address: if user_id.is_none() {
            Some("127.0.0.1".to_string())
        } else {
            None
        },
    }
}

#[actix_rt::test]
async fn created_analysis_starts_processing() {
    let service = AnalysisService::new(test_pool().await);
    let id = service.create_analysis(&new_analysis(None)).await.unwrap();

    let record = service.get_analysis(&id).await.unwrap().unwrap();
    assert_eq!(record.status, AnalysisStatus::Processing);
    assert!(!record.is_authenticated);
    assert_eq!(record.ip_address.as_deref(), Some("127.0.0.1"));
    assert!(record.verdict.is_none());

    assert!(service.get_analysis("nao-existe").await.unwrap().is_none());
}

#[actix_rt::test]
async fn completed_results_round_trip_through_storage() {
    let service = AnalysisService::new(test_pool().await);
    let id = service
        .create_analysis(&new_analysis(Some("user-1")))
        .await
        .unwrap();

    let (outcome, elapsed) = fake_pipeline(tampered_itau_text())
        .run(b"imagem")
        .await
        .unwrap();
    let completed = outcome.into_completed(elapsed).unwrap();
    service.mark_completed(&id, &completed).await.unwrap();

    let record = service.get_analysis(&id).await.unwrap().unwrap();
    assert_eq!(record.status, AnalysisStatus::Completed);
    assert!(record.processed_at.is_some());
    assert_eq!(record.extracted, Some(completed.extracted.clone()));

    let verdict = record.verdict.unwrap();
    assert!(verdict.is_fraudulent);
    assert_eq!(verdict.methods, vec!["validacao_febraban"]);
    assert_eq!(
        verdict.reasons,
        vec!["DV1 inválido (esperado: 8, encontrado: 7)"]
    );
    assert!(matches!(verdict.explanation, Some(ExplanationView::Full(_))));
    assert_eq!(
        record.validation.unwrap()["erros"][0],
        "DV1 inválido (esperado: 8, encontrado: 7)"
    );
}

#[actix_rt::test]
async fn failed_analysis_keeps_error() {
    let service = AnalysisService::new(test_pool().await);
    let id = service.create_analysis(&new_analysis(None)).await.unwrap();

    service
        .mark_failed(&id, "Erro ao extrair texto: falhou")
        .await
        .unwrap();

    let record = service.get_analysis(&id).await.unwrap().unwrap();
    assert_eq!(record.status, AnalysisStatus::Failed);
    assert_eq!(
        record.error_message.as_deref(),
        Some("Erro ao extrair texto: falhou")
    );
    assert!(record.failed_at.is_some());
}

#[actix_rt::test]
async fn history_is_paginated_newest_first() {
    let service = AnalysisService::new(test_pool().await);
    let mut ids = Vec::new();
    for _ in 0..3 {
        ids.push(
            service
                .create_analysis(&new_analysis(Some("user-1")))
                .await
                .unwrap(),
        );
    }
    service
        .create_analysis(&new_analysis(Some("user-2")))
        .await
        .unwrap();

    assert_eq!(service.count_by_user("user-1").await.unwrap(), 3);

    let page = service.list_by_user("user-1", 2, 0).await.unwrap();
    assert_eq!(
        page.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
        vec![ids[2].as_str(), ids[1].as_str()]
    );
    let rest = service.list_by_user("user-1", 2, 2).await.unwrap();
    assert_eq!(rest.len(), 1);
    assert_eq!(rest[0].id, ids[0]);
}

#[actix_rt::test]
async fn genuine_boleto_verdict_has_no_reasons() {
    let (outcome, _) = fake_pipeline(itau_text()).run(b"imagem").await.unwrap();

    assert!(!outcome.verdict.is_fraudulent);
    assert!(outcome.verdict.methods.is_empty());
    assert!(outcome.verdict.reasons.is_empty());
    assert_eq!(outcome.verdict.score, 4);
    assert_eq!(outcome.text, itau_text());
}

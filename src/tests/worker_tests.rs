//! tests/worker_tests.rs

use std::{sync::Arc, time::Duration};

use sqlx::{Pool, Sqlite};
use tokio::sync::watch;

use crate::models::{analysis_model::AnalysisStatus, job_model::JobPayload};
use crate::services::{
    analysis_service::AnalysisService, fraud_service::ScorecardModel,
    pipeline_service::AnalysisPipeline, queue_service::JobQueue, worker_service::Worker,
};
use crate::tests::{fake_pipeline, itau_text, test_pool, FailingExtractor};

async fn setup(pipeline: AnalysisPipeline) -> (JobQueue, AnalysisService, Worker, String) {
    setup_on(test_pool().await, pipeline).await
}

async fn setup_on(
    pool: Pool<Sqlite>,
    pipeline: AnalysisPipeline,
) -> (JobQueue, AnalysisService, Worker, String) {
    let queue = JobQueue::new(pool.clone());
    let analyses = AnalysisService::new(pool);
    let id = analyses
        .create_analysis(&crate::models::analysis_model::NewAnalysis {
            file_type: "image/png".to_string(),
            file_size: 6,
            file_name: None,
            user_id: None,
            ip_address: Some("127.0.0.1".to_string()),
        })
        .await
        .unwrap();
    let worker = Worker::new(
        queue.clone(),
        analyses.clone(),
        pipeline,
        2,
        Duration::from_millis(50),
    );
    (queue, analyses, worker, id)
}

fn payload(id: &str) -> JobPayload {
    JobPayload {
        analysis_id: id.to_string(),
        file: b"imagem".to_vec(),
        file_type: "image/png".to_string(),
        user_id: None,
        is_authenticated: false,
    }
}

#[test]
fn payload_uses_base64_on_the_wire() {
    let json = serde_json::to_value(payload("abc")).unwrap();
    assert_eq!(json["analise_id"], "abc");
    assert_eq!(json["file_base64"], "aW1hZ2Vt");

    let back: JobPayload = serde_json::from_value(json).unwrap();
    assert_eq!(back.file, b"imagem");
}

#[actix_rt::test]
async fn queue_claims_oldest_first() {
    let (queue, _, _, id) = setup(fake_pipeline(itau_text())).await;
    let first = queue.enqueue(&payload(&id)).await.unwrap();
    let second = queue.enqueue(&payload("outra")).await.unwrap();

    assert_eq!(queue.claim_next().await.unwrap().unwrap().id, first);
    assert_eq!(queue.claim_next().await.unwrap().unwrap().id, second);
    assert!(queue.claim_next().await.unwrap().is_none());

    // Lo que quedó "running" vuelve a la cola
    assert_eq!(queue.requeue_stale().await.unwrap(), 2);
    assert_eq!(queue.pending().await.unwrap(), 2);

    queue.complete(first).await.unwrap();
    assert_eq!(queue.pending().await.unwrap(), 1);
}

#[actix_rt::test]
async fn processed_job_completes_analysis() {
    let (queue, analyses, worker, id) = setup(fake_pipeline(itau_text())).await;
    queue.enqueue(&payload(&id)).await.unwrap();

    let job = queue.claim_next().await.unwrap().unwrap();
    worker.process_job(job).await;

    let record = analyses.get_analysis(&id).await.unwrap().unwrap();
    assert_eq!(record.status, AnalysisStatus::Completed);
    assert!(!record.verdict.unwrap().is_fraudulent);
    assert_eq!(queue.pending().await.unwrap(), 0);
}

#[actix_rt::test]
async fn ocr_failure_marks_analysis_failed() {
    let pipeline = AnalysisPipeline::new(
        Arc::new(FailingExtractor),
        Arc::new(ScorecardModel::default()),
    );
    let (queue, analyses, worker, id) = setup(pipeline).await;
    queue.enqueue(&payload(&id)).await.unwrap();

    let job = queue.claim_next().await.unwrap().unwrap();
    worker.process_job(job).await;

    let record = analyses.get_analysis(&id).await.unwrap().unwrap();
    assert_eq!(record.status, AnalysisStatus::Failed);
    assert!(record
        .error_message
        .unwrap()
        .starts_with("Erro ao extrair texto"));
}

#[actix_rt::test]
async fn processing_mark_error_marks_analysis_failed() {
    let pool = test_pool().await;
    // Solo se bloquea el paso a "processing"; "failed" sigue permitido
    sqlx::query(
        r#"
        CREATE TRIGGER bloquear_processing BEFORE UPDATE OF status ON analyses
        WHEN NEW.status = 'processing'
        BEGIN
            SELECT RAISE(ABORT, 'estado bloqueado');
        END
        "#,
    )
    .execute(&pool)
    .await
    .unwrap();

    let (_, analyses, worker, id) = setup_on(pool, fake_pipeline(itau_text())).await;
    let result = worker.process_payload(&payload(&id)).await;
    assert!(result.is_err());

    let record = analyses.get_analysis(&id).await.unwrap().unwrap();
    assert_eq!(record.status, AnalysisStatus::Failed);
    assert!(record.error_message.unwrap().contains("estado bloqueado"));
}

#[actix_rt::test]
async fn run_loop_processes_queue_and_stops() {
    let (queue, analyses, worker, id) = setup(fake_pipeline(itau_text())).await;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(worker.run(shutdown_rx));

    queue.enqueue(&payload(&id)).await.unwrap();

    let mut status = AnalysisStatus::Processing;
    for _ in 0..100 {
        status = analyses.get_analysis(&id).await.unwrap().unwrap().status;
        if status != AnalysisStatus::Processing {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(status, AnalysisStatus::Completed);

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("el worker debe detenerse")
        .unwrap();
}

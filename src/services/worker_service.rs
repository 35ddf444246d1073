//! services/worker_service.rs
//! Worker en proceso: reclama trabajos de la cola y corre el pipeline.

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use tokio::sync::{watch, Semaphore};

use crate::models::job_model::{JobPayload, QueuedJob};
use crate::services::{
    analysis_service::AnalysisService, pipeline_service::AnalysisPipeline,
    queue_service::JobQueue,
};

#[derive(Clone)]
pub struct Worker {
    queue: JobQueue,
    analyses: AnalysisService,
    pipeline: AnalysisPipeline,
    concurrency: usize,
    poll_interval: Duration,
}

impl Worker {
    pub fn new(
        queue: JobQueue,
        analyses: AnalysisService,
        pipeline: AnalysisPipeline,
        concurrency: usize,
        poll_interval: Duration,
    ) -> Self {
        Self {
            queue,
            analyses,
            pipeline,
            concurrency: concurrency.max(1),
            poll_interval,
        }
    }

    /// Corre hasta que `shutdown` pase a `true`. Un trabajo fallido nunca
    /// detiene el bucle.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        log::info!("Worker iniciado ({} trabajos simultáneos)", self.concurrency);
        let semaphore = Arc::new(Semaphore::new(self.concurrency));

        loop {
            if *shutdown.borrow() {
                break;
            }

            let permit = tokio::select! {
                permit = semaphore.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
            };

            match self.queue.claim_next().await {
                Ok(Some(job)) => {
                    let worker = self.clone();
                    tokio::spawn(async move {
                        worker.process_job(job).await;
                        drop(permit);
                    });
                }
                Ok(None) => {
                    drop(permit);
                    tokio::select! {
                        _ = self.queue.wait_for_work(self.poll_interval) => {}
                        changed = shutdown.changed() => {
                            if changed.is_err() {
                                break;
                            }
                        }
                    }
                }
                Err(e) => {
                    drop(permit);
                    log::error!("Error leyendo la cola: {:#}", e);
                    tokio::select! {
                        _ = tokio::time::sleep(self.poll_interval) => {}
                        changed = shutdown.changed() => {
                            if changed.is_err() {
                                break;
                            }
                        }
                    }
                }
            }
        }

        // Esperar a que terminen los trabajos en curso
        let _ = semaphore.acquire_many(self.concurrency as u32).await;
        log::info!("Worker detenido");
    }

    pub async fn process_job(&self, job: QueuedJob) {
        log::info!("[JOB {}] Iniciando análisis {}", job.id, job.analysis_id);

        let result = match serde_json::from_str::<JobPayload>(&job.payload) {
            Ok(payload) => self.process_payload(&payload).await,
            Err(e) => {
                let message = format!("Trabajo inválido: {}", e);
                self.fail(&job.analysis_id, &message).await;
                Err(anyhow::anyhow!(message))
            }
        };

        if let Err(e) = &result {
            log::error!("[JOB {}] Error: {:#}", job.id, e);
        }
        if let Err(e) = self.queue.complete(job.id).await {
            log::error!("[JOB {}] No se pudo cerrar el trabajo: {:#}", job.id, e);
        }
    }

    /// Procesa un archivo y deja el análisis en "completed" o "failed".
    pub async fn process_payload(&self, payload: &JobPayload) -> Result<()> {
        let id = &payload.analysis_id;

        let outcome = async {
            self.analyses.mark_processing(id).await?;
            let (outcome, elapsed) = self.pipeline.run(&payload.file).await?;
            let completed = outcome.into_completed(elapsed)?;
            self.analyses
                .mark_completed(id, &completed)
                .await
                .context("No se pudo guardar el resultado")
        }
        .await;

        match outcome {
            Ok(()) => {
                log::info!("[JOB] {} concluido", id);
                Ok(())
            }
            Err(e) => {
                self.fail(id, &format!("{:#}", e)).await;
                Err(e)
            }
        }
    }

    async fn fail(&self, analysis_id: &str, message: &str) {
        if let Err(e) = self.analyses.mark_failed(analysis_id, message).await {
            log::error!(
                "No se pudo marcar el análisis {} como fallido: {:#}",
                analysis_id,
                e
            );
        }
    }
}

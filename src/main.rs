use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::{Context, Result};
use dotenv::dotenv;
use tokio::sync::watch;

use crate::config::app_config::AppConfig;
use crate::logger::init_logger;
use crate::services::{
    access_service::AccessService, analysis_service::AnalysisService,
    fraud_service::ScorecardModel, ocr_service::OcrService, pipeline_service::AnalysisPipeline,
    queue_service::JobQueue, token_service::TokenService, user_service::UserService,
    worker_service::Worker,
};

mod app;
mod config;
mod database;
mod errors;
mod handlers;
mod logger;
mod middleware;
mod models;
mod services;

#[cfg(test)]
mod tests;

fn build_cors(config: &AppConfig) -> Cors {
    config
        .allowed_origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allow_any_method()
        .allow_any_header()
        .supports_credentials()
        .max_age(3600)
}

#[actix_web::main]
async fn main() -> Result<()> {
    dotenv().ok(); // Cargar .env al inicio
    init_logger();

    let config = AppConfig::from_env().context("Configuración inválida")?;
    log::info!("Ambiente: {}", config.environment);

    // Conectarnos a la DB y migrar
    let db_pool = database::setup_database(&config.database_url).await?;
    database::run_migrations(&db_pool).await?;

    // Pipeline: OCR + modelo
    let ocr = OcrService::new(&config).context("No se pudo inicializar OcrService")?;
    let model = ScorecardModel::load(&config.model_path)?;
    let pipeline = AnalysisPipeline::new(Arc::new(ocr), Arc::new(model));

    let analysis_service = AnalysisService::new(db_pool.clone());
    let user_service = UserService::new(db_pool.clone(), config.bcrypt_cost);
    let access_service = AccessService::new(db_pool.clone(), config.anon_daily_limit);
    let token_service = TokenService::new(&config.jwt_secret, config.jwt_expire_minutes);
    let job_queue = JobQueue::new(db_pool.clone());
    job_queue.requeue_stale().await?;

    // Worker en segundo plano
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker = Worker::new(
        job_queue.clone(),
        analysis_service.clone(),
        pipeline.clone(),
        config.worker_concurrency,
        config.worker_poll_interval,
    );
    let worker_handle = tokio::spawn(worker.run(shutdown_rx));

    // Levantar servidor
    let bind_addr = (config.api_host.clone(), config.api_port);
    log::info!("Levantando servidor en {}:{}", bind_addr.0, bind_addr.1);
    let server_config = config.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(build_cors(&server_config))
            .wrap(Logger::default())
            .app_data(web::Data::new(server_config.clone()))
            .app_data(web::Data::new(pipeline.clone()))
            .app_data(web::Data::new(analysis_service.clone()))
            .app_data(web::Data::new(user_service.clone()))
            .app_data(web::Data::new(access_service.clone()))
            .app_data(web::Data::new(token_service.clone()))
            .app_data(web::Data::new(job_queue.clone()))
            .configure(app::init_app)
    })
    .bind(bind_addr)?
    .run()
    .await?;

    // El servidor terminó: detener el worker
    let _ = shutdown_tx.send(true);
    if let Err(e) = worker_handle.await {
        log::error!("El worker terminó con error: {}", e);
    }
    log::info!("Servicio detenido");
    Ok(())
}

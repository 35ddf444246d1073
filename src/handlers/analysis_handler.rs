//! handlers/analysis_handler.rs
use actix_multipart::Multipart;
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use futures_util::StreamExt;

use crate::config::app_config::AppConfig;
use crate::errors::ApiError;
use crate::middleware::{auth_middleware::OptionalAuth, client_ip::client_ip};
use crate::models::{
    analysis_model::{
        AnalysisStatus, AnalysisView, ExplanationView, HistoryQuery, HistoryResponse, NewAnalysis,
        TestOcrResponse, UploadResponse,
    },
    job_model::JobPayload,
};
use crate::services::{
    access_service::AccessService, analysis_service::AnalysisService,
    pipeline_service::AnalysisPipeline, queue_service::JobQueue, user_service::UserService,
};

pub const ALLOWED_TYPES: [&str; 3] = ["image/jpeg", "image/png", "application/pdf"];
const DEFAULT_HISTORY_LIMIT: i64 = 10;
const MAX_HISTORY_LIMIT: i64 = 100;

/// Archivo recibido en el campo multipart "file"
#[derive(Debug)]
pub struct Upload {
    pub bytes: Vec<u8>,
    pub file_name: Option<String>,
    pub content_type: String,
}

/// Lee el campo "file" validando tipo y tamaño mientras llega.
pub async fn read_upload(mut payload: Multipart, max_bytes: usize) -> Result<Upload, ApiError> {
    let too_large = || {
        ApiError::BadRequest(format!(
            "Arquivo muito grande. Máximo: {}MB",
            max_bytes / (1024 * 1024)
        ))
    };

    while let Some(item) = payload.next().await {
        let mut field =
            item.map_err(|e| ApiError::BadRequest(format!("Erro ao ler upload: {}", e)))?;
        if field.content_disposition().get_name() != Some("file") {
            continue;
        }

        let content_type = field
            .content_type()
            .map(|mime| mime.essence_str().to_string())
            .unwrap_or_default();
        if !ALLOWED_TYPES.contains(&content_type.as_str()) {
            return Err(ApiError::BadRequest(format!(
                "Tipo de arquivo inválido. Aceitos: {}",
                ALLOWED_TYPES.join(", ")
            )));
        }
        let file_name = field
            .content_disposition()
            .get_filename()
            .map(str::to_string);

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk =
                chunk.map_err(|e| ApiError::BadRequest(format!("Erro ao ler upload: {}", e)))?;
            if bytes.len() + chunk.len() > max_bytes {
                return Err(too_large());
            }
            bytes.extend_from_slice(&chunk);
        }

        if bytes.is_empty() {
            return Err(ApiError::BadRequest("Arquivo vazio".into()));
        }
        return Ok(Upload {
            bytes,
            file_name,
            content_type,
        });
    }

    Err(ApiError::BadRequest("Arquivo não enviado".into()))
}

/// POST /api/analisar
#[allow(clippy::too_many_arguments)]
pub async fn upload_endpoint(
    req: HttpRequest,
    payload: Multipart,
    auth: OptionalAuth,
    config: web::Data<AppConfig>,
    access: web::Data<AccessService>,
    analyses: web::Data<AnalysisService>,
    queue: web::Data<JobQueue>,
    users: web::Data<UserService>,
) -> Result<HttpResponse, ApiError> {
    let ip = client_ip(&req, config.trust_proxy_headers);
    let user_id = auth.user_id().map(str::to_string);
    let is_authenticated = user_id.is_some();

    let upload = read_upload(payload, config.max_upload_bytes).await?;

    // La cuota se consume solo con un archivo válido
    let remaining = if is_authenticated {
        None
    } else {
        Some(access.try_consume(&ip, Utc::now()).await?)
    };

    let file_size = upload.bytes.len() as i64;
    log::info!(
        "Recibido archivo: {:?} ({} bytes)",
        upload.file_name,
        file_size
    );

    let internal = |e: anyhow::Error| {
        ApiError::internal("Erro interno ao processar arquivo", format!("{:#}", e))
    };

    let id = analyses
        .create_analysis(&NewAnalysis {
            file_type: upload.content_type.clone(),
            file_size,
            file_name: upload.file_name.clone(),
            user_id: user_id.clone(),
            ip_address: if is_authenticated { None } else { Some(ip.clone()) },
        })
        .await
        .map_err(internal)?;

    let job = JobPayload {
        analysis_id: id.clone(),
        file: upload.bytes,
        file_type: upload.content_type.clone(),
        user_id: user_id.clone(),
        is_authenticated,
    };
    queue.enqueue(&job).await.map_err(internal)?;

    if let Some(user_id) = &user_id {
        users.increment_analyses(user_id).await.map_err(internal)?;
    }

    Ok(HttpResponse::Ok().json(UploadResponse {
        id,
        status: AnalysisStatus::Processing,
        message: "Boleto recebido e adicionado à fila de processamento".to_string(),
        file_name: upload.file_name,
        file_size,
        file_type: upload.content_type,
        is_authenticated,
        analises_restantes: remaining,
        mensagem_acesso: remaining
            .map(|_| "Faça login para análises ilimitadas e histórico completo!".to_string()),
    }))
}

/// GET /api/analise/{id}
pub async fn get_analysis_endpoint(
    path: web::Path<String>,
    auth: OptionalAuth,
    analyses: web::Data<AnalysisService>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let mut record = analyses
        .get_analysis(&id)
        .await
        .map_err(|e| ApiError::internal("Erro ao consultar análise", format!("{:#}", e)))?
        .ok_or_else(|| ApiError::NotFound("Análise não encontrada".into()))?;

    if let Some(user_id) = auth.user_id() {
        if record.user_id.as_deref() != Some(user_id) {
            return Err(ApiError::Forbidden("Acesso negado a esta análise".into()));
        }
        return Ok(HttpResponse::Ok().json(AnalysisView {
            record,
            acesso_limitado: None,
            mensagem: None,
        }));
    }

    // Anónimo: sin explicación detallada
    if let Some(verdict) = record.verdict.as_mut() {
        if verdict.explanation.is_some() {
            verdict.explanation = Some(ExplanationView::Restricted {
                mensagem: "Faça login para ver explicação detalhada!".to_string(),
            });
        }
    }
    Ok(HttpResponse::Ok().json(AnalysisView {
        record,
        acesso_limitado: Some(true),
        mensagem: Some("Resultados básicos. Faça login para ver detalhes completos!".to_string()),
    }))
}

/// GET /api/historico
pub async fn history_endpoint(
    auth: OptionalAuth,
    query: web::Query<HistoryQuery>,
    analyses: web::Data<AnalysisService>,
) -> Result<HttpResponse, ApiError> {
    let user_id = auth.user_id().ok_or_else(|| {
        ApiError::Unauthorized("Autenticação necessária para acessar histórico".into())
    })?;

    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);
    let skip = query.skip.unwrap_or(0).max(0);

    let history_error =
        |e: anyhow::Error| ApiError::internal("Erro ao buscar histórico", format!("{:#}", e));
    let items = analyses
        .list_by_user(user_id, limit, skip)
        .await
        .map_err(history_error)?;
    let total = analyses.count_by_user(user_id).await.map_err(history_error)?;

    Ok(HttpResponse::Ok().json(HistoryResponse {
        total,
        analises: items,
        limit,
        skip,
    }))
}

/// POST /api/test-ocr
/// Corre el pipeline completo de forma síncrona.
#[allow(clippy::too_many_arguments)]
pub async fn test_ocr_endpoint(
    req: HttpRequest,
    payload: Multipart,
    auth: OptionalAuth,
    config: web::Data<AppConfig>,
    access: web::Data<AccessService>,
    pipeline: web::Data<AnalysisPipeline>,
    users: web::Data<UserService>,
) -> Result<HttpResponse, ApiError> {
    let ip = client_ip(&req, config.trust_proxy_headers);
    let user_id = auth.user_id().map(str::to_string);

    let upload = read_upload(payload, config.max_upload_bytes).await?;
    let remaining = match &user_id {
        Some(_) => None,
        None => Some(access.try_consume(&ip, Utc::now()).await?),
    };

    log::info!("Procesando: {:?}", upload.file_name);
    let (outcome, _) = pipeline
        .run(&upload.bytes)
        .await
        .map_err(|e| ApiError::internal("Erro", format!("{:#}", e)))?;

    let mut verdict = outcome.verdict;
    let response = match &user_id {
        Some(user_id) => {
            users
                .increment_analyses(user_id)
                .await
                .map_err(|e| ApiError::internal("Erro", format!("{:#}", e)))?;
            TestOcrResponse {
                success: true,
                dados_extraidos: outcome.extracted,
                resultado_final: verdict,
                is_authenticated: true,
                mensagem: None,
                analises_restantes: None,
                historico_disponivel: Some(true),
            }
        }
        None => {
            verdict.explanation = None;
            TestOcrResponse {
                success: true,
                dados_extraidos: outcome.extracted,
                resultado_final: verdict,
                is_authenticated: false,
                mensagem: Some(
                    "Faça login para ver explicação detalhada e histórico completo!".to_string(),
                ),
                analises_restantes: remaining,
                historico_disponivel: None,
            }
        }
    };

    log::info!("Análisis concluido: {:?}", upload.file_name);
    Ok(HttpResponse::Ok().json(response))
}

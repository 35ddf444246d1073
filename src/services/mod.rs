//! services/mod.rs
//! Módulo que agrupa distintos "servicios" o "capas de negocio" de la app.

pub mod access_service;
pub mod analysis_service;
pub mod explanation_service;
pub mod fraud_service;
pub mod ocr_service;
pub mod parser_service;
pub mod pipeline_service;
pub mod queue_service;
pub mod token_service;
pub mod user_service;
pub mod validation_service;
pub mod worker_service;

//! handlers/mod.rs
//! Módulo que agrupa los handlers HTTP (salud, autenticación, análisis).
pub mod analysis_handler;
pub mod auth_handler;
pub mod health_handler;

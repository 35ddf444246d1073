//! models/mod.rs
//! Módulo raíz para modelos/estructuras compartidas.

pub mod access_model;
pub mod analysis_model;
pub mod boleto_model;
pub mod explanation_model;
pub mod job_model;
pub mod prediction_model;
pub mod user_model;
pub mod validation_model;

//! middleware/mod.rs
//! Extractores de autenticación e IP del cliente.

pub mod auth_middleware;
pub mod client_ip;

//! logger.rs
//! Logger global con env_logger.

/// Sin RUST_LOG: "info" para el servicio y solo avisos de sqlx, que
/// registra cada consulta del worker.
const DEFAULT_FILTER: &str = "info,sqlx=warn";

pub fn init_logger() {
    let filter = std::env::var("RUST_LOG")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_FILTER.to_string());

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter))
        .format_timestamp_secs()
        .format_module_path(false)
        .init();
}

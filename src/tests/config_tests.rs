//! tests/config_tests.rs

use std::collections::HashMap;
use std::time::Duration;

use crate::config::app_config::AppConfig;

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn defaults_without_environment() {
    let config = AppConfig::from_lookup(lookup(&[])).unwrap();

    assert_eq!(config.api_port, 8000);
    assert_eq!(config.api_host, "0.0.0.0");
    assert_eq!(config.database_url, "sqlite://data/boletos.db");
    assert_eq!(config.anon_daily_limit, 2);
    assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
    assert_eq!(config.allowed_origins.len(), 3);
    assert!(!config.trust_proxy_headers);
    assert_eq!(config.environment, "development");
}

#[test]
fn values_are_read_from_environment() {
    let config = AppConfig::from_lookup(lookup(&[
        ("API_PORT", "9000"),
        ("ALLOWED_ORIGINS", "https://a.example, https://b.example ,"),
        ("OCR_TIMEOUT_SECS", "30"),
        ("TRUST_PROXY_HEADERS", "true"),
        ("JWT_SECRET", "s3cr3t"),
    ]))
    .unwrap();

    assert_eq!(config.api_port, 9000);
    assert_eq!(
        config.allowed_origins,
        vec!["https://a.example", "https://b.example"]
    );
    assert_eq!(config.ocr_timeout, Duration::from_secs(30));
    assert!(config.trust_proxy_headers);
    assert_eq!(config.jwt_secret, "s3cr3t");
}

#[test]
fn invalid_number_names_the_variable() {
    let err = AppConfig::from_lookup(lookup(&[("API_PORT", "oito mil")])).unwrap_err();
    assert!(err.to_string().contains("API_PORT"));
}

#[test]
fn production_requires_jwt_secret() {
    let err = AppConfig::from_lookup(lookup(&[("ENVIRONMENT", "production")])).unwrap_err();
    assert!(err.to_string().contains("JWT_SECRET"));

    let config = AppConfig::from_lookup(lookup(&[
        ("ENVIRONMENT", "production"),
        ("JWT_SECRET", "s3cr3t"),
    ]))
    .unwrap();
    assert_eq!(config.environment, "production");
}

#[test]
fn bcrypt_cost_is_bounded() {
    assert!(AppConfig::from_lookup(lookup(&[("BCRYPT_COST", "3")])).is_err());
    assert!(AppConfig::from_lookup(lookup(&[("WORKER_CONCURRENCY", "0")])).is_err());
}

#[test]
fn durations_out_of_range_are_rejected() {
    for (key, raw) in [
        ("JWT_EXPIRE_MINUTES", "0"),
        ("JWT_EXPIRE_MINUTES", "-60"),
        ("JWT_EXPIRE_MINUTES", "9223372036854775807"),
        ("WORKER_POLL_SECS", "0"),
        ("OCR_TIMEOUT_SECS", "0"),
        ("OCR_TIMEOUT_SECS", "86400"),
    ] {
        let err = AppConfig::from_lookup(lookup(&[(key, raw)])).unwrap_err();
        assert!(
            err.to_string().contains(key),
            "{}={} -> {}",
            key,
            raw,
            err
        );
    }

    let config = AppConfig::from_lookup(lookup(&[
        ("JWT_EXPIRE_MINUTES", "525600"),
        ("WORKER_POLL_SECS", "1"),
    ]))
    .unwrap();
    assert_eq!(config.jwt_expire_minutes, 525_600);
    assert_eq!(config.worker_poll_interval, Duration::from_secs(1));
}

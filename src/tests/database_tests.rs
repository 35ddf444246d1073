//! tests/database_tests.rs

use crate::database::{parse_timestamp, run_migrations, setup_database, timestamp};

#[actix_rt::test]
async fn database_file_and_folder_are_created() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data").join("boletos.db");
    let url = format!("sqlite://{}", path.display());

    let pool = setup_database(&url).await.unwrap();
    run_migrations(&pool).await.unwrap();
    assert!(path.exists());

    let (tables,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' \
         AND name IN ('users', 'anonymous_access', 'analyses', 'jobs')",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(tables, 4);
    pool.close().await;
}

#[test]
fn timestamps_are_utc_rfc3339() {
    let at = parse_timestamp("2025-03-01T12:30:00.250Z").unwrap();
    assert_eq!(timestamp(at), "2025-03-01T12:30:00.250Z");
    assert_eq!(
        timestamp(parse_timestamp("2025-03-01T09:30:00-03:00").unwrap()),
        "2025-03-01T12:30:00.000Z"
    );
    assert!(parse_timestamp("01/03/2025").is_err());
}

#[actix_rt::test]
async fn memory_database_needs_no_folder() {
    let pool = setup_database("sqlite::memory:").await.unwrap();
    run_migrations(&pool).await.unwrap();
    let (one,): (i64,) = sqlx::query_as("SELECT 1").fetch_one(&pool).await.unwrap();
    assert_eq!(one, 1);
    pool.close().await;
}

//! app.rs
use crate::handlers::{analysis_handler, auth_handler, health_handler};
use actix_web::web;

pub fn init_app(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(health_handler::root_endpoint))
        .route("/health", web::get().to(health_handler::health_endpoint))
        .service(
            web::scope("/auth")
                .route("/register", web::post().to(auth_handler::register_endpoint))
                .route("/login", web::post().to(auth_handler::login_endpoint))
                .route("/me", web::get().to(auth_handler::me_endpoint))
                .route(
                    "/quick-access",
                    web::post().to(auth_handler::quick_access_endpoint),
                )
                .route(
                    "/quick-access/register",
                    web::post().to(auth_handler::quick_access_register_endpoint),
                ),
        )
        .service(
            web::scope("/api")
                .route(
                    "/analisar",
                    web::post().to(analysis_handler::upload_endpoint),
                )
                .route(
                    "/analise/{id}",
                    web::get().to(analysis_handler::get_analysis_endpoint),
                )
                .route(
                    "/historico",
                    web::get().to(analysis_handler::history_endpoint),
                )
                .route(
                    "/test-ocr",
                    web::post().to(analysis_handler::test_ocr_endpoint),
                ),
        );
}

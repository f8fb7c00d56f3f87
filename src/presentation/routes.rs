use crate::application::auth_service::AuthService;
use crate::data::user_repository::InMemoryUserRepository;
use crate::presentation::auth::{get_profile, login, register, update_profile};
use crate::presentation::handlers::{
    create_task, delete_task, get_task, health_check, json_error_handler, list_tasks,
    query_error_handler, update_task,
};
use crate::presentation::middleware::JwtAuthMiddleware;
use actix_cors::Cors;
use actix_web::{Scope, http::header, web};
use std::sync::Arc;

pub const ROUTES_SUMMARY: &str = "GET /api/health, POST /api/auth/register, POST /api/auth/login, \
GET|PUT /api/auth/profile, POST|GET /api/tasks, GET|PUT|DELETE /api/tasks/{id}";

/// The `/api` scope. Profile and task routes sit behind `JwtAuthMiddleware`.
pub fn api_scope(auth_service: Arc<AuthService<InMemoryUserRepository>>) -> Scope {
    web::scope("/api")
        .app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .route("/health", web::get().to(health_check))
        .service(
            web::scope("/auth")
                .route("/register", web::post().to(register))
                .route("/login", web::post().to(login))
                .service(
                    web::resource("/profile")
                        .wrap(JwtAuthMiddleware::new(auth_service.clone()))
                        .route(web::get().to(get_profile))
                        .route(web::put().to(update_profile)),
                ),
        )
        .service(
            web::scope("/tasks")
                .wrap(JwtAuthMiddleware::new(auth_service))
                .service(
                    web::resource("")
                        .route(web::post().to(create_task))
                        .route(web::get().to(list_tasks)),
                )
                .service(
                    web::resource("/{id}")
                        .route(web::get().to(get_task))
                        .route(web::put().to(update_task))
                        .route(web::delete().to(delete_task)),
                ),
        )
}

/// CORS for the browser client; any origin when `client_url` is unset.
pub fn cors(client_url: Option<&str>) -> Cors {
    let cors = match client_url {
        Some(origin) => Cors::default().allowed_origin(origin),
        None => Cors::default().allow_any_origin(),
    };
    cors.allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers(vec![
            header::HeaderName::from_static("x-request-id"),
            header::HeaderName::from_static("x-response-time"),
        ])
        .max_age(3600)
}

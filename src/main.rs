use actix_web::{App, HttpServer, web};
use std::sync::Arc;
use task_manager_api::application::auth_service::AuthService;
use task_manager_api::application::task_service::TaskService;
use task_manager_api::data::task_repository::InMemoryTaskRepository;
use task_manager_api::data::user_repository::InMemoryUserRepository;
use task_manager_api::infrastructure::config::AppConfig;
use task_manager_api::infrastructure::logging::init_logging;
use task_manager_api::presentation::handlers::AppState;
use task_manager_api::presentation::middleware::RequestLogMiddleware;
use task_manager_api::presentation::routes::{ROUTES_SUMMARY, api_scope, cors};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    init_logging();
    info!(token_ttl_secs = config.token_ttl_secs, "Configuration loaded");

    let auth_service = Arc::new(
        AuthService::new(
            Arc::new(InMemoryUserRepository::new()),
            config.jwt_secret.clone(),
        )
        .with_token_ttl(config.token_ttl_secs),
    );
    let task_service = TaskService::new(Arc::new(InMemoryTaskRepository::new()));

    let state = web::Data::new(AppState {
        auth_service: auth_service.clone(),
        task_service,
    });

    let client_url = config.client_url.clone();
    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(cors(client_url.as_deref()))
            .wrap(RequestLogMiddleware)
            .service(api_scope(auth_service.clone()))
    });

    let (host, port) = config.bind_addr();
    let server = server.bind((host.as_str(), port))?;
    info!(address = %format!("{}:{}", host, port), routes = ROUTES_SUMMARY, "Starting HTTP server");

    server.run().await?;
    Ok(())
}

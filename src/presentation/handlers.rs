use crate::application::auth_service::AuthService;
use crate::application::task_service::TaskService;
use crate::data::task_repository::InMemoryTaskRepository;
use crate::data::user_repository::InMemoryUserRepository;
use crate::domain::error::DomainError;
use crate::domain::task::{CreateTask, Task, TaskFilter, UpdateTask};
use crate::presentation::middleware::AuthenticatedUser;
use actix_web::error::{JsonPayloadError, QueryPayloadError};
use actix_web::http::StatusCode;
use actix_web::{FromRequest, HttpMessage, HttpRequest, HttpResponse, ResponseError, web};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::future::{Ready, ready};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

pub struct AppState {
    pub auth_service: Arc<AuthService<InMemoryUserRepository>>,
    pub task_service: TaskService<InMemoryTaskRepository>,
}

// Uniform error envelope
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    message: String,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    DuplicateResource(String),
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("{0}")]
    Unauthenticated(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_)
            | ApiError::DuplicateResource(_)
            | ApiError::InvalidCredentials => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let error_msg = self.to_string();

        let message = match self {
            ApiError::Internal(_) => {
                // Details stay in the log
                error!(error = %error_msg, status = %status, "Internal error");
                "Internal server error".to_string()
            }
            _ => {
                warn!(error = %error_msg, status = %status, "Request rejected");
                error_msg
            }
        };

        HttpResponse::build(status).json(ErrorResponse {
            success: false,
            message,
        })
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => ApiError::Validation(msg),
            DomainError::DuplicateResource(msg) => ApiError::DuplicateResource(msg),
            DomainError::InvalidCredentials => ApiError::InvalidCredentials,
            DomainError::Unauthenticated(msg) => ApiError::Unauthenticated(msg),
            DomainError::Forbidden(msg) => ApiError::Forbidden(msg),
            DomainError::NotFound(msg) => ApiError::NotFound(msg),
            DomainError::Internal(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<DomainError>() {
            Ok(domain) => ApiError::from(domain),
            Err(other) => ApiError::Internal(other.to_string()),
        }
    }
}

pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::Validation(format!("Invalid request body: {}", err)).into()
}

pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::Validation(format!("Invalid query string: {}", err)).into()
}

// Identity attached by JwtAuthMiddleware
impl FromRequest for AuthenticatedUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        let user = req.extensions().get::<AuthenticatedUser>().cloned();
        ready(user.ok_or_else(|| ApiError::Unauthenticated("Not authorized".to_string())))
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    timestamp: String,
}

#[derive(Serialize, Deserialize)]
pub struct TaskResponse {
    pub success: bool,
    pub task: Task,
}

#[derive(Serialize, Deserialize)]
pub struct TaskListResponse {
    pub success: bool,
    pub count: usize,
    pub tasks: Vec<Task>,
}

#[derive(Serialize, Deserialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

/// Raw list query; empty values mean "no filter".
#[derive(Debug, Default, Deserialize)]
pub struct TaskListParams {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub search: Option<String>,
}

#[instrument]
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

#[instrument(skip(state, req), fields(user_id = %user.user_id))]
pub async fn create_task(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    req: web::Json<CreateTask>,
) -> Result<HttpResponse, ApiError> {
    let task = state
        .task_service
        .create_task(&user.user_id, req.into_inner())
        .await?;
    info!(task_id = %task.id, "Task created");
    Ok(HttpResponse::Created().json(TaskResponse {
        success: true,
        task,
    }))
}

#[instrument(skip(state), fields(user_id = %user.user_id))]
pub async fn list_tasks(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    query: web::Query<TaskListParams>,
) -> Result<HttpResponse, ApiError> {
    let filter = TaskFilter::parse(
        query.status.as_deref(),
        query.priority.as_deref(),
        query.search.as_deref(),
    )?;
    let tasks = state.task_service.list_tasks(&user.user_id, &filter).await?;
    Ok(HttpResponse::Ok().json(TaskListResponse {
        success: true,
        count: tasks.len(),
        tasks,
    }))
}

#[instrument(skip(state), fields(user_id = %user.user_id, task_id = %*path))]
pub async fn get_task(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let task = state
        .task_service
        .get_task(&path.into_inner(), &user.user_id)
        .await?;
    Ok(HttpResponse::Ok().json(TaskResponse {
        success: true,
        task,
    }))
}

#[instrument(skip(state, req), fields(user_id = %user.user_id, task_id = %*path))]
pub async fn update_task(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    req: web::Json<UpdateTask>,
) -> Result<HttpResponse, ApiError> {
    let task = state
        .task_service
        .update_task(&path.into_inner(), &user.user_id, req.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(TaskResponse {
        success: true,
        task,
    }))
}

#[instrument(skip(state), fields(user_id = %user.user_id, task_id = %*path))]
pub async fn delete_task(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    state
        .task_service
        .delete_task(&path.into_inner(), &user.user_id)
        .await?;
    Ok(HttpResponse::Ok().json(MessageResponse {
        success: true,
        message: "Task deleted successfully".to_string(),
    }))
}

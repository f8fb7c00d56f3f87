use crate::domain::user::{CreateUser, LoginRequest, UpdateProfile, UserProfile};
use crate::presentation::handlers::{ApiError, AppState};
use crate::presentation::middleware::AuthenticatedUser;
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

#[derive(Serialize, Deserialize)]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    pub user: UserProfile,
}

#[derive(Serialize, Deserialize)]
pub struct ProfileResponse {
    pub success: bool,
    pub user: UserProfile,
}

#[instrument(skip(state, req), fields(email = %req.email))]
pub async fn register(
    state: web::Data<AppState>,
    req: web::Json<CreateUser>,
) -> Result<HttpResponse, ApiError> {
    info!("Registration request received");

    let session = state.auth_service.register_user(req.into_inner()).await?;

    Ok(HttpResponse::Created().json(AuthResponse {
        success: true,
        token: session.token,
        user: session.user.profile(),
    }))
}

#[instrument(skip(state, req), fields(email = %req.email))]
pub async fn login(
    state: web::Data<AppState>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    info!("Login request received");

    let session = state.auth_service.login(req.into_inner()).await?;

    Ok(HttpResponse::Ok().json(AuthResponse {
        success: true,
        token: session.token,
        user: session.user.profile(),
    }))
}

#[instrument(skip(state), fields(user_id = %user.user_id))]
pub async fn get_profile(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let user = state.auth_service.get_profile(&user.user_id).await?;

    Ok(HttpResponse::Ok().json(ProfileResponse {
        success: true,
        user: user.profile(),
    }))
}

#[instrument(skip(state, req), fields(user_id = %user.user_id))]
pub async fn update_profile(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    req: web::Json<UpdateProfile>,
) -> Result<HttpResponse, ApiError> {
    let user = state
        .auth_service
        .update_profile(&user.user_id, req.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(ProfileResponse {
        success: true,
        user: user.profile(),
    }))
}

use axum::{
    extract::State,
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    api::{ApiJson, MessageResponse},
    auth::{
        dto::{CheckAuthResponse, CredentialsRequest, PublicUser, RegisterResponse},
        extractors::{AuthUser, MaybeUser, SessionToken},
    },
    error::AppError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/check-auth", get(check_auth))
        .route(
            "/users",
            post(register).patch(update_user).delete(delete_user),
        )
        .route("/login", post(login))
        .route("/logout", post(logout))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

pub async fn check_auth(MaybeUser(user_id): MaybeUser) -> Json<CheckAuthResponse> {
    Json(CheckAuthResponse {
        is_authenticated: user_id.is_some(),
    })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CredentialsRequest>,
) -> Result<(HeaderMap, Json<RegisterResponse>), AppError> {
    let (user_id, session_id) = state.auth.register(&payload.email, &payload.password).await?;
    let headers = state.config.token_transport.issue(&session_id)?;
    Ok((headers, Json(RegisterResponse { user_id })))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<CredentialsRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .auth
        .update_profile(user_id, &payload.email, &payload.password)
        .await?;
    Ok(MessageResponse::new("User updated successfully"))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<(HeaderMap, Json<MessageResponse>), AppError> {
    state.auth.delete_account(user_id).await?;
    let headers = state.config.token_transport.clear()?;
    Ok((headers, MessageResponse::new("User deleted successfully")))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CredentialsRequest>,
) -> Result<(HeaderMap, Json<MessageResponse>), AppError> {
    let session_id = state
        .auth
        .login(&payload.email, &payload.password)
        .await?
        .ok_or(AppError::Authentication)?;
    let headers = state.config.token_transport.issue(&session_id)?;
    Ok((headers, MessageResponse::new("Logged in successfully")))
}

#[instrument(skip(state, token))]
pub async fn logout(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
) -> Result<(HeaderMap, Json<MessageResponse>), AppError> {
    state.auth.logout(&token).await?;
    info!("session closed");
    let headers = state.config.token_transport.clear()?;
    Ok((headers, MessageResponse::new("Logged out successfully")))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, AppError> {
    let user = state.auth.profile(user_id).await?;
    Ok(Json(PublicUser {
        id: user.id,
        email: user.email,
    }))
}

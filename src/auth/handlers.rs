use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{AuthResponse, LoginRequest, RegisterRequest},
    extractors::CurrentUser,
    identity::Identity,
    services,
};
use crate::{
    error::{ApiJson, AppResult},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let (user, token) = services::register(&state, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully",
            token,
            user,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let (user, token) = services::login(&state, payload).await?;
    Ok(Json(AuthResponse {
        message: "Login successful",
        token,
        user,
    }))
}

#[instrument(skip_all)]
pub async fn get_me(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
) -> AppResult<Json<Identity>> {
    Ok(Json(services::current_identity(&state, identity).await?))
}

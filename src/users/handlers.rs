use axum::{
    extract::State,
    routing::{delete, get},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{MessageResponse, UpdateProfileRequest},
    services,
};
use crate::{
    accounts::repo_types::Account,
    auth::{extractors::CurrentUser, identity::Identity, services::current_identity},
    error::{ApiJson, AppResult},
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/user/profile", get(get_profile).put(update_profile))
        .route("/user/delete", delete(delete_account))
}

#[instrument(skip_all)]
pub async fn get_profile(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
) -> AppResult<Json<Identity>> {
    Ok(Json(current_identity(&state, identity).await?))
}

#[instrument(skip_all)]
pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    ApiJson(payload): ApiJson<UpdateProfileRequest>,
) -> AppResult<Json<Account>> {
    Ok(Json(services::update_profile(&state, &identity, payload).await?))
}

#[instrument(skip_all)]
pub async fn delete_account(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
) -> AppResult<Json<MessageResponse>> {
    services::delete_account(&state, &identity).await?;
    Ok(Json(MessageResponse {
        message: "Account deleted successfully.",
    }))
}

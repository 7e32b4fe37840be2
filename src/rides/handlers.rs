use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{CreateRideRequest, RideListResponse, RideMessage, RideResponse},
    services,
};
use crate::{
    auth::extractors::CurrentUser,
    error::{ApiJson, AppResult},
    state::AppState,
};

pub fn ride_routes() -> Router<AppState> {
    Router::new()
        .route("/rides", get(list_rides).post(create_ride))
        .route("/rides/:id", get(get_ride))
        .route("/rides/:id/cancel", patch(cancel_ride))
}

#[instrument(skip(state, identity, payload))]
pub async fn create_ride(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    ApiJson(payload): ApiJson<CreateRideRequest>,
) -> AppResult<(StatusCode, Json<RideMessage>)> {
    let ride = services::create_ride(&state, &identity, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(RideMessage {
            message: "Ride requested successfully",
            ride,
        }),
    ))
}

#[instrument(skip_all)]
pub async fn list_rides(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
) -> AppResult<Json<RideListResponse>> {
    let rides = services::list_rides(&state, &identity).await?;
    Ok(Json(RideListResponse { rides }))
}

#[instrument(skip(state, identity))]
pub async fn get_ride(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<RideResponse>> {
    let id = services::parse_ride_id(&id)?;
    let ride = services::get_ride(&state, &identity, id).await?;
    Ok(Json(RideResponse { ride }))
}

#[instrument(skip(state, identity))]
pub async fn cancel_ride(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<RideMessage>> {
    let id = services::parse_ride_id(&id)?;
    let ride = services::cancel_ride(&state, &identity, id).await?;
    Ok(Json(RideMessage {
        message: "Ride cancelled successfully",
        ride,
    }))
}

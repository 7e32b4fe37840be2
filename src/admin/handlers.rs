use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    filter::FilterParams,
    dto::{
        AdminLoginResponse, AdminRideResponse, AdminRidesResponse, AnalyticsResponse,
        DashboardResponse,
    },
    services,
};
use crate::{
    auth::{dto::LoginRequest, extractors::AdminUser},
    error::AdminError,
    rides::{dto::UpdateStatusRequest, services as rides},
    state::AppState,
};

type AdminResult<T> = Result<Json<T>, AdminError>;

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/login", post(login))
        .route("/admin/dashboard", get(dashboard))
        .route("/admin/all-rides", get(all_rides))
        .route("/admin/ride/:id/status", put(update_ride_status))
        .route("/admin/analytics", get(analytics))
        .route("/admin/filter", get(filter_rides))
}

#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AdminResult<AdminLoginResponse> {
    let Json(payload) = payload?;
    let (user, token) = services::login(&state, payload).await?;
    Ok(Json(AdminLoginResponse {
        success: true,
        message: "Admin login successful",
        token,
        user,
    }))
}

#[instrument(skip_all)]
pub async fn dashboard(AdminUser(identity): AdminUser) -> AdminResult<DashboardResponse> {
    info!(admin = %identity.email(), name = identity.display_name(), "admin dashboard viewed");
    Ok(Json(DashboardResponse {
        success: true,
        message: "Welcome to admin dashboard!",
        user: identity,
    }))
}

#[instrument(skip_all)]
pub async fn all_rides(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> AdminResult<AdminRidesResponse> {
    Ok(Json(rides::all_rides(&state).await?.into()))
}

#[instrument(skip(state, admin, payload))]
pub async fn update_ride_status(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> AdminResult<AdminRideResponse> {
    let Json(payload) = payload?;
    let id = rides::parse_ride_id(&id)?;
    let ride = rides::set_status(&state, &admin, id, payload).await?;
    Ok(Json(AdminRideResponse {
        success: true,
        message: "Ride status updated successfully",
        ride,
    }))
}

#[instrument(skip_all)]
pub async fn analytics(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> AdminResult<AnalyticsResponse> {
    Ok(Json(AnalyticsResponse {
        success: true,
        analytics: services::analytics(&state).await?,
    }))
}

#[instrument(skip(state, _admin))]
pub async fn filter_rides(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(params): Query<FilterParams>,
) -> AdminResult<AdminRidesResponse> {
    let filter = params.into_filter(state.config.report_offset)?;
    Ok(Json(rides::search_rides(&state, &filter).await?.into()))
}

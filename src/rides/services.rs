//! Ride lifecycle: who may move a ride between which statuses.
//!
//! Owners create rides and may cancel them while they are `requested` or
//! `approved`. Administrators see every ride and may set any status.

use std::collections::HashMap;

use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::{CreateRideRequest, RideView, UpdateStatusRequest},
    repo_types::{Ride, RideFilter, RideStatus, RideWithOwner, StatusUpdate},
};
use crate::{
    auth::{identity::Identity, services::non_blank},
    error::{AppError, AppResult},
    state::AppState,
};

fn ride_not_found() -> AppError {
    AppError::NotFound("Ride not found".into())
}

/// Malformed ids cannot name a ride, so they are reported as not found.
pub fn parse_ride_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| ride_not_found())
}

/// Owners may only cancel rides that are still `requested` or `approved`.
pub fn ensure_cancellable(status: RideStatus) -> AppResult<()> {
    match status {
        RideStatus::Requested | RideStatus::Approved => Ok(()),
        RideStatus::Cancelled => Err(AppError::Conflict("Ride is already cancelled".into())),
        RideStatus::Completed => Err(AppError::Conflict("Cannot cancel a completed ride".into())),
        RideStatus::Rejected => Err(AppError::Conflict("Cannot cancel a rejected ride".into())),
    }
}

pub async fn create_ride(
    state: &AppState,
    identity: &Identity,
    req: CreateRideRequest,
) -> AppResult<Ride> {
    let Some(owner) = identity.account_id() else {
        return Err(AppError::Forbidden(
            "The built-in administrator cannot request rides".into(),
        ));
    };
    let (Some(pickup), Some(dropoff)) = (non_blank(req.pickup), non_blank(req.dropoff)) else {
        return Err(AppError::bad_request("Pickup and dropoff are required"));
    };

    let ride = state.rides.create(owner, &pickup, &dropoff).await?;
    info!(ride_id = %ride.id, account_id = %owner, "ride requested");
    Ok(ride)
}

pub async fn list_rides(state: &AppState, identity: &Identity) -> AppResult<Vec<RideView>> {
    if identity.is_admin() {
        let rides = state.rides.list(None).await?;
        return Ok(with_owners(state, rides)
            .await?
            .into_iter()
            .map(RideView::WithOwner)
            .collect());
    }
    let Some(owner) = identity.account_id() else {
        return Ok(Vec::new());
    };
    let rides = state.rides.list(Some(owner)).await?;
    Ok(rides.into_iter().map(RideView::Own).collect())
}

pub async fn get_ride(state: &AppState, identity: &Identity, id: Uuid) -> AppResult<RideView> {
    let ride = state.rides.find(id).await?.ok_or_else(ride_not_found)?;
    if identity.is_admin() {
        let mut joined = with_owners(state, vec![ride]).await?;
        return joined.pop().map(RideView::WithOwner).ok_or_else(ride_not_found);
    }
    if identity.account_id() != Some(ride.user_id) {
        return Err(ride_not_found());
    }
    Ok(RideView::Own(ride))
}

pub async fn cancel_ride(state: &AppState, identity: &Identity, id: Uuid) -> AppResult<Ride> {
    let ride = state.rides.find(id).await?.ok_or_else(ride_not_found)?;
    if identity.account_id() != Some(ride.user_id) {
        return Err(ride_not_found());
    }
    if let Err(e) = ensure_cancellable(ride.status) {
        warn!(ride_id = %id, status = %ride.status, "cancel refused");
        return Err(e);
    }

    let Some(cancelled) = state.rides.cancel_open(id).await? else {
        // An administrator settled the ride after it was read.
        let current = state.rides.find(id).await?.ok_or_else(ride_not_found)?;
        warn!(ride_id = %id, status = %current.status, "cancel lost to a concurrent update");
        return Err(ensure_cancellable(current.status)
            .err()
            .unwrap_or_else(|| AppError::Conflict("Ride status changed, try again".into())));
    };
    info!(ride_id = %id, "ride cancelled by owner");
    Ok(cancelled)
}

pub async fn all_rides(state: &AppState) -> AppResult<Vec<RideWithOwner>> {
    let rides = state.rides.list(None).await?;
    with_owners(state, rides).await
}

pub async fn search_rides(state: &AppState, filter: &RideFilter) -> AppResult<Vec<RideWithOwner>> {
    let rides = state.rides.search(filter).await?;
    with_owners(state, rides).await
}

/// Administrator status write. Stamps the approval time and approver on every
/// change and optionally records the fare.
pub async fn set_status(
    state: &AppState,
    admin: &Identity,
    id: Uuid,
    req: UpdateStatusRequest,
) -> AppResult<RideWithOwner> {
    let raw = non_blank(req.status).ok_or_else(|| AppError::bad_request("Status is required"))?;
    let status = raw
        .parse::<RideStatus>()
        .map_err(|_| AppError::bad_request(format!("Invalid status '{raw}'")))?;
    if let Some(fare) = req.fare {
        if !fare.is_finite() || fare < 0.0 {
            return Err(AppError::bad_request("Fare must be a non-negative number"));
        }
    }

    let update = StatusUpdate {
        status,
        approved_by: Some(admin.subject()),
        approved_at: Some(OffsetDateTime::now_utc()),
        fare: req.fare,
    };
    let ride = state
        .rides
        .update_status(id, &update)
        .await?
        .ok_or_else(ride_not_found)?;
    info!(ride_id = %id, %status, admin = %admin.subject(), "ride status set by admin");

    let mut joined = with_owners(state, vec![ride]).await?;
    joined.pop().ok_or_else(ride_not_found)
}

/// Attaches owner name and email to each ride, preserving order. Rides whose
/// owner was deleted get `owner: None`.
pub async fn with_owners(state: &AppState, rides: Vec<Ride>) -> AppResult<Vec<RideWithOwner>> {
    let mut ids: Vec<Uuid> = rides.iter().map(|r| r.user_id).collect();
    ids.sort_unstable();
    ids.dedup();

    let owners: HashMap<Uuid, _> = state
        .accounts
        .owner_summaries(&ids)
        .await?
        .into_iter()
        .map(|o| (o.id, o))
        .collect();

    Ok(rides
        .into_iter()
        .map(|ride| {
            let owner = owners.get(&ride.user_id).cloned();
            RideWithOwner { ride, owner }
        })
        .collect())
}

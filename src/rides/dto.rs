use serde::{Deserialize, Serialize};

use super::repo_types::{Ride, RideWithOwner};

#[derive(Debug, Default, Deserialize)]
pub struct CreateRideRequest {
    pub pickup: Option<String>,
    pub dropoff: Option<String>,
}

/// A ride as returned to its caller: owners see the bare ride, administrators
/// also get the owner's name and email.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum RideView {
    Own(Ride),
    WithOwner(RideWithOwner),
}

#[derive(Debug, Serialize)]
pub struct RideMessage {
    pub message: &'static str,
    pub ride: Ride,
}

#[derive(Debug, Serialize)]
pub struct RideResponse {
    pub ride: RideView,
}

#[derive(Debug, Serialize)]
pub struct RideListResponse {
    pub rides: Vec<RideView>,
}

/// Body of the administrator status update.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
    pub fare: Option<f64>,
}

use serde::Serialize;

use crate::{
    auth::identity::{Identity, SyntheticAdmin},
    rides::{repo_types::RideWithOwner, stats::Analytics},
};

#[derive(Debug, Serialize)]
pub struct AdminLoginResponse {
    pub success: bool,
    pub message: &'static str,
    pub token: String,
    pub user: SyntheticAdmin,
}

#[derive(Debug, Serialize)]
pub struct AdminRidesResponse {
    pub success: bool,
    pub rides: Vec<RideWithOwner>,
    pub count: usize,
}

impl From<Vec<RideWithOwner>> for AdminRidesResponse {
    fn from(rides: Vec<RideWithOwner>) -> Self {
        Self {
            success: true,
            count: rides.len(),
            rides,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AdminRideResponse {
    pub success: bool,
    pub message: &'static str,
    pub ride: RideWithOwner,
}

#[derive(Debug, Serialize)]
pub struct AnalyticsResponse {
    pub success: bool,
    pub analytics: Analytics,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub success: bool,
    pub message: &'static str,
    pub user: Identity,
}

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::accounts::repo_types::OwnerSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "ride_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RideStatus {
    Requested,
    Approved,
    Rejected,
    Cancelled,
    Completed,
}

impl RideStatus {
    pub const ALL: [RideStatus; 5] = [
        RideStatus::Requested,
        RideStatus::Approved,
        RideStatus::Rejected,
        RideStatus::Cancelled,
        RideStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RideStatus::Requested => "requested",
            RideStatus::Approved => "approved",
            RideStatus::Rejected => "rejected",
            RideStatus::Cancelled => "cancelled",
            RideStatus::Completed => "completed",
        }
    }

    /// Statuses from which the owner may still cancel.
    pub fn accepts_owner_cancel(&self) -> bool {
        matches!(self, RideStatus::Requested | RideStatus::Approved)
    }
}

impl fmt::Display for RideStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RideStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RideStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown ride status {s:?}"))
    }
}

/// Ride record in the ride store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Ride {
    pub id: Uuid,
    #[serde(rename = "user")]
    pub user_id: Uuid, // owner, fixed at creation
    pub pickup: String,
    pub dropoff: String,
    pub status: RideStatus,
    pub fare: Option<f64>,
    pub approved_by: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub approved_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Ride as seen by an administrator: the ride plus its owner's name and email.
/// `owner` is `None` when the owning account has since been deleted.
#[derive(Debug, Clone, Serialize)]
pub struct RideWithOwner {
    #[serde(flatten)]
    pub ride: Ride,
    pub owner: Option<OwnerSummary>,
}

/// Write applied by the administrator status-update path.
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub status: RideStatus,
    pub approved_by: Option<String>,
    pub approved_at: Option<OffsetDateTime>,
    pub fare: Option<f64>,
}

impl StatusUpdate {
    /// Owner cancellation: no approver recorded, timestamps untouched.
    pub fn cancelled() -> Self {
        Self {
            status: RideStatus::Cancelled,
            approved_by: None,
            approved_at: None,
            fare: None,
        }
    }

    pub fn apply(&self, ride: &mut Ride) {
        ride.status = self.status;
        if let Some(by) = &self.approved_by {
            ride.approved_by = Some(by.clone());
        }
        if let Some(at) = self.approved_at {
            ride.approved_at = Some(at);
        }
        if let Some(fare) = self.fare {
            ride.fare = Some(fare);
        }
    }
}

/// Filter used by the administrator ride search. Every bound is optional and
/// all present bounds must hold. Date bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RideFilter {
    pub created_from: Option<OffsetDateTime>,
    pub created_to: Option<OffsetDateTime>,
    pub status: Option<RideStatus>,
    pub min_fare: Option<f64>,
    pub max_fare: Option<f64>,
}

impl RideFilter {
    pub fn matches(&self, ride: &Ride) -> bool {
        if self.created_from.is_some_and(|from| ride.created_at < from) {
            return false;
        }
        if self.created_to.is_some_and(|to| ride.created_at > to) {
            return false;
        }
        if self.status.is_some_and(|status| ride.status != status) {
            return false;
        }
        // A fare bound never matches a ride without a fare.
        if let Some(min) = self.min_fare {
            if !ride.fare.is_some_and(|fare| fare >= min) {
                return false;
            }
        }
        if let Some(max) = self.max_fare {
            if !ride.fare.is_some_and(|fare| fare <= max) {
                return false;
            }
        }
        true
    }
}

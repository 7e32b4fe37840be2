//! Persistence seams for accounts and rides.
//!
//! Services talk to the stores only through [`AccountStore`] and [`RideStore`].
//! [`postgres::PgStore`] backs production; [`memory::MemoryStore`] backs tests and
//! local runs with `DATABASE_URL=memory://`.

use async_trait::async_trait;
use thiserror::Error;
use time::UtcOffset;
use uuid::Uuid;

use crate::accounts::repo_types::{Account, NewAccount, OwnerSummary, ProfileChanges};
use crate::rides::repo_types::{Ride, RideFilter, StatusUpdate};
use crate::rides::stats::Analytics;

pub mod memory;
pub mod postgres;

/// Account columns with a uniqueness constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Email,
    EmployeeId,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate {0:?}")]
    Duplicate(UniqueField),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Account>>;

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>>;

    /// Whether another account (other than `except`) already uses `employee_id`.
    async fn employee_id_taken(&self, employee_id: &str, except: Option<Uuid>)
        -> StoreResult<bool>;

    async fn create(&self, account: NewAccount) -> StoreResult<Account>;

    async fn update_profile(&self, id: Uuid, changes: &ProfileChanges)
        -> StoreResult<Option<Account>>;

    /// Returns the removed account, if it existed.
    async fn delete(&self, id: Uuid) -> StoreResult<Option<Account>>;

    async fn owner_summaries(&self, ids: &[Uuid]) -> StoreResult<Vec<OwnerSummary>>;
}

#[async_trait]
pub trait RideStore: Send + Sync {
    async fn create(&self, owner: Uuid, pickup: &str, dropoff: &str) -> StoreResult<Ride>;

    async fn find(&self, id: Uuid) -> StoreResult<Option<Ride>>;

    /// Rides newest first; restricted to `owner` when given.
    async fn list(&self, owner: Option<Uuid>) -> StoreResult<Vec<Ride>>;

    /// Rides matching `filter`, newest first.
    async fn search(&self, filter: &RideFilter) -> StoreResult<Vec<Ride>>;

    async fn update_status(&self, id: Uuid, update: &StatusUpdate) -> StoreResult<Option<Ride>>;

    /// Owner cancellation, applied only while the ride is still `requested` or
    /// `approved`. `None` when the ride is missing or has already moved on.
    async fn cancel_open(&self, id: Uuid) -> StoreResult<Option<Ride>>;

    /// Aggregates over every ride; calendar days are taken at `day_offset`.
    async fn stats(&self, day_offset: UtcOffset) -> StoreResult<Analytics>;
}

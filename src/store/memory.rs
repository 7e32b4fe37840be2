use std::collections::HashMap;

use async_trait::async_trait;
use time::{OffsetDateTime, UtcOffset};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AccountStore, RideStore, StoreError, StoreResult, UniqueField};
use crate::accounts::repo_types::{Account, NewAccount, OwnerSummary, ProfileChanges};
use crate::rides::repo_types::{Ride, RideFilter, RideStatus, StatusUpdate};
use crate::rides::stats::{summarize, Analytics};

/// In-process store with the same uniqueness rules as the Postgres schema.
#[derive(Default)]
pub struct MemoryStore {
    accounts: RwLock<HashMap<Uuid, Account>>,
    rides: RwLock<HashMap<Uuid, Ride>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(mut rides: Vec<Ride>) -> Vec<Ride> {
    rides.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    rides
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Account>> {
        Ok(self.accounts.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        let accounts = self.accounts.read().await;
        Ok(accounts.values().find(|a| a.email == email).cloned())
    }

    async fn employee_id_taken(
        &self,
        employee_id: &str,
        except: Option<Uuid>,
    ) -> StoreResult<bool> {
        let accounts = self.accounts.read().await;
        Ok(accounts
            .values()
            .any(|a| a.employee_id == employee_id && Some(a.id) != except))
    }

    async fn create(&self, account: NewAccount) -> StoreResult<Account> {
        let mut accounts = self.accounts.write().await;
        if accounts.values().any(|a| a.email == account.email) {
            return Err(StoreError::Duplicate(UniqueField::Email));
        }
        if accounts.values().any(|a| a.employee_id == account.employee_id) {
            return Err(StoreError::Duplicate(UniqueField::EmployeeId));
        }
        let created = Account {
            id: Uuid::new_v4(),
            name: account.name,
            email: account.email,
            password_hash: account.password_hash,
            phone_number: account.phone_number,
            employee_id: account.employee_id,
            role: account.role,
            created_at: OffsetDateTime::now_utc(),
        };
        accounts.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        changes: &ProfileChanges,
    ) -> StoreResult<Option<Account>> {
        let mut accounts = self.accounts.write().await;
        if let Some(employee_id) = &changes.employee_id {
            if accounts
                .values()
                .any(|a| &a.employee_id == employee_id && a.id != id)
            {
                return Err(StoreError::Duplicate(UniqueField::EmployeeId));
            }
        }
        Ok(accounts.get_mut(&id).map(|account| {
            changes.apply(account);
            account.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> StoreResult<Option<Account>> {
        Ok(self.accounts.write().await.remove(&id))
    }

    async fn owner_summaries(&self, ids: &[Uuid]) -> StoreResult<Vec<OwnerSummary>> {
        let accounts = self.accounts.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| accounts.get(id))
            .map(OwnerSummary::from)
            .collect())
    }
}

#[async_trait]
impl RideStore for MemoryStore {
    async fn create(&self, owner: Uuid, pickup: &str, dropoff: &str) -> StoreResult<Ride> {
        let ride = Ride {
            id: Uuid::new_v4(),
            user_id: owner,
            pickup: pickup.to_string(),
            dropoff: dropoff.to_string(),
            status: RideStatus::Requested,
            fare: None,
            approved_by: None,
            approved_at: None,
            created_at: OffsetDateTime::now_utc(),
        };
        self.rides.write().await.insert(ride.id, ride.clone());
        Ok(ride)
    }

    async fn find(&self, id: Uuid) -> StoreResult<Option<Ride>> {
        Ok(self.rides.read().await.get(&id).cloned())
    }

    async fn list(&self, owner: Option<Uuid>) -> StoreResult<Vec<Ride>> {
        let rides = self.rides.read().await;
        let selected = rides
            .values()
            .filter(|r| owner.map_or(true, |o| r.user_id == o))
            .cloned()
            .collect();
        Ok(newest_first(selected))
    }

    async fn search(&self, filter: &RideFilter) -> StoreResult<Vec<Ride>> {
        let rides = self.rides.read().await;
        let selected = rides.values().filter(|r| filter.matches(r)).cloned().collect();
        Ok(newest_first(selected))
    }

    async fn update_status(&self, id: Uuid, update: &StatusUpdate) -> StoreResult<Option<Ride>> {
        let mut rides = self.rides.write().await;
        Ok(rides.get_mut(&id).map(|ride| {
            update.apply(ride);
            ride.clone()
        }))
    }

    async fn cancel_open(&self, id: Uuid) -> StoreResult<Option<Ride>> {
        let mut rides = self.rides.write().await;
        Ok(rides
            .get_mut(&id)
            .filter(|ride| ride.status.accepts_owner_cancel())
            .map(|ride| {
                StatusUpdate::cancelled().apply(ride);
                ride.clone()
            }))
    }

    async fn stats(&self, day_offset: UtcOffset) -> StoreResult<Analytics> {
        let rides: Vec<Ride> = self.rides.read().await.values().cloned().collect();
        Ok(summarize(&rides, day_offset))
    }
}

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool, Postgres, QueryBuilder};
use time::UtcOffset;
use uuid::Uuid;

use super::{AccountStore, RideStore, StoreError, StoreResult, UniqueField};
use crate::accounts::repo_types::{Account, NewAccount, OwnerSummary, ProfileChanges};
use crate::rides::repo_types::{Ride, RideFilter, RideStatus, StatusUpdate};
use crate::rides::stats::{Analytics, Bucket};

const ACCOUNT_COLUMNS: &str =
    "id, name, email, password_hash, phone_number, employee_id, role, created_at";
const RIDE_COLUMNS: &str =
    "id, user_id, pickup, dropoff, status, fare, approved_by, approved_at, created_at";

#[derive(FromRow)]
struct RideTotals {
    total_rides: i64,
    completed_rides: i64,
    cancelled_rides: i64,
    total_revenue: f64,
    average_fare: f64,
}

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self { db })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.db)
            .await
            .context("run migrations")?;
        Ok(())
    }
}

fn store_error(e: sqlx::Error, what: &'static str) -> StoreError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            match db_err.constraint() {
                Some("accounts_email_key") => return StoreError::Duplicate(UniqueField::Email),
                Some("accounts_employee_id_key") => {
                    return StoreError::Duplicate(UniqueField::EmployeeId)
                }
                _ => {}
            }
        }
    }
    StoreError::Backend(anyhow::Error::new(e).context(what))
}

#[async_trait]
impl AccountStore for PgStore {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Account>> {
        sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| store_error(e, "find account by id"))
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| store_error(e, "find account by email"))
    }

    async fn employee_id_taken(
        &self,
        employee_id: &str,
        except: Option<Uuid>,
    ) -> StoreResult<bool> {
        let taken: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM accounts
                 WHERE employee_id = $1
                   AND ($2::uuid IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(employee_id)
        .bind(except)
        .fetch_one(&self.db)
        .await
        .map_err(|e| store_error(e, "probe employee id"))?;
        Ok(taken)
    }

    async fn create(&self, account: NewAccount) -> StoreResult<Account> {
        sqlx::query_as::<_, Account>(&format!(
            r#"
            INSERT INTO accounts (name, email, password_hash, phone_number, employee_id, role)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(&account.name)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(&account.phone_number)
        .bind(&account.employee_id)
        .bind(account.role)
        .fetch_one(&self.db)
        .await
        .map_err(|e| store_error(e, "insert account"))
    }

    async fn update_profile(
        &self,
        id: Uuid,
        changes: &ProfileChanges,
    ) -> StoreResult<Option<Account>> {
        sqlx::query_as::<_, Account>(&format!(
            r#"
            UPDATE accounts
               SET name = COALESCE($2, name),
                   phone_number = COALESCE($3, phone_number),
                   employee_id = COALESCE($4, employee_id)
             WHERE id = $1
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.name.as_deref())
        .bind(changes.phone_number.as_deref())
        .bind(changes.employee_id.as_deref())
        .fetch_optional(&self.db)
        .await
        .map_err(|e| store_error(e, "update account profile"))
    }

    async fn delete(&self, id: Uuid) -> StoreResult<Option<Account>> {
        sqlx::query_as::<_, Account>(&format!(
            "DELETE FROM accounts WHERE id = $1 RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| store_error(e, "delete account"))
    }

    async fn owner_summaries(&self, ids: &[Uuid]) -> StoreResult<Vec<OwnerSummary>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, OwnerSummary>(
            "SELECT id, name, email FROM accounts WHERE id = ANY($1)",
        )
        .bind(ids.to_vec())
        .fetch_all(&self.db)
        .await
        .map_err(|e| store_error(e, "load ride owners"))
    }
}

#[async_trait]
impl RideStore for PgStore {
    async fn create(&self, owner: Uuid, pickup: &str, dropoff: &str) -> StoreResult<Ride> {
        sqlx::query_as::<_, Ride>(&format!(
            r#"
            INSERT INTO rides (user_id, pickup, dropoff)
            VALUES ($1, $2, $3)
            RETURNING {RIDE_COLUMNS}
            "#
        ))
        .bind(owner)
        .bind(pickup)
        .bind(dropoff)
        .fetch_one(&self.db)
        .await
        .map_err(|e| store_error(e, "insert ride"))
    }

    async fn find(&self, id: Uuid) -> StoreResult<Option<Ride>> {
        sqlx::query_as::<_, Ride>(&format!("SELECT {RIDE_COLUMNS} FROM rides WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .map_err(|e| store_error(e, "find ride"))
    }

    async fn list(&self, owner: Option<Uuid>) -> StoreResult<Vec<Ride>> {
        sqlx::query_as::<_, Ride>(&format!(
            r#"
            SELECT {RIDE_COLUMNS}
              FROM rides
             WHERE ($1::uuid IS NULL OR user_id = $1)
             ORDER BY created_at DESC
            "#
        ))
        .bind(owner)
        .fetch_all(&self.db)
        .await
        .map_err(|e| store_error(e, "list rides"))
    }

    async fn search(&self, filter: &RideFilter) -> StoreResult<Vec<Ride>> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {RIDE_COLUMNS} FROM rides WHERE TRUE"));
        if let Some(from) = filter.created_from {
            qb.push(" AND created_at >= ").push_bind(from);
        }
        if let Some(to) = filter.created_to {
            qb.push(" AND created_at <= ").push_bind(to);
        }
        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status);
        }
        if let Some(min) = filter.min_fare {
            qb.push(" AND fare >= ").push_bind(min);
        }
        if let Some(max) = filter.max_fare {
            qb.push(" AND fare <= ").push_bind(max);
        }
        qb.push(" ORDER BY created_at DESC");

        qb.build_query_as::<Ride>()
            .fetch_all(&self.db)
            .await
            .map_err(|e| store_error(e, "search rides"))
    }

    async fn update_status(&self, id: Uuid, update: &StatusUpdate) -> StoreResult<Option<Ride>> {
        sqlx::query_as::<_, Ride>(&format!(
            r#"
            UPDATE rides
               SET status = $2,
                   approved_by = COALESCE($3, approved_by),
                   approved_at = COALESCE($4, approved_at),
                   fare = COALESCE($5, fare)
             WHERE id = $1
            RETURNING {RIDE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(update.status)
        .bind(update.approved_by.as_deref())
        .bind(update.approved_at)
        .bind(update.fare)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| store_error(e, "update ride status"))
    }

    async fn cancel_open(&self, id: Uuid) -> StoreResult<Option<Ride>> {
        sqlx::query_as::<_, Ride>(&format!(
            r#"
            UPDATE rides
               SET status = 'cancelled'
             WHERE id = $1
               AND status IN ('requested', 'approved')
            RETURNING {RIDE_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| store_error(e, "cancel ride"))
    }

    async fn stats(&self, day_offset: UtcOffset) -> StoreResult<Analytics> {
        let totals = sqlx::query_as::<_, RideTotals>(
            r#"
            SELECT COUNT(*) AS total_rides,
                   COUNT(*) FILTER (WHERE status = 'completed') AS completed_rides,
                   COUNT(*) FILTER (WHERE status = 'cancelled') AS cancelled_rides,
                   COALESCE(SUM(fare), 0)::float8 AS total_revenue,
                   COALESCE(AVG(fare), 0)::float8 AS average_fare
              FROM rides
            "#,
        )
        .fetch_one(&self.db)
        .await
        .map_err(|e| store_error(e, "ride totals"))?;

        let by_status = sqlx::query_as::<_, (RideStatus, i64)>(
            "SELECT status, COUNT(*) FROM rides GROUP BY status ORDER BY status",
        )
        .fetch_all(&self.db)
        .await
        .map_err(|e| store_error(e, "rides by status"))?;

        let by_date = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT to_char(created_at AT TIME ZONE make_interval(secs => $1), 'YYYY-MM-DD') AS day,
                   COUNT(*)
              FROM rides
             GROUP BY day
             ORDER BY day
            "#,
        )
        .bind(f64::from(day_offset.whole_seconds()))
        .fetch_all(&self.db)
        .await
        .map_err(|e| store_error(e, "rides by date"))?;

        Ok(Analytics {
            total_rides: totals.total_rides as usize,
            completed_rides: totals.completed_rides as usize,
            cancelled_rides: totals.cancelled_rides as usize,
            total_revenue: totals.total_revenue,
            average_fare: totals.average_fare,
            rides_by_status: by_status
                .into_iter()
                .map(|(id, count)| Bucket { id, count: count as usize })
                .collect(),
            rides_by_date: by_date
                .into_iter()
                .map(|(id, count)| Bucket { id, count: count as usize })
                .collect(),
        })
    }
}

use tracing::{info, warn};
use uuid::Uuid;

use super::dto::UpdateProfileRequest;
use crate::{
    accounts::repo_types::{Account, ProfileChanges},
    auth::identity::Identity,
    error::{AppError, AppResult},
    state::AppState,
};

fn user_not_found() -> AppError {
    AppError::NotFound("User not found".into())
}

/// The built-in administrator has no stored profile to change or delete.
fn stored_id(identity: &Identity) -> AppResult<Uuid> {
    identity.account_id().ok_or_else(user_not_found)
}

/// A supplied field is trimmed and must not be blank.
fn supplied(value: Option<String>, field: &str) -> AppResult<Option<String>> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if v.is_empty() => Err(AppError::bad_request(format!("{field} cannot be empty"))),
        other => Ok(other),
    }
}

pub fn profile_changes(req: UpdateProfileRequest) -> AppResult<ProfileChanges> {
    Ok(ProfileChanges {
        name: supplied(req.name, "Name")?,
        phone_number: supplied(req.phone_number, "Phone number")?,
        employee_id: supplied(req.employee_id, "Employee ID")?,
    })
}

pub async fn update_profile(
    state: &AppState,
    identity: &Identity,
    req: UpdateProfileRequest,
) -> AppResult<Account> {
    let id = stored_id(identity)?;
    let changes = profile_changes(req)?;

    if changes.is_empty() {
        return state.accounts.find_by_id(id).await?.ok_or_else(user_not_found);
    }
    if let Some(employee_id) = &changes.employee_id {
        if state.accounts.employee_id_taken(employee_id, Some(id)).await? {
            warn!(account_id = %id, %employee_id, "employee id already registered");
            return Err(AppError::bad_request("Employee ID already exists"));
        }
    }

    let account = state
        .accounts
        .update_profile(id, &changes)
        .await?
        .ok_or_else(user_not_found)?;
    info!(account_id = %id, "profile updated");
    Ok(account)
}

pub async fn delete_account(state: &AppState, identity: &Identity) -> AppResult<()> {
    let id = stored_id(identity)?;
    let account = state.accounts.delete(id).await?.ok_or_else(user_not_found)?;
    info!(account_id = %account.id, "account deleted");
    Ok(())
}

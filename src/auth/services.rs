use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use super::{
    dto::{LoginRequest, RegisterRequest},
    identity::Identity,
    jwt::JwtKeys,
    password::{hash_password, verify_against_dummy, verify_password},
};
use crate::{
    accounts::repo_types::{Account, NewAccount, Role},
    error::{AppError, AppResult},
    state::AppState,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Trimmed value, or `None` when absent or blank.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Email and password of a login body; the password is taken verbatim.
pub(crate) fn credentials(req: LoginRequest) -> AppResult<(String, String)> {
    match (non_blank(req.email), req.password.filter(|p| !p.is_empty())) {
        (Some(email), Some(password)) => Ok((email, password)),
        _ => Err(AppError::bad_request("Email and password are required")),
    }
}

pub fn issue_token(keys: &JwtKeys, account: &Account) -> anyhow::Result<String> {
    keys.sign(&account.id.to_string(), &account.email, account.role)
}

pub async fn register(state: &AppState, req: RegisterRequest) -> AppResult<(Account, String)> {
    let missing = || AppError::bad_request("All fields are required for registration");
    let name = non_blank(req.name).ok_or_else(missing)?;
    let email = non_blank(req.email).ok_or_else(missing)?;
    let password = req.password.filter(|p| !p.is_empty()).ok_or_else(missing)?;
    let phone_number = non_blank(req.phone_number).ok_or_else(missing)?;
    let employee_id = non_blank(req.employee_id).ok_or_else(missing)?;

    if !is_valid_email(&email) {
        warn!("registration with invalid email");
        return Err(AppError::bad_request("Invalid email"));
    }

    let role = match non_blank(req.role) {
        None => Role::User,
        Some(r) => r
            .parse::<Role>()
            .map_err(|_| AppError::bad_request("Invalid role"))?,
    };
    if role == Role::Admin && !state.config.allow_admin_registration {
        warn!("self-registration as admin refused");
        return Err(AppError::bad_request("Cannot register with the admin role"));
    }

    if state.accounts.find_by_email(&email).await?.is_some() {
        warn!("email already registered");
        return Err(AppError::bad_request("User with this email already exists"));
    }
    if state.accounts.employee_id_taken(&employee_id, None).await? {
        warn!(%employee_id, "employee id already registered");
        return Err(AppError::bad_request("Employee ID already exists"));
    }

    let password_hash = hash_password(&password)?;
    let account = state
        .accounts
        .create(NewAccount {
            name,
            email,
            password_hash,
            phone_number,
            employee_id,
            role,
        })
        .await?;

    let token = issue_token(&state.keys, &account)?;
    info!(account_id = %account.id, role = %account.role, "account registered");
    Ok((account, token))
}

pub async fn login(state: &AppState, req: LoginRequest) -> AppResult<(Account, String)> {
    let (email, password) = credentials(req)?;

    let Some(account) = state.accounts.find_by_email(&email).await? else {
        verify_against_dummy(&password);
        warn!("login for unknown email");
        return Err(AppError::InvalidCredentials);
    };

    if !verify_password(&password, &account.password_hash)? {
        warn!(account_id = %account.id, "login with wrong password");
        return Err(AppError::InvalidCredentials);
    }

    let token = issue_token(&state.keys, &account)?;
    info!(account_id = %account.id, "account logged in");
    Ok((account, token))
}

/// Fresh view of the caller: stored accounts are re-read, the synthetic admin
/// is returned as-is.
pub async fn current_identity(state: &AppState, identity: Identity) -> AppResult<Identity> {
    match identity {
        Identity::Stored(account) => state
            .accounts
            .find_by_id(account.id)
            .await?
            .map(Identity::Stored)
            .ok_or_else(|| AppError::NotFound("User not found".into())),
        synthetic @ Identity::Synthetic(_) => Ok(synthetic),
    }
}

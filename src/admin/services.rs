use tracing::{info, warn};

use crate::{
    accounts::repo_types::Role,
    auth::{
        claims::ADMIN_SUBJECT,
        dto::LoginRequest,
        identity::SyntheticAdmin,
        password::{hash_password, verify_against_dummy, verify_password},
        services::credentials,
    },
    config::AdminConfig,
    error::{AppError, AppResult},
    rides::stats::Analytics,
    state::AppState,
};

/// Built-in administrator credentials, with the password hashed once at startup.
#[derive(Clone)]
pub struct AdminCredentials {
    pub email: String,
    pub password_hash: String,
}

impl AdminCredentials {
    pub fn from_config(cfg: &AdminConfig) -> anyhow::Result<Self> {
        Ok(Self {
            email: cfg.email.clone(),
            password_hash: hash_password(&cfg.password)?,
        })
    }
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

pub async fn login(state: &AppState, req: LoginRequest) -> AppResult<(SyntheticAdmin, String)> {
    let (email, password) = credentials(req)?;
    let invalid = || AppError::Unauthenticated("Invalid admin credentials".into());

    if email != state.admin.email {
        verify_against_dummy(&password);
        warn!("admin login with unknown email");
        return Err(invalid());
    }
    if !verify_password(&password, &state.admin.password_hash)? {
        warn!("admin login with wrong password");
        return Err(invalid());
    }

    let token = state.keys.sign(ADMIN_SUBJECT, &state.admin.email, Role::Admin)?;
    info!("admin logged in");
    Ok((SyntheticAdmin::new(state.admin.email.clone()), token))
}

pub async fn analytics(state: &AppState) -> AppResult<Analytics> {
    Ok(state.rides.stats(state.config.report_offset).await?)
}

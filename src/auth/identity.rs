//! Who is making a request, once the bearer token has been checked.

use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use super::claims::{Claims, ADMIN_SUBJECT};
use crate::{
    accounts::repo_types::{Account, Role},
    error::{AppError, AppResult},
    store::AccountStore,
};

pub const ADMIN_DISPLAY_NAME: &str = "Admin";

/// The built-in administrator, materialized from token claims and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyntheticAdmin {
    pub id: &'static str,
    pub name: &'static str,
    pub email: String,
    pub role: Role,
}

impl SyntheticAdmin {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            id: ADMIN_SUBJECT,
            name: ADMIN_DISPLAY_NAME,
            email: email.into(),
            role: Role::Admin,
        }
    }
}

/// Resolved caller identity. Serializes as the account (sans password hash)
/// or as the synthetic administrator view.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Identity {
    Stored(Account),
    Synthetic(SyntheticAdmin),
}

impl Identity {
    pub fn subject(&self) -> String {
        match self {
            Identity::Stored(a) => a.id.to_string(),
            Identity::Synthetic(s) => s.id.to_string(),
        }
    }

    /// Backing account id; `None` for the synthetic administrator.
    pub fn account_id(&self) -> Option<Uuid> {
        match self {
            Identity::Stored(a) => Some(a.id),
            Identity::Synthetic(_) => None,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Identity::Stored(a) => a.role,
            Identity::Synthetic(s) => s.role,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Identity::Stored(a) => &a.name,
            Identity::Synthetic(s) => s.name,
        }
    }

    pub fn email(&self) -> &str {
        match self {
            Identity::Stored(a) => &a.email,
            Identity::Synthetic(s) => &s.email,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Role::Admin
    }
}

/// Turns verified claims into an identity. Only the sentinel admin subject with
/// the admin role skips the credential store.
pub async fn resolve_identity(accounts: &dyn AccountStore, claims: Claims) -> AppResult<Identity> {
    if claims.is_synthetic_admin() {
        return Ok(Identity::Synthetic(SyntheticAdmin::new(claims.email)));
    }

    let not_found = || AppError::Unauthenticated("Invalid token. User not found".into());
    let Ok(id) = Uuid::parse_str(&claims.sub) else {
        warn!(subject = %claims.sub, "token subject is not an account id");
        return Err(not_found());
    };
    match accounts.find_by_id(id).await? {
        Some(account) => Ok(Identity::Stored(account)),
        None => {
            warn!(account_id = %id, "token for missing account");
            Err(not_found())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::repo_types::NewAccount;
    use crate::store::memory::MemoryStore;

    fn claims(sub: &str, role: Role) -> Claims {
        Claims {
            sub: sub.into(),
            email: "boss@x.com".into(),
            role,
            iat: 0,
            exp: 0,
            iss: "iss".into(),
            aud: "aud".into(),
        }
    }

    #[tokio::test]
    async fn sentinel_admin_skips_the_store() {
        let store = MemoryStore::new();
        let identity = resolve_identity(&store, claims(ADMIN_SUBJECT, Role::Admin))
            .await
            .unwrap();
        assert!(identity.is_admin());
        assert_eq!(identity.display_name(), "Admin");
        assert_eq!(identity.email(), "boss@x.com");
        assert_eq!(identity.subject(), ADMIN_SUBJECT);
        assert_eq!(identity.account_id(), None);
    }

    #[tokio::test]
    async fn sentinel_subject_without_admin_role_is_rejected() {
        let store = MemoryStore::new();
        let err = resolve_identity(&store, claims(ADMIN_SUBJECT, Role::User))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn stored_accounts_are_looked_up() {
        let store = MemoryStore::new();
        let account = AccountStore::create(
            &store,
            NewAccount {
                name: "Ann".into(),
                email: "ann@x.com".into(),
                password_hash: "h".into(),
                phone_number: "+1555".into(),
                employee_id: "E1".into(),
                role: Role::User,
            },
        )
        .await
        .unwrap();

        let identity = resolve_identity(&store, claims(&account.id.to_string(), Role::User))
            .await
            .unwrap();
        assert_eq!(identity.account_id(), Some(account.id));
        assert!(!identity.is_admin());

        let missing = resolve_identity(&store, claims(&Uuid::new_v4().to_string(), Role::User))
            .await
            .unwrap_err();
        assert_eq!(missing.to_string(), "Invalid token. User not found");
    }

    #[test]
    fn synthetic_admin_serializes_like_an_account() {
        let json = serde_json::to_value(Identity::Synthetic(SyntheticAdmin::new("a@x.com"))).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": "admin-id", "name": "Admin", "email": "a@x.com", "role": "admin"})
        );
    }
}

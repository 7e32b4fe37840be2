use serde::{Deserialize, Serialize};

use crate::accounts::repo_types::Role;

/// Subject of tokens minted for the built-in administrator, which has no stored account.
pub const ADMIN_SUBJECT: &str = "admin-id";

/// JWT payload used for authentication.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: String,   // account uuid, or ADMIN_SUBJECT
    pub email: String,
    pub role: Role,
    pub iat: usize,    // issued at (unix timestamp)
    pub exp: usize,    // expires at (unix timestamp)
    pub iss: String,
    pub aud: String,
}

impl Claims {
    pub fn is_synthetic_admin(&self) -> bool {
        self.sub == ADMIN_SUBJECT && self.role == Role::Admin
    }
}

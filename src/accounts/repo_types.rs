use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Account role. `Employee` is a legacy alias carrying the same permissions as `User`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "account_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Employee,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Employee => "employee",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "employee" => Ok(Role::Employee),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role {other:?}")),
        }
    }
}

/// Account record in the credential store.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // argon2 PHC string, never exposed
    pub phone_number: String,
    pub employee_id: String,
    pub role: Role,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Validated registration data, password already hashed.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone_number: String,
    pub employee_id: String,
    pub role: Role,
}

/// The only account fields a profile update may touch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub employee_id: Option<String>,
}

impl ProfileChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.phone_number.is_none() && self.employee_id.is_none()
    }

    pub fn apply(&self, account: &mut Account) {
        if let Some(name) = &self.name {
            account.name = name.clone();
        }
        if let Some(phone) = &self.phone_number {
            account.phone_number = phone.clone();
        }
        if let Some(employee_id) = &self.employee_id {
            account.employee_id = employee_id.clone();
        }
    }
}

/// Owner details joined onto rides in administrator views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct OwnerSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<&Account> for OwnerSummary {
    fn from(a: &Account) -> Self {
        Self {
            id: a.id,
            name: a.name.clone(),
            email: a.email.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Account {
        Account {
            id: Uuid::new_v4(),
            name: "Ann".into(),
            email: "ann@x.com".into(),
            password_hash: "$argon2id$secret".into(),
            phone_number: "+1555".into(),
            employee_id: "E1".into(),
            role: Role::User,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn account_serialization_hides_password_hash() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["phoneNumber"], "+1555");
        assert_eq!(json["employeeId"], "E1");
        assert_eq!(json["role"], "user");
    }

    #[test]
    fn profile_changes_touch_only_supplied_fields() {
        let mut account = sample();
        let changes = ProfileChanges {
            phone_number: Some("+1666".into()),
            ..Default::default()
        };
        changes.apply(&mut account);
        assert_eq!(account.phone_number, "+1666");
        assert_eq!(account.name, "Ann");
        assert_eq!(account.employee_id, "E1");
    }

    #[test]
    fn role_parses_known_values_only() {
        assert_eq!("employee".parse::<Role>().unwrap(), Role::Employee);
        assert!("root".parse::<Role>().is_err());
    }
}

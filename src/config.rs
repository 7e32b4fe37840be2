use anyhow::Context;
use serde::Deserialize;
use time::{macros::format_description, UtcOffset};
use tracing::warn;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// Credentials of the built-in administrator, checked by `/api/admin/login`.
#[derive(Clone, Deserialize)]
pub struct AdminConfig {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConfig")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub admin: AdminConfig,
    pub allow_admin_registration: bool,
    /// Offset used to bucket rides into calendar days for reporting.
    pub report_offset: UtcOffset,
}

const SEVEN_DAYS_MINUTES: i64 = 60 * 24 * 7;
const MAX_TTL_MINUTES: i64 = 60 * 24 * 366;

impl AppConfig {
    /// `local_offset` is the host's UTC offset, read before the runtime starts
    /// any threads.
    pub fn from_env(local_offset: Option<UtcOffset>) -> anyhow::Result<Self> {
        let database_url = required("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: required("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "ridebook".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "ridebook-users".into()),
            ttl_minutes: ttl_minutes(std::env::var("JWT_TTL_MINUTES").ok())?,
        };
        let admin = AdminConfig {
            email: required("ADMIN_EMAIL")?,
            password: required("ADMIN_PASSWORD")?,
        };
        let allow_admin_registration = std::env::var("ALLOW_ADMIN_REGISTRATION")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);
        let report_offset = report_offset(std::env::var("REPORT_UTC_OFFSET").ok(), local_offset)?;

        Ok(Self {
            database_url,
            jwt,
            admin,
            allow_admin_registration,
            report_offset,
        })
    }
}

/// Parses offsets such as `+05:30` or `-08:00`.
pub fn parse_offset(value: &str) -> anyhow::Result<UtcOffset> {
    let format = format_description!("[offset_hour sign:mandatory]:[offset_minute]");
    UtcOffset::parse(value.trim(), &format)
        .with_context(|| format!("invalid REPORT_UTC_OFFSET {value:?}"))
}

/// `REPORT_UTC_OFFSET` when set, else the host offset, else UTC.
pub fn report_offset(
    configured: Option<String>,
    local_offset: Option<UtcOffset>,
) -> anyhow::Result<UtcOffset> {
    if let Some(value) = configured.filter(|v| !v.trim().is_empty()) {
        return parse_offset(&value);
    }
    Ok(local_offset.unwrap_or_else(|| {
        warn!("host UTC offset unavailable; reporting days in UTC");
        UtcOffset::UTC
    }))
}

/// Token lifetime in minutes; defaults to seven days, capped at a year.
fn ttl_minutes(raw: Option<String>) -> anyhow::Result<i64> {
    let Some(raw) = raw.filter(|v| !v.trim().is_empty()) else {
        return Ok(SEVEN_DAYS_MINUTES);
    };
    let minutes: i64 = raw
        .trim()
        .parse()
        .with_context(|| format!("invalid JWT_TTL_MINUTES {raw:?}"))?;
    let seconds = minutes
        .checked_mul(60)
        .context("JWT_TTL_MINUTES out of range")?;
    anyhow::ensure!(
        seconds > 0 && minutes <= MAX_TTL_MINUTES,
        "JWT_TTL_MINUTES must be between 1 and {MAX_TTL_MINUTES}"
    );
    Ok(minutes)
}

fn required(key: &str) -> anyhow::Result<String> {
    let value = std::env::var(key).with_context(|| format!("{key} must be set"))?;
    anyhow::ensure!(!value.trim().is_empty(), "{key} must not be empty");
    Ok(value)
}

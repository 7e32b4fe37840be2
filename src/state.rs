use crate::admin::services::AdminCredentials;
use crate::auth::jwt::JwtKeys;
use crate::config::AppConfig;
use crate::store::{memory::MemoryStore, postgres::PgStore, AccountStore, RideStore};
use std::sync::Arc;
use time::UtcOffset;
use tracing::warn;

/// `DATABASE_URL` prefix that selects the in-process store.
pub const MEMORY_URL_PREFIX: &str = "memory:";

#[cfg(test)]
pub const FAKE_ADMIN_PASSWORD: &str = "admin-pass";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub keys: JwtKeys,
    pub admin: Arc<AdminCredentials>,
    pub accounts: Arc<dyn AccountStore>,
    pub rides: Arc<dyn RideStore>,
}

impl AppState {
    pub async fn init(local_offset: Option<UtcOffset>) -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env(local_offset)?);

        if config.database_url.starts_with(MEMORY_URL_PREFIX) {
            warn!("using in-memory store; data is lost on shutdown");
            let store = Arc::new(MemoryStore::new());
            return Self::from_parts(config, store.clone(), store);
        }

        let store = Arc::new(PgStore::connect(&config.database_url).await?);
        store.migrate().await?;
        Self::from_parts(config, store.clone(), store)
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        accounts: Arc<dyn AccountStore>,
        rides: Arc<dyn RideStore>,
    ) -> anyhow::Result<Self> {
        let keys = JwtKeys::from_config(&config.jwt);
        let admin = Arc::new(AdminCredentials::from_config(&config.admin)?);
        Ok(Self {
            config,
            keys,
            admin,
            accounts,
            rides,
        })
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::config::{AdminConfig, JwtConfig};

        let config = Arc::new(AppConfig {
            database_url: "memory://".into(),
            jwt: JwtConfig {
                secret: "test".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 60 * 24 * 7,
            },
            admin: AdminConfig {
                email: "admin@ridebook.test".into(),
                password: FAKE_ADMIN_PASSWORD.into(),
            },
            allow_admin_registration: false,
            report_offset: UtcOffset::UTC,
        });

        let store = Arc::new(MemoryStore::new());
        Self::from_parts(config, store.clone(), store).expect("fake state")
    }
}

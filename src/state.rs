use std::sync::Arc;

use anyhow::Context;
use tracing::warn;

use crate::auth::{
    jwt::JwtKeys,
    password::PasswordHasher,
    repo::{MemoryUserStore, PgUserStore, UserStore},
};
use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub keys: Arc<JwtKeys>,
    pub hasher: PasswordHasher,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let store: Arc<dyn UserStore> = match &config.database_url {
            Some(url) => {
                let db = sqlx::postgres::PgPoolOptions::new()
                    .max_connections(10)
                    .connect(url)
                    .await
                    .context("connect to database")?;

                sqlx::migrate!("./migrations")
                    .run(&db)
                    .await
                    .context("run migrations")?;
                Arc::new(PgUserStore::new(db))
            }
            None => {
                warn!("DATABASE_URL not set; users are kept in memory and lost on restart");
                Arc::new(MemoryUserStore::new())
            }
        };

        Self::from_parts(store, config)
    }

    pub fn from_parts(store: Arc<dyn UserStore>, config: AppConfig) -> anyhow::Result<Self> {
        let hasher = PasswordHasher::new(&config.password)?;
        let keys = Arc::new(JwtKeys::from_config(&config.jwt));
        Ok(Self {
            store,
            keys,
            hasher,
            config: Arc::new(config),
        })
    }

    /// State backed by an in-memory store and cheap hashing parameters.
    #[cfg(test)]
    pub fn fake() -> (Self, Arc<MemoryUserStore>) {
        let store = Arc::new(MemoryUserStore::new());
        let state = Self::from_parts(store.clone(), Self::fake_config()).expect("fake state");
        (state, store)
    }

    #[cfg(test)]
    pub fn fake_config() -> AppConfig {
        use crate::config::{JwtConfig, ServerConfig};

        AppConfig {
            database_url: None,
            jwt: JwtConfig {
                secret: "test-secret".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 60,
            },
            password: crate::auth::password::cheap_config(),
            server: ServerConfig {
                host: "127.0.0.1".into(),
                port: 0,
            },
            cookie_secure: false,
        }
    }
}

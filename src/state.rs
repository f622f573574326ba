use std::sync::Arc;

use sqlx::PgPool;

use crate::{
    auth::{
        jwt::JwtKeys,
        repo::{PgUserStore, UserStore},
    },
    cache::{CacheStore, Fetcher, HttpFetcher, PgCacheStore, ResponseCache},
    config::AppConfig,
};

/// Long-lived dependencies shared by every handler. Built once at start-up.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserStore>,
    pub cache: ResponseCache,
    pub jwt: JwtKeys,
}

impl AppState {
    pub fn init(config: AppConfig, db: PgPool) -> anyhow::Result<Self> {
        let timeout = config.store_timeout;
        let users = Arc::new(PgUserStore::new(db.clone(), timeout)) as Arc<dyn UserStore>;
        let cache_store = Arc::new(PgCacheStore::new(db, timeout)) as Arc<dyn CacheStore>;
        let fetcher = Arc::new(HttpFetcher::new(config.pokeapi.timeout)?) as Arc<dyn Fetcher>;

        Ok(Self::from_parts(Arc::new(config), users, cache_store, fetcher))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserStore>,
        cache_store: Arc<dyn CacheStore>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        let jwt = JwtKeys::from_config(&config);
        Self {
            config,
            users,
            cache: ResponseCache::new(cache_store, fetcher),
            jwt,
        }
    }
}

use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::{CacheStore, Fetcher};
use crate::db::StoreError;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("upstream unavailable")]
    UpstreamUnavailable(#[source] BoxError),
    #[error("failed to read upstream response body")]
    UpstreamRead(#[source] BoxError),
    #[error("upstream answered with status {0}")]
    UpstreamStatus(u16),
    #[error("failed to persist cached response")]
    CachePersist(#[source] StoreError),
}

/// Lookup-or-fetch-and-store over a [`CacheStore`].
///
/// Only the insert runs under `write_lock`. Two requests missing on the same
/// URL at once both fetch; the store keeps whichever row lands first.
#[derive(Clone)]
pub struct ResponseCache {
    store: Arc<dyn CacheStore>,
    fetcher: Arc<dyn Fetcher>,
    write_lock: Arc<Mutex<()>>,
}

impl ResponseCache {
    pub fn new(store: Arc<dyn CacheStore>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            store,
            fetcher,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    #[instrument(skip(self))]
    pub async fn fetch_cached(&self, url: &str) -> Result<Bytes, FetchError> {
        match self.store.get(url).await {
            Ok(Some(hit)) => {
                debug!(id = hit.id, bytes = hit.payload.len(), "cache hit");
                return Ok(Bytes::from(hit.payload));
            }
            Ok(None) => debug!("cache miss"),
            Err(e) => warn!(error = %e, "cache lookup failed, treating as miss"),
        }

        let payload = self.fetcher.get(url).await?;

        {
            let _guard = self.write_lock.lock().await;
            self.store
                .insert(url, &payload)
                .await
                .map_err(FetchError::CachePersist)?;
        }

        info!(bytes = payload.len(), "response cached");
        Ok(payload)
    }
}

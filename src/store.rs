//! Durable-store seam. The real database is an external collaborator; the
//! cache stays authoritative and store failures are logged and ignored.

use std::sync::{Arc, RwLock};

use log::info;
use once_cell::sync::Lazy;
use thiserror::Error;

use crate::models::Proxy;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub trait ProxyStore: Send + Sync {
    fn load_all(&self) -> Result<Vec<Proxy>, StoreError>;
    fn save_all(&self, proxies: &[Proxy]) -> Result<(), StoreError>;
    fn clear_old(&self) -> Result<(), StoreError>;
}

/// Keeps nothing. Used when no database driver is wired in.
pub struct NullStore;

impl ProxyStore for NullStore {
    fn load_all(&self) -> Result<Vec<Proxy>, StoreError> {
        Ok(Vec::new())
    }

    fn save_all(&self, _proxies: &[Proxy]) -> Result<(), StoreError> {
        Ok(())
    }

    fn clear_old(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

static STORE: Lazy<RwLock<Arc<dyn ProxyStore>>> =
    Lazy::new(|| RwLock::new(Arc::new(NullStore)));

pub fn set_store(s: Arc<dyn ProxyStore>) {
    if let Ok(mut guard) = STORE.write() {
        *guard = s;
    }
}

pub fn store() -> Arc<dyn ProxyStore> {
    STORE
        .read()
        .map(|s| s.clone())
        .unwrap_or_else(|_| Arc::new(NullStore))
}

/// Reports what backs proxy persistence for this process.
pub fn init_from_config(database_url: &str) {
    let dsn = std::env::var("DATABASE_URL").unwrap_or_else(|_| database_url.to_string());
    if dsn.is_empty() {
        info!("store: no database configured, cache only");
    } else {
        info!("store: no database driver in this build, cache only");
    }
}

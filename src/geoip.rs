//! GeoIP seam. The lookup database is an external collaborator; the crate
//! ships a null implementation and stamps the neutral tag when lookups miss.

use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;

/// Country tag used when no lookup result is available.
pub const UNKNOWN_COUNTRY: &str = "🏁 ZZ";

pub trait GeoIp: Send + Sync {
    /// Resolves an address to `(ip, country)` when the backing database
    /// knows it.
    fn find(&self, addr: &str) -> Option<(String, String)>;
}

pub struct NullGeoIp;

impl GeoIp for NullGeoIp {
    fn find(&self, _addr: &str) -> Option<(String, String)> {
        None
    }
}

static GEOIP: Lazy<RwLock<Arc<dyn GeoIp>>> =
    Lazy::new(|| RwLock::new(Arc::new(NullGeoIp)));

pub fn set_geoip(g: Arc<dyn GeoIp>) {
    if let Ok(mut guard) = GEOIP.write() {
        *guard = g;
    }
}

pub fn geoip() -> Arc<dyn GeoIp> {
    GEOIP
        .read()
        .map(|g| g.clone())
        .unwrap_or_else(|_| Arc::new(NullGeoIp))
}

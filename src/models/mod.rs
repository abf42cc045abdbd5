//! Proxy model definitions
//!
//! Contains the normalized proxy record, its transport option blocks and
//! the list-level pool operations.

pub mod ciphers;
pub mod proxies;
pub mod proxy;
pub mod transport;

pub use proxies::{ProxyList, ProxyListOps};
pub use proxy::{Base, Proxy, ProxyDetail};

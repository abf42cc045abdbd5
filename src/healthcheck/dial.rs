//! Dial primitives for the probes.
//!
//! An `http` proxy can be exercised end to end: the probe request actually
//! travels through it. Every other protocol would need a full client stack,
//! so reachability is measured with a deadline-bounded TCP connect against
//! the advertised endpoint.

use std::time::{Duration, Instant};

use reqwest::{Client, Proxy as ReqwestProxy};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::models::proxy::{Proxy, ProxyDetail};
use crate::utils::string::join_host_port;

pub const HEALTH_CHECK_URL: &str = "http://www.gstatic.com/generate_204";

/// Builds a client routed through an `http` proxy record, or `None` for
/// types with no native dialer.
pub fn client_via_proxy(p: &Proxy, deadline: Duration) -> Option<Client> {
    let h = match &p.detail {
        ProxyDetail::Http(h) => h,
        _ => return None,
    };
    let scheme = if h.tls { "https" } else { "http" };
    let proxy_url = format!(
        "{}://{}:{}@{}",
        scheme,
        h.username,
        h.password,
        join_host_port(&p.base.server, p.base.port)
    );
    let proxy = ReqwestProxy::all(&proxy_url).ok()?;
    Client::builder()
        .proxy(proxy)
        .timeout(deadline)
        .danger_accept_invalid_certs(h.skip_cert_verify)
        .build()
        .ok()
}

/// HEAD through the proxy; the elapsed time is the delay sample. A status
/// of 400 or above counts as dead.
pub async fn http_head_via_proxy(p: &Proxy, deadline: Duration) -> Option<Duration> {
    let client = client_via_proxy(p, deadline)?;
    let start = Instant::now();
    let resp = client.head(HEALTH_CHECK_URL).send().await.ok()?;
    if resp.status().as_u16() >= 400 {
        return None;
    }
    Some(start.elapsed())
}

/// Deadline-bounded TCP connect; the connect time is the delay sample.
pub async fn net_connectivity(server: &str, port: u16, deadline: Duration) -> Option<Duration> {
    let addr = join_host_port(server, port);
    let start = Instant::now();
    match timeout(deadline, TcpStream::connect(&addr)).await {
        Ok(Ok(_conn)) => Some(start.elapsed()),
        _ => None,
    }
}

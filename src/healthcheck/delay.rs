//! Latency probe over the whole pool with bounded parallelism.

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use log::debug;

use crate::config;
use crate::healthcheck::dial;
use crate::healthcheck::statistic;
use crate::models::proxy::ProxyDetail;
use crate::models::{Proxy, ProxyList};

/// Fallback probe deadline for proxies clash itself could not dial.
const FALLBACK_TIMEOUT: Duration = Duration::from_secs(3);
const DEFAULT_DELAY_TIMEOUT: Duration = Duration::from_secs(5);

fn delay_timeout() -> Duration {
    let cfg = config::current();
    if cfg.healthcheck_timeout > 0 {
        Duration::from_secs(cfg.healthcheck_timeout)
    } else {
        DEFAULT_DELAY_TIMEOUT
    }
}

/// Probes one proxy. `None` marks it dead for this round.
pub async fn test_delay(p: &Proxy) -> Option<Duration> {
    if !p.clash_supported() {
        return dial::net_connectivity(&p.base.server, p.base.port, FALLBACK_TIMEOUT).await;
    }
    match &p.detail {
        ProxyDetail::Http(_) => dial::http_head_via_proxy(p, delay_timeout()).await,
        _ => dial::net_connectivity(&p.base.server, p.base.port, delay_timeout()).await,
    }
}

/// Runs the latency probe over the pool and keeps the proxies that
/// answered, recording their delays.
pub async fn clean_bad_proxies(proxies: ProxyList) -> ProxyList {
    let cfg = config::current();
    let concurrency = cfg.healthcheck_connection.max(1);
    debug!(
        "healthcheck: connection={}, timeout={:?}",
        concurrency,
        delay_timeout()
    );

    let total = proxies.len();
    if total == 0 {
        return proxies;
    }
    let done = Arc::new(AtomicUsize::new(0));

    let survivors: Vec<Proxy> = stream::iter(proxies)
        .map(|p| {
            let done = done.clone();
            async move {
                let delay = test_delay(&p).await;
                let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
                let progress = finished as f64 * 100.0 / total as f64;
                print!("\r\t[{:5.1}% DONE]", progress);
                let _ = std::io::stdout().flush();
                delay.map(|d| (p, d))
            }
        })
        .buffer_unordered(concurrency)
        .filter_map(|result| async move { result })
        .map(|(p, delay)| {
            let millis = (delay.as_millis() as u64).max(1);
            statistic::update_delay(&p.identifier(), millis);
            p
        })
        .collect()
        .await;
    println!();

    survivors
}

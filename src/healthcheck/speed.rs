//! Bandwidth probe on health-check survivors.

use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use log::{debug, info};

use crate::config;
use crate::healthcheck::dial;
use crate::healthcheck::statistic;
use crate::models::{Proxy, ProxyList};

fn speed_timeout() -> Duration {
    Duration::from_secs(config::current().speed_timeout.max(1))
}

/// Streams the configured payload through the proxy and returns MB/s.
/// `None` when the proxy has no native dialer or the transfer failed.
async fn test_speed(p: &Proxy) -> Option<f64> {
    let deadline = speed_timeout();
    let client = dial::client_via_proxy(p, deadline)?;
    let url = config::current().speed_test_url.clone();
    let start = Instant::now();
    let resp = client.get(&url).send().await.ok()?;
    let bytes = resp.bytes().await.ok()?;
    let elapsed = start.elapsed().as_secs_f64();
    if elapsed <= 0.0 || bytes.is_empty() {
        return None;
    }
    Some(bytes.len() as f64 / elapsed / 1024.0 / 1024.0)
}

async fn run_speed_tests(proxies: Vec<Proxy>) {
    let cfg = config::current();
    let concurrency = cfg.speed_connection.max(1);
    debug!(
        "speedtest: connection={}, timeout={}s, url={}",
        concurrency, cfg.speed_timeout, cfg.speed_test_url
    );
    stream::iter(proxies)
        .for_each_concurrent(concurrency, |p| async move {
            if let Some(speed) = test_speed(&p).await {
                statistic::update_speed(&p.identifier(), speed);
            }
        })
        .await;
}

/// Measures every proxy in the list.
pub async fn speed_test_all(proxies: &ProxyList) {
    info!("speedtest: testing {} proxies", proxies.len());
    run_speed_tests(proxies.clone()).await;
}

/// Measures only proxies with no prior sample.
pub async fn speed_test_new(proxies: &ProxyList) {
    let untested: Vec<Proxy> = proxies
        .iter()
        .filter(|p| {
            statistic::find(&p.identifier())
                .map(|s| s.speed == 0.0)
                .unwrap_or(true)
        })
        .cloned()
        .collect();
    info!("speedtest: testing {} new proxies", untested.len());
    run_speed_tests(untested).await;
}

/// Selects the actively-requested subset for the frequent re-test pass:
/// request count over the threshold, capped by the configured maximum,
/// fastest first.
pub fn pick_active(proxies: &ProxyList) -> ProxyList {
    let cfg = config::current();
    let mut picked = statistic::req_count_than(cfg.active_frequency, proxies);
    if picked.len() > cfg.active_max_number {
        picked = statistic::sort_proxies_by_speed(picked);
        picked.truncate(cfg.active_max_number);
    }
    picked
}

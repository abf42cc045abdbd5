//! The crawl orchestrator.
//!
//! One crawl at a time fans all sources into a shared channel, merges the
//! records under the configured dedup mode, health-checks the pool and
//! publishes the shaped result. A failing source only reduces its own
//! contribution.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Instant, SystemTime};

use futures::stream::{self, StreamExt};
use log::{debug, error, info, warn};
use tokio::sync::mpsc;

use crate::app::cache;
use crate::app::getter_init::getters;
use crate::config;
use crate::geoip;
use crate::getter::history;
use crate::healthcheck;
use crate::models::{Proxy, ProxyList, ProxyListOps};
use crate::provider;
use crate::store;

/// Sources crawled concurrently.
const GETTER_POOL_SIZE: usize = 100;

static CRAWL_RUNNING: AtomicBool = AtomicBool::new(false);

/// Single-flight crawl entry point. A trigger while one is in flight is a
/// logged no-op.
pub async fn crawl_go_with_sync() {
    if CRAWL_RUNNING
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        debug!("CrawlGo: is running!");
        return;
    }
    let start = Instant::now();
    crawl_go().await;
    debug!("CrawlGo: ended after {:?}", start.elapsed());
    CRAWL_RUNNING.store(false, Ordering::SeqCst);
}

async fn crawl_go() {
    let cfg = config::current();
    let sources = getters();

    let (tx, mut rx) = mpsc::channel::<Proxy>(1);
    let runner = tokio::spawn({
        let sources = sources.clone();
        async move {
            stream::iter(0..sources.len())
                .for_each_concurrent(GETTER_POOL_SIZE, |i| {
                    let sources = sources.clone();
                    let tx = tx.clone();
                    async move {
                        sources[i].get_to_channel(tx).await;
                    }
                })
                .await;
            // all senders dropped here; the drain loop ends
        }
    });

    // seed with the previous pool so a fresh crawl cannot lose known nodes
    let mut proxies: ProxyList = cache::get_all_proxies().as_ref().clone();
    if proxies.is_empty() {
        match store::store().load_all() {
            Ok(stored) if !stored.is_empty() => {
                info!("store: loaded {} proxies from last run", stored.len());
                cache::set_usable_proxies(stored.clone());
                proxies = stored;
            }
            Ok(_) => {}
            Err(e) => warn!("store load failed: {}", e),
        }
    }

    let merge_mode = cfg.merge_mode();
    let mut id_set: std::collections::HashSet<String> = if merge_mode == 1 {
        proxies.iter().map(|p| p.identifier()).collect()
    } else {
        Default::default()
    };

    while let Some(mut p) = rx.recv().await {
        if !p.is_valid() {
            continue;
        }
        p.fix_value();
        match merge_mode {
            0 => proxies.uniq_append(p),
            1 => {
                if id_set.insert(p.identifier()) {
                    proxies.push(p);
                }
            }
            _ => proxies.push(p),
        }
    }
    let _ = runner.await;
    let mut proxies = proxies.deduplication();

    let show_mode = cfg.show_subscribe.as_str();
    if show_mode == "showall" || show_mode == "showsuc" {
        history::dump(show_mode);
    } else {
        history::dump("debug");
    }
    history::end_crawl();

    proxies.name_clear();
    let proxies = proxies.derive();
    info!("CrawlGo unique proxy count: {}", proxies.len());

    cache::set_all_proxies(proxies.clone());
    for type_name in [
        "ss",
        "ssr",
        "vmess",
        "vless",
        "trojan",
        "http",
        "snell",
        "tuic",
        "hysteria",
        "hysteria2",
    ] {
        info!(
            "{}ProxiesCount: {}",
            type_name,
            proxies.type_len(type_name)
        );
    }
    cache::set_last_crawl_time(humantime_now());

    if !cfg.save_proxy_file.is_empty() {
        save_to_file(&proxies, &format!("{}_all", cfg.save_proxy_file), &cfg.save_proxy_mode);
    }

    info!("Now proceed proxy health check...");
    let mut proxies = healthcheck::clean_bad_proxies(proxies).await;
    info!("CrawlGo usable proxy count: {}", proxies.len());

    let geo = geoip::geoip();
    proxies.add_country(geo.as_ref());
    proxies.name_add_country();
    proxies.sort_by_country_type();
    info!("Proxy rename DONE!");

    if cfg.relay_test {
        healthcheck::relay_check(&proxies).await;
        for p in proxies.iter_mut() {
            if let Some(stat) = healthcheck::statistic::find(&p.identifier()) {
                if stat.relay {
                    let egress_country = geo
                        .find(&stat.out_ip)
                        .map(|(_, c)| c)
                        .unwrap_or_else(|| stat.out_ip.clone());
                    let name = format!("Relay_{}-{}", p.base.name, egress_country);
                    p.set_name(&name);
                } else if stat.pool {
                    let name = format!("Pool_{}", p.base.name);
                    p.set_name(&name);
                }
            }
        }
    }

    proxies.name_add_index();

    cache::set_usable_proxies(proxies.clone());
    info!(
        "Usability checking done. Open {} to check",
        cfg.host_url()
    );

    if !cfg.save_proxy_file.is_empty() {
        save_to_file(&proxies, &cfg.save_proxy_file, &cfg.save_proxy_mode);
        return;
    }

    if let Err(e) = store::store().save_all(&proxies) {
        warn!("store save failed: {}", e);
    }
    if let Err(e) = store::store().clear_old() {
        warn!("store cleanup failed: {}", e);
    }

    if cfg.speed_test {
        healthcheck::speed_test_new(&proxies).await;
    }

    render_providers(&proxies);
}

/// Re-renders the cached provider documents from a pool snapshot.
pub fn render_providers(proxies: &ProxyList) {
    cache::set_clash_proxies(provider::Clash { proxies }.provide());
    cache::set_surge_proxies(provider::Surge { proxies }.provide());
}

fn save_to_file(proxies: &ProxyList, path: &str, mode: &str) {
    if let Err(e) = provider::file::save_proxies(proxies, path, mode) {
        error!("save proxies to {} failed: {}", path, e);
    }
}

fn humantime_now() -> String {
    let now = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("unix {}", now)
}

/// Speed test over the full usable pool, guarded by the config flag.
pub async fn speed_test(proxies: &ProxyList) {
    let cfg = config::current();
    if cfg.speed_test {
        healthcheck::speed_test_all(proxies).await;
    }
}

//! Per-proxy statistics, keyed by identifier.
//!
//! The list is small enough that linear scans beat maintaining an index;
//! everything goes through one mutex with short critical sections.

use std::sync::Mutex;
use std::time::SystemTime;

use lazy_static::lazy_static;

use crate::models::{Proxy, ProxyList};

#[derive(Debug, Clone, Default)]
pub struct Stat {
    pub id: String,
    /// Round-trip of the last successful probe, in milliseconds. Zero means
    /// the proxy never answered.
    pub delay_ms: u64,
    /// Last measured bandwidth in MB/s. Zero means untested.
    pub speed: f64,
    pub relay: bool,
    pub pool: bool,
    pub out_ip: String,
    pub last_checked: Option<SystemTime>,
    pub request_count: u64,
}

lazy_static! {
    static ref PROXY_STATS: Mutex<Vec<Stat>> = Mutex::new(Vec::new());
}

pub fn update_delay(id: &str, delay_ms: u64) {
    if let Ok(mut stats) = PROXY_STATS.lock() {
        match stats.iter_mut().find(|s| s.id == id) {
            Some(stat) => {
                stat.delay_ms = delay_ms;
                stat.last_checked = Some(SystemTime::now());
            }
            None => stats.push(Stat {
                id: id.to_string(),
                delay_ms,
                last_checked: Some(SystemTime::now()),
                ..Default::default()
            }),
        }
    }
}

pub fn update_speed(id: &str, speed: f64) {
    if let Ok(mut stats) = PROXY_STATS.lock() {
        match stats.iter_mut().find(|s| s.id == id) {
            Some(stat) => {
                stat.speed = speed;
                stat.last_checked = Some(SystemTime::now());
            }
            None => stats.push(Stat {
                id: id.to_string(),
                speed,
                last_checked: Some(SystemTime::now()),
                ..Default::default()
            }),
        }
    }
}

pub fn set_relay(id: &str, relay: bool, pool: bool, out_ip: &str) {
    if let Ok(mut stats) = PROXY_STATS.lock() {
        if let Some(stat) = stats.iter_mut().find(|s| s.id == id) {
            stat.relay = relay;
            stat.pool = pool;
            stat.out_ip = out_ip.to_string();
        }
    }
}

pub fn find(id: &str) -> Option<Stat> {
    PROXY_STATS
        .lock()
        .ok()
        .and_then(|stats| stats.iter().find(|s| s.id == id).cloned())
}

/// Counts an external request against a proxy; the active re-test pass
/// selects by this counter.
pub fn add_request_count(id: &str) {
    if let Ok(mut stats) = PROXY_STATS.lock() {
        if let Some(stat) = stats.iter_mut().find(|s| s.id == id) {
            stat.request_count += 1;
        }
    }
}

/// Picks the proxies requested at least `threshold` times, resetting their
/// counters so the next interval counts fresh.
pub fn req_count_than(threshold: u64, proxies: &ProxyList) -> ProxyList {
    let mut picked = ProxyList::new();
    if let Ok(mut stats) = PROXY_STATS.lock() {
        for p in proxies {
            let id = p.identifier();
            if let Some(stat) = stats.iter_mut().find(|s| s.id == id) {
                if stat.request_count >= threshold {
                    stat.request_count = 0;
                    picked.push(p.clone());
                }
            }
        }
    }
    picked
}

/// Orders proxies by recorded speed, fastest first.
pub fn sort_proxies_by_speed(mut proxies: ProxyList) -> ProxyList {
    let speed_of = |p: &Proxy| find(&p.identifier()).map(|s| s.speed).unwrap_or(0.0);
    proxies.sort_by(|a, b| {
        speed_of(b)
            .partial_cmp(&speed_of(a))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    proxies
}

/// Test hook: wipes all stats.
pub fn reset_for_test() {
    if let Ok(mut stats) = PROXY_STATS.lock() {
        stats.clear();
    }
}

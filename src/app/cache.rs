//! Snapshot registers shared between the crawl pipeline and consumers.
//! Readers clone the current `Arc`; writers allocate and swap. No reader
//! ever blocks a crawl.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;

use crate::models::ProxyList;

static ALL_PROXIES: Lazy<RwLock<Arc<ProxyList>>> =
    Lazy::new(|| RwLock::new(Arc::new(ProxyList::new())));
static USABLE_PROXIES: Lazy<RwLock<Arc<ProxyList>>> =
    Lazy::new(|| RwLock::new(Arc::new(ProxyList::new())));
static CLASH_PROXIES: Lazy<RwLock<Arc<String>>> =
    Lazy::new(|| RwLock::new(Arc::new(String::new())));
static SURGE_PROXIES: Lazy<RwLock<Arc<String>>> =
    Lazy::new(|| RwLock::new(Arc::new(String::new())));
static LAST_CRAWL_TIME: Lazy<RwLock<String>> = Lazy::new(|| RwLock::new(String::new()));

pub static GETTERS_COUNT: AtomicUsize = AtomicUsize::new(0);
pub static ALL_PROXIES_COUNT: AtomicUsize = AtomicUsize::new(0);
pub static USABLE_PROXIES_COUNT: AtomicUsize = AtomicUsize::new(0);

fn read_list(register: &RwLock<Arc<ProxyList>>) -> Arc<ProxyList> {
    register
        .read()
        .map(|r| r.clone())
        .unwrap_or_else(|_| Arc::new(ProxyList::new()))
}

fn write_list(register: &RwLock<Arc<ProxyList>>, list: ProxyList) {
    if let Ok(mut guard) = register.write() {
        *guard = Arc::new(list);
    }
}

pub fn get_all_proxies() -> Arc<ProxyList> {
    read_list(&ALL_PROXIES)
}

pub fn set_all_proxies(list: ProxyList) {
    ALL_PROXIES_COUNT.store(list.len(), Ordering::Relaxed);
    write_list(&ALL_PROXIES, list);
}

pub fn get_usable_proxies() -> Arc<ProxyList> {
    read_list(&USABLE_PROXIES)
}

pub fn set_usable_proxies(list: ProxyList) {
    USABLE_PROXIES_COUNT.store(list.len(), Ordering::Relaxed);
    write_list(&USABLE_PROXIES, list);
}

pub fn get_clash_proxies() -> Arc<String> {
    CLASH_PROXIES
        .read()
        .map(|r| r.clone())
        .unwrap_or_else(|_| Arc::new(String::new()))
}

pub fn set_clash_proxies(text: String) {
    if let Ok(mut guard) = CLASH_PROXIES.write() {
        *guard = Arc::new(text);
    }
}

pub fn get_surge_proxies() -> Arc<String> {
    SURGE_PROXIES
        .read()
        .map(|r| r.clone())
        .unwrap_or_else(|_| Arc::new(String::new()))
}

pub fn set_surge_proxies(text: String) {
    if let Ok(mut guard) = SURGE_PROXIES.write() {
        *guard = Arc::new(text);
    }
}

pub fn set_last_crawl_time(text: String) {
    if let Ok(mut guard) = LAST_CRAWL_TIME.write() {
        *guard = text;
    }
}

pub fn last_crawl_time() -> String {
    LAST_CRAWL_TIME
        .read()
        .map(|t| t.clone())
        .unwrap_or_default()
}

//! Source adapters and their registry.
//!
//! A getter fetches raw content from one source and emits normalized proxy
//! records. The registry maps the `type` string of a source descriptor to a
//! constructor; it is built explicitly at startup so the set of available
//! adapters is the same on every run.

pub mod history;
pub mod subscribe;
pub mod tgchannel;
pub mod tggroup;
pub mod webfuzz;

use std::collections::HashMap;

use async_trait::async_trait;
use lazy_static::lazy_static;
use log::info;
use regex::Regex;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::config;
use crate::models::{Proxy, ProxyList};
use crate::parser::{grep_links_from_string, parse_proxy_link};

#[derive(Debug, Error)]
pub enum GetterError {
    #[error("url should be specified")]
    UrlNotFound,
    #[error("channel should be specified")]
    ChannelNotFound,
    #[error("type not supported")]
    TypeNotSupported,
    #[error("option {0} is not a string")]
    OptionNotString(&'static str),
}

pub type Options = serde_yaml::Mapping;

/// A single proxy source.
#[async_trait]
pub trait Getter: Send + Sync {
    /// Fetches and parses this source. Network failures yield an empty
    /// list, never an error.
    async fn get(&self) -> ProxyList;

    /// Adapter kind for statistic lines.
    fn kind(&self) -> &'static str;

    /// The URL this adapter is anchored on.
    fn source(&self) -> String;

    /// Drains `get` into the shared channel; completion is signalled by the
    /// sender being dropped with the rest of the fan-out.
    async fn get_to_channel(&self, tx: mpsc::Sender<Proxy>) {
        let nodes = self.get().await;
        info!(
            "STATISTIC: {:<12} count={:<5} url={}",
            self.kind(),
            nodes.len(),
            self.source()
        );
        for node in nodes {
            if tx.send(node).await.is_err() {
                break;
            }
        }
    }
}

type Creator = fn(&Options) -> Result<Box<dyn Getter>, GetterError>;

/// Explicit adapter table keyed by source type.
pub struct Registry {
    creators: HashMap<&'static str, Creator>,
}

impl Registry {
    pub fn with_builtins() -> Self {
        let mut creators: HashMap<&'static str, Creator> = HashMap::new();
        creators.insert("subscribe", subscribe::create);
        creators.insert("tgchannel", tgchannel::create);
        creators.insert("tggroup", tggroup::create);
        creators.insert("webfuzzsub", webfuzz::create);
        Registry { creators }
    }

    pub fn create(
        &self,
        source_type: &str,
        options: &Options,
    ) -> Result<Box<dyn Getter>, GetterError> {
        match self.creators.get(source_type) {
            Some(creator) => creator(options),
            None => Err(GetterError::TypeNotSupported),
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Pulls a mandatory non-empty string option.
pub(crate) fn option_string(
    options: &Options,
    key: &'static str,
    missing: GetterError,
) -> Result<String, GetterError> {
    match options.get(key) {
        Some(serde_yaml::Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(_) => Err(GetterError::OptionNotString(key)),
        None => Err(missing),
    }
}

/// Pulls a positive integer option, tolerating float spellings.
pub(crate) fn option_num(options: &Options, key: &str, default: usize) -> usize {
    match options.get(key) {
        Some(serde_yaml::Value::Number(n)) => {
            let value = n
                .as_u64()
                .map(|v| v as usize)
                .or_else(|| n.as_f64().map(|f| f as usize))
                .unwrap_or(default);
            if value == 0 {
                default
            } else {
                value
            }
        }
        _ => default,
    }
}

/// Parses a batch of links, dropping the ones that fail.
pub fn string_array_to_proxies(links: Vec<String>) -> ProxyList {
    links
        .iter()
        .filter_map(|link| parse_proxy_link(link).ok())
        .collect()
}

/// Greps proxy links out of free text and parses them.
pub fn fuzz_parse_proxies(text: &str) -> ProxyList {
    string_array_to_proxies(grep_links_from_string(text))
}

const IP4_PATTERN: &str = r"((25[0-5]|2[0-4]\d|[01]?\d\d?)\.){3}(25[0-5]|2[0-4]\d|[01]?\d\d?)";
const DOMAIN_PATTERN: &str =
    r"[a-zA-Z0-9][a-zA-Z0-9_-]{0,62}(\.[a-zA-Z0-9][a-zA-Z0-9_-]{0,62})*(\.[a-zA-Z][a-zA-Z0-9]{0,10}){1}";

lazy_static! {
    static ref URL_RE: Regex = Regex::new(&format!(
        r"((https|http)?://)?(([0-9a-zA-Z]+:)?[0-9a-zA-Z_-]+@)?({}|({}))(:\d{{1,5}})?(/+[a-zA-Z0-9_#@%.\-][a-zA-Z0-9_#@%.\-]*)*/*(\?([a-zA-Z0-9_\-]+(=[^<>\x22'\(\)\s]*&?)*)*)*",
        IP4_PATTERN, DOMAIN_PATTERN
    ))
    .expect("url regex");
}

/// Finds URL-looking strings in a blob of HTML or text. `limit` caps the
/// scan, `None` scans everything.
pub fn find_all_url(html: &str, limit: Option<usize>) -> Vec<String> {
    let mut found: Vec<String> = URL_RE
        .find_iter(html)
        .take(limit.unwrap_or(usize::MAX))
        .map(|m| m.as_str().to_string())
        .collect();
    let mut seen = std::collections::HashSet::new();
    found.retain(|u| seen.insert(u.clone()));
    found
}

/// Gate for candidate subscription URLs discovered inside other sources.
pub fn check_subscribe_url_valid(url: &str) -> bool {
    if url.is_empty() {
        return false;
    }
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        return false;
    }
    let cfg = config::current();
    for prefix in &cfg.sub_urls_black_prefix {
        if url.starts_with(prefix.as_str()) {
            return false;
        }
    }
    if url.matches('/').count() >= 3 {
        for suffix in &cfg.sub_urls_black_suffix {
            if url.ends_with(suffix.as_str()) {
                return false;
            }
        }
    }
    if cfg.sub_urls_black_list.iter().any(|b| b == url) {
        return false;
    }
    true
}

/// URL grep filtered through the subscription gate.
pub fn find_all_subscribe_url(html: &str, limit: Option<usize>) -> Vec<String> {
    find_all_url(html, limit)
        .into_iter()
        .filter(|u| check_subscribe_url_valid(u))
        .collect()
}

/// Filters and instantiates the configured sources.
pub fn build_getters(registry: &Registry, sources: &[config::Source]) -> Vec<Box<dyn Getter>> {
    let cfg = config::current();
    let mut getters: Vec<Box<dyn Getter>> = Vec::new();
    let mut seen: std::collections::HashSet<String> = std::collections::HashSet::new();

    for source in sources {
        if source.options.is_empty() {
            continue;
        }
        if source_in_black_list(&cfg.getter_black_list, source) {
            continue;
        }
        let anchor = source_anchor(source);
        if !anchor.is_empty() && !seen.insert(anchor) {
            continue;
        }
        match registry.create(&source.source_type, &source.options) {
            Ok(getter) => {
                log::debug!("init getter: {} {:?}", source.source_type, source.options);
                getters.push(getter);
            }
            Err(e) => {
                log::warn!("skipping source {}: {}", source.source_type, e);
            }
        }
    }
    getters
}

fn source_anchor(source: &config::Source) -> String {
    for key in ["channel", "url"] {
        if let Some(serde_yaml::Value::String(v)) = source.options.get(key) {
            return format!("{}{}", v, source.source_type);
        }
    }
    String::new()
}

fn source_in_black_list(
    black_list: &HashMap<String, HashMap<String, serde_yaml::Value>>,
    source: &config::Source,
) -> bool {
    if let Some(entries) = black_list.get(&source.source_type) {
        // "-" bans the whole source type
        if entries.contains_key("-") {
            return true;
        }
        for key in ["channel", "url"] {
            if let Some(serde_yaml::Value::String(v)) = source.options.get(key) {
                if !v.is_empty() && entries.contains_key(v.as_str()) {
                    return true;
                }
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigOptions;
    use std::sync::Mutex;

    lazy_static! {
        // these tests swap the global config snapshot
        static ref CONFIG_GUARD: Mutex<()> = Mutex::new(());
    }

    #[test]
    fn test_find_all_url() {
        let html = "<a href=\"https://sub.example/clash?token=1\">x</a> plain \
                    http://1.2.3.4:8080/sub and again https://sub.example/clash?token=1";
        let urls = find_all_url(html, None);
        assert!(urls.iter().any(|u| u.starts_with("https://sub.example/clash")));
        assert!(urls.iter().any(|u| u.starts_with("http://1.2.3.4:8080/sub")));
        // duplicates are collapsed
        let clash_count = urls
            .iter()
            .filter(|u| u.starts_with("https://sub.example/clash"))
            .count();
        assert_eq!(clash_count, 1);
    }

    #[test]
    fn test_check_subscribe_url_valid() {
        let _guard = CONFIG_GUARD.lock().unwrap_or_else(|e| e.into_inner());
        let mut cfg = ConfigOptions::default();
        cfg.sub_urls_black_prefix = vec!["https://t.me".to_string()];
        cfg.sub_urls_black_suffix = vec![".jpg".to_string()];
        cfg.sub_urls_black_list = vec!["https://dead.example/sub".to_string()];
        crate::config::replace_for_test(cfg);

        assert!(check_subscribe_url_valid("https://sub.example/clash"));
        assert!(check_subscribe_url_valid("http://sub.example/clash"));
        assert!(!check_subscribe_url_valid("ftp://sub.example/clash"));
        assert!(!check_subscribe_url_valid("https://t.me/s/somechannel"));
        assert!(!check_subscribe_url_valid("https://img.example/a/b.jpg"));
        assert!(!check_subscribe_url_valid("https://dead.example/sub"));
        // suffix blacklist only applies at path depth >= 2
        assert!(check_subscribe_url_valid("https://img.example.jpg"));

        crate::config::replace_for_test(ConfigOptions::default());
    }

    #[test]
    fn test_registry_builtins() {
        let registry = Registry::with_builtins();
        let mut options = Options::new();
        options.insert(
            serde_yaml::Value::from("url"),
            serde_yaml::Value::from("https://sub.example/clash"),
        );
        assert!(registry.create("subscribe", &options).is_ok());
        assert!(registry.create("webfuzzsub", &options).is_ok());
        assert!(matches!(
            registry.create("nosuch", &options),
            Err(GetterError::TypeNotSupported)
        ));
    }

    #[test]
    fn test_build_getters_blacklist_and_dedup() {
        let _guard = CONFIG_GUARD.lock().unwrap_or_else(|e| e.into_inner());
        let registry = Registry::with_builtins();
        let yaml = r#"
- type: subscribe
  options: {url: "https://a.example/sub"}
- type: subscribe
  options: {url: "https://a.example/sub"}
- type: subscribe
  options: {url: "https://b.example/sub"}
- type: tgchannel
  options: {channel: "chan", num: 100}
"#;
        let sources: Vec<config::Source> = serde_yaml::from_str(yaml).unwrap();

        let mut cfg = ConfigOptions::default();
        let mut banned: HashMap<String, serde_yaml::Value> = HashMap::new();
        banned.insert("-".to_string(), serde_yaml::Value::from(1));
        cfg.getter_black_list.insert("tgchannel".to_string(), banned);
        crate::config::replace_for_test(cfg);

        let getters = build_getters(&registry, &sources);
        // duplicate subscribe collapsed, tgchannel type banned
        assert_eq!(getters.len(), 2);

        crate::config::replace_for_test(ConfigOptions::default());
    }
}

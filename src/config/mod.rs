//! Configuration loading. The file is YAML, read from a local path or an
//! HTTP URL; a handful of options yield to environment variables. Readers
//! take a snapshot (`current()`); `parse` swaps the pointer.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use log::debug;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utils::http::web_get;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config read failed: {0}")]
    Read(String),
    #[error("config parse failed: {0}")]
    Parse(String),
}

/// One source descriptor as found in a source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    #[serde(rename = "type")]
    pub source_type: String,
    #[serde(default)]
    pub options: serde_yaml::Mapping,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigOptions {
    pub domain: String,
    pub port: String,
    pub database_url: String,
    #[serde(rename = "crawl-interval")]
    pub crawl_interval: u64,
    #[serde(rename = "cf_email")]
    pub cf_email: String,
    #[serde(rename = "cf_key")]
    pub cf_key: String,
    #[serde(rename = "tg_file_api")]
    pub tg_file_api: String,
    #[serde(rename = "show_subscribe")]
    pub show_subscribe: String,
    #[serde(rename = "source-files")]
    pub source_files: Vec<String>,
    #[serde(rename = "proxies_merge_mode")]
    pub proxies_merge_mode: Option<u8>,
    #[serde(rename = "getter_black_list")]
    pub getter_black_list: HashMap<String, HashMap<String, serde_yaml::Value>>,
    #[serde(rename = "zero_fail")]
    pub zero_fail: bool,
    #[serde(rename = "zero_fail_num")]
    pub zero_fail_num: u32,
    #[serde(rename = "zero_fail_multifactor")]
    pub zero_fail_multifactor: u32,
    #[serde(rename = "suburl-blacklist-prefix")]
    pub sub_urls_black_prefix: Vec<String>,
    #[serde(rename = "suburl-blacklist-suffix")]
    pub sub_urls_black_suffix: Vec<String>,
    #[serde(rename = "suburl-blacklist")]
    pub sub_urls_black_list: Vec<String>,
    #[serde(rename = "healthcheck-timeout")]
    pub healthcheck_timeout: u64,
    #[serde(rename = "healthcheck-connection")]
    pub healthcheck_connection: usize,
    #[serde(rename = "relaytest")]
    pub relay_test: bool,
    #[serde(rename = "speedtest")]
    pub speed_test: bool,
    #[serde(rename = "speedtest-interval")]
    pub speed_test_interval: u64,
    #[serde(rename = "speed-timeout")]
    pub speed_timeout: u64,
    #[serde(rename = "speed-connection")]
    pub speed_connection: usize,
    #[serde(rename = "speed-test-url")]
    pub speed_test_url: String,
    #[serde(rename = "active-frequency")]
    pub active_frequency: u64,
    #[serde(rename = "active-interval")]
    pub active_interval: u64,
    #[serde(rename = "active-max-number")]
    pub active_max_number: usize,
    #[serde(rename = "save_proxy_file")]
    pub save_proxy_file: String,
    #[serde(rename = "save_proxy_mode")]
    pub save_proxy_mode: String,
}

impl ConfigOptions {
    /// Host URL of the embedded service, appending the port when the domain
    /// does not already carry one.
    pub fn host_url(&self) -> String {
        if self.domain.split(':').count() <= 1 {
            format!("{}:{}", self.domain, self.port)
        } else {
            self.domain.clone()
        }
    }

    /// Effective merge mode. Unset configurations take bulk dedup.
    pub fn merge_mode(&self) -> u8 {
        self.proxies_merge_mode.unwrap_or(2)
    }

    fn apply_defaults(&mut self) {
        if self.speed_connection == 0 {
            self.speed_connection = 5;
        }
        if self.speed_timeout == 0 {
            self.speed_timeout = 10;
        }
        if self.healthcheck_connection == 0 {
            self.healthcheck_connection = 500;
        }
        if self.port.is_empty() {
            self.port = "12580".to_string();
        }
        if self.crawl_interval == 0 {
            self.crawl_interval = 60;
        }
        if self.tg_file_api.is_empty() {
            self.tg_file_api = "https://tg.i-c-a.su/rss/".to_string();
        }
        if self.zero_fail_num == 0 {
            self.zero_fail_num = 10;
        }
        if self.zero_fail_multifactor == 0 {
            self.zero_fail_multifactor = 20;
        }
        if self.speed_test_interval == 0 {
            self.speed_test_interval = 720;
        }
        if self.speed_test_url.is_empty() {
            self.speed_test_url = "http://cachefly.cachefly.net/10mb.test".to_string();
        }
        if self.active_interval == 0 {
            self.active_interval = 60;
        }
        if self.active_frequency == 0 {
            self.active_frequency = 100;
        }
        if self.active_max_number == 0 {
            self.active_max_number = 100;
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(domain) = std::env::var("DOMAIN") {
            if !domain.is_empty() {
                self.domain = domain;
            }
        }
        if let Ok(email) = std::env::var("CF_API_EMAIL") {
            if !email.is_empty() {
                self.cf_email = email;
            }
        }
        if let Ok(key) = std::env::var("CF_API_KEY") {
            if !key.is_empty() {
                self.cf_key = key;
            }
        }
    }
}

static CONFIG: Lazy<RwLock<Arc<ConfigOptions>>> = Lazy::new(|| {
    let mut cfg = ConfigOptions::default();
    cfg.apply_defaults();
    RwLock::new(Arc::new(cfg))
});

static FILE_PATH: Lazy<RwLock<String>> = Lazy::new(|| RwLock::new("config.yaml".to_string()));

/// Snapshot of the current configuration.
pub fn current() -> Arc<ConfigOptions> {
    CONFIG
        .read()
        .map(|c| c.clone())
        .unwrap_or_else(|_| Arc::new(ConfigOptions::default()))
}

pub fn set_file_path(path: &str) {
    if let Ok(mut guard) = FILE_PATH.write() {
        *guard = path.to_string();
    }
}

pub fn file_path() -> String {
    FILE_PATH
        .read()
        .map(|p| p.clone())
        .unwrap_or_else(|_| "config.yaml".to_string())
}

/// Directory the config file lives in; relative source files resolve
/// against it.
pub fn file_dir() -> PathBuf {
    let path = file_path();
    Path::new(&path)
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn is_local_file(path: &str) -> bool {
    !(path.starts_with("http://") || path.starts_with("https://"))
}

/// Reads a file from the local filesystem or over HTTP.
pub async fn read_file(path: &str) -> Result<String, ConfigError> {
    if is_local_file(path) {
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ConfigError::Read(format!("{}: {}", path, e)))
    } else {
        web_get(path)
            .await
            .map_err(|e| ConfigError::Read(format!("{}: {}", path, e)))
    }
}

/// Parses the configured file and swaps the global snapshot.
pub async fn parse() -> Result<(), ConfigError> {
    let data = read_file(&file_path()).await?;
    let mut new_config: ConfigOptions =
        serde_yaml::from_str(&data).map_err(|e| ConfigError::Parse(e.to_string()))?;
    new_config.apply_defaults();
    new_config.apply_env_overrides();

    crate::getter::history::configure(
        new_config.zero_fail,
        new_config.zero_fail_num,
        new_config.zero_fail_multifactor,
    );

    if let Ok(json) = serde_json::to_string(&new_config) {
        debug!("Config options: {}", json);
    }
    if let Ok(mut guard) = CONFIG.write() {
        *guard = Arc::new(new_config);
    }
    Ok(())
}

/// Test hook: installs a configuration snapshot directly.
pub fn replace_for_test(mut cfg: ConfigOptions) {
    cfg.apply_defaults();
    if let Ok(mut guard) = CONFIG.write() {
        *guard = Arc::new(cfg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let mut cfg: ConfigOptions = serde_yaml::from_str("domain: pool.example").unwrap();
        cfg.apply_defaults();
        assert_eq!(cfg.port, "12580");
        assert_eq!(cfg.crawl_interval, 60);
        assert_eq!(cfg.healthcheck_connection, 500);
        assert_eq!(cfg.zero_fail_num, 10);
        assert_eq!(cfg.zero_fail_multifactor, 20);
        assert_eq!(cfg.tg_file_api, "https://tg.i-c-a.su/rss/");
        assert_eq!(cfg.merge_mode(), 2);
    }

    #[test]
    fn test_configured_keys() {
        let yaml = r#"
domain: pool.example
proxies_merge_mode: 1
zero_fail: true
healthcheck-timeout: 5
suburl-blacklist-prefix:
  - https://t.me
getter_black_list:
  tgchannel:
    "-": 1
"#;
        let mut cfg: ConfigOptions = serde_yaml::from_str(yaml).unwrap();
        cfg.apply_defaults();
        assert_eq!(cfg.merge_mode(), 1);
        assert!(cfg.zero_fail);
        assert_eq!(cfg.healthcheck_timeout, 5);
        assert_eq!(cfg.sub_urls_black_prefix, vec!["https://t.me".to_string()]);
        assert!(cfg.getter_black_list["tgchannel"].contains_key("-"));
    }

    #[test]
    fn test_host_url() {
        let mut cfg = ConfigOptions::default();
        cfg.domain = "pool.example".to_string();
        cfg.port = "12580".to_string();
        assert_eq!(cfg.host_url(), "pool.example:12580");
        cfg.domain = "pool.example:80".to_string();
        assert_eq!(cfg.host_url(), "pool.example:80");
    }

    #[test]
    fn test_source_descriptor() {
        let yaml = r#"
- type: subscribe
  options:
    url: https://sub.example/clash
- type: tgchannel
  options:
    channel: somechannel
    num: 200
"#;
        let sources: Vec<Source> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].source_type, "subscribe");
        assert_eq!(sources[1].source_type, "tgchannel");
    }
}

//! Bootstrap: configuration plus source files into a live getter set.

use std::sync::atomic::Ordering;
use std::sync::{Arc, RwLock};

use anyhow::{bail, Context, Result};
use log::{error, info};
use once_cell::sync::Lazy;

use crate::app::cache;
use crate::config;
use crate::getter::{build_getters, Getter, Registry};

static GETTERS: Lazy<RwLock<Arc<Vec<Box<dyn Getter>>>>> =
    Lazy::new(|| RwLock::new(Arc::new(Vec::new())));

pub fn getters() -> Arc<Vec<Box<dyn Getter>>> {
    GETTERS
        .read()
        .map(|g| g.clone())
        .unwrap_or_else(|_| Arc::new(Vec::new()))
}

/// Parses the config file and rebuilds the getter set from the source
/// files it names. Fatal only when no sources are configured at all; a
/// single broken source file reduces the set, not the run.
pub async fn init_config_and_getters() -> Result<()> {
    config::parse().await.context("config parse")?;

    let cfg = config::current();
    if cfg.source_files.is_empty() {
        bail!("no sources");
    }

    let registry = Registry::with_builtins();
    let mut sources: Vec<config::Source> = Vec::new();
    for raw_path in &cfg.source_files {
        let path = resolve_source_path(raw_path);
        let data = match config::read_file(&path).await {
            Ok(data) => data,
            Err(e) => {
                error!("init source file error: {}", e);
                continue;
            }
        };
        match serde_yaml::from_str::<Vec<config::Source>>(&data) {
            Ok(mut list) => sources.append(&mut list),
            Err(e) => error!("init source file error: {}: {}", path, e),
        }
    }

    let getters = build_getters(&registry, &sources);
    info!("Getter count: {}", getters.len());
    cache::GETTERS_COUNT.store(getters.len(), Ordering::Relaxed);
    if let Ok(mut guard) = GETTERS.write() {
        *guard = Arc::new(getters);
    }
    Ok(())
}

fn resolve_source_path(path: &str) -> String {
    if config::is_local_file(path) && !std::path::Path::new(path).is_absolute() {
        config::file_dir()
            .join(path)
            .to_string_lossy()
            .into_owned()
    } else {
        path.to_string()
    }
}

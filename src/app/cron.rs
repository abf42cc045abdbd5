//! Interval schedules: crawl, full speed test, active re-test. Each loop
//! reloads configuration before doing work so edits take effect without a
//! restart.

use std::time::Duration;

use log::{error, info};
use tokio::time::{interval, MissedTickBehavior};

use crate::app::cache;
use crate::app::getter_init::init_config_and_getters;
use crate::app::task;
use crate::config;
use crate::healthcheck;

fn minutes(m: u64) -> Duration {
    Duration::from_secs(m.max(1) * 60)
}

async fn crawl_task() {
    if let Err(e) = init_config_and_getters().await {
        error!("config parse error: {}", e);
    }
    task::crawl_go_with_sync().await;
}

async fn speed_test_task() {
    if let Err(e) = config::parse().await {
        error!("config parse error: {}", e);
    }
    if !config::current().speed_test {
        return;
    }
    info!("Doing speed test task...");
    let proxies = cache::get_usable_proxies().as_ref().clone();
    task::speed_test(&proxies).await;
    task::render_providers(&proxies);
}

async fn active_speed_test_task() {
    if let Err(e) = config::parse().await {
        error!("config parse error: {}", e);
    }
    if !config::current().speed_test {
        return;
    }
    info!("Doing speed test task for active proxies...");
    let all = cache::get_usable_proxies().as_ref().clone();
    let picked = healthcheck::pick_active(&all);
    info!("Active proxies count: {}", picked.len());
    task::speed_test(&picked).await;
    task::render_providers(&all);
}

/// Runs the three schedules forever. Intervals come from the configuration
/// current at startup.
pub async fn run() {
    let cfg = config::current();

    let crawl = async {
        let mut ticker = interval(minutes(cfg.crawl_interval));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await; // immediate tick; the first crawl runs at startup
        loop {
            ticker.tick().await;
            crawl_task().await;
        }
    };

    let speed = async {
        let mut ticker = interval(minutes(cfg.speed_test_interval));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            speed_test_task().await;
        }
    };

    let active = async {
        let mut ticker = interval(minutes(cfg.active_interval));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            active_speed_test_task().await;
        }
    };

    futures::join!(crawl, speed, active);
}

//! Crawl orchestration, shared caches and schedules.

pub mod cache;
pub mod cron;
pub mod getter_init;
pub mod task;

pub use getter_init::{getters, init_config_and_getters};
pub use task::crawl_go_with_sync;

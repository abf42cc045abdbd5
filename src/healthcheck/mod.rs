//! Probes: latency, bandwidth, egress classification, and the per-proxy
//! statistics they feed.

pub mod delay;
pub mod dial;
pub mod relay;
pub mod speed;
pub mod statistic;

pub use delay::clean_bad_proxies;
pub use relay::relay_check;
pub use speed::{pick_active, speed_test_all, speed_test_new};
pub use statistic::Stat;

//! Per-URL source-quality memory.
//!
//! Every fetching adapter checks in here before touching the network. A URL
//! that keeps yielding nothing is suppressed with a growing back-off factor;
//! one refused attempt raises the factor by `fail_num`, so the URL skips a
//! crawl round per crossing until the factor saturates, which is a permanent
//! ban for the process lifetime. Any successful yield resets the record.
//!
//! With the feature disabled only a per-crawl seen-set remains, which stops
//! the same URL from being fetched twice within one crawl.

use std::collections::HashMap;
use std::sync::Mutex;

use lazy_static::lazy_static;
use log::{debug, info};

#[derive(Debug, Clone, Default)]
pub struct SourceQualityRecord {
    pub in_flight: bool,
    pub last_response_size: usize,
    pub last_yield: usize,
    pub zero_streak: u32,
    pub backoff_factor: u32,
}

struct SourceQuality {
    enabled: bool,
    fail_num: u32,
    multi_factor: u32,
    records: HashMap<String, SourceQualityRecord>,
}

impl SourceQuality {
    fn cap(&self) -> u32 {
        self.fail_num.saturating_mul(self.multi_factor)
    }

    fn admit(&mut self, url: &str) -> bool {
        if !self.enabled {
            // blind marker: one fetch per URL per crawl
            let record = self.records.entry(url.to_string()).or_default();
            if record.in_flight {
                return true;
            }
            record.in_flight = true;
            return false;
        }

        let multi_factor = self.multi_factor;
        let fail_num = self.fail_num;
        let cap = self.cap();
        let record = self
            .records
            .entry(url.to_string())
            .or_insert_with(|| SourceQualityRecord {
                backoff_factor: multi_factor,
                ..Default::default()
            });
        if record.in_flight {
            return true;
        }
        if record.zero_streak > record.backoff_factor {
            if record.backoff_factor < cap {
                record.backoff_factor = (record.backoff_factor + fail_num).min(cap);
            }
            return true;
        }
        record.in_flight = true;
        false
    }

    fn close(&mut self, url: &str) {
        if !self.enabled {
            return;
        }
        let multi_factor = self.multi_factor;
        if let Some(record) = self.records.get_mut(url) {
            record.in_flight = false;
            if record.last_yield > 0 {
                record.zero_streak = 0;
                record.backoff_factor = multi_factor;
            } else if record.last_response_size > 0 {
                // data but nothing parseable: jump past the threshold
                record.zero_streak = record.zero_streak.max(record.backoff_factor + 1);
            } else {
                record.zero_streak += 1;
            }
        }
    }
}

lazy_static! {
    static ref SOURCE_QUALITY: Mutex<SourceQuality> = Mutex::new(SourceQuality {
        enabled: false,
        fail_num: 10,
        multi_factor: 20,
        records: HashMap::with_capacity(1000),
    });
}

pub fn configure(enabled: bool, fail_num: u32, multi_factor: u32) {
    if let Ok(mut q) = SOURCE_QUALITY.lock() {
        q.enabled = enabled;
        if fail_num > 0 {
            q.fail_num = fail_num;
        }
        if multi_factor > 0 {
            q.multi_factor = multi_factor;
        }
    }
}

/// Returns `true` when the URL must be skipped; otherwise the caller owns
/// the fetch and must call [`close`] when done.
pub fn admit(url: &str) -> bool {
    SOURCE_QUALITY
        .lock()
        .map(|mut q| q.admit(url))
        .unwrap_or(false)
}

pub fn set_response_size(url: &str, size: usize) {
    if let Ok(mut q) = SOURCE_QUALITY.lock() {
        if let Some(record) = q.records.get_mut(url) {
            record.last_response_size = size;
        }
    }
}

pub fn set_yield(url: &str, count: usize) {
    if let Ok(mut q) = SOURCE_QUALITY.lock() {
        if let Some(record) = q.records.get_mut(url) {
            record.last_yield = count;
        }
    }
}

/// Finishes a fetch and applies the back-off transition.
pub fn close(url: &str) {
    if let Ok(mut q) = SOURCE_QUALITY.lock() {
        q.close(url);
    }
}

/// Pins a one-shot sub-source so it is never fetched again. Used by the
/// telegram companion API path after a yielding fetch.
pub fn block_after_success(url: &str) {
    if let Ok(mut q) = SOURCE_QUALITY.lock() {
        if !q.enabled {
            return;
        }
        let cap = q.cap();
        if let Some(record) = q.records.get_mut(url) {
            record.backoff_factor = cap;
            record.zero_streak = cap.saturating_add(1);
        }
    }
}

/// Ends a crawl: clears the blind markers in disabled mode and any stuck
/// in-flight flags otherwise.
pub fn end_crawl() {
    if let Ok(mut q) = SOURCE_QUALITY.lock() {
        if q.enabled {
            for record in q.records.values_mut() {
                record.in_flight = false;
            }
        } else {
            q.records.clear();
        }
    }
}

/// Dumps per-URL statistics. `showall` prints every record at info level,
/// `showsuc` only the yielding ones; anything else logs at debug.
pub fn dump(mode: &str) {
    if let Ok(q) = SOURCE_QUALITY.lock() {
        for (url, record) in q.records.iter() {
            match mode {
                "showall" => info!(
                    "STATISTIC: Subscribe count={:<5} size={:<8} url={}",
                    record.last_yield, record.last_response_size, url
                ),
                "showsuc" => {
                    if record.last_yield > 0 {
                        info!(
                            "STATISTIC: Subscribe count={:<5} size={:<8} url={}",
                            record.last_yield, record.last_response_size, url
                        );
                    }
                }
                _ => debug!(
                    "STATISTIC: Subscribe count={:<5} url={}",
                    record.last_yield, url
                ),
            }
        }
    }
}

/// Test hook: snapshot of a record.
pub fn record_snapshot(url: &str) -> Option<SourceQualityRecord> {
    SOURCE_QUALITY
        .lock()
        .ok()
        .and_then(|q| q.records.get(url).cloned())
}

/// Test hook: wipes all records.
pub fn reset_for_test() {
    if let Ok(mut q) = SOURCE_QUALITY.lock() {
        q.records.clear();
    }
}

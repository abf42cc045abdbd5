//! Egress classification: a proxy whose outbound address differs from its
//! advertised server is a relay; an egress shared by several servers is a
//! pool endpoint.

use std::collections::HashMap;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use log::debug;

use crate::geoip;
use crate::healthcheck::dial;
use crate::healthcheck::statistic;
use crate::models::ProxyList;

const IP_ECHO_URL: &str = "https://api.ip.sb/ip";
const RELAY_TIMEOUT: Duration = Duration::from_secs(10);
const RELAY_CONCURRENCY: usize = 16;

/// Servers sharing an egress at or past this count classify as a pool.
const POOL_SHARE_THRESHOLD: usize = 3;

/// Probes the outbound IP of every dialable survivor and stores the
/// relay/pool classification in the stats.
pub async fn relay_check(proxies: &ProxyList) {
    let probed: Vec<(String, String, String)> = stream::iter(proxies.clone())
        .map(|p| async move {
            let client = dial::client_via_proxy(&p, RELAY_TIMEOUT)?;
            let out_ip = client
                .get(IP_ECHO_URL)
                .send()
                .await
                .ok()?
                .text()
                .await
                .ok()?
                .trim()
                .to_string();
            if out_ip.is_empty() {
                return None;
            }
            Some((p.identifier(), p.base.server.clone(), out_ip))
        })
        .buffer_unordered(RELAY_CONCURRENCY)
        .filter_map(|r| async move { r })
        .collect()
        .await;

    let mut egress_share: HashMap<String, usize> = HashMap::new();
    for (_, _, out_ip) in &probed {
        *egress_share.entry(out_ip.clone()).or_insert(0) += 1;
    }

    let geo = geoip::geoip();
    for (id, server, out_ip) in probed {
        let pool = egress_share.get(&out_ip).copied().unwrap_or(0) >= POOL_SHARE_THRESHOLD;
        let relay = if pool {
            false
        } else {
            match (geo.find(&server), geo.find(&out_ip)) {
                // country divergence marks a relay when both ends resolve
                (Some((_, server_country)), Some((_, out_country))) => {
                    server_country != out_country
                }
                _ => out_ip != server,
            }
        };
        debug!(
            "relaycheck: id={} egress={} relay={} pool={}",
            id, out_ip, relay, pool
        );
        statistic::set_relay(&id, relay, pool, &out_ip);
    }
}

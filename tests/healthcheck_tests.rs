//! Probe behavior against local endpoints: reachable nodes survive with a
//! recorded delay, unreachable nodes are dropped.

use std::net::TcpListener;

use proxypool::healthcheck::{clean_bad_proxies, statistic};
use proxypool::models::proxy::{Base, Shadowsocks};
use proxypool::{Proxy, ProxyDetail};

fn ss_at(port: u16, password: &str) -> Proxy {
    Proxy::new(
        Base {
            server: "127.0.0.1".to_string(),
            port,
            udp: true,
            ..Default::default()
        },
        ProxyDetail::Shadowsocks(Shadowsocks {
            password: password.to_string(),
            cipher: "aes-256-gcm".to_string(),
            ..Default::default()
        }),
    )
}

/// Binds and immediately drops a listener, yielding a port that refuses
/// connections.
fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

#[tokio::test]
async fn survivors_are_the_reachable_proxies() {
    // a live listener accepts the probe via its backlog
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let open = listener.local_addr().unwrap().port();
    let dead = closed_port();

    let alive = ss_at(open, "alive");
    let gone = ss_at(dead, "gone");
    let survivors = clean_bad_proxies(vec![alive.clone(), gone.clone()]).await;

    assert_eq!(survivors.len(), 1);
    assert_eq!(survivors[0].identifier(), alive.identifier());

    let stat = statistic::find(&alive.identifier()).unwrap();
    assert!(stat.delay_ms > 0);
    assert!(statistic::find(&gone.identifier()).is_none());
}

#[tokio::test]
async fn fallback_dial_covers_clash_unsupported_nodes() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let open = listener.local_addr().unwrap().port();

    // a 2022 cipher is outside clash support and takes the fallback dial
    let mut node = ss_at(open, "fallback");
    if let ProxyDetail::Shadowsocks(ss) = &mut node.detail {
        ss.cipher = "2022-blake3-aes-128-gcm".to_string();
    }
    assert!(!node.clash_supported());

    let survivors = clean_bad_proxies(vec![node.clone()]).await;
    assert_eq!(survivors.len(), 1);
    assert!(statistic::find(&node.identifier()).unwrap().delay_ms > 0);
}

//! Adapter contract: sources drain into the shared channel, and a failing
//! fetch reduces the yield to zero instead of erroring.

use async_trait::async_trait;
use tokio::sync::mpsc;

use proxypool::getter::history;
use proxypool::getter::subscribe::Subscribe;
use proxypool::getter::Getter;
use proxypool::models::proxy::{Base, Shadowsocks};
use proxypool::models::ProxyListOps;
use proxypool::{Proxy, ProxyDetail, ProxyList};

fn ss(server: &str) -> Proxy {
    Proxy::new(
        Base {
            server: server.to_string(),
            port: 443,
            udp: true,
            ..Default::default()
        },
        ProxyDetail::Shadowsocks(Shadowsocks {
            password: "x".to_string(),
            cipher: "aes-256-gcm".to_string(),
            ..Default::default()
        }),
    )
}

struct StaticSource {
    nodes: ProxyList,
}

#[async_trait]
impl Getter for StaticSource {
    async fn get(&self) -> ProxyList {
        self.nodes.clone()
    }

    fn kind(&self) -> &'static str {
        "Static"
    }

    fn source(&self) -> String {
        "static://test".to_string()
    }
}

#[tokio::test]
async fn get_to_channel_drains_every_node() {
    let source = StaticSource {
        nodes: vec![ss("a.example"), ss("b.example"), ss("a.example")],
    };
    let (tx, mut rx) = mpsc::channel::<Proxy>(1);
    let producer = tokio::spawn(async move { source.get_to_channel(tx).await });

    let mut merged = ProxyList::new();
    while let Some(p) = rx.recv().await {
        merged.uniq_append(p);
    }
    producer.await.unwrap();

    // duplicates collapse at the merge, not in the adapter
    assert_eq!(merged.len(), 2);
}

#[tokio::test]
async fn failed_fetch_yields_empty_and_feeds_backoff() {
    history::configure(true, 10, 20);
    let url = "http://127.0.0.1:1/never-there";
    let nodes = Subscribe {
        url: url.to_string(),
    }
    .get_nodes()
    .await;
    assert!(nodes.is_empty());

    let record = history::record_snapshot(url).unwrap();
    assert!(!record.in_flight);
    assert_eq!(record.last_yield, 0);
    assert_eq!(record.zero_streak, 1);
}

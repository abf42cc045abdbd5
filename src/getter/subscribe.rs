//! The subscription adapter: one URL, one body, three possible shapes.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use log::debug;

use crate::getter::{
    fuzz_parse_proxies, history, option_string, string_array_to_proxies, Getter, GetterError,
    Options,
};
use crate::models::{ProxyList, ProxyListOps};
use crate::parser::parse_proxy_from_clash_map;
use crate::utils::base64::base64_decode;
use crate::utils::http::web_get;

/// Concurrent sub-fetches per fan-out batch.
const QUEUE_CONCURRENCY: usize = 8;

const LINK_MARKERS: [&str; 4] = ["ss://", "ssr://", "vmess://", "trojan://"];

pub struct Subscribe {
    pub url: String,
}

pub fn create(options: &Options) -> Result<Box<dyn Getter>, GetterError> {
    let url = option_string(options, "url", GetterError::UrlNotFound)?;
    Ok(Box::new(Subscribe { url }))
}

impl Subscribe {
    /// Dissects a subscription body: a clash document, a pile of plain
    /// links, or a base64 blob of newline-separated links.
    pub fn parse_body(body: &str) -> ProxyList {
        if body.contains("proxies:") {
            let doc: serde_yaml::Value = match serde_yaml::from_str(body) {
                Ok(doc) => doc,
                Err(_) => return ProxyList::new(),
            };
            let proxies = match doc.get("proxies").and_then(|p| p.as_sequence()) {
                Some(seq) => seq,
                None => return ProxyList::new(),
            };
            return proxies
                .iter()
                .filter_map(|map| parse_proxy_from_clash_map(map).ok())
                .collect();
        }

        if LINK_MARKERS.iter().any(|marker| body.contains(marker)) {
            return fuzz_parse_proxies(body);
        }

        match base64_decode(body) {
            Some(decoded) => {
                let decoded = decoded.replace('\t', "");
                string_array_to_proxies(
                    decoded.lines().map(|line| line.trim().to_string()).collect(),
                )
            }
            None => fuzz_parse_proxies(body),
        }
    }

    async fn fetch(&self) -> ProxyList {
        let body = match web_get(&self.url).await {
            Ok(body) => body,
            Err(e) => {
                debug!("subscribe fetch failed: {} url={}", e, self.url);
                return ProxyList::new();
            }
        };
        history::set_response_size(&self.url, body.len());
        Self::parse_body(&body)
    }

    /// Fetch under the quality-memory protocol.
    pub async fn get_nodes(&self) -> ProxyList {
        if history::admit(&self.url) {
            return ProxyList::new();
        }
        history::set_yield(&self.url, 0);
        history::set_response_size(&self.url, 0);

        let nodes = self.fetch().await;
        history::set_yield(&self.url, nodes.len());
        history::close(&self.url);
        nodes
    }

    /// One-shot variant for companion-API sub-sources: a yielding fetch pins
    /// the URL so it is never pulled again.
    pub async fn get_and_block(&self) -> ProxyList {
        let nodes = self.get_nodes().await;
        if !nodes.is_empty() {
            history::block_after_success(&self.url);
        }
        nodes
    }

    /// Fans a batch of URLs through subscribe fetches with bounded
    /// concurrency, deduplicating the merged result.
    pub async fn queue_get(urls: Vec<String>) -> ProxyList {
        if urls.is_empty() {
            return ProxyList::new();
        }
        let results: Vec<ProxyList> = stream::iter(urls)
            .map(|url| async move { Subscribe { url }.get_nodes().await })
            .buffer_unordered(QUEUE_CONCURRENCY)
            .collect()
            .await;
        results
            .into_iter()
            .flatten()
            .collect::<ProxyList>()
            .deduplication()
    }
}

#[async_trait]
impl Getter for Subscribe {
    async fn get(&self) -> ProxyList {
        self.get_nodes().await
    }

    fn kind(&self) -> &'static str {
        "Subscribe"
    }

    fn source(&self) -> String {
        self.url.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::base64::base64_encode;

    #[test]
    fn test_parse_clash_body() {
        let body =
            "proxies:\n- {name: a, type: ss, server: 1.1.1.1, port: 443, cipher: aes-256-gcm, password: x}\n";
        let nodes = Subscribe::parse_body(body);
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].type_name(), "ss");
        assert_eq!(nodes[0].identifier(), "1.1.1.1:443x");
    }

    #[test]
    fn test_parse_base64_body() {
        let body = base64_encode("ss://YWVzLTI1Ni1nY206eA==@1.1.1.1:443#n\n");
        let nodes = Subscribe::parse_body(&body);
        assert_eq!(nodes.len(), 1);
        let link = nodes[0].to_link();
        let reparsed = crate::parser::parse_proxy_link(&link).unwrap();
        assert_eq!(reparsed, nodes[0]);
    }

    #[test]
    fn test_parse_plain_link_body() {
        let body = "some text ss://YWVzLTI1Ni1nY206eA==@1.1.1.1:443#n more text";
        let nodes = Subscribe::parse_body(body);
        assert_eq!(nodes.len(), 1);
    }

    #[test]
    fn test_parse_garbage_body() {
        assert!(Subscribe::parse_body("<html>nothing here</html>").is_empty());
    }

    #[test]
    fn test_parse_clash_body_skips_invalid_entries() {
        let body = "proxies:\n\
                    - {name: a, type: ss, server: 1.1.1.1, port: 443, cipher: aes-256-gcm, password: x}\n\
                    - {name: b, server: 2.2.2.2, port: 443}\n";
        let nodes = Subscribe::parse_body(body);
        assert_eq!(nodes.len(), 1);
    }
}

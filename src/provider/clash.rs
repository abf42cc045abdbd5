use crate::models::Proxy;

/// Renders the clash provider document from the current pool.
pub struct Clash<'a> {
    pub proxies: &'a [Proxy],
}

/// Placeholder entry: clash rejects a provider with an empty proxies
/// sequence, so an unusable sentinel is emitted instead.
const NULL_NODE: &str = "- {\"name\":\"NULL\",\"server\":\"NULL\",\"port\":11708,\"type\":\"ssr\",\"country\":\"NULL\",\"password\":\"sEscPBiAD9K$\\u0026@79\",\"cipher\":\"aes-256-cfb\",\"protocol\":\"origin\",\"protocol_param\":\"NULL\",\"obfs\":\"http_simple\"}";

impl Clash<'_> {
    /// Drops proxies clash-family clients cannot carry.
    pub fn clean_proxies(&self) -> Vec<Proxy> {
        self.proxies
            .iter()
            .filter(|p| p.clash_supported())
            .cloned()
            .collect()
    }

    pub fn provide(&self) -> String {
        let mut result = String::from("proxies:\n");
        let mut emitted = false;
        for p in self.proxies {
            if !p.clash_supported() {
                continue;
            }
            let line = p.to_clash_line();
            if !line.is_empty() {
                result.push_str(&line);
                result.push('\n');
                emitted = true;
            }
        }
        if !emitted {
            result.push_str(NULL_NODE);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::proxy::{Base, ProxyDetail, Shadowsocks};

    fn ss(cipher: &str) -> Proxy {
        Proxy::new(
            Base {
                server: "1.1.1.1".to_string(),
                port: 443,
                ..Default::default()
            },
            ProxyDetail::Shadowsocks(Shadowsocks {
                password: "x".to_string(),
                cipher: cipher.to_string(),
                ..Default::default()
            }),
        )
    }

    #[test]
    fn test_provide() {
        let proxies = vec![ss("aes-256-gcm")];
        let doc = Clash { proxies: &proxies }.provide();
        assert!(doc.starts_with("proxies:\n- {"));
        // the document parses back as a clash config
        let yaml: serde_yaml::Value = serde_yaml::from_str(&doc).unwrap();
        assert_eq!(yaml["proxies"].as_sequence().unwrap().len(), 1);
    }

    #[test]
    fn test_empty_pool_gets_sentinel() {
        let proxies: Vec<Proxy> = Vec::new();
        let doc = Clash { proxies: &proxies }.provide();
        assert!(doc.contains("\"name\":\"NULL\""));
    }

    #[test]
    fn test_unsupported_filtered_to_sentinel() {
        let proxies = vec![ss("2022-blake3-aes-128-gcm")];
        let doc = Clash { proxies: &proxies }.provide();
        assert!(doc.contains("\"name\":\"NULL\""));
    }
}

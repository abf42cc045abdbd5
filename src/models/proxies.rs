//! Operations over the proxy pool as a list: deduplication, ordering,
//! naming, counting and ss⇄ssr derivation.

use std::collections::HashSet;

use crate::geoip::{GeoIp, UNKNOWN_COUNTRY};
use crate::models::ciphers;
use crate::models::proxy::{Proxy, ProxyDetail, Shadowsocks, ShadowsocksR};

pub type ProxyList = Vec<Proxy>;

fn type_rank(type_name: &str) -> u8 {
    match type_name {
        "ss" => 1,
        "ssr" => 2,
        "vmess" => 3,
        "trojan" => 4,
        "http" => 5,
        "vless" => 6,
        "snell" => 7,
        "tuic" => 8,
        "hysteria" => 9,
        "hysteria2" => 10,
        _ => 11,
    }
}

pub trait ProxyListOps {
    /// Drops later records carrying an identifier already seen, keeping the
    /// first occurrence order.
    fn deduplication(self) -> Self;
    /// Appends `p` unless its identifier is already present (linear scan).
    fn uniq_append(&mut self, p: Proxy);
    fn uniq_append_list(&mut self, other: ProxyList);
    fn type_len(&self, type_name: &str) -> usize;
    /// Country first, then the fixed type ordering.
    fn sort_by_country_type(&mut self);
    fn name_clear(&mut self);
    fn name_add_country(&mut self);
    /// Appends `_NN`, a two-digit 1-based index.
    fn name_add_index(&mut self);
    fn name_re_index(&mut self);
    fn add_country(&mut self, geoip: &dyn GeoIp);
    /// Derives ss from convertible ssr records and vice versa, then dedups.
    fn derive(self) -> Self;
}

impl ProxyListOps for ProxyList {
    fn deduplication(self) -> Self {
        let mut seen: HashSet<String> = HashSet::with_capacity(self.len());
        let mut result = Vec::with_capacity(self.len());
        for p in self {
            if seen.insert(p.identifier()) {
                result.push(p);
            }
        }
        result
    }

    fn uniq_append(&mut self, p: Proxy) {
        let id = p.identifier();
        if !self.iter().any(|existing| existing.identifier() == id) {
            self.push(p);
        }
    }

    fn uniq_append_list(&mut self, other: ProxyList) {
        for p in other {
            self.uniq_append(p);
        }
    }

    fn type_len(&self, type_name: &str) -> usize {
        self.iter().filter(|p| p.type_name() == type_name).count()
    }

    fn sort_by_country_type(&mut self) {
        self.sort_by(|a, b| {
            a.base
                .country
                .cmp(&b.base.country)
                .then_with(|| type_rank(a.type_name()).cmp(&type_rank(b.type_name())))
        });
    }

    fn name_clear(&mut self) {
        for p in self.iter_mut() {
            p.set_name("");
        }
    }

    fn name_add_country(&mut self) {
        for p in self.iter_mut() {
            let name = format!("{}{}", p.base.name, p.base.country);
            p.set_name(&name);
        }
    }

    fn name_add_index(&mut self) {
        for (i, p) in self.iter_mut().enumerate() {
            let name = format!("{}_{:02}", p.base.name, i + 1);
            p.set_name(&name);
        }
    }

    fn name_re_index(&mut self) {
        for (i, p) in self.iter_mut().enumerate() {
            let country = p
                .base
                .name
                .splitn(2, '_')
                .next()
                .unwrap_or_default()
                .to_string();
            p.set_name(&format!("{}_{:02}", country, i + 1));
        }
    }

    fn add_country(&mut self, geoip: &dyn GeoIp) {
        for p in self.iter_mut() {
            let country = geoip
                .find(&p.base.server)
                .map(|(_, c)| c)
                .unwrap_or_else(|| UNKNOWN_COUNTRY.to_string());
            p.set_country(&country);
        }
    }

    fn derive(self) -> Self {
        let mut proxies = self;
        let mut derived = Vec::new();
        for p in proxies.iter() {
            match &p.detail {
                ProxyDetail::Shadowsocks(_) => {
                    if let Some(ssr) = convert_to_ssr(p) {
                        derived.push(ssr);
                    }
                }
                ProxyDetail::ShadowsocksR(_) => {
                    if let Some(ss) = convert_to_ss(p) {
                        derived.push(ss);
                    }
                }
                _ => {}
            }
        }
        proxies.extend(derived);
        proxies.deduplication()
    }
}

/// An ss node doubles as ssr when its cipher exists there and no plugin is
/// attached.
pub fn convert_to_ssr(p: &Proxy) -> Option<Proxy> {
    if let ProxyDetail::Shadowsocks(ss) = &p.detail {
        if !ss.plugin.is_empty() || !ciphers::check_ssr_cipher(&ss.cipher) {
            return None;
        }
        return Some(Proxy::new(
            p.base.clone(),
            ProxyDetail::ShadowsocksR(ShadowsocksR {
                password: ss.password.clone(),
                cipher: ss.cipher.clone(),
                protocol: "origin".to_string(),
                obfs: "plain".to_string(),
                ..Default::default()
            }),
        ));
    }
    None
}

/// The inverse holds only for plain/origin ssr nodes with an ss cipher.
pub fn convert_to_ss(p: &Proxy) -> Option<Proxy> {
    if let ProxyDetail::ShadowsocksR(ssr) = &p.detail {
        if ssr.protocol != "origin"
            || !(ssr.obfs == "plain" || ssr.obfs.is_empty())
            || !ciphers::check_ss_cipher(&ssr.cipher)
        {
            return None;
        }
        return Some(Proxy::new(
            p.base.clone(),
            ProxyDetail::Shadowsocks(Shadowsocks {
                password: ssr.password.clone(),
                cipher: ssr.cipher.clone(),
                ..Default::default()
            }),
        ));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::proxy::Base;

    fn ss(server: &str, password: &str) -> Proxy {
        Proxy::new(
            Base {
                server: server.to_string(),
                port: 443,
                ..Default::default()
            },
            ProxyDetail::Shadowsocks(Shadowsocks {
                password: password.to_string(),
                cipher: "aes-256-gcm".to_string(),
                ..Default::default()
            }),
        )
    }

    #[test]
    fn test_dedup_keeps_first_occurrence_order() {
        let list = vec![
            ss("a.example", "1"),
            ss("b.example", "1"),
            ss("a.example", "1"),
            ss("c.example", "1"),
            ss("b.example", "1"),
        ];
        let deduped = list.deduplication();
        let servers: Vec<&str> = deduped.iter().map(|p| p.base.server.as_str()).collect();
        assert_eq!(servers, vec!["a.example", "b.example", "c.example"]);
    }

    #[test]
    fn test_dedup_idempotent() {
        let list = vec![ss("a.example", "1"), ss("a.example", "1")];
        let once = list.deduplication();
        let twice = once.clone().deduplication();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_uniq_append() {
        let mut list = vec![ss("a.example", "1")];
        list.uniq_append(ss("a.example", "1"));
        assert_eq!(list.len(), 1);
        list.uniq_append(ss("a.example", "2"));
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_sort_and_index_naming() {
        let mut a = ss("a.example", "1");
        a.set_country("US");
        let mut b = ss("b.example", "2");
        b.set_country("DE");
        let mut list = vec![a, b];
        list.name_clear();
        list.name_add_country();
        list.sort_by_country_type();
        list.name_add_index();
        assert_eq!(list[0].base.name, "DE_01");
        assert_eq!(list[1].base.name, "US_02");
    }

    #[test]
    fn test_derive_roundtrip() {
        let list = vec![ss("a.example", "1")];
        // aes-256-gcm is not an ssr cipher, nothing derived
        assert_eq!(list.clone().derive().len(), 1);

        let mut convertible = ss("a.example", "1");
        if let ProxyDetail::Shadowsocks(inner) = &mut convertible.detail {
            inner.cipher = "aes-256-cfb".to_string();
        }
        let derived = vec![convertible].derive();
        assert_eq!(derived.len(), 2);
        assert_eq!(derived.type_len("ssr"), 1);
        // deriving again adds nothing new
        assert_eq!(derived.clone().derive().len(), 2);
    }
}

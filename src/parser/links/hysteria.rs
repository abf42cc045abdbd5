use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

use crate::models::proxy::{parse_proxy_alpn, Base, Hysteria, Proxy, ProxyDetail};
use crate::parser::links::common::query_map;
use crate::parser::links::grep_with;
use crate::parser::ParseError;

/// Parses a `hysteria://host:port?auth=...` (v1) link.
pub fn parse_hysteria_link(link: &str) -> Result<Proxy, ParseError> {
    if !link.starts_with("hysteria://") {
        return Err(ParseError::WrongScheme("hysteria"));
    }

    let uri = Url::parse(link).map_err(|_| ParseError::PayloadParse("hysteria"))?;
    let server = uri.host_str().unwrap_or_default().to_string();
    let port = uri.port().unwrap_or(0);
    if port == 0 || server.is_empty() {
        return Err(ParseError::PayloadParse("hysteria"));
    }

    let q = query_map(&uri);
    let auth = q.get("auth").cloned().unwrap_or_default();
    let ports = q.get("mport").cloned().unwrap_or_default();
    let obfs = q.get("obfs").cloned().unwrap_or_default();
    let protocol = q.get("protocol").cloned().unwrap_or_default();
    let up_speed = q.get("upmbps").cloned().unwrap_or_default();
    let down_speed = q.get("downmbps").cloned().unwrap_or_default();
    let sni = q.get("peer").cloned().unwrap_or_default();
    let alpn = parse_proxy_alpn(q.get("alpn").map(String::as_str).unwrap_or(""));
    let skip_cert_verify = q.get("insecure").map(String::as_str) != Some("0");

    Ok(Proxy::new(
        Base {
            name: String::new(),
            server,
            port,
            ..Default::default()
        },
        ProxyDetail::Hysteria(Hysteria {
            auth,
            ports,
            obfs,
            alpn,
            protocol,
            up_speed,
            down_speed,
            sni,
            skip_cert_verify,
        }),
    ))
}

lazy_static! {
    static ref HYSTERIA_PLAIN_RE: Regex =
        Regex::new("hysteria://([A-Za-z0-9+/_&?=@:%.-])+").expect("hysteria regex");
}

pub fn grep_hysteria_links(text: &str) -> Vec<String> {
    grep_with(text, "hysteria://", &HYSTERIA_PLAIN_RE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_v1() {
        let p = parse_hysteria_link(
            "hysteria://h.example:443?auth=token&upmbps=100&downmbps=500&peer=sni.example&protocol=udp&mport=40000-50000",
        )
        .unwrap();
        assert_eq!(p.identifier(), "h.example:443token");
        if let ProxyDetail::Hysteria(h) = &p.detail {
            assert_eq!(h.up_speed, "100");
            assert_eq!(h.down_speed, "500");
            assert_eq!(h.sni, "sni.example");
            assert_eq!(h.ports, "40000-50000");
            assert_eq!(h.protocol, "udp");
        } else {
            panic!("wrong type");
        }
    }
}

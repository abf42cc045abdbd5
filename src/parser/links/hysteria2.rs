use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

use crate::models::proxy::{parse_proxy_alpn, Base, Hysteria2, Proxy, ProxyDetail};
use crate::parser::links::common::query_map;
use crate::parser::links::grep_with;
use crate::parser::ParseError;
use crate::utils::url::url_decode;

/// Parses `hysteria2://` and `hy2://` links.
pub fn parse_hysteria2_link(link: &str) -> Result<Proxy, ParseError> {
    if !link.starts_with("hysteria2://") && !link.starts_with("hy2://") {
        return Err(ParseError::WrongScheme("hysteria2"));
    }

    let uri = Url::parse(link).map_err(|_| ParseError::PayloadParse("hysteria2"))?;
    let password = url_decode(uri.username());
    let server = uri.host_str().unwrap_or_default().to_string();
    let port = uri.port().unwrap_or(0);
    if port == 0 || server.is_empty() {
        return Err(ParseError::PayloadParse("hysteria2"));
    }

    let q = query_map(&uri);
    // sni with peer as the legacy spelling
    let sni = q
        .get("sni")
        .filter(|v| !v.is_empty())
        .or_else(|| q.get("peer"))
        .cloned()
        .unwrap_or_default();
    let alpn = parse_proxy_alpn(q.get("alpn").map(String::as_str).unwrap_or(""));
    let skip_cert_verify = q.get("insecure").map(String::as_str) != Some("0");
    let mut obfs = q.get("obfs").cloned().unwrap_or_default();
    if obfs == "none" {
        obfs = String::new();
    }
    let obfs_password = q.get("obfs-password").cloned().unwrap_or_default();

    Ok(Proxy::new(
        Base {
            name: String::new(),
            server,
            port,
            ..Default::default()
        },
        ProxyDetail::Hysteria2(Hysteria2 {
            password,
            obfs,
            obfs_password,
            alpn,
            sni,
            skip_cert_verify,
        }),
    ))
}

lazy_static! {
    static ref HYSTERIA2_PLAIN_RE: Regex = Regex::new(
        "hysteria2://[A-Za-z0-9+/_&=@:%\\[\\].-]+(\\?[A-Za-z0-9+/_&?=@:%.-]+)?"
    )
    .expect("hysteria2 regex");
    static ref HY2_PLAIN_RE: Regex = Regex::new(
        "hy2://[A-Za-z0-9+/_&=@:%\\[\\].-]+(\\?[A-Za-z0-9+/_&?=@:%.-]+)?"
    )
    .expect("hy2 regex");
}

pub fn grep_hysteria2_links(text: &str) -> Vec<String> {
    let mut results = grep_with(text, "hysteria2://", &HYSTERIA2_PLAIN_RE);
    results.extend(grep_with(text, "hy2://", &HY2_PLAIN_RE));
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_both_prefixes() {
        let long = parse_hysteria2_link("hysteria2://pw@h.example:443?sni=s.example").unwrap();
        let short = parse_hysteria2_link("hy2://pw@h.example:443?sni=s.example").unwrap();
        assert_eq!(long.identifier(), short.identifier());
    }

    #[test]
    fn test_peer_as_sni_fallback() {
        let p = parse_hysteria2_link("hy2://pw@h.example:443?peer=legacy.example").unwrap();
        if let ProxyDetail::Hysteria2(h) = &p.detail {
            assert_eq!(h.sni, "legacy.example");
        } else {
            panic!("wrong type");
        }
    }

    #[test]
    fn test_obfs_none_normalized() {
        let p = parse_hysteria2_link("hy2://pw@h.example:443?obfs=none").unwrap();
        if let ProxyDetail::Hysteria2(h) = &p.detail {
            assert!(h.obfs.is_empty());
        } else {
            panic!("wrong type");
        }
    }
}

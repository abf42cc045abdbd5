//! Link parsers, one module per URI scheme, plus scheme-anchored grepping
//! over free text.

pub(crate) mod common;
pub mod http;
pub mod hysteria;
pub mod hysteria2;
pub mod snell;
pub mod ss;
pub mod ssr;
pub mod trojan;
pub mod tuic;
pub mod vless;
pub mod vmess;

use std::collections::HashSet;

use crate::models::Proxy;
use crate::parser::ParseError;

/// Dispatches a proxy link to its scheme parser. The prefix order is part of
/// the compatibility contract: `ss://` must not shadow `ssr://`, and the
/// hysteria2 prefixes must win over `hysteria://`.
pub fn parse_proxy_link(link: &str) -> Result<Proxy, ParseError> {
    if link.starts_with("ssr://") {
        ssr::parse_ssr_link(link)
    } else if link.starts_with("vmess://") {
        vmess::parse_vmess_link(link)
    } else if link.starts_with("ss://") {
        ss::parse_ss_link(link)
    } else if link.starts_with("trojan://") || link.starts_with("trojan-go://") {
        trojan::parse_trojan_link(link)
    } else if link.starts_with("vless://") {
        vless::parse_vless_link(link)
    } else if link.starts_with("https://") {
        http::parse_http_link(link)
    } else if link.starts_with("snell://") {
        snell::parse_snell_link(link)
    } else if link.starts_with("tuic://") {
        tuic::parse_tuic_link(link)
    } else if link.starts_with("hysteria2://") || link.starts_with("hy2://") {
        hysteria2::parse_hysteria2_link(link)
    } else if link.starts_with("hysteria://") {
        hysteria::parse_hysteria_link(link)
    } else {
        Err(ParseError::UnsupportedScheme)
    }
}

/// Greps every supported link shape out of arbitrary text, deduplicated
/// preserving first occurrence.
pub fn grep_links_from_string(text: &str) -> Vec<String> {
    let mut results = ssr::grep_ssr_links(text);
    results.extend(vmess::grep_vmess_links(text));
    results.extend(ss::grep_ss_links(text));
    results.extend(trojan::grep_trojan_links(text));
    results.extend(http::grep_http_links(text));
    results.extend(vless::grep_vless_links(text));
    results.extend(tuic::grep_tuic_links(text));
    results.extend(hysteria2::grep_hysteria2_links(text));
    results.extend(hysteria::grep_hysteria_links(text));

    let mut seen: HashSet<String> = HashSet::with_capacity(results.len());
    results.retain(|link| seen.insert(link.clone()));
    results
}

/// Runs a scheme-anchored regex over text split at the scheme token, so a
/// link glued to leading garbage is still found. The segment before the
/// first token is not a link candidate.
pub(crate) fn grep_with(text: &str, scheme: &str, re: &regex::Regex) -> Vec<String> {
    let mut results = Vec::new();
    if !text.contains(scheme) {
        return results;
    }
    for (i, part) in text.split(scheme).enumerate() {
        if i == 0 && !text.starts_with(scheme) {
            continue;
        }
        let candidate = format!("{}{}", scheme, part);
        if let Some(m) = re.find(&candidate) {
            if m.start() == 0 {
                results.push(m.as_str().to_string());
            }
        }
    }
    results
}

/// Splits `host:port`, unbracketing IPv6 literals. `None` when the port is
/// missing or malformed.
pub(crate) fn split_host_port(authority: &str) -> Option<(String, u16)> {
    let (host, port_str) = authority.rsplit_once(':')?;
    let port: u16 = port_str.parse().ok()?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.is_empty() {
        return None;
    }
    Some((host.to_string(), port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_host_port() {
        assert_eq!(
            split_host_port("1.1.1.1:443"),
            Some(("1.1.1.1".to_string(), 443))
        );
        assert_eq!(
            split_host_port("[2001:db8::1]:443"),
            Some(("2001:db8::1".to_string(), 443))
        );
        assert_eq!(split_host_port("noport"), None);
    }

    #[test]
    fn test_dispatch_order() {
        // ssr parses as ssr, not as a malformed ss
        let err = parse_proxy_link("ssr://notbase64!");
        assert!(err.is_err());
        assert!(matches!(
            parse_proxy_link("wireguard://x"),
            Err(ParseError::UnsupportedScheme)
        ));
    }

    #[test]
    fn test_grep_links_dedup_preserves_order() {
        let text = "junk ss://YWVzLTI1Ni1nY206eA==@1.1.1.1:443#a more \
                    trojan://pw@2.2.2.2:443?sni=x#b again \
                    ss://YWVzLTI1Ni1nY206eA==@1.1.1.1:443#a";
        let links = grep_links_from_string(text);
        assert_eq!(links.len(), 2);
        assert!(links[0].starts_with("ss://"));
        assert!(links[1].starts_with("trojan://"));
    }
}

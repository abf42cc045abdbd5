use std::collections::HashMap;

use url::Url;

use crate::models::proxy::{Base, Proxy, ProxyDetail, Snell};
use crate::parser::links::common::query_map;
use crate::parser::ParseError;
use crate::utils::url::url_decode;

/// Parses a `snell://psk@host:port?version=&obfs=&obfs-host=` link.
/// Snell has no canonical link emission, so this path is parse-only.
pub fn parse_snell_link(link: &str) -> Result<Proxy, ParseError> {
    if !link.starts_with("snell://") {
        return Err(ParseError::WrongScheme("snell"));
    }

    let uri = Url::parse(link).map_err(|_| ParseError::PayloadParse("snell"))?;
    let psk = url_decode(uri.username());
    if psk.is_empty() {
        return Err(ParseError::PayloadParse("snell"));
    }
    let server = uri.host_str().unwrap_or_default().to_string();
    let port = uri.port().unwrap_or(0);
    if port == 0 || server.is_empty() {
        return Err(ParseError::PayloadParse("snell"));
    }

    let q = query_map(&uri);
    let version: i32 = q
        .get("version")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    let mut obfs_opts = HashMap::new();
    if let Some(mode) = q.get("obfs") {
        if !mode.is_empty() {
            obfs_opts.insert("mode".to_string(), mode.clone());
        }
    }
    if let Some(host) = q.get("obfs-host") {
        if !host.is_empty() {
            obfs_opts.insert("host".to_string(), host.clone());
        }
    }

    Ok(Proxy::new(
        Base {
            name: String::new(),
            server,
            port,
            ..Default::default()
        },
        ProxyDetail::Snell(Snell {
            psk,
            version,
            obfs_opts,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_obfs() {
        let p =
            parse_snell_link("snell://psk-value@h.example:6160?version=2&obfs=http&obfs-host=bing.com")
                .unwrap();
        assert_eq!(p.type_name(), "snell");
        assert_eq!(p.identifier(), "h.example:6160psk-value");
        if let ProxyDetail::Snell(s) = &p.detail {
            assert_eq!(s.version, 2);
            assert_eq!(s.obfs_opts.get("mode").map(String::as_str), Some("http"));
            assert_eq!(s.obfs_opts.get("host").map(String::as_str), Some("bing.com"));
        } else {
            panic!("wrong type");
        }
    }

    #[test]
    fn test_reject_missing_psk() {
        assert!(parse_snell_link("snell://h.example:6160").is_err());
    }
}

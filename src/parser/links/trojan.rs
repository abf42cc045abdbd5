use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

use crate::models::proxy::{parse_proxy_alpn, Base, Proxy, ProxyDetail, Trojan};
use crate::parser::links::common::{parse_query_reality, parse_query_transport, query_map};
use crate::parser::links::grep_with;
use crate::parser::ParseError;
use crate::utils::url::url_decode;

/// Parses `trojan://` and `trojan-go://` links.
pub fn parse_trojan_link(link: &str) -> Result<Proxy, ParseError> {
    if !link.starts_with("trojan://") && !link.starts_with("trojan-go://") {
        return Err(ParseError::WrongScheme("trojan"));
    }

    let uri = Url::parse(link).map_err(|_| ParseError::PayloadParse("trojan"))?;
    let password = url_decode(uri.username());
    let server = uri.host_str().unwrap_or_default().to_string();
    let port = uri.port().unwrap_or(0);
    if port == 0 || server.is_empty() {
        return Err(ParseError::PayloadParse("trojan"));
    }

    let q = query_map(&uri);
    let flow = q.get("flow").cloned().unwrap_or_default();
    let sni = q.get("sni").cloned().unwrap_or_default();
    let alpn = parse_proxy_alpn(q.get("alpn").map(String::as_str).unwrap_or(""));
    let fingerprint = q.get("fp").cloned().unwrap_or_default();
    let reality_opts = parse_query_reality(&q);
    let transport = parse_query_transport(&q);

    Ok(Proxy::new(
        Base {
            name: String::new(),
            server,
            port,
            udp: true,
            ..Default::default()
        },
        ProxyDetail::Trojan(Trojan {
            password,
            alpn,
            sni,
            skip_cert_verify: true,
            network: transport.network,
            fingerprint,
            flow,
            reality_opts,
            tcp_opts: transport.tcp_opts,
            http_opts: transport.http_opts,
            h2_opts: transport.h2_opts,
            grpc_opts: transport.grpc_opts,
            ws_opts: transport.ws_opts,
            quic_opts: transport.quic_opts,
            kcp_opts: transport.kcp_opts,
        }),
    ))
}

lazy_static! {
    static ref TROJAN_PLAIN_RE: Regex = Regex::new(
        "trojan(-go)?://[A-Za-z0-9+/_&=@:%\\[\\].-]+(\\?[A-Za-z0-9+/_&?=@:%.-]+)?"
    )
    .expect("trojan regex");
}

pub fn grep_trojan_links(text: &str) -> Vec<String> {
    grep_with(text, "trojan://", &TROJAN_PLAIN_RE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain() {
        let p = parse_trojan_link("trojan://pw@h.example:443?sni=cdn.example#node").unwrap();
        assert_eq!(p.base.server, "h.example");
        assert_eq!(p.base.port, 443);
        assert_eq!(p.identifier(), "h.example:443pw");
        if let ProxyDetail::Trojan(t) = &p.detail {
            assert_eq!(t.password, "pw");
            assert_eq!(t.sni, "cdn.example");
            assert!(t.skip_cert_verify);
            assert!(t.network.is_empty());
        } else {
            panic!("wrong type");
        }
    }

    #[test]
    fn test_parse_trojan_go_scheme() {
        assert!(parse_trojan_link("trojan-go://pw@h.example:443").is_ok());
    }

    #[test]
    fn test_parse_ws_transport() {
        let p = parse_trojan_link(
            "trojan://pw@h.example:443?type=ws&host=cdn.example&path=%2Fws",
        )
        .unwrap();
        if let ProxyDetail::Trojan(t) = &p.detail {
            assert_eq!(t.network, "ws");
            let ws = t.ws_opts.as_ref().unwrap();
            assert_eq!(ws.path, "/ws");
            assert_eq!(ws.host(), "cdn.example");
        } else {
            panic!("wrong type");
        }
    }

    #[test]
    fn test_parse_grpc_aliases() {
        let p = parse_trojan_link(
            "trojan://pw@h.example:443?type=trojangrpc&serviceName=svc",
        )
        .unwrap();
        if let ProxyDetail::Trojan(t) = &p.detail {
            assert_eq!(t.network, "grpc");
            assert_eq!(t.grpc_opts.as_ref().unwrap().service_name, "svc");
        } else {
            panic!("wrong type");
        }
    }

    #[test]
    fn test_parse_reality() {
        let p = parse_trojan_link(
            "trojan://pw@h.example:443?security=reality&pbk=KEY&sid=42&spx=%2F",
        )
        .unwrap();
        if let ProxyDetail::Trojan(t) = &p.detail {
            let reality = t.reality_opts.as_ref().unwrap();
            assert_eq!(reality.public_key, "KEY");
            assert_eq!(reality.short_id, "42");
            assert_eq!(reality.spiderx, "/");
        } else {
            panic!("wrong type");
        }
    }

    #[test]
    fn test_parse_header_type_http_upgrade() {
        let p = parse_trojan_link(
            "trojan://pw@h.example:443?headerType=http&host=masq.example",
        )
        .unwrap();
        if let ProxyDetail::Trojan(t) = &p.detail {
            assert_eq!(t.network, "http");
            let opts = t.http_opts.as_ref().unwrap();
            assert_eq!(opts.method, "GET");
            assert_eq!(opts.path, vec!["/".to_string()]);
        } else {
            panic!("wrong type");
        }
    }

    #[test]
    fn test_parse_type_http_maps_to_h2() {
        let p = parse_trojan_link(
            "trojan://pw@h.example:443?type=http&host=h2.example&path=%2Fh2",
        )
        .unwrap();
        if let ProxyDetail::Trojan(t) = &p.detail {
            assert_eq!(t.network, "h2");
            let h2 = t.h2_opts.as_ref().unwrap();
            assert_eq!(h2.host, vec!["h2.example".to_string()]);
            assert_eq!(h2.path, "/h2");
        } else {
            panic!("wrong type");
        }
    }

    #[test]
    fn test_reject_missing_port() {
        assert!(parse_trojan_link("trojan://pw@h.example").is_err());
    }
}

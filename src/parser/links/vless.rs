use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

use crate::models::proxy::{parse_proxy_alpn, Base, Proxy, ProxyDetail, Vless};
use crate::parser::links::common::{parse_query_reality, parse_query_transport, query_map};
use crate::parser::links::grep_with;
use crate::parser::ParseError;
use crate::utils::url::url_decode;

/// Parses a `vless://` link. TLS is unconditional for vless; `encryption`
/// defaults to `none` and legacy flow values are normalized away later by
/// `fix_value`.
pub fn parse_vless_link(link: &str) -> Result<Proxy, ParseError> {
    if !link.starts_with("vless://") {
        return Err(ParseError::WrongScheme("vless"));
    }

    let uri = Url::parse(link).map_err(|_| ParseError::PayloadParse("vless"))?;
    let uuid = url_decode(uri.username());
    let server = uri.host_str().unwrap_or_default().to_string();
    let port = uri.port().unwrap_or(0);
    if port == 0 || server.is_empty() {
        return Err(ParseError::PayloadParse("vless"));
    }

    let q = query_map(&uri);
    let mut encryption = q.get("encryption").cloned().unwrap_or_default();
    if encryption.is_empty() {
        encryption = "none".to_string();
    }
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
        ProxyDetail::Vless(Vless {
            uuid,
            encryption,
            flow,
            network: transport.network,
            fingerprint,
            alpn,
            sni,
            reality_opts,
            tls: true,
            skip_cert_verify: true,
            tcp_opts: transport.tcp_opts,
            http_opts: transport.http_opts,
            h2_opts: transport.h2_opts,
            grpc_opts: transport.grpc_opts,
            ws_opts: transport.ws_opts,
            quic_opts: transport.quic_opts,
            kcp_opts: transport.kcp_opts,
            splithttp_opts: None,
        }),
    ))
}

lazy_static! {
    static ref VLESS_PLAIN_RE: Regex =
        Regex::new("vless://([A-Za-z0-9+/_&?=@:%.-])+").expect("vless regex");
}

pub fn grep_vless_links(text: &str) -> Vec<String> {
    grep_with(text, "vless://", &VLESS_PLAIN_RE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reality_vision() {
        let p = parse_vless_link(
            "vless://uuid-1@h.example:443?security=reality&pbk=KEY&sid=7&flow=xtls-rprx-vision&sni=real.example",
        )
        .unwrap();
        if let ProxyDetail::Vless(v) = &p.detail {
            assert!(v.tls);
            assert_eq!(v.encryption, "none");
            assert_eq!(v.flow, "xtls-rprx-vision");
            assert_eq!(v.reality_opts.as_ref().unwrap().public_key, "KEY");
            assert_eq!(v.sni, "real.example");
        } else {
            panic!("wrong type");
        }
    }

    #[test]
    fn test_parse_ws() {
        let p = parse_vless_link(
            "vless://uuid-1@h.example:443?type=ws&host=cdn.example&path=%2Fws",
        )
        .unwrap();
        if let ProxyDetail::Vless(v) = &p.detail {
            assert_eq!(v.network, "ws");
            assert_eq!(v.ws_opts.as_ref().unwrap().path, "/ws");
        } else {
            panic!("wrong type");
        }
    }

    #[test]
    fn test_identifier_uses_uuid() {
        let p = parse_vless_link("vless://uuid-1@h.example:443").unwrap();
        assert_eq!(p.identifier(), "h.example:443uuid-1");
    }

    #[test]
    fn test_flow_normalized_by_fix_value() {
        let mut p =
            parse_vless_link("vless://uuid-1@h.example:443?flow=xtls-rprx-direct").unwrap();
        p.fix_value();
        if let ProxyDetail::Vless(v) = &p.detail {
            assert!(v.flow.is_empty());
        } else {
            panic!("wrong type");
        }
    }
}

//! Clash-map intake: coerce the loose YAML shapes found in subscriptions
//! into something the typed record decodes strictly.

use serde_json::{Map, Value};

use crate::models::proxy::{parse_proxy_network, Proxy, ProxyDetail};
use crate::parser::ParseError;

/// Parses one element of a clash `proxies:` sequence.
pub fn parse_proxy_from_clash_map(map: &serde_yaml::Value) -> Result<Proxy, ParseError> {
    let mut value: Value =
        serde_json::to_value(map).map_err(|e| ParseError::ClashDecode(e.to_string()))?;
    let obj = value.as_object_mut().ok_or(ParseError::MissingType)?;

    let type_name = match obj.get("type").and_then(Value::as_str) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => return Err(ParseError::MissingType),
    };

    // names are reassigned by the output shaper; drop whatever came in
    obj.insert("name".to_string(), Value::from(""));
    fix_clash_value(obj, &type_name);

    let mut proxy: Proxy =
        serde_json::from_value(value).map_err(|e| ParseError::ClashDecode(e.to_string()))?;
    normalize_transports(&mut proxy);
    Ok(proxy)
}

/// Per-type coercions applied before strict decoding.
fn fix_clash_value(obj: &mut Map<String, Value>, type_name: &str) {
    coerce_int(obj, "port");
    if type_name == "vmess" {
        coerce_int(obj, "alterId");
    }
    if type_name == "http" {
        if let Some(v) = obj.get("username") {
            if v.is_number() {
                let s = v.to_string();
                obj.insert("username".to_string(), Value::from(s));
            }
        }
    }
    if type_name == "snell" {
        coerce_int(obj, "version");
    }

    // legacy flat ws keys predate the ws-opts block
    if (type_name == "vmess" || type_name == "vless") && !obj.contains_key("ws-opts") {
        let mut ws = Map::new();
        if let Some(path) = obj.remove("ws-path") {
            ws.insert("path".to_string(), path);
        }
        if let Some(headers) = obj.remove("ws-headers") {
            ws.insert("headers".to_string(), headers);
        }
        if !ws.is_empty() {
            obj.insert("ws-opts".to_string(), Value::Object(ws));
        }
    } else {
        obj.remove("ws-path");
        obj.remove("ws-headers");
    }
}

fn coerce_int(obj: &mut Map<String, Value>, key: &str) {
    match obj.get(key) {
        Some(Value::String(s)) => {
            if let Ok(n) = s.trim().parse::<i64>() {
                obj.insert(key.to_string(), Value::from(n));
            }
        }
        Some(Value::Number(n)) => {
            if !n.is_i64() && !n.is_u64() {
                if let Some(f) = n.as_f64() {
                    obj.insert(key.to_string(), Value::from(f as i64));
                }
            }
        }
        _ => {}
    }
}

/// Keeps only the transport block matching the network and drops blocks that
/// decode to all-default values, the same shape serialization would emit.
fn normalize_transports(proxy: &mut Proxy) {
    match &mut proxy.detail {
        ProxyDetail::Vmess(v) => {
            let (network, _) = parse_proxy_network(&v.network);
            v.network = if network.is_empty() {
                "tcp".to_string()
            } else {
                network
            };
            let keep = v.network.as_str();
            let ws = keep == "ws" || keep == "httpupgrade";
            v.ws_opts = v.ws_opts.take().filter(|o| ws && !o.is_empty());
            v.grpc_opts = v.grpc_opts.take().filter(|o| keep == "grpc" && !o.is_empty());
            v.h2_opts = v.h2_opts.take().filter(|o| keep == "h2" && !o.is_empty());
            v.http_opts = v.http_opts.take().filter(|o| keep == "http" && !o.is_empty());
            v.quic_opts = v.quic_opts.take().filter(|o| keep == "quic" && !o.is_empty());
            v.kcp_opts = v.kcp_opts.take().filter(|o| keep == "kcp" && !o.is_empty());
            v.splithttp_opts = v
                .splithttp_opts
                .take()
                .filter(|o| keep == "splithttp" && !o.is_empty());
            v.tcp_opts = v.tcp_opts.take().filter(|o| keep == "tcp" && !o.is_empty());
        }
        ProxyDetail::Vless(v) => {
            v.tcp_opts = v.tcp_opts.take().filter(|o| !o.is_empty());
            v.http_opts = v.http_opts.take().filter(|o| !o.is_empty());
            v.h2_opts = v.h2_opts.take().filter(|o| !o.is_empty());
            v.grpc_opts = v.grpc_opts.take().filter(|o| !o.is_empty());
            v.ws_opts = v.ws_opts.take().filter(|o| !o.is_empty());
            v.quic_opts = v.quic_opts.take().filter(|o| !o.is_empty());
            v.kcp_opts = v.kcp_opts.take().filter(|o| !o.is_empty());
            v.splithttp_opts = v.splithttp_opts.take().filter(|o| !o.is_empty());
            v.reality_opts = v.reality_opts.take().filter(|o| !o.is_empty());
        }
        ProxyDetail::Trojan(t) => {
            t.tcp_opts = t.tcp_opts.take().filter(|o| !o.is_empty());
            t.http_opts = t.http_opts.take().filter(|o| !o.is_empty());
            t.h2_opts = t.h2_opts.take().filter(|o| !o.is_empty());
            t.grpc_opts = t.grpc_opts.take().filter(|o| !o.is_empty());
            t.ws_opts = t.ws_opts.take().filter(|o| !o.is_empty());
            t.quic_opts = t.quic_opts.take().filter(|o| !o.is_empty());
            t.kcp_opts = t.kcp_opts.take().filter(|o| !o.is_empty());
            t.reality_opts = t.reality_opts.take().filter(|o| !o.is_empty());
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProxyDetail;

    fn yaml(text: &str) -> serde_yaml::Value {
        serde_yaml::from_str(text).unwrap()
    }

    #[test]
    fn test_parse_ss_map() {
        let map = yaml(
            "{name: a, type: ss, server: 1.1.1.1, port: 443, cipher: aes-256-gcm, password: x}",
        );
        let p = parse_proxy_from_clash_map(&map).unwrap();
        assert_eq!(p.type_name(), "ss");
        assert_eq!(p.identifier(), "1.1.1.1:443x");
        assert_eq!(p.base.name, "");
    }

    #[test]
    fn test_parse_string_port() {
        let map = yaml(
            "{name: a, type: ss, server: 1.1.1.1, port: '443', cipher: aes-256-gcm, password: x}",
        );
        let p = parse_proxy_from_clash_map(&map).unwrap();
        assert_eq!(p.base.port, 443);
    }

    #[test]
    fn test_parse_numeric_http_username() {
        let map = yaml(
            "{name: a, type: http, server: 1.1.1.1, port: 8080, username: 12345, password: pw}",
        );
        let p = parse_proxy_from_clash_map(&map).unwrap();
        if let ProxyDetail::Http(h) = &p.detail {
            assert_eq!(h.username, "12345");
        } else {
            panic!("wrong type");
        }
    }

    #[test]
    fn test_parse_vmess_legacy_ws_keys() {
        let map = yaml(
            "{name: a, type: vmess, server: h.example, port: 443, uuid: 11111111-1111-1111-1111-111111111111, alterId: '0', cipher: auto, network: ws, ws-path: /legacy, ws-headers: {Host: cdn.example}}",
        );
        let p = parse_proxy_from_clash_map(&map).unwrap();
        if let ProxyDetail::Vmess(v) = &p.detail {
            let ws = v.ws_opts.as_ref().unwrap();
            assert_eq!(ws.path, "/legacy");
            assert_eq!(ws.host(), "cdn.example");
        } else {
            panic!("wrong type");
        }
    }

    #[test]
    fn test_parse_vmess_unknown_network_coerced() {
        let map = yaml(
            "{name: a, type: vmess, server: h.example, port: 443, uuid: 11111111-1111-1111-1111-111111111111, cipher: auto, network: banana}",
        );
        let p = parse_proxy_from_clash_map(&map).unwrap();
        if let ProxyDetail::Vmess(v) = &p.detail {
            assert_eq!(v.network, "tcp");
        } else {
            panic!("wrong type");
        }
    }

    #[test]
    fn test_parse_ssr_map() {
        let map = yaml(
            "{name: a, type: ssr, server: 1.1.1.1, port: 443, cipher: aes-256-cfb, password: x, protocol: auth_aes128_md5, protocol-param: '32', obfs: tls1.2_ticket_auth, obfs-param: o.example}",
        );
        let p = parse_proxy_from_clash_map(&map).unwrap();
        if let ProxyDetail::ShadowsocksR(ssr) = &p.detail {
            assert_eq!(ssr.protocol, "auth_aes128_md5");
            assert_eq!(ssr.protocol_param, "32");
            assert_eq!(ssr.obfs_param, "o.example");
        } else {
            panic!("wrong type");
        }
    }

    #[test]
    fn test_parse_trojan_map_with_transport() {
        let map = yaml(
            "{name: a, type: trojan, server: h.example, port: 443, password: pw, sni: s.example, network: ws, ws-opts: {path: /ws, headers: {Host: cdn.example}}}",
        );
        let p = parse_proxy_from_clash_map(&map).unwrap();
        if let ProxyDetail::Trojan(t) = &p.detail {
            assert_eq!(t.sni, "s.example");
            assert_eq!(t.ws_opts.as_ref().unwrap().path, "/ws");
        } else {
            panic!("wrong type");
        }
    }

    #[test]
    fn test_parse_vless_map_with_reality() {
        let map = yaml(
            "{name: a, type: vless, server: h.example, port: 443, uuid: uuid-1, network: grpc, grpc-opts: {grpc-service-name: svc}, reality-opts: {public-key: KEY, short-id: '7'}, tls: true}",
        );
        let p = parse_proxy_from_clash_map(&map).unwrap();
        if let ProxyDetail::Vless(v) = &p.detail {
            assert_eq!(v.reality_opts.as_ref().unwrap().public_key, "KEY");
            assert_eq!(v.grpc_opts.as_ref().unwrap().service_name, "svc");
        } else {
            panic!("wrong type");
        }
    }

    #[test]
    fn test_parse_snell_map() {
        let map = yaml(
            "{name: a, type: snell, server: h.example, port: 6160, psk: secret, version: '2', obfs-opts: {mode: http, host: bing.com}}",
        );
        let p = parse_proxy_from_clash_map(&map).unwrap();
        if let ProxyDetail::Snell(s) = &p.detail {
            assert_eq!(s.psk, "secret");
            assert_eq!(s.version, 2);
            assert_eq!(s.obfs_opts.get("mode").map(String::as_str), Some("http"));
        } else {
            panic!("wrong type");
        }
    }

    #[test]
    fn test_parse_tuic_map() {
        let map = yaml(
            "{name: a, type: tuic, server: h.example, port: 443, uuid: uuid-1, password: pw, congestion-controller: bbr, udp-relay-mode: native, alpn: [h3]}",
        );
        let p = parse_proxy_from_clash_map(&map).unwrap();
        if let ProxyDetail::Tuic(t) = &p.detail {
            assert_eq!(t.congestion_controller, "bbr");
            assert_eq!(t.alpn, vec!["h3".to_string()]);
        } else {
            panic!("wrong type");
        }
        assert_eq!(p.identifier(), "h.example:443uuid-1pw");
    }

    #[test]
    fn test_parse_hysteria2_map() {
        let map = yaml(
            "{name: a, type: hysteria2, server: h.example, port: 443, password: pw, obfs: salamander, obfs-password: ob, sni: s.example}",
        );
        let p = parse_proxy_from_clash_map(&map).unwrap();
        if let ProxyDetail::Hysteria2(h) = &p.detail {
            assert_eq!(h.obfs, "salamander");
            assert_eq!(h.obfs_password, "ob");
        } else {
            panic!("wrong type");
        }
    }

    #[test]
    fn test_parse_hysteria_map_speeds() {
        let map = yaml(
            "{name: a, type: hysteria, server: h.example, port: 443, auth_str: tok, up: '100', down: '500', ports: 4000-5000}",
        );
        let p = parse_proxy_from_clash_map(&map).unwrap();
        if let ProxyDetail::Hysteria(h) = &p.detail {
            assert_eq!(h.auth, "tok");
            assert_eq!(h.up_speed, "100");
            assert_eq!(h.down_speed, "500");
            assert_eq!(h.ports, "4000-5000");
        } else {
            panic!("wrong type");
        }
    }

    #[test]
    fn test_missing_type_rejected() {
        let map = yaml("{name: a, server: 1.1.1.1, port: 443}");
        assert!(matches!(
            parse_proxy_from_clash_map(&map),
            Err(ParseError::MissingType)
        ));
    }

    #[test]
    fn test_unknown_type_rejected() {
        let map = yaml("{name: a, type: wireguard, server: 1.1.1.1, port: 443}");
        assert!(parse_proxy_from_clash_map(&map).is_err());
    }
}

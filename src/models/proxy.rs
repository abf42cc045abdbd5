//! The normalized proxy record.
//!
//! A proxy is the pair of a [`Base`] (fields every type shares) and a
//! [`ProxyDetail`] variant payload, tagged on the wire by the `type` key.
//! Serializing the pair yields the flat clash-style mapping; one such mapping
//! rendered as JSON is also the payload of `to_clash_line`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::ciphers;
use crate::models::transport::*;
use crate::utils::string::join_host_port;

fn is_false(b: &bool) -> bool {
    !*b
}

fn is_zero_i32(v: &i32) -> bool {
    *v == 0
}

/// Fields shared by every proxy type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Base {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub server: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub country: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default, skip_serializing_if = "is_false")]
    pub udp: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub useable: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Shadowsocks {
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub cipher: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub plugin: String,
    #[serde(rename = "plugin-opts", default, skip_serializing_if = "HashMap::is_empty")]
    pub plugin_opts: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShadowsocksR {
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub cipher: String,
    #[serde(default)]
    pub protocol: String,
    #[serde(rename = "protocol-param", default, skip_serializing_if = "String::is_empty")]
    pub protocol_param: String,
    #[serde(default)]
    pub obfs: String,
    #[serde(rename = "obfs-param", default, skip_serializing_if = "String::is_empty")]
    pub obfs_param: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vmess {
    #[serde(default)]
    pub uuid: String,
    #[serde(rename = "alterId", default, skip_serializing_if = "is_zero_i32")]
    pub alter_id: i32,
    #[serde(default)]
    pub cipher: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub network: String,
    #[serde(
        rename = "client-fingerprint",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub fingerprint: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alpn: Vec<String>,
    #[serde(rename = "servername", default, skip_serializing_if = "String::is_empty")]
    pub sni: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub tls: bool,
    #[serde(rename = "skip-cert-verify", default, skip_serializing_if = "is_false")]
    pub skip_cert_verify: bool,

    #[serde(rename = "tcp-opts", default, skip_serializing_if = "Option::is_none")]
    pub tcp_opts: Option<TcpOptions>,
    #[serde(rename = "http-opts", default, skip_serializing_if = "Option::is_none")]
    pub http_opts: Option<HttpOptions>,
    #[serde(rename = "h2-opts", default, skip_serializing_if = "Option::is_none")]
    pub h2_opts: Option<H2Options>,
    #[serde(rename = "grpc-opts", default, skip_serializing_if = "Option::is_none")]
    pub grpc_opts: Option<GrpcOptions>,
    #[serde(rename = "ws-opts", default, skip_serializing_if = "Option::is_none")]
    pub ws_opts: Option<WsOptions>,
    #[serde(rename = "quic-opts", default, skip_serializing_if = "Option::is_none")]
    pub quic_opts: Option<QuicOptions>,
    #[serde(rename = "kcp-opts", default, skip_serializing_if = "Option::is_none")]
    pub kcp_opts: Option<KcpOptions>,
    #[serde(rename = "splithttp-opts", default, skip_serializing_if = "Option::is_none")]
    pub splithttp_opts: Option<SplitHttpOptions>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vless {
    #[serde(default)]
    pub uuid: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub encryption: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub flow: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub network: String,
    #[serde(
        rename = "client-fingerprint",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub fingerprint: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alpn: Vec<String>,
    #[serde(rename = "servername", default, skip_serializing_if = "String::is_empty")]
    pub sni: String,
    #[serde(rename = "reality-opts", default, skip_serializing_if = "Option::is_none")]
    pub reality_opts: Option<RealityOptions>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub tls: bool,
    #[serde(rename = "skip-cert-verify", default, skip_serializing_if = "is_false")]
    pub skip_cert_verify: bool,

    #[serde(rename = "tcp-opts", default, skip_serializing_if = "Option::is_none")]
    pub tcp_opts: Option<TcpOptions>,
    #[serde(rename = "http-opts", default, skip_serializing_if = "Option::is_none")]
    pub http_opts: Option<HttpOptions>,
    #[serde(rename = "h2-opts", default, skip_serializing_if = "Option::is_none")]
    pub h2_opts: Option<H2Options>,
    #[serde(rename = "grpc-opts", default, skip_serializing_if = "Option::is_none")]
    pub grpc_opts: Option<GrpcOptions>,
    #[serde(rename = "ws-opts", default, skip_serializing_if = "Option::is_none")]
    pub ws_opts: Option<WsOptions>,
    #[serde(rename = "quic-opts", default, skip_serializing_if = "Option::is_none")]
    pub quic_opts: Option<QuicOptions>,
    #[serde(rename = "kcp-opts", default, skip_serializing_if = "Option::is_none")]
    pub kcp_opts: Option<KcpOptions>,
    #[serde(rename = "splithttp-opts", default, skip_serializing_if = "Option::is_none")]
    pub splithttp_opts: Option<SplitHttpOptions>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trojan {
    #[serde(default)]
    pub password: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alpn: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sni: String,
    #[serde(rename = "skip-cert-verify", default, skip_serializing_if = "is_false")]
    pub skip_cert_verify: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub network: String,
    #[serde(
        rename = "client-fingerprint",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub fingerprint: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub flow: String,
    #[serde(rename = "reality-opts", default, skip_serializing_if = "Option::is_none")]
    pub reality_opts: Option<RealityOptions>,

    #[serde(rename = "tcp-opts", default, skip_serializing_if = "Option::is_none")]
    pub tcp_opts: Option<TcpOptions>,
    #[serde(rename = "http-opts", default, skip_serializing_if = "Option::is_none")]
    pub http_opts: Option<HttpOptions>,
    #[serde(rename = "h2-opts", default, skip_serializing_if = "Option::is_none")]
    pub h2_opts: Option<H2Options>,
    #[serde(rename = "grpc-opts", default, skip_serializing_if = "Option::is_none")]
    pub grpc_opts: Option<GrpcOptions>,
    #[serde(rename = "ws-opts", default, skip_serializing_if = "Option::is_none")]
    pub ws_opts: Option<WsOptions>,
    #[serde(rename = "quic-opts", default, skip_serializing_if = "Option::is_none")]
    pub quic_opts: Option<QuicOptions>,
    #[serde(rename = "kcp-opts", default, skip_serializing_if = "Option::is_none")]
    pub kcp_opts: Option<KcpOptions>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Http {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub username: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub password: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub tls: bool,
    #[serde(rename = "skip-cert-verify", default, skip_serializing_if = "is_false")]
    pub skip_cert_verify: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sni: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snell {
    #[serde(rename = "psk", default)]
    pub psk: String,
    #[serde(default, skip_serializing_if = "is_zero_i32")]
    pub version: i32,
    #[serde(rename = "obfs-opts", default, skip_serializing_if = "HashMap::is_empty")]
    pub obfs_opts: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tuic {
    #[serde(default)]
    pub uuid: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub password: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alpn: Vec<String>,
    #[serde(
        rename = "congestion-controller",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub congestion_controller: String,
    #[serde(rename = "udp-relay-mode", default, skip_serializing_if = "String::is_empty")]
    pub udp_relay_mode: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sni: String,
    #[serde(rename = "skip-cert-verify", default, skip_serializing_if = "is_false")]
    pub skip_cert_verify: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hysteria {
    #[serde(rename = "auth_str", default)]
    pub auth: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ports: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub obfs: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alpn: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub protocol: String,
    #[serde(rename = "up", default, skip_serializing_if = "String::is_empty")]
    pub up_speed: String,
    #[serde(rename = "down", default, skip_serializing_if = "String::is_empty")]
    pub down_speed: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sni: String,
    #[serde(rename = "skip-cert-verify", default, skip_serializing_if = "is_false")]
    pub skip_cert_verify: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hysteria2 {
    #[serde(default)]
    pub password: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub obfs: String,
    #[serde(rename = "obfs-password", default, skip_serializing_if = "String::is_empty")]
    pub obfs_password: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alpn: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sni: String,
    #[serde(rename = "skip-cert-verify", default, skip_serializing_if = "is_false")]
    pub skip_cert_verify: bool,
}

/// Variant payload, tagged by the clash `type` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProxyDetail {
    #[serde(rename = "ss")]
    Shadowsocks(Shadowsocks),
    #[serde(rename = "ssr")]
    ShadowsocksR(ShadowsocksR),
    #[serde(rename = "vmess")]
    Vmess(Vmess),
    #[serde(rename = "vless")]
    Vless(Vless),
    #[serde(rename = "trojan")]
    Trojan(Trojan),
    #[serde(rename = "http")]
    Http(Http),
    #[serde(rename = "snell")]
    Snell(Snell),
    #[serde(rename = "tuic")]
    Tuic(Tuic),
    #[serde(rename = "hysteria")]
    Hysteria(Hysteria),
    #[serde(rename = "hysteria2")]
    Hysteria2(Hysteria2),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proxy {
    #[serde(flatten)]
    pub base: Base,
    #[serde(flatten)]
    pub detail: ProxyDetail,
}

impl Proxy {
    pub fn new(base: Base, detail: ProxyDetail) -> Self {
        Proxy { base, detail }
    }

    pub fn type_name(&self) -> &'static str {
        match self.detail {
            ProxyDetail::Shadowsocks(_) => "ss",
            ProxyDetail::ShadowsocksR(_) => "ssr",
            ProxyDetail::Vmess(_) => "vmess",
            ProxyDetail::Vless(_) => "vless",
            ProxyDetail::Trojan(_) => "trojan",
            ProxyDetail::Http(_) => "http",
            ProxyDetail::Snell(_) => "snell",
            ProxyDetail::Tuic(_) => "tuic",
            ProxyDetail::Hysteria(_) => "hysteria",
            ProxyDetail::Hysteria2(_) => "hysteria2",
        }
    }

    /// Canonical deduplication key: `host:port` plus a type-specific
    /// discriminator. Never derived from the name or country, which are
    /// free fields.
    pub fn identifier(&self) -> String {
        let hp = join_host_port(&self.base.server, self.base.port);
        match &self.detail {
            ProxyDetail::Shadowsocks(ss) => hp + &ss.password,
            ProxyDetail::ShadowsocksR(ssr) => hp + &ssr.password,
            ProxyDetail::Vmess(v) => {
                format!("{}{}{}{}", hp, v.cipher, v.uuid, v.alter_id)
            }
            ProxyDetail::Vless(v) => hp + &v.uuid,
            ProxyDetail::Trojan(t) => hp + &t.password,
            ProxyDetail::Http(h) => hp + &h.username + &h.password,
            ProxyDetail::Snell(s) => hp + &s.psk,
            ProxyDetail::Tuic(t) => hp + &t.uuid + &t.password,
            ProxyDetail::Hysteria(h) => hp + &h.auth,
            ProxyDetail::Hysteria2(h) => hp + &h.password,
        }
    }

    pub fn set_name(&mut self, name: &str) {
        self.base.name = name.to_string();
    }

    pub fn add_to_name(&mut self, suffix: &str) {
        self.base.name.push_str(suffix);
    }

    pub fn add_before_name(&mut self, prefix: &str) {
        self.base.name = format!("{}{}", prefix, self.base.name);
    }

    pub fn set_ip(&mut self, ip: &str) {
        self.base.server = ip.to_string();
    }

    pub fn set_country(&mut self, country: &str) {
        self.base.country = country.to_string();
    }

    pub fn set_useable(&mut self, useable: bool) {
        self.base.useable = useable;
    }

    /// Gate applied to every record at intake. A proxy failing this never
    /// enters the pool.
    pub fn is_valid(&self) -> bool {
        if !check_address(&self.base.server) {
            return false;
        }
        if self.base.port == 0 {
            return false;
        }
        match &self.detail {
            ProxyDetail::Shadowsocks(ss) => {
                if !ciphers::check_ss_cipher(&ss.cipher) {
                    return false;
                }
                if ss.plugin == "v2ray-plugin" && !ss.plugin_opts.contains_key("mode") {
                    return false;
                }
                true
            }
            ProxyDetail::ShadowsocksR(ssr) => {
                ciphers::check_ssr_cipher(&ssr.cipher)
                    && ciphers::check_ssr_protocol(&ssr.protocol)
                    && ciphers::check_ssr_obfs(&ssr.obfs)
            }
            ProxyDetail::Vmess(v) => {
                ciphers::check_vmess_uuid(&v.uuid) && ciphers::check_vmess_cipher(&v.cipher)
            }
            ProxyDetail::Vless(v) => ciphers::check_vless_uuid(&v.uuid),
            ProxyDetail::Http(h) => !h.username.is_empty() && !h.password.is_empty(),
            _ => true,
        }
    }

    /// Normalizes fields that wild inputs get wrong but clients reject.
    pub fn fix_value(&mut self) {
        match &mut self.detail {
            ProxyDetail::Vmess(v) => {
                if v.cipher.is_empty() {
                    v.cipher = "auto".to_string();
                }
                if v.network == "grpc" {
                    v.tls = true;
                }
            }
            ProxyDetail::Trojan(t) => {
                let (network, chg) = parse_proxy_network(&t.network);
                if chg != 0 {
                    t.network = network;
                }
            }
            ProxyDetail::Vless(v) => {
                let (flow, chg) = parse_proxy_flow(&v.flow);
                if chg {
                    v.flow = flow;
                }
                // mihomo panics on vision flow without reality material
                if v.reality_opts.is_none() && v.flow == "xtls-rprx-vision" {
                    v.flow = String::new();
                }
                if v.encryption.is_empty() {
                    v.encryption = "none".to_string();
                }
                if v.network == "http" {
                    match &mut v.http_opts {
                        Some(opts) => {
                            if opts.method.is_empty() {
                                opts.method = "GET".to_string();
                            }
                            if opts.path.is_empty() {
                                opts.path = vec!["/".to_string()];
                            }
                        }
                        None => {
                            v.http_opts = Some(HttpOptions::for_header("", ""));
                        }
                    }
                }
                v.tls = true;
            }
            _ => {}
        }
    }

    /// Whether mainstream clash builds can carry this proxy. The complement
    /// selects the fallback-dial set of the health checker.
    pub fn clash_supported(&self) -> bool {
        match &self.detail {
            ProxyDetail::Shadowsocks(ss) => !matches!(
                ss.cipher.as_str(),
                "none"
                    | "2022-blake3-aes-128-gcm"
                    | "2022-blake3-aes-256-gcm"
                    | "2022-blake3-chacha20-poly1305"
            ),
            ProxyDetail::ShadowsocksR(ssr) => {
                ssr.cipher != "rc4" && ssr.cipher != "chacha20"
            }
            ProxyDetail::Vmess(v) => v.network != "kcp",
            ProxyDetail::Vless(v) => v.network != "kcp",
            ProxyDetail::Trojan(t) => t.network != "kcp",
            _ => true,
        }
    }
}

/// Rejects addresses that cannot be a hostname or IP literal.
pub fn check_address(addr: &str) -> bool {
    if addr.len() < 3 {
        return false;
    }
    if addr.contains('[') {
        if addr.contains('.') || addr.contains('-') {
            return false;
        }
        if !(addr.contains(':') || addr.contains(']')) {
            return false;
        }
    }
    if addr.contains(|c| " /\\&?,@".contains(c)) {
        return false;
    }
    true
}

/// Normalizes the `type`/network query value of vmess-family links.
/// Returns the value and a change marker: 1 known rewrite, -1 unknown
/// network coerced to tcp, 0 unchanged.
pub fn parse_proxy_network(n: &str) -> (String, i32) {
    if n == "none" {
        return (String::new(), 1);
    }
    if n == "trojangrpc" || n == "trgrpc" || n == "mm_grpc" || n == "GRPC" {
        return ("grpc".to_string(), 1);
    }
    match n {
        "" | "tcp" | "ws" | "grpc" | "http" | "h2" | "quic" | "kcp" | "httpupgrade"
        | "splithttp" => (n.to_string(), 0),
        _ => ("tcp".to_string(), -1),
    }
}

/// Splits a comma-separated alpn value, dropping empty entries.
pub fn parse_proxy_alpn(s: &str) -> Vec<String> {
    s.split(',')
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
        .collect()
}

/// Flow values with no modern equivalent are dropped.
pub fn parse_proxy_flow(s: &str) -> (String, bool) {
    if s == "xtls-rprx-direct" || s == "xtls-rprx-direct-udp443" {
        return (String::new(), true);
    }
    (s.to_string(), false)
}

pub fn parse_proxy_fingerprint(fp: &str) -> String {
    if fp == "随机" || fp == "rando" {
        return "random".to_string();
    }
    fp.to_string()
}

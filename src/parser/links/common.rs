//! Query-string handling shared by the trojan and vless link dialects.

use std::collections::HashMap;

use url::Url;

use crate::models::proxy::parse_proxy_network;
use crate::models::transport::{
    GrpcOptions, H2Options, HttpOptions, KcpOptions, QuicOptions, RealityOptions, TcpOptions,
    WsOptions,
};
use crate::utils::url::loop_url_decode;

/// Collapses the query into a first-wins map of decoded pairs.
pub(crate) fn query_map(url: &Url) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for (k, v) in url.query_pairs() {
        map.entry(k.to_string()).or_insert_with(|| v.to_string());
    }
    map
}

fn get<'a>(q: &'a HashMap<String, String>, key: &str) -> &'a str {
    q.get(key).map(String::as_str).unwrap_or("")
}

#[derive(Default)]
pub(crate) struct TransportParts {
    pub network: String,
    pub tcp_opts: Option<TcpOptions>,
    pub http_opts: Option<HttpOptions>,
    pub h2_opts: Option<H2Options>,
    pub grpc_opts: Option<GrpcOptions>,
    pub ws_opts: Option<WsOptions>,
    pub quic_opts: Option<QuicOptions>,
    pub kcp_opts: Option<KcpOptions>,
}

/// Decodes the `type` query value and the transport-specific keys that ride
/// along with it. `type=http` is the h2 dialect; `headerType=http` under a
/// tcp network upgrades to the http network with synthesized defaults.
pub(crate) fn parse_query_transport(q: &HashMap<String, String>) -> TransportParts {
    let mut parts = TransportParts::default();
    let (network, _) = parse_proxy_network(get(q, "type"));
    parts.network = network;

    match parts.network.as_str() {
        "ws" => {
            let host = get(q, "host");
            let path = loop_url_decode(get(q, "path"));
            if !(host.is_empty() && path.is_empty()) {
                parts.ws_opts = Some(WsOptions {
                    path,
                    ..Default::default()
                }
                .with_host(host));
            }
        }
        "grpc" => {
            let service_name = loop_url_decode(get(q, "serviceName"));
            let mode = get(q, "mode").to_string();
            if !(service_name.is_empty() && mode.is_empty()) {
                parts.grpc_opts = Some(GrpcOptions { service_name, mode });
            }
        }
        "http" => {
            let host = get(q, "host");
            let path = get(q, "path");
            if !(host.is_empty() && path.is_empty()) {
                let mut opts = H2Options {
                    path: path.to_string(),
                    ..Default::default()
                };
                if !host.is_empty() {
                    opts.host = vec![host.to_string()];
                }
                parts.h2_opts = Some(opts);
            }
            parts.network = "h2".to_string();
        }
        "quic" => {
            let header_type = get(q, "headerType");
            let security = get(q, "quicSecurity");
            let key = get(q, "key");
            if !(header_type.is_empty() && security.is_empty() && key.is_empty()) {
                parts.quic_opts = Some(QuicOptions {
                    header_type: header_type.to_string(),
                    security: security.to_string(),
                    key: key.to_string(),
                });
            }
        }
        "kcp" => {
            let header_type = get(q, "headerType");
            let seed = get(q, "seed");
            if !(header_type.is_empty() && seed.is_empty()) {
                parts.kcp_opts = Some(KcpOptions {
                    header_type: header_type.to_string(),
                    seed: seed.to_string(),
                });
            }
        }
        _ => {
            let host = get(q, "host");
            let path = get(q, "path");
            let header_type = get(q, "headerType");
            if header_type == "http" {
                parts.network = "http".to_string();
                parts.http_opts = Some(HttpOptions::for_header(host, path));
            } else {
                parts.network = "tcp".to_string();
                if !(host.is_empty()
                    && (header_type.is_empty() || header_type == "none")
                    && path.is_empty())
                {
                    parts.tcp_opts = Some(TcpOptions {
                        header_type: header_type.to_string(),
                        host: host.to_string(),
                        path: path.to_string(),
                    });
                } else {
                    parts.network = String::new();
                }
            }
        }
    }

    parts
}

/// `security=reality` carries the key material in `pbk`/`sid`/`spx`.
pub(crate) fn parse_query_reality(q: &HashMap<String, String>) -> Option<RealityOptions> {
    if get(q, "security") != "reality" {
        return None;
    }
    let opts = RealityOptions {
        public_key: get(q, "pbk").to_string(),
        short_id: get(q, "sid").to_string(),
        spiderx: get(q, "spx").to_string(),
    };
    if opts.is_empty() {
        None
    } else {
        Some(opts)
    }
}

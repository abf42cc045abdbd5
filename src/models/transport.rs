//! Per-transport option blocks shared by the vmess/vless/trojan records.
//!
//! Every block is optional on a proxy; an all-default block is treated as
//! absent and dropped before serialization.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

fn is_false(b: &bool) -> bool {
    !*b
}

fn is_zero(v: &u32) -> bool {
    *v == 0
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TcpOptions {
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub header_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub host: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
}

impl TcpOptions {
    pub fn is_empty(&self) -> bool {
        (self.header_type.is_empty() || self.header_type == "none")
            && self.host.is_empty()
            && self.path.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WsOptions {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
    #[serde(rename = "max-early-data", default, skip_serializing_if = "is_zero")]
    pub max_early_data: u32,
    #[serde(
        rename = "early-data-header-name",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub early_data_header_name: String,
    #[serde(
        rename = "v2ray-http-upgrade-fast-open",
        default,
        skip_serializing_if = "is_false"
    )]
    pub fast_open: bool,
}

impl WsOptions {
    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
            && self.headers.is_empty()
            && self.max_early_data == 0
            && !self.fast_open
    }

    pub fn host(&self) -> &str {
        self.headers.get("Host").map(String::as_str).unwrap_or("")
    }

    pub fn with_host(mut self, host: &str) -> Self {
        if !host.is_empty() {
            self.headers.insert("Host".to_string(), host.to_string());
        }
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HttpOptions {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub method: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, Vec<String>>,
}

impl HttpOptions {
    pub fn is_empty(&self) -> bool {
        self.method.is_empty() && self.path.is_empty() && self.headers.is_empty()
    }

    pub fn host(&self) -> &str {
        self.headers
            .get("Host")
            .and_then(|v| v.first())
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Synthesizes the block every `headerType=http` proxy must carry so
    /// downstream dialers do not trip over missing method or path.
    pub fn for_header(host: &str, path: &str) -> Self {
        let mut opts = HttpOptions {
            method: "GET".to_string(),
            path: vec![if path.is_empty() { "/" } else { path }.to_string()],
            headers: HashMap::new(),
        };
        if !host.is_empty() {
            opts.headers
                .insert("Host".to_string(), vec![host.to_string()]);
        }
        opts
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct H2Options {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub host: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
}

impl H2Options {
    pub fn is_empty(&self) -> bool {
        self.host.is_empty() && self.path.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GrpcOptions {
    #[serde(
        rename = "grpc-service-name",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub service_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub mode: String,
}

impl GrpcOptions {
    pub fn is_empty(&self) -> bool {
        self.service_name.is_empty() && self.mode.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuicOptions {
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub header_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub security: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub key: String,
}

impl QuicOptions {
    pub fn is_empty(&self) -> bool {
        self.header_type.is_empty() && self.security.is_empty() && self.key.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KcpOptions {
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub header_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub seed: String,
}

impl KcpOptions {
    pub fn is_empty(&self) -> bool {
        self.header_type.is_empty() && self.seed.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RealityOptions {
    #[serde(rename = "public-key", default, skip_serializing_if = "String::is_empty")]
    pub public_key: String,
    #[serde(rename = "short-id", default, skip_serializing_if = "String::is_empty")]
    pub short_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub spiderx: String,
}

impl RealityOptions {
    pub fn is_empty(&self) -> bool {
        self.public_key.is_empty() && self.short_id.is_empty() && self.spiderx.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SplitHttpOptions {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub host: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
}

impl SplitHttpOptions {
    pub fn is_empty(&self) -> bool {
        self.host.is_empty() && self.path.is_empty()
    }
}

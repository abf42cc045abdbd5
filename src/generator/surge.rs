//! Surge line emission. Only the types surge can express produce output.

use crate::models::proxy::{Proxy, ProxyDetail};

impl Proxy {
    /// One surge proxy line, or empty for types surge cannot carry.
    pub fn to_surge(&self) -> String {
        match &self.detail {
            ProxyDetail::Shadowsocks(ss) => {
                if ss.plugin == "obfs" {
                    let mode = ss
                        .plugin_opts
                        .get("mode")
                        .and_then(|v| v.as_str())
                        .unwrap_or_default();
                    let mut text = format!(
                        "{} = ss, {}, {}, encrypt-method={}, password={}, obfs={}, udp-relay=false",
                        self.base.name,
                        self.base.server,
                        self.base.port,
                        ss.cipher,
                        ss.password,
                        mode
                    );
                    if let Some(host) = ss.plugin_opts.get("host").and_then(|v| v.as_str()) {
                        if !host.is_empty() {
                            text.push_str(", obfs-host=");
                            text.push_str(host);
                        }
                    }
                    text
                } else {
                    format!(
                        "{} = ss, {}, {}, encrypt-method={}, password={}, udp-relay=false",
                        self.base.name, self.base.server, self.base.port, ss.cipher, ss.password
                    )
                }
            }
            ProxyDetail::Vmess(v) => {
                if v.network == "ws" {
                    if let Some(ws) = &v.ws_opts {
                        let headers = ws
                            .headers
                            .iter()
                            .map(|(k, v)| format!("{}:{}", k, v))
                            .collect::<Vec<_>>()
                            .join("|");
                        let mut text = format!(
                            "{} = vmess, {}, {}, username={}, ws=true, tls={}, ws-path={}",
                            self.base.name,
                            self.base.server,
                            self.base.port,
                            v.uuid,
                            v.tls,
                            ws.path
                        );
                        if !headers.is_empty() {
                            text.push_str(", ws-headers=");
                            text.push_str(&headers);
                        }
                        return text;
                    }
                }
                format!(
                    "{} = vmess, {}, {}, username={}, tls={}",
                    self.base.name, self.base.server, self.base.port, v.uuid, v.tls
                )
            }
            _ => String::new(),
        }
    }
}

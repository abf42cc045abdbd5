use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;

use crate::models::ciphers::check_ss_cipher;
use crate::models::proxy::{Base, Proxy, ProxyDetail, Shadowsocks};
use crate::parser::links::{grep_with, split_host_port};
use crate::parser::ParseError;
use crate::utils::base64::base64_decode;
use crate::utils::url::url_decode;

/// Parses an `ss://` link. Two shapes are accepted: SIP002 with base64 only
/// in the userinfo, and the legacy form where the whole authority is one
/// base64 blob.
pub fn parse_ss_link(link: &str) -> Result<Proxy, ParseError> {
    if !link.starts_with("ss://") {
        return Err(ParseError::WrongScheme("ss"));
    }

    let mut content = link[5..].replace("/?", "?");

    let mut name = String::new();
    if let Some(pos) = content.find('#') {
        name = url_decode(&content[pos + 1..]);
        content.truncate(pos);
    }

    let mut plugin_query = String::new();
    if let Some(pos) = content.find('?') {
        for pair in content[pos + 1..].split('&') {
            if let Some(value) = pair.strip_prefix("plugin=") {
                plugin_query = url_decode(value);
            }
        }
        content.truncate(pos);
    }
    content = content.trim_end_matches('/').to_string();

    let (cipher, password, server, port) = if let Some((userinfo, authority)) =
        content.split_once('@')
    {
        // SIP002: base64(cipher:password)@host:port
        let decoded =
            base64_decode(userinfo).ok_or(ParseError::PayloadParse("ss"))?;
        let (cipher, password) = decoded
            .split_once(':')
            .ok_or(ParseError::PayloadParse("ss"))?;
        let (server, port) =
            split_host_port(authority).ok_or(ParseError::PayloadParse("ss"))?;
        (
            cipher.to_lowercase(),
            password.to_string(),
            server,
            port,
        )
    } else {
        // Legacy: the whole cipher:password@host:port is base64
        let decoded =
            base64_decode(&content).ok_or(ParseError::PayloadParse("ss"))?;
        let (userinfo, authority) = decoded
            .rsplit_once('@')
            .ok_or(ParseError::PayloadParse("ss"))?;
        let (cipher, password) = userinfo
            .split_once(':')
            .ok_or(ParseError::PayloadParse("ss"))?;
        let (server, port) =
            split_host_port(authority).ok_or(ParseError::PayloadParse("ss"))?;
        (
            cipher.to_lowercase(),
            password.to_string(),
            server,
            port,
        )
    };

    if port == 0 || cipher.is_empty() || !check_ss_cipher(&cipher) {
        return Err(ParseError::PayloadParse("ss"));
    }

    let (plugin, plugin_opts) = parse_plugin(&plugin_query);

    Ok(Proxy::new(
        Base {
            name,
            server,
            port,
            udp: true,
            ..Default::default()
        },
        ProxyDetail::Shadowsocks(Shadowsocks {
            password,
            cipher,
            plugin,
            plugin_opts,
        }),
    ))
}

/// The `plugin` query value is semicolon-delimited:
/// `obfs-local;obfs=http;obfs-host=...` or `v2ray-plugin;mode=...;tls`.
fn parse_plugin(raw: &str) -> (String, HashMap<String, serde_json::Value>) {
    let mut opts = HashMap::new();
    if raw.is_empty() {
        return (String::new(), opts);
    }
    if !raw.contains(';') {
        return (raw.to_string(), opts);
    }

    let mut parts = raw.split(';');
    let mut plugin = parts.next().unwrap_or_default().to_string();
    let kv: HashMap<&str, &str> = raw
        .split(';')
        .skip(1)
        .filter_map(|item| item.split_once('='))
        .collect();

    match plugin.as_str() {
        "obfs" | "obfs-local" => {
            plugin = "obfs".to_string();
            if let Some(mode) = kv.get("obfs") {
                opts.insert("mode".to_string(), serde_json::Value::from(*mode));
            }
            if let Some(host) = kv.get("obfs-host") {
                opts.insert("host".to_string(), serde_json::Value::from(*host));
            }
        }
        "v2ray-plugin" => {
            if let Some(mode) = kv.get("mode") {
                opts.insert("mode".to_string(), serde_json::Value::from(*mode));
            }
            if let Some(host) = kv.get("host") {
                opts.insert("host".to_string(), serde_json::Value::from(*host));
            }
            if let Some(path) = kv.get("path") {
                opts.insert("path".to_string(), serde_json::Value::from(*path));
            }
            if raw.split(';').any(|item| item == "tls") {
                opts.insert("tls".to_string(), serde_json::Value::from(true));
            }
        }
        _ => {}
    }

    (plugin, opts)
}

lazy_static! {
    static ref SS_PLAIN_RE: Regex =
        Regex::new("ss://([A-Za-z0-9+/_&?=@:%.-])+").expect("ss regex");
}

pub fn grep_ss_links(text: &str) -> Vec<String> {
    grep_with(text, "ss://", &SS_PLAIN_RE)
}

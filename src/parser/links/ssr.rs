use lazy_static::lazy_static;
use regex::Regex;

use crate::models::proxy::{Base, Proxy, ProxyDetail, ShadowsocksR};
use crate::parser::links::grep_with;
use crate::parser::ParseError;
use crate::utils::base64::{base64_decode, url_safe_base64_decode};

/// Parses the original SSR composite form:
/// `ssr://base64(host:port:protocol:cipher:obfs:base64(password)/?params)`
/// where the query values are themselves url-safe base64.
pub fn parse_ssr_link(link: &str) -> Result<Proxy, ParseError> {
    if !link.starts_with("ssr://") {
        return Err(ParseError::WrongScheme("ssr"));
    }

    let mut decoded = base64_decode(&link[6..])
        .ok_or(ParseError::PayloadParse("ssr"))?
        .replace('\r', "");

    let mut name = String::new();
    let mut obfs_param = String::new();
    let mut protocol_param = String::new();
    if let Some(pos) = decoded.find("/?") {
        let query = decoded[pos + 2..].to_string();
        decoded.truncate(pos);
        for pair in query.split('&') {
            let (key, value) = match pair.split_once('=') {
                Some(kv) => kv,
                None => continue,
            };
            match key {
                "remarks" => name = url_safe_base64_decode(value),
                "obfsparam" => obfs_param = url_safe_base64_decode(value).replace(' ', ""),
                "protoparam" => protocol_param = url_safe_base64_decode(value).replace(' ', ""),
                _ => {}
            }
        }
    }

    let parts: Vec<&str> = decoded.split(':').collect();
    if parts.len() < 6 {
        return Err(ParseError::PayloadParse("ssr"));
    }
    let server = parts[0].to_string();
    let port: u16 = parts[1]
        .parse()
        .map_err(|_| ParseError::PayloadParse("ssr"))?;
    let protocol = parts[2].to_string();
    let cipher = parts[3].to_string();
    let obfs = parts[4].to_string();
    let password = url_safe_base64_decode(parts[5]);

    if port == 0 {
        return Err(ParseError::PayloadParse("ssr"));
    }

    Ok(Proxy::new(
        Base {
            name,
            server,
            port,
            udp: true,
            ..Default::default()
        },
        ProxyDetail::ShadowsocksR(ShadowsocksR {
            password,
            cipher,
            protocol,
            protocol_param,
            obfs,
            obfs_param,
        }),
    ))
}

lazy_static! {
    static ref SSR_PLAIN_RE: Regex =
        Regex::new("ssr://([A-Za-z0-9+/_=-])+").expect("ssr regex");
}

pub fn grep_ssr_links(text: &str) -> Vec<String> {
    grep_with(text, "ssr://", &SSR_PLAIN_RE)
}

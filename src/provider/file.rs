//! Writes the pool to disk, either as a full clash document or as a raw
//! link list.

use std::io;

use crate::models::Proxy;
use crate::provider::Clash;

/// `mode` selects the shape: `link` writes one shareable link per line,
/// anything else writes the clash document.
pub fn render(proxies: &[Proxy], mode: &str) -> String {
    if mode == "link" {
        let mut result = String::new();
        for p in proxies {
            let link = p.to_link();
            if !link.is_empty() {
                result.push_str(&link);
                result.push('\n');
            }
        }
        result
    } else {
        Clash { proxies }.provide()
    }
}

pub fn save_proxies(proxies: &[Proxy], path: &str, mode: &str) -> io::Result<()> {
    std::fs::write(path, render(proxies, mode))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::proxy::{Base, ProxyDetail, Shadowsocks};
    use std::io::Read;

    fn sample() -> Vec<Proxy> {
        vec![Proxy::new(
            Base {
                server: "1.1.1.1".to_string(),
                port: 443,
                ..Default::default()
            },
            ProxyDetail::Shadowsocks(Shadowsocks {
                password: "x".to_string(),
                cipher: "aes-256-gcm".to_string(),
                ..Default::default()
            }),
        )]
    }

    #[test]
    fn test_render_link_mode() {
        let text = render(&sample(), "link");
        assert!(text.starts_with("ss://"));
    }

    #[test]
    fn test_save_clash_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pool.yaml");
        save_proxies(&sample(), path.to_str().unwrap(), "clash").unwrap();
        let mut contents = String::new();
        std::fs::File::open(&path)
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert!(contents.starts_with("proxies:\n"));
    }
}

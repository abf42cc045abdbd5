use crate::models::Proxy;

/// Renders the surge proxy list. Only types surge understands are emitted.
pub struct Surge<'a> {
    pub proxies: &'a [Proxy],
}

fn surge_supported(p: &Proxy) -> bool {
    matches!(p.type_name(), "ss" | "vmess")
}

impl Surge<'_> {
    pub fn provide(&self) -> String {
        let mut result = String::new();
        for p in self.proxies {
            if !surge_supported(p) {
                continue;
            }
            let line = p.to_surge();
            if !line.is_empty() {
                result.push_str(&line);
                result.push('\n');
            }
        }
        result
    }
}

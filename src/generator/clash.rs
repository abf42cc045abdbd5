//! Clash-facing serialization. One proxy renders as a single-line JSON
//! object, which YAML accepts as a flow mapping inside a sequence.

use crate::models::Proxy;

impl Proxy {
    /// The flat clash map as a JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// One element of a clash `proxies:` sequence.
    pub fn to_clash_line(&self) -> String {
        let json = self.to_json();
        if json.is_empty() {
            return String::new();
        }
        format!("- {}", json)
    }
}

//! String helpers shared across parsers and adapters.

/// Checks whether an item is contained in a static word list.
pub fn check_in_list(list: &[&str], item: &str) -> bool {
    list.iter().any(|i| *i == item)
}

/// Joins a host and port, bracketing IPv6 literals.
pub fn join_host_port(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}

/// Undoes the HTML escaping found in scraped message bodies. Only the five
/// entities that actually occur in URLs and link text are handled.
pub fn html_unescape(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

/// Extracts the `ed=` early-data marker some ws paths carry (`/path?ed=2048`).
pub fn parse_early_data(path: &str) -> u32 {
    if let Some(pos) = path.find('?') {
        for pair in path[pos + 1..].split('&') {
            if let Some(value) = pair.strip_prefix("ed=") {
                return value.parse().unwrap_or(0);
            }
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_host_port() {
        assert_eq!(join_host_port("1.1.1.1", 443), "1.1.1.1:443");
        assert_eq!(join_host_port("2001:db8::1", 443), "[2001:db8::1]:443");
        assert_eq!(join_host_port("[2001:db8::1]", 443), "[2001:db8::1]:443");
    }

    #[test]
    fn test_html_unescape() {
        assert_eq!(
            html_unescape("https://a.example/sub?token=1&amp;x=2"),
            "https://a.example/sub?token=1&x=2"
        );
    }

    #[test]
    fn test_parse_early_data() {
        assert_eq!(parse_early_data("/path?ed=2048"), 2048);
        assert_eq!(parse_early_data("/path"), 0);
        assert_eq!(parse_early_data("/path?other=1"), 0);
    }
}

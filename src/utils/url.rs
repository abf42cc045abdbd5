//! URL encoding/decoding utilities.

/// Encodes a string using percent encoding.
pub fn url_encode(input: &str) -> String {
    urlencoding::encode(input).into_owned()
}

/// Decodes a percent-encoded string, returning the input unchanged on failure.
pub fn url_decode(input: &str) -> String {
    urlencoding::decode(input)
        .map(|cow| cow.into_owned())
        .unwrap_or_else(|_| input.to_string())
}

/// Decodes until the value stops changing. Some wild links arrive with their
/// path component escaped more than once.
pub fn loop_url_decode(input: &str) -> String {
    let mut current = input.to_string();
    for _ in 0..4 {
        let next = url_decode(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

/// Renders query pairs sorted by key, the way serialized links are expected
/// to look by downstream clients.
pub fn encode_query(pairs: &[(&str, String)]) -> String {
    let mut sorted: Vec<&(&str, String)> = pairs.iter().collect();
    sorted.sort_by_key(|(k, _)| *k);
    sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, url_encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_query_sorts_keys() {
        let pairs = [("sni", "a.example".to_string()), ("alpn", "h2".to_string())];
        assert_eq!(encode_query(&pairs), "alpn=h2&sni=a.example");
    }

    #[test]
    fn test_loop_url_decode() {
        assert_eq!(loop_url_decode("%252Fws"), "/ws");
        assert_eq!(loop_url_decode("/plain"), "/plain");
    }
}

use base64::{
    alphabet,
    engine::{general_purpose, DecodePaddingMode},
    Engine as _,
};

fn engine(urlsafe: bool) -> general_purpose::GeneralPurpose {
    let config = general_purpose::GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent);
    general_purpose::GeneralPurpose::new(
        if urlsafe {
            &alphabet::URL_SAFE
        } else {
            &alphabet::STANDARD
        },
        config,
    )
}

/// Encodes a string to standard Base64.
pub fn base64_encode(input: &str) -> String {
    general_purpose::STANDARD.encode(input)
}

/// Decodes Base64, tolerating missing padding and both alphabets.
///
/// Subscription bodies come from the wild, so the standard alphabet is tried
/// first and the URL-safe one second. Returns `None` when neither matches.
pub fn base64_decode(input: &str) -> Option<String> {
    let clean: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    for urlsafe in [false, true] {
        if let Ok(bytes) = engine(urlsafe).decode(&clean) {
            return Some(String::from_utf8_lossy(&bytes).to_string());
        }
    }
    None
}

/// Reverses a URL-safe Base64 string to standard Base64 format.
pub fn url_safe_base64_reverse(input: &str) -> String {
    input.replace('-', "+").replace('_', "/")
}

/// Decodes a URL-safe Base64 string, falling back to the input on failure.
pub fn url_safe_base64_decode(input: &str) -> String {
    match base64_decode(&url_safe_base64_reverse(input)) {
        Some(decoded) => decoded,
        None => input.to_string(),
    }
}

/// Encodes a string to URL-safe Base64 without padding.
pub fn url_safe_base64_encode(input: &str) -> String {
    base64_encode(input)
        .replace('+', "-")
        .replace('/', "_")
        .replace('=', "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_tolerates_missing_padding() {
        assert_eq!(
            base64_decode("YWVzLTI1Ni1nY206eA").as_deref(),
            Some("aes-256-gcm:x")
        );
        assert_eq!(
            base64_decode("YWVzLTI1Ni1nY206eA==").as_deref(),
            Some("aes-256-gcm:x")
        );
    }

    #[test]
    fn test_decode_url_safe_alphabet() {
        let encoded = url_safe_base64_encode("subject?+/value");
        assert_eq!(url_safe_base64_decode(&encoded), "subject?+/value");
    }

    #[test]
    fn test_decode_garbage_returns_none() {
        assert_eq!(base64_decode("not*base64!"), None);
    }
}

// Helper functions for safe logging and JSON-in-TEXT columns

/// Masks email addresses for safe logging
///
/// # Example
/// ```ignore
/// let masked = safe_email_log("user@example.com");
/// // Returns: "u***@example.com"
/// ```
pub fn safe_email_log(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {
            let first: String = local.chars().take(1).collect();
            format!("{}***@{}", first, domain)
        }
        _ => "***@***.***".to_string(),
    }
}

/// Masks a secret (API key, token) for display: first and last 4 characters.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}…{}", head, tail)
    } else if chars.is_empty() {
        String::new()
    } else {
        "****".to_string()
    }
}

/// True when the value looks like something `mask_secret` produced.
pub fn is_masked_secret(value: &str) -> bool {
    value.contains('…') || value == "****"
}

/// Decodes a JSON string array stored in a TEXT column, tolerating garbage.
pub fn string_list_from_json(raw: Option<&str>) -> Vec<String> {
    raw.and_then(|s| serde_json::from_str::<Vec<String>>(s).ok())
        .unwrap_or_default()
}

/// Encodes a string list for a TEXT column.
pub fn string_list_to_json(values: &[String]) -> String {
    serde_json::to_string(values).unwrap_or_else(|_| "[]".to_string())
}

/// Truncates a string to at most `max` characters, on a char boundary.
pub fn truncate_chars(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_email_log() {
        assert_eq!(safe_email_log("rider@example.com"), "r***@example.com");
        assert_eq!(safe_email_log("nope"), "***@***.***");
    }

    #[test]
    fn test_mask_secret_round_trip_detection() {
        let masked = mask_secret("sk-proj-1234567890abcdef");
        assert_eq!(masked, "sk-p…cdef");
        assert!(is_masked_secret(&masked));
        assert!(!is_masked_secret("sk-proj-1234567890abcdef"));
        assert_eq!(mask_secret("short"), "****");
        assert_eq!(mask_secret(""), "");
    }

    #[test]
    fn test_string_list_json_tolerates_bad_input() {
        assert_eq!(
            string_list_from_json(Some(r#"["a","b"]"#)),
            vec!["a".to_string(), "b".to_string()]
        );
        assert!(string_list_from_json(Some("not json")).is_empty());
        assert!(string_list_from_json(None).is_empty());
        assert_eq!(string_list_to_json(&["x".to_string()]), r#"["x"]"#);
    }
}

//! Property path formatting.
//!
//! Object members are addressed as `parent.key` when `key` is an identifier
//! and as `parent["key"]` otherwise; array elements as `parent[i]`.

/// Returns true if `key` is `[A-Za-z_][A-Za-z0-9_]*`.
#[must_use]
pub fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Appends an object member to `parent`.
#[must_use]
pub fn push_key(parent: &str, key: &str) -> String {
    if is_identifier(key) {
        if parent.is_empty() {
            key.to_string()
        } else {
            format!("{parent}.{key}")
        }
    } else {
        format!("{parent}[{}]", quote(key))
    }
}

/// Appends an array index to `parent`.
#[must_use]
pub fn push_index(parent: &str, index: usize) -> String {
    format!("{parent}[{index}]")
}

// JSON string quoting; serializing a &str cannot fail.
fn quote(key: &str) -> String {
    serde_json::to_string(key).unwrap_or_else(|_| format!("\"{key}\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("dbPassword"));
        assert!(is_identifier("_x9"));
        assert!(!is_identifier("9lives"));
        assert!(!is_identifier("my-key"));
        assert!(!is_identifier("aws:region"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn test_push_key_forms() {
        assert_eq!(push_key("", "region"), "region");
        assert_eq!(push_key("aws", "region"), "aws.region");
        assert_eq!(push_key("", "aws:region"), "[\"aws:region\"]");
        assert_eq!(push_key("tags", "team name"), "tags[\"team name\"]");
        assert_eq!(push_key("", "say \"hi\""), "[\"say \\\"hi\\\"\"]");
    }

    #[test]
    fn test_push_index() {
        assert_eq!(push_index("hosts", 2), "hosts[2]");
        assert_eq!(push_index(&push_index("grid", 0), 1), "grid[0][1]");
    }
}

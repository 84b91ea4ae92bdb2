use sha2::{Digest, Sha256};

/// Stable change-detection hash for an article:
/// `sha256(title | url | summary)` with an empty string for a missing summary.
/// Stored on the article row and compared on every upsert.
pub fn content_hash(title: &str, url: &str, summary: Option<&str>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update(b"|");
    hasher.update(url.as_bytes());
    hasher.update(b"|");
    hasher.update(summary.unwrap_or("").as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_across_calls() {
        let a = content_hash("Title", "https://example.com/a", Some("sum"));
        let b = content_hash("Title", "https://example.com/a", Some("sum"));
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn missing_summary_equals_empty_summary() {
        let a = content_hash("T", "u", None);
        let b = content_hash("T", "u", Some(""));
        assert_eq!(a, b);
    }

    #[test]
    fn any_field_change_changes_hash() {
        let base = content_hash("T", "u", Some("s"));
        assert_ne!(base, content_hash("T2", "u", Some("s")));
        assert_ne!(base, content_hash("T", "u2", Some("s")));
        assert_ne!(base, content_hash("T", "u", Some("s2")));
    }
}

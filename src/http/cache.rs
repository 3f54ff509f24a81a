//! HTTP cache control module
//!
//! Provides `ETag` generation, conditional request handling and the
//! `Cache-Control` policy.

use std::time::{SystemTime, UNIX_EPOCH};

/// Generate a weak `ETag` from file size and modification time
///
/// Format: `W/"<size hex>-<mtime millis hex>"`. Identical inputs always give
/// identical tags, and any change of size or mtime changes the tag.
pub fn generate_etag(size: u64, modified: Option<SystemTime>) -> String {
    let mtime_ms = modified
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |d| d.as_millis());
    format!("W/\"{size:x}-{mtime_ms:x}\"")
}

/// Check if client's `If-None-Match` header matches the server's `ETag`
///
/// Byte-for-byte comparison only: no list parsing, no weak comparison.
pub fn check_etag_match(if_none_match: Option<&str>, etag: &str) -> bool {
    if_none_match.is_some_and(|client_etag| client_etag == etag)
}

/// Cache control policy derived from `max_age` / `immutable`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CachePolicy {
    /// `max-age` in seconds, `None` disables the header
    pub max_age: Option<u64>,
    /// Append `immutable`
    pub immutable: bool,
}

impl CachePolicy {
    pub const fn new(max_age: Option<u64>, immutable: bool) -> Self {
        Self { max_age, immutable }
    }

    /// Convert to Cache-Control header value
    pub fn to_header_value(self) -> Option<String> {
        let max_age = self.max_age?;
        let mut value = format!("public,max-age={max_age}");
        if self.immutable {
            value.push_str(",immutable");
        } else if max_age == 0 {
            value.push_str(",must-revalidate");
        }
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_generate_etag() {
        let mtime = UNIX_EPOCH + Duration::from_millis(1_700_000_000_123);
        let etag = generate_etag(1024, Some(mtime));
        assert_eq!(etag, format!("W/\"400-{:x}\"", 1_700_000_000_123_u128));
    }

    #[test]
    fn test_etag_consistency() {
        let mtime = SystemTime::now();
        assert_eq!(generate_etag(10, Some(mtime)), generate_etag(10, Some(mtime)));
    }

    #[test]
    fn test_etag_difference() {
        let mtime = UNIX_EPOCH + Duration::from_secs(1000);
        let later = mtime + Duration::from_millis(1);
        assert_ne!(generate_etag(10, Some(mtime)), generate_etag(11, Some(mtime)));
        assert_ne!(generate_etag(10, Some(mtime)), generate_etag(10, Some(later)));
    }

    #[test]
    fn test_check_etag_match() {
        let etag = "W/\"a-b\"";
        assert!(check_etag_match(Some("W/\"a-b\""), etag));
        assert!(!check_etag_match(Some("\"a-b\""), etag));
        assert!(!check_etag_match(Some("*"), etag));
        assert!(!check_etag_match(Some("\"x\", W/\"a-b\""), etag));
        assert!(!check_etag_match(None, etag));
    }

    #[test]
    fn test_cache_policy() {
        assert_eq!(CachePolicy::new(None, true).to_header_value(), None);
        assert_eq!(
            CachePolicy::new(Some(3600), false).to_header_value().as_deref(),
            Some("public,max-age=3600")
        );
        assert_eq!(
            CachePolicy::new(Some(3600), true).to_header_value().as_deref(),
            Some("public,max-age=3600,immutable")
        );
        assert_eq!(
            CachePolicy::new(Some(0), false).to_header_value().as_deref(),
            Some("public,max-age=0,must-revalidate")
        );
        assert_eq!(
            CachePolicy::new(Some(0), true).to_header_value().as_deref(),
            Some("public,max-age=0,immutable")
        );
    }
}

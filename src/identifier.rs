use regex::{Regex, RegexBuilder};
use std::fmt;
use std::sync::LazyLock;

/// Normalized (uppercase) product identifier taken from a listing URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProductId(String);

impl ProductId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Tried in order; the first pattern that matches wins.
const PATTERNS: &[&str] = &[
    r"/dp/([A-Z0-9]{10})",
    r"/gp/product/([A-Z0-9]{10})",
    r"/product/([A-Z0-9]{10})",
    r"/dp/([A-Z0-9]{10})/",
    r"/([A-Z0-9]{10})/",
    r"[/?&]asin=([A-Z0-9]{10})",
    r"[/?&]pd_rd_i=([A-Z0-9]{10})",
];

static MATCHERS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    PATTERNS
        .iter()
        .filter_map(|pattern| {
            RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .inspect_err(|e| tracing::error!("invalid identifier pattern {}: {}", pattern, e))
                .ok()
        })
        .collect()
});

/// Extracts the product identifier from a listing URL.
///
/// Returns `None` when no known URL shape matches; that is a cache miss, not an error.
pub fn extract_identifier(url: &str) -> Option<ProductId> {
    MATCHERS
        .iter()
        .find_map(|re| re.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|m| ProductId(m.as_str().to_uppercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(url: &str) -> Option<String> {
        extract_identifier(url).map(|id| id.to_string())
    }

    #[test]
    fn all_patterns_compile() {
        assert_eq!(MATCHERS.len(), PATTERNS.len());
    }

    #[test]
    fn standard_dp_url() {
        assert_eq!(
            id("https://www.amazon.com/Some-Product-Name/dp/B08N5WRWNW?ref=sr_1_1").as_deref(),
            Some("B08N5WRWNW")
        );
    }

    #[test]
    fn dp_segment_beats_generic_segment() {
        // Both "/B000000001/" and "/dp/B08N5WRWNW" are present.
        let url = "https://www.amazon.com/B000000001/dp/B08N5WRWNW/ref=abc";
        assert_eq!(id(url).as_deref(), Some("B08N5WRWNW"));
    }

    #[test]
    fn alternate_path_forms() {
        assert_eq!(
            id("https://www.amazon.com/gp/product/0596517742").as_deref(),
            Some("0596517742")
        );
        assert_eq!(
            id("https://example.com/product/B07XJ8C8F5").as_deref(),
            Some("B07XJ8C8F5")
        );
        assert_eq!(
            id("https://www.amazon.com/stuff/B07XJ8C8F5/").as_deref(),
            Some("B07XJ8C8F5")
        );
    }

    #[test]
    fn query_parameter_forms() {
        assert_eq!(
            id("https://www.amazon.com/s?k=thing&asin=B07XJ8C8F5").as_deref(),
            Some("B07XJ8C8F5")
        );
        assert_eq!(
            id("https://www.amazon.com/s?pd_rd_i=B07XJ8C8F5&th=1").as_deref(),
            Some("B07XJ8C8F5")
        );
    }

    #[test]
    fn result_is_uppercased() {
        assert_eq!(
            id("https://www.amazon.com/dp/b08n5wrwnw").as_deref(),
            Some("B08N5WRWNW")
        );
    }

    #[test]
    fn unrecognized_urls_yield_none() {
        assert_eq!(id("https://www.amazon.com/s?k=headphones"), None);
        assert_eq!(id("https://www.amazon.com/dp/SHORT"), None);
        assert_eq!(id("not a url at all"), None);
        assert_eq!(id(""), None);
    }
}

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum CompareError {
    #[error("no comparison backend is configured")]
    Unconfigured,
    #[error("comparison backend failed: {0}")]
    #[cfg_attr(not(test), allow(dead_code))]
    Backend(String),
}

/// Produces a fresh comparison of two listings (scraping plus the language-model call).
#[async_trait]
pub trait Comparator: Send + Sync {
    async fn compare(&self, product1_url: &str, product2_url: &str)
    -> Result<String, CompareError>;
}

/// Placeholder wired in until a real scraping/LLM backend is plugged in.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredComparator;

#[async_trait]
impl Comparator for UnconfiguredComparator {
    async fn compare(
        &self,
        product1_url: &str,
        product2_url: &str,
    ) -> Result<String, CompareError> {
        tracing::warn!(
            "comparison requested for {} vs {} but no backend is configured",
            product1_url,
            product2_url
        );
        Err(CompareError::Unconfigured)
    }
}

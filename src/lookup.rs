//! Cache check run before the expensive comparison path.
//!
//! Any storage failure is reported as [`LookupOutcome::Failed`] and logged; it
//! never propagates, so a broken cache only costs a recomputation.

use crate::identifier::{ProductId, extract_identifier};
use crate::storage::{ComparisonStore, StoreError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    Found(String),
    NotFound,
    Failed(String),
}

impl LookupOutcome {
    pub fn result(&self) -> Option<&str> {
        match self {
            Self::Found(result) => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(error) => Some(error),
            _ => None,
        }
    }
}

/// Looks up a stored comparison for the ordered pair of products behind the two URLs.
pub async fn find_cached_comparison(
    store: &dyn ComparisonStore,
    product1_url: &str,
    product2_url: &str,
) -> LookupOutcome {
    // No identifier means nothing could have been cached; skip storage entirely.
    let (Some(id1), Some(id2)) = (
        extract_identifier(product1_url),
        extract_identifier(product2_url),
    ) else {
        return LookupOutcome::NotFound;
    };

    match lookup(store, &id1, &id2).await {
        Ok(Some(result)) => {
            tracing::info!("cache hit for {} vs {}", id1.as_str(), id2.as_str());
            LookupOutcome::Found(result)
        }
        Ok(None) => LookupOutcome::NotFound,
        Err(e) => {
            tracing::warn!(
                "comparison cache lookup failed for {} vs {}: {}",
                id1.as_str(),
                id2.as_str(),
                e
            );
            LookupOutcome::Failed(e.to_string())
        }
    }
}

async fn lookup(
    store: &dyn ComparisonStore,
    id1: &ProductId,
    id2: &ProductId,
) -> Result<Option<String>, StoreError> {
    let Some(product1) = store.find_product_by_identifier(id1).await? else {
        return Ok(None);
    };
    let Some(product2) = store.find_product_by_identifier(id2).await? else {
        return Ok(None);
    };

    let record = store.find_comparison(product1.key, product2.key).await?;
    Ok(record.map(|r| r.result))
}

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::identifier::ProductId;

/// Internal key the store assigns to a product.
pub type ProductKey = i64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub key: ProductKey,
    pub identifier: ProductId,
}

/// Result of a previous comparison, stored for the ordered pair `(product_key_1, product_key_2)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonRecord {
    pub product_key_1: ProductKey,
    pub product_key_2: ProductKey,
    pub result: String,
}

// Only fallible backends produce these; the in-memory store never does.
#[derive(Debug, thiserror::Error)]
#[cfg_attr(not(test), allow(dead_code))]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("malformed record: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait ComparisonStore: Send + Sync {
    async fn find_product_by_identifier(
        &self,
        identifier: &ProductId,
    ) -> Result<Option<Product>, StoreError>;

    /// Ordered lookup: `(a, b)` and `(b, a)` are different records.
    async fn find_comparison(
        &self,
        product_key_1: ProductKey,
        product_key_2: ProductKey,
    ) -> Result<Option<ComparisonRecord>, StoreError>;

    /// Returns the existing product for `identifier`, creating it if needed.
    async fn upsert_product(&self, identifier: &ProductId) -> Result<Product, StoreError>;

    /// Stores (or replaces) the result for the ordered pair.
    async fn save_comparison(
        &self,
        product_key_1: ProductKey,
        product_key_2: ProductKey,
        result: String,
    ) -> Result<ComparisonRecord, StoreError>;
}

/// Process-local store. Contents are lost on restart.
#[derive(Debug)]
pub struct InMemoryStore {
    products: DashMap<ProductId, Product>,
    comparisons: DashMap<(ProductKey, ProductKey), ComparisonRecord>,
    next_key: AtomicI64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            products: DashMap::new(),
            comparisons: DashMap::new(),
            next_key: AtomicI64::new(1),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ComparisonStore for InMemoryStore {
    async fn find_product_by_identifier(
        &self,
        identifier: &ProductId,
    ) -> Result<Option<Product>, StoreError> {
        Ok(self.products.get(identifier).map(|p| p.value().clone()))
    }

    async fn find_comparison(
        &self,
        product_key_1: ProductKey,
        product_key_2: ProductKey,
    ) -> Result<Option<ComparisonRecord>, StoreError> {
        Ok(self
            .comparisons
            .get(&(product_key_1, product_key_2))
            .map(|r| r.value().clone()))
    }

    async fn upsert_product(&self, identifier: &ProductId) -> Result<Product, StoreError> {
        let product = self
            .products
            .entry(identifier.clone())
            .or_insert_with(|| Product {
                key: self.next_key.fetch_add(1, Ordering::Relaxed),
                identifier: identifier.clone(),
            });
        Ok(product.value().clone())
    }

    async fn save_comparison(
        &self,
        product_key_1: ProductKey,
        product_key_2: ProductKey,
        result: String,
    ) -> Result<ComparisonRecord, StoreError> {
        let record = ComparisonRecord {
            product_key_1,
            product_key_2,
            result,
        };
        self.comparisons
            .insert((product_key_1, product_key_2), record.clone());
        tracing::debug!(
            "stored comparison for products {} and {}",
            product_key_1,
            product_key_2
        );
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::extract_identifier;

    fn pid(asin: &str) -> ProductId {
        extract_identifier(&format!("https://www.amazon.com/dp/{asin}")).unwrap()
    }

    #[tokio::test]
    async fn upsert_is_idempotent_per_identifier() {
        let store = InMemoryStore::new();
        let first = store.upsert_product(&pid("B000000001")).await.unwrap();
        let again = store.upsert_product(&pid("B000000001")).await.unwrap();
        let other = store.upsert_product(&pid("B000000002")).await.unwrap();

        assert_eq!(first, again);
        assert_eq!(first.key, 1);
        assert_eq!(other.key, 2);
        assert_eq!(
            store
                .find_product_by_identifier(&pid("B000000002"))
                .await
                .unwrap(),
            Some(other)
        );
    }

    #[tokio::test]
    async fn unknown_product_is_none() {
        let store = InMemoryStore::new();
        assert_eq!(
            store
                .find_product_by_identifier(&pid("B000000009"))
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn comparisons_are_keyed_by_ordered_pair() {
        let store = InMemoryStore::new();
        store
            .save_comparison(1, 2, "first wins".to_string())
            .await
            .unwrap();

        let found = store.find_comparison(1, 2).await.unwrap();
        assert_eq!(found.map(|r| r.result), Some("first wins".to_string()));
        assert_eq!(store.find_comparison(2, 1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn saving_again_replaces_the_result() {
        let store = InMemoryStore::new();
        store.save_comparison(1, 2, "old".to_string()).await.unwrap();
        store.save_comparison(1, 2, "new".to_string()).await.unwrap();

        let found = store.find_comparison(1, 2).await.unwrap().unwrap();
        assert_eq!(found.result, "new");
    }
}

//! Client-side storage abstraction, the equivalent of a browser's
//! `localStorage`: string keys, string values, and no errors surfaced to the
//! caller.

use async_trait::async_trait;
use std::sync::Arc;

/// Collection holding the currency keys below.
pub const PREFERENCES_COLLECTION: &str = "preferences";

/// Key holding the manually selected currency code.
pub const CURRENCY_KEY: &str = "currency";
/// Key holding the JSON-encoded [`crate::core::rates::RateSnapshot`].
pub const RATES_CACHE_KEY: &str = "exchange_rates_cache";

#[async_trait]
pub trait KeyValueCollection: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
    async fn put(&self, key: &str, value: &str);
    async fn remove(&self, key: &str);
}

/// Hands out named collections, either persistent or in-memory.
pub trait Store {
    fn get_collection(
        &self,
        name: &str,
        persist: bool,
        create_if_missing: bool,
    ) -> Option<Arc<dyn KeyValueCollection>>;
}

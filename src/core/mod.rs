//! Domain types and pure calculations.

pub mod cache;
pub mod config;
pub mod currency;
pub mod format;
pub mod leads;
pub mod log;
pub mod rates;
pub mod tips;

// Re-export main types for cleaner imports
pub use cache::KeyValueCollection;
pub use currency::{CurrencyCode, CurrencySelection};
pub use rates::{ExchangeRates, RatePayload, RateSnapshot, RateSource};

//! Exchange rate sets relative to IDR and the cached snapshot format.

use crate::core::currency::CurrencyCode;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tracing::debug;

/// Fallback factors applied whenever live or cached data is missing.
pub const DEFAULT_RATES: [(CurrencyCode, f64); 4] = [
    (CurrencyCode::Idr, 1.0),
    (CurrencyCode::Usd, 0.000063),
    (CurrencyCode::Sgd, 0.000085),
    (CurrencyCode::Aud, 0.000097),
];

/// Maximum age of a cached rate set before it is ignored at load time.
pub const RATES_TTL: Duration = Duration::from_millis(3_600_000);

/// Rates as they arrive over the wire: any code, possibly null.
pub type RawRates = HashMap<String, Option<f64>>;

fn default_rate(code: CurrencyCode) -> f64 {
    DEFAULT_RATES
        .iter()
        .find(|(c, _)| *c == code)
        .map_or(1.0, |(_, rate)| *rate)
}

/// Multiplicative factors converting an IDR amount into each supported
/// currency. Every code is always present and IDR is always 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawRates", into = "BTreeMap<CurrencyCode, f64>")]
pub struct ExchangeRates {
    rates: BTreeMap<CurrencyCode, f64>,
}

impl ExchangeRates {
    pub fn defaults() -> Self {
        Self {
            rates: DEFAULT_RATES.into_iter().collect(),
        }
    }

    /// Builds a complete rate set from a payload that may be missing codes or
    /// carry unusable values. Gaps are filled from [`DEFAULT_RATES`].
    pub fn from_partial(raw: &RawRates) -> Self {
        let mut rates = Self::defaults();
        for (key, value) in raw {
            let Ok(code) = key.parse::<CurrencyCode>() else {
                debug!("Ignoring rate for unsupported currency {key}");
                continue;
            };
            match value {
                Some(rate) if rate.is_finite() && *rate > 0.0 => {
                    rates.rates.insert(code, *rate);
                }
                _ => debug!("Unusable rate {value:?} for {code}, keeping default"),
            }
        }
        rates.rates.insert(CurrencyCode::Idr, 1.0);
        rates
    }

    pub fn get(&self, code: CurrencyCode) -> f64 {
        self.rates
            .get(&code)
            .copied()
            .unwrap_or_else(|| default_rate(code))
    }

    pub fn iter(&self) -> impl Iterator<Item = (CurrencyCode, f64)> + '_ {
        self.rates.iter().map(|(code, rate)| (*code, *rate))
    }
}

impl Default for ExchangeRates {
    fn default() -> Self {
        Self::defaults()
    }
}

impl From<RawRates> for ExchangeRates {
    fn from(raw: RawRates) -> Self {
        Self::from_partial(&raw)
    }
}

impl From<ExchangeRates> for BTreeMap<CurrencyCode, f64> {
    fn from(rates: ExchangeRates) -> Self {
        rates.rates
    }
}

/// Body returned by the remote rates function.
#[derive(Debug, Clone, Deserialize)]
pub struct RatePayload {
    pub rates: RawRates,
    #[serde(default)]
    pub cached: bool,
    #[serde(default)]
    pub fallback: bool,
}

/// A rate set together with the moment it was fetched, as persisted under
/// the `exchange_rates_cache` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSnapshot {
    pub rates: ExchangeRates,
    #[serde(rename = "fetchedAt", with = "chrono::serde::ts_milliseconds")]
    pub fetched_at: DateTime<Utc>,
}

impl RateSnapshot {
    pub fn new(rates: ExchangeRates, fetched_at: DateTime<Utc>) -> Self {
        Self { rates, fetched_at }
    }

    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        let age_ms = (now - self.fetched_at).num_milliseconds();
        age_ms > RATES_TTL.as_millis() as i64
    }
}

#[async_trait]
pub trait RateSource: Send + Sync {
    async fn fetch_rates(&self) -> Result<RatePayload>;
}

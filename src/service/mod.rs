//! The currency service: current selection, current rates, and the cache
//! and refresh lifecycle around them.
//!
//! A service is built explicitly from a storage collection and a rate source,
//! initialised with [`CurrencyService::init`], and torn down with
//! [`CurrencyService::dispose`]. None of its operations fail: when anything
//! goes wrong the service keeps serving the rates it already has, and those
//! start out as [`DEFAULT_RATES`](crate::core::rates::DEFAULT_RATES).

mod refresher;

use crate::core::cache::{CURRENCY_KEY, KeyValueCollection, RATES_CACHE_KEY};
use crate::core::currency::{CurrencyCode, CurrencySelection, currency_for_language};
use crate::core::format::{format_amount, format_amount_short};
use crate::core::rates::{ExchangeRates, RateSnapshot, RateSource};
use chrono::{DateTime, Utc};
use refresher::Refresher;
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tracing::{debug, info, warn};

/// How often the background refresher re-fetches live rates.
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone)]
struct CurrencyState {
    selection: CurrencySelection,
    rates: ExchangeRates,
    fetched_at: Option<DateTime<Utc>>,
}

struct ServiceInner {
    storage: Arc<dyn KeyValueCollection>,
    source: Arc<dyn RateSource>,
    state: RwLock<CurrencyState>,
}

impl ServiceInner {
    fn read(&self) -> RwLockReadGuard<'_, CurrencyState> {
        self.state
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, CurrencyState> {
        self.state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn apply_snapshot(&self, snapshot: &RateSnapshot) {
        let mut state = self.write();
        state.rates = snapshot.rates.clone();
        state.fetched_at = Some(snapshot.fetched_at);
    }

    async fn fetch_live_rates(&self) {
        let payload = match self.source.fetch_rates().await {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Failed to fetch live exchange rates, keeping current rates: {e:#}");
                return;
            }
        };
        if payload.fallback {
            debug!("Rates function answered with its own fallback rates");
        }

        let snapshot = RateSnapshot::new(ExchangeRates::from_partial(&payload.rates), Utc::now());
        self.apply_snapshot(&snapshot);

        match serde_json::to_string(&snapshot) {
            Ok(json) => self.storage.put(RATES_CACHE_KEY, &json).await,
            Err(e) => warn!("Could not serialize exchange rates for caching: {e}"),
        }
        info!(cached = payload.cached, "Exchange rates updated");
    }
}

pub struct CurrencyService {
    inner: Arc<ServiceInner>,
    refresher: Mutex<Option<Refresher>>,
}

impl CurrencyService {
    pub fn new(storage: Arc<dyn KeyValueCollection>, source: Arc<dyn RateSource>) -> Self {
        let state = CurrencyState {
            selection: CurrencySelection::default(),
            rates: ExchangeRates::defaults(),
            fetched_at: None,
        };
        Self {
            inner: Arc::new(ServiceInner {
                storage,
                source,
                state: RwLock::new(state),
            }),
            refresher: Mutex::new(None),
        }
    }

    /// Restores the persisted selection and cached rates, then fetches live
    /// rates once.
    pub async fn init(&self) {
        self.load_persisted().await;
        self.fetch_live_rates().await;
    }

    /// Reads the stored currency and rate cache. A malformed or stale cache
    /// entry is ignored and the current (default) rates stay in effect.
    pub async fn load_persisted(&self) {
        let storage = &self.inner.storage;

        if let Some(stored) = storage.get(CURRENCY_KEY).await {
            match stored.parse::<CurrencyCode>() {
                Ok(code) => self.inner.write().selection = CurrencySelection::manual(code),
                Err(e) => {
                    warn!("Ignoring stored currency selection: {e}");
                    storage.remove(CURRENCY_KEY).await;
                }
            }
        }

        let Some(cached) = storage.get(RATES_CACHE_KEY).await else {
            return;
        };
        match serde_json::from_str::<RateSnapshot>(&cached) {
            Ok(snapshot) if snapshot.is_stale(Utc::now()) => {
                debug!(
                    fetched_at = %snapshot.fetched_at,
                    "Cached exchange rates expired, keeping defaults"
                );
            }
            Ok(snapshot) => {
                debug!(fetched_at = %snapshot.fetched_at, "Using cached exchange rates");
                self.inner.apply_snapshot(&snapshot);
            }
            Err(e) => debug!("Discarding malformed cached exchange rates: {e}"),
        }
    }

    /// Fetches live rates. Failures are logged and leave the current rates
    /// untouched.
    pub async fn fetch_live_rates(&self) {
        self.inner.fetch_live_rates().await;
    }

    /// Starts re-fetching rates every `every`, replacing any running
    /// refresher.
    pub fn spawn_refresher(&self, every: Duration) {
        let inner = Arc::clone(&self.inner);
        let refresher = Refresher::spawn(every, move || {
            let inner = Arc::clone(&inner);
            async move { inner.fetch_live_rates().await }
        });

        let previous = self
            .refresher
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .replace(refresher);
        if previous.is_some() {
            debug!("Replaced running rate refresher");
        }
    }

    /// Stops the background refresher and waits for it to finish.
    pub async fn dispose(&self) {
        let refresher = self
            .refresher
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(refresher) = refresher {
            refresher.stop().await;
            debug!("Currency service disposed");
        }
    }

    pub fn selection(&self) -> CurrencySelection {
        self.inner.read().selection
    }

    pub fn currency(&self) -> CurrencyCode {
        self.selection().code
    }

    pub fn rates(&self) -> ExchangeRates {
        self.inner.read().rates.clone()
    }

    /// Current rates together with their fetch time, read under one lock.
    pub fn snapshot(&self) -> (ExchangeRates, Option<DateTime<Utc>>) {
        let state = self.inner.read();
        (state.rates.clone(), state.fetched_at)
    }

    /// When the rates in use were fetched; `None` while on defaults.
    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.inner.read().fetched_at
    }

    /// Selects `code` on the user's behalf and remembers it.
    pub async fn set_currency(&self, code: CurrencyCode) {
        self.inner.write().selection = CurrencySelection::manual(code);
        self.inner.storage.put(CURRENCY_KEY, code.code()).await;
    }

    /// Follows the UI language unless the user picked a currency.
    pub fn apply_language(&self, lang: &str) -> CurrencyCode {
        self.apply_automatic(currency_for_language(lang))
    }

    /// Uses `code` as the automatic choice. A manual selection still wins.
    pub fn apply_automatic(&self, code: CurrencyCode) -> CurrencyCode {
        let mut state = self.inner.write();
        if !state.selection.manual {
            state.selection = CurrencySelection::automatic(code);
        }
        state.selection.code
    }

    /// Forgets the user's pick and goes back to the language mapping.
    pub async fn reset_to_automatic(&self, lang: &str) -> CurrencyCode {
        let code = currency_for_language(lang);
        self.inner.write().selection = CurrencySelection::automatic(code);
        self.inner.storage.remove(CURRENCY_KEY).await;
        code
    }

    pub fn convert(&self, amount_idr: f64) -> f64 {
        self.convert_to(amount_idr, self.currency())
    }

    pub fn convert_to(&self, amount_idr: f64, code: CurrencyCode) -> f64 {
        amount_idr * self.inner.read().rates.get(code)
    }

    pub fn format_price(&self, amount_idr: f64) -> String {
        let code = self.currency();
        format_amount(self.convert_to(amount_idr, code), code)
    }

    pub fn format_price_short(&self, amount_idr: f64) -> String {
        let code = self.currency();
        format_amount_short(self.convert_to(amount_idr, code), code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rates::{RatePayload, RawRates};
    use crate::store::memory::MemoryCollection;
    use anyhow::{Result, anyhow};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // Scripted RateSource: replays queued results, then keeps failing.
    #[derive(Default)]
    struct MockRateSource {
        responses: Mutex<VecDeque<Result<RatePayload>>>,
        calls: AtomicUsize,
    }

    impl MockRateSource {
        fn with(responses: Vec<Result<RatePayload>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RateSource for MockRateSource {
        async fn fetch_rates(&self) -> Result<RatePayload> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(anyhow!("network unreachable")))
        }
    }

    fn payload(pairs: &[(&str, f64)]) -> RatePayload {
        let rates: RawRates = pairs
            .iter()
            .map(|(code, rate)| (code.to_string(), Some(*rate)))
            .collect();
        RatePayload {
            rates,
            cached: false,
            fallback: false,
        }
    }

    fn service_with(
        responses: Vec<Result<RatePayload>>,
    ) -> (CurrencyService, Arc<MemoryCollection>, Arc<MockRateSource>) {
        let storage = Arc::new(MemoryCollection::new());
        let source = MockRateSource::with(responses);
        let service = CurrencyService::new(storage.clone(), source.clone());
        (service, storage, source)
    }

    async fn seed_cache(storage: &MemoryCollection, rates: &[(&str, f64)], age: chrono::Duration) {
        let snapshot = RateSnapshot::new(
            ExchangeRates::from_partial(&payload(rates).rates),
            Utc::now() - age,
        );
        storage
            .put(RATES_CACHE_KEY, &serde_json::to_string(&snapshot).unwrap())
            .await;
    }

    #[tokio::test]
    async fn test_defaults_before_any_fetch() {
        let (service, _, _) = service_with(vec![]);

        assert_eq!(service.currency(), CurrencyCode::Idr);
        assert!(!service.selection().manual);
        assert_eq!(service.rates(), ExchangeRates::defaults());
        assert!(service.fetched_at().is_none());
        for code in CurrencyCode::ALL {
            assert_eq!(service.convert_to(0.0, code), 0.0);
        }
        assert_eq!(service.convert(1_500_000.0), 1_500_000.0);
    }

    #[tokio::test]
    async fn test_live_fetch_updates_and_persists() {
        let live = payload(&[
            ("IDR", 1.0),
            ("USD", 0.00006),
            ("SGD", 0.00008),
            ("AUD", 0.00009),
        ]);
        let (service, storage, source) = service_with(vec![Ok(live)]);

        service.fetch_live_rates().await;

        assert_eq!(source.calls(), 1);
        assert!((service.convert_to(1_000_000.0, CurrencyCode::Usd) - 60.0).abs() < 1e-9);
        assert!(service.fetched_at().is_some());

        let cached = storage.get(RATES_CACHE_KEY).await.unwrap();
        let snapshot: RateSnapshot = serde_json::from_str(&cached).unwrap();
        assert_eq!(snapshot.rates, service.rates());
        // Persisted with millisecond precision
        let drift = snapshot.fetched_at - service.fetched_at().unwrap();
        assert_eq!(drift.num_milliseconds(), 0);
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_previous_rates() {
        let (service, storage, _) = service_with(vec![
            Ok(payload(&[("USD", 0.00007)])),
            Err(anyhow!("timeout")),
        ]);

        service.fetch_live_rates().await;
        let before = service.rates();
        let cached_before = storage.get(RATES_CACHE_KEY).await;

        service.fetch_live_rates().await;
        assert_eq!(service.rates(), before);
        assert_eq!(service.rates().get(CurrencyCode::Usd), 0.00007);
        assert_eq!(storage.get(RATES_CACHE_KEY).await, cached_before);
    }

    #[tokio::test]
    async fn test_partial_live_payload_falls_back_per_currency() {
        let (service, _, _) = service_with(vec![Ok(payload(&[("IDR", 1.0), ("USD", 0.000065)]))]);
        let defaults = ExchangeRates::defaults();

        service.fetch_live_rates().await;
        let rates = service.rates();

        assert_eq!(rates.get(CurrencyCode::Usd), 0.000065);
        for code in [CurrencyCode::Sgd, CurrencyCode::Aud] {
            assert_eq!(rates.get(code), defaults.get(code));
        }
    }

    #[tokio::test]
    async fn test_idr_stays_one_whatever_the_source_says() {
        let (service, _, _) = service_with(vec![Ok(payload(&[("IDR", 15_000.0), ("USD", 1.0)]))]);

        assert_eq!(service.rates().get(CurrencyCode::Idr), 1.0);
        service.fetch_live_rates().await;
        assert_eq!(service.rates().get(CurrencyCode::Idr), 1.0);
        service.fetch_live_rates().await;
        assert_eq!(service.rates().get(CurrencyCode::Idr), 1.0);
    }

    #[tokio::test]
    async fn test_stale_cache_is_ignored_until_live_fetch() {
        let (service, storage, _) = service_with(vec![Ok(payload(&[("USD", 0.000066)]))]);
        seed_cache(&storage, &[("USD", 0.00005)], chrono::Duration::hours(2)).await;

        service.load_persisted().await;
        assert_eq!(service.rates(), ExchangeRates::defaults());
        assert!(service.fetched_at().is_none());

        service.fetch_live_rates().await;
        assert_eq!(service.rates().get(CurrencyCode::Usd), 0.000066);
    }

    #[tokio::test]
    async fn test_fresh_cache_is_used() {
        let (service, storage, _) = service_with(vec![]);
        seed_cache(&storage, &[("USD", 0.00005)], chrono::Duration::minutes(10)).await;

        service.init().await;

        // Live fetch failed, cached rates remain
        assert_eq!(service.rates().get(CurrencyCode::Usd), 0.00005);
        assert!(service.fetched_at().is_some());
    }

    #[tokio::test]
    async fn test_malformed_cache_is_discarded() {
        let (service, storage, _) = service_with(vec![]);
        storage.put(RATES_CACHE_KEY, "{not json").await;

        service.init().await;
        assert_eq!(service.rates(), ExchangeRates::defaults());
    }

    #[tokio::test]
    async fn test_manual_selection_persists_and_beats_language() {
        let (service, storage, _) = service_with(vec![]);

        assert_eq!(service.apply_language("en"), CurrencyCode::Usd);
        assert!(storage.get(CURRENCY_KEY).await.is_none());

        service.set_currency(CurrencyCode::Aud).await;
        assert_eq!(storage.get(CURRENCY_KEY).await.as_deref(), Some("AUD"));
        assert_eq!(service.apply_language("id"), CurrencyCode::Aud);
        assert!(service.selection().manual);

        // A fresh service restores the manual pick from storage
        let restored = CurrencyService::new(storage.clone(), MockRateSource::with(vec![]));
        restored.load_persisted().await;
        assert_eq!(
            restored.selection(),
            CurrencySelection::manual(CurrencyCode::Aud)
        );
    }

    #[tokio::test]
    async fn test_reset_to_automatic() {
        let (service, storage, _) = service_with(vec![]);
        service.set_currency(CurrencyCode::Sgd).await;

        assert_eq!(service.reset_to_automatic("en-AU").await, CurrencyCode::Aud);
        assert!(!service.selection().manual);
        assert!(storage.get(CURRENCY_KEY).await.is_none());
        assert_eq!(service.apply_language("id"), CurrencyCode::Idr);
    }

    #[tokio::test]
    async fn test_invalid_stored_currency_is_dropped() {
        let (service, storage, _) = service_with(vec![]);
        storage.put(CURRENCY_KEY, "EUR").await;

        service.load_persisted().await;
        assert_eq!(service.selection(), CurrencySelection::default());
        assert!(storage.get(CURRENCY_KEY).await.is_none());
    }

    #[tokio::test]
    async fn test_formatting_uses_current_currency() {
        let (service, _, _) = service_with(vec![Ok(payload(&[("USD", 0.000065)]))]);
        service.fetch_live_rates().await;

        assert_eq!(service.format_price(1_500_000_000.0), "Rp 1.500.000.000");
        assert_eq!(service.format_price_short(1_500_000_000.0), "Rp 1,5 M");

        service.set_currency(CurrencyCode::Usd).await;
        assert_eq!(service.format_price(1_500_000_000.0), "$97,500.00");
        assert_eq!(service.format_price_short(1_500_000_000.0), "$97.5K");
    }

    #[tokio::test]
    async fn test_concurrent_fetches_are_not_deduplicated() {
        let (service, _, source) = service_with(vec![
            Ok(payload(&[("USD", 0.00006)])),
            Ok(payload(&[("USD", 0.00006)])),
        ]);

        tokio::join!(service.fetch_live_rates(), service.fetch_live_rates());
        assert_eq!(source.calls(), 2);
        assert_eq!(service.rates().get(CurrencyCode::Usd), 0.00006);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresher_fetches_hourly_until_disposed() {
        let (service, _, source) = service_with(vec![
            Ok(payload(&[("USD", 0.000061)])),
            Ok(payload(&[("USD", 0.000062)])),
        ]);

        service.spawn_refresher(REFRESH_INTERVAL);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(source.calls(), 0);

        tokio::time::sleep(REFRESH_INTERVAL * 2).await;
        assert_eq!(source.calls(), 2);
        assert_eq!(service.rates().get(CurrencyCode::Usd), 0.000062);

        service.dispose().await;
        tokio::time::sleep(REFRESH_INTERVAL * 3).await;
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_service_stops_refresher() {
        let (service, _, source) = service_with(vec![Ok(payload(&[("USD", 0.000061)]))]);

        service.spawn_refresher(REFRESH_INTERVAL);
        tokio::time::sleep(REFRESH_INTERVAL + Duration::from_secs(60)).await;
        assert_eq!(source.calls(), 1);

        drop(service);
        tokio::time::sleep(REFRESH_INTERVAL * 3).await;
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_respawning_refresher_replaces_previous() {
        let (service, _, source) = service_with(vec![]);

        service.spawn_refresher(REFRESH_INTERVAL);
        service.spawn_refresher(REFRESH_INTERVAL);

        tokio::time::sleep(REFRESH_INTERVAL + Duration::from_secs(60)).await;
        assert_eq!(source.calls(), 1);

        tokio::time::sleep(REFRESH_INTERVAL).await;
        assert_eq!(source.calls(), 2);

        service.dispose().await;
    }
}

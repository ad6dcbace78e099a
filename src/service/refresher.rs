use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Background task running `task` once per period until cancelled.
///
/// The first run happens one full period after spawning. Dropping the
/// refresher cancels it without waiting; [`Refresher::stop`] also waits for
/// an in-flight run to finish.
pub(crate) struct Refresher {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl Refresher {
    pub(crate) fn spawn<F, Fut>(every: Duration, task: F) -> Self
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        let cancelled = token.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + every, every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => {
                        debug!("Refresher cancelled");
                        break;
                    }
                    _ = ticker.tick() => {
                        debug!("Refresher tick");
                        task().await;
                    }
                }
            }
        });

        Self { token, handle }
    }

    pub(crate) async fn stop(mut self) {
        self.token.cancel();
        if let Err(e) = (&mut self.handle).await {
            warn!("Refresher task ended abnormally: {e}");
        }
    }
}

impl Drop for Refresher {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_refresher(every: Duration) -> (Refresher, Arc<AtomicUsize>) {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let refresher = Refresher::spawn(every, move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });
        (refresher, runs)
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_once_per_period() {
        let (refresher, runs) = counting_refresher(Duration::from_secs(60));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(155)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 3);

        refresher.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_and_drop_cancel() {
        let (refresher, runs) = counting_refresher(Duration::from_secs(60));
        tokio::time::sleep(Duration::from_secs(61)).await;
        refresher.stop().await;

        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        let (refresher, runs) = counting_refresher(Duration::from_secs(60));
        drop(refresher);
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }
}

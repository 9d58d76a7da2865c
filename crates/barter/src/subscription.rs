//! # Event Subscriptions
//!
//! Turns the Active Loop Cache's best-effort, in-process
//! [`barter_cache::CacheChangeEvent`] fan-out into the externally-visible
//! contract of §6: at-least-once delivery to a registered callback, retried
//! with exponential backoff, with a failing endpoint parked after too many
//! consecutive failures. Grounded in the teacher's `oroboros_blockchain::ipc`
//! listener thread shape (a dedicated thread per interested party draining a
//! bounded channel) and `oroboros_economy::integration::TheBank`'s event-draining
//! facade idiom.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::ExponentialBackoffBuilder;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use tracing::{info, warn};

use barter_cache::CacheChangeEvent;

/// How often the subscriber thread wakes to check for a stop request even
/// while idle. A subscription's sender stays alive for as long as the
/// tenant's cache does (it was handed to `ActiveLoopCache::add_listener`),
/// so the channel itself never disconnects on `stop()` — this poll is what
/// lets the thread exit promptly anyway. Mirrors `barter_concurrency::worker`'s
/// own `RECV_POLL_INTERVAL`.
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Configuration for one subscription's retry and parking behavior.
#[derive(Clone, Debug)]
pub struct SubscriptionConfig {
    /// Bound on events queued for this subscriber before new ones are
    /// dropped rather than blocking the cache mutation that produced them.
    pub channel_capacity: usize,
    /// Consecutive delivery failures (across retries of the same event)
    /// before the endpoint is parked and stops receiving further events.
    pub max_consecutive_failures: u32,
    /// Backoff before the first retry of a failed delivery.
    pub initial_backoff: Duration,
    /// Ceiling the exponential backoff is clamped to.
    pub max_backoff: Duration,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1_024,
            max_consecutive_failures: 8,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(30),
        }
    }
}

/// One delivery attempt handed to a subscriber's callback.
#[derive(Clone, Debug)]
pub struct Delivery {
    /// The cache change being delivered.
    pub event: CacheChangeEvent,
    /// 1 on the first attempt, incremented on every retry of this same event.
    pub attempt: u32,
}

/// The callback's verdict: `Ok(())` on success, `Err(reason)` to retry.
pub type DeliveryResult = Result<(), String>;

/// A live subscription: a background thread draining events for one
/// registered callback.
pub struct Subscription {
    sender: Sender<CacheChangeEvent>,
    parked: Arc<AtomicBool>,
    stop: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Starts the subscriber thread. `callback` runs on that thread, never on
    /// the caller's or the tenant worker's.
    pub fn start(
        label: String,
        config: SubscriptionConfig,
        callback: impl Fn(Delivery) -> DeliveryResult + Send + 'static,
    ) -> Self {
        let (sender, receiver) = bounded(config.channel_capacity.max(1));
        let parked = Arc::new(AtomicBool::new(false));
        let stop = Arc::new(AtomicBool::new(false));

        let join = std::thread::Builder::new()
            .name(format!("barter-subscriber-{label}"))
            .spawn({
                let parked = Arc::clone(&parked);
                let stop = Arc::clone(&stop);
                move || run_subscriber(label, receiver, config, callback, parked, stop)
            })
            .expect("spawning subscriber thread");

        Self {
            sender,
            parked,
            stop,
            join: Some(join),
        }
    }

    /// The channel this subscription's cache listener publishes into. Wired
    /// into [`barter_cache::ActiveLoopCache::add_listener`] at registration.
    pub(crate) fn sender(&self) -> Sender<CacheChangeEvent> {
        self.sender.clone()
    }

    /// Whether this endpoint has been parked after exhausting its retry
    /// budget on some event and is no longer receiving deliveries.
    #[must_use]
    pub fn is_parked(&self) -> bool {
        self.parked.load(Ordering::Acquire)
    }

    /// Signals the subscriber thread to stop and waits for it to exit.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

/// Count of delivery attempts made across every subscription's lifetime
/// (diagnostics only; not part of the delivery guarantee itself).
pub(crate) static TOTAL_ATTEMPTS: AtomicU32 = AtomicU32::new(0);

fn run_subscriber(
    label: String,
    receiver: Receiver<CacheChangeEvent>,
    config: SubscriptionConfig,
    callback: impl Fn(Delivery) -> DeliveryResult,
    parked: Arc<AtomicBool>,
    stop: Arc<AtomicBool>,
) {
    info!(subscriber = %label, "subscriber thread started");

    loop {
        if stop.load(Ordering::Acquire) {
            break;
        }

        let event = match receiver.recv_timeout(STOP_POLL_INTERVAL) {
            Ok(event) => event,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };

        if parked.load(Ordering::Acquire) {
            continue;
        }

        let mut backoff = ExponentialBackoffBuilder::new()
            .with_initial_interval(config.initial_backoff)
            .with_max_interval(config.max_backoff)
            .with_max_elapsed_time(None)
            .build();

        let mut attempt: u32 = 1;
        loop {
            TOTAL_ATTEMPTS.fetch_add(1, Ordering::Relaxed);
            match callback(Delivery {
                event: event.clone(),
                attempt,
            }) {
                Ok(()) => break,
                Err(reason) => {
                    warn!(subscriber = %label, attempt, %reason, "delivery failed");
                    if attempt >= config.max_consecutive_failures {
                        warn!(subscriber = %label, "endpoint parked after too many consecutive failures");
                        parked.store(true, Ordering::Release);
                        break;
                    }
                    let delay = backoff.next_backoff().unwrap_or(config.max_backoff);
                    std::thread::sleep(delay);
                    attempt += 1;
                }
            }
        }
    }

    info!(subscriber = %label, "subscriber thread stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration as StdDuration;

    use barter_shared::TenantId;

    fn sample_event() -> CacheChangeEvent {
        CacheChangeEvent::Lost {
            tenant: TenantId::new("t"),
            canonical_id: "cid:1".to_string(),
        }
    }

    #[test]
    fn delivers_successfully_on_first_attempt() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);
        let mut sub = Subscription::start(
            "test".to_string(),
            SubscriptionConfig::default(),
            move |_delivery| {
                calls_clone.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
        );

        sub.sender().send(sample_event()).unwrap();
        for _ in 0..200 {
            if calls.load(Ordering::SeqCst) == 1 {
                break;
            }
            std::thread::sleep(StdDuration::from_millis(10));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!sub.is_parked());
        sub.stop();
    }

    #[test]
    fn parks_after_exhausting_retry_budget() {
        let mut config = SubscriptionConfig::default();
        config.max_consecutive_failures = 2;
        config.initial_backoff = StdDuration::from_millis(1);
        config.max_backoff = StdDuration::from_millis(2);

        let mut sub = Subscription::start("test".to_string(), config, |_delivery| Err("boom".to_string()));

        sub.sender().send(sample_event()).unwrap();
        for _ in 0..200 {
            if sub.is_parked() {
                break;
            }
            std::thread::sleep(StdDuration::from_millis(10));
        }
        assert!(sub.is_parked());
        sub.stop();
    }

    #[test]
    fn parked_endpoint_ignores_further_events() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);
        let mut config = SubscriptionConfig::default();
        config.max_consecutive_failures = 1;
        config.initial_backoff = StdDuration::from_millis(1);

        let mut sub = Subscription::start("test".to_string(), config, move |_delivery| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            Err("boom".to_string())
        });

        sub.sender().send(sample_event()).unwrap();
        for _ in 0..200 {
            if sub.is_parked() {
                break;
            }
            std::thread::sleep(StdDuration::from_millis(10));
        }
        assert!(sub.is_parked());
        let after_park = calls.load(Ordering::SeqCst);

        sub.sender().send(sample_event()).unwrap();
        std::thread::sleep(StdDuration::from_millis(50));
        assert_eq!(calls.load(Ordering::SeqCst), after_park);
        sub.stop();
    }
}

//! Periodic feed polling.
//!
//! One scheduler owns the only write path into the [`RateRepository`].
//! At most one poll is in flight at a time; a tick or manual refresh that
//! arrives while another poll is running is dropped, not queued.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use futures::FutureExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{Level, debug, info, warn};

use crate::error::FeedError;
use crate::market_data::adapters::FeedTransport;
use crate::market_data::feed_parser::parse_with_report;
use crate::metrics::prometheus as feed_metrics;
use crate::state::lock;
use crate::state::rate_repository::RateRepository;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    /// Upper bound on one transport call; expiry counts as a failed poll.
    pub timeout: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug)]
pub enum PollOutcome {
    Updated {
        generation: u64,
        spot: usize,
        products: usize,
    },
    /// Another poll was already in flight.
    Skipped,
    Failed(FeedError),
    /// The scheduler was stopped; nothing was written.
    Stopped,
}

impl PollOutcome {
    fn label(&self) -> &'static str {
        match self {
            Self::Updated { .. } => "updated",
            Self::Skipped => "skipped",
            Self::Failed(_) => "failed",
            Self::Stopped => "stopped",
        }
    }
}

/// Clears the in-flight flag however the poll ends, cancellation included.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct PollScheduler {
    transport: Arc<dyn FeedTransport>,
    repository: RateRepository,
    settings: PollSettings,
    auto_update: watch::Receiver<bool>,
    in_flight: AtomicBool,
    /// Write gate: held while swapping a snapshot in, set to true by `stop`.
    stopped: Mutex<bool>,
}

impl PollScheduler {
    pub fn new(
        transport: Arc<dyn FeedTransport>,
        repository: RateRepository,
        settings: PollSettings,
        auto_update: watch::Receiver<bool>,
    ) -> Self {
        Self {
            transport,
            repository,
            settings,
            auto_update,
            in_flight: AtomicBool::new(false),
            stopped: Mutex::new(false),
        }
    }

    /// Whether scheduled ticks are currently allowed to poll.
    pub fn auto_update_enabled(&self) -> bool {
        *self.auto_update.borrow()
    }

    pub fn is_stopped(&self) -> bool {
        *lock(&self.stopped)
    }

    /// Runs one poll now. Not gated by the auto-update flag.
    pub async fn poll_now(&self) -> PollOutcome {
        let outcome = self.poll_once().await;
        feed_metrics::record_poll(outcome.label());
        outcome
    }

    async fn poll_once(&self) -> PollOutcome {
        if self.is_stopped() {
            return PollOutcome::Stopped;
        }
        let Some(_in_flight) = InFlight::acquire(&self.in_flight) else {
            debug!("poll already in flight, dropping this one");
            return PollOutcome::Skipped;
        };

        let started = Instant::now();
        let fetch = AssertUnwindSafe(self.transport.fetch_raw_feed()).catch_unwind();
        let fetched = match tokio::time::timeout(self.settings.timeout, fetch).await {
            Err(_) => Err(FeedError::Timeout(self.settings.timeout)),
            Ok(Err(_)) => Err(FeedError::Panicked),
            Ok(Ok(result)) => result,
        };
        feed_metrics::record_poll_latency_ms(started.elapsed().as_secs_f64() * 1_000.0);

        let raw = match fetched {
            Ok(raw) => raw,
            Err(err) => {
                warn!(
                    transport = self.transport.name(),
                    kind = err.kind(),
                    error = %err,
                    "feed poll failed, keeping last snapshot"
                );
                feed_metrics::record_poll_failure(err.kind());
                return PollOutcome::Failed(err);
            }
        };

        let report = parse_with_report(&raw);
        if report.rejected_rows > 0 {
            feed_metrics::record_rows_rejected(report.rejected_rows);
        }
        let spot = report.snapshot.spot.len();
        let products = report.snapshot.rtgs.len();
        if tracing::enabled!(Level::DEBUG) {
            if let Ok(json) = serde_json::to_string(&report.snapshot) {
                debug!(snapshot = %json, "parsed feed snapshot");
            }
        }

        let generation = {
            let stopped = lock(&self.stopped);
            if *stopped {
                return PollOutcome::Stopped;
            }
            self.repository.set(report.snapshot)
        };
        feed_metrics::record_generation(generation);

        info!(
            generation,
            spot,
            products,
            rejected_rows = report.rejected_rows,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "rate snapshot replaced"
        );
        PollOutcome::Updated {
            generation,
            spot,
            products,
        }
    }

    /// Blocks further repository writes. Once this returns no poll,
    /// in flight or future, will store a snapshot.
    pub fn stop(&self) {
        *lock(&self.stopped) = true;
    }

    /// Starts the interval loop on the runtime.
    pub fn spawn(self: Arc<Self>) -> PollerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(Arc::clone(&self).run(shutdown_rx));
        PollerHandle {
            scheduler: self,
            shutdown: shutdown_tx,
            task,
        }
    }

    async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut auto_update = self.auto_update.clone();
        let mut flag_open = true;
        let mut ticker = tokio::time::interval(self.settings.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            transport = self.transport.name(),
            interval_ms = self.settings.interval.as_millis() as u64,
            timeout_ms = self.settings.timeout.as_millis() as u64,
            "poll scheduler started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            if !*auto_update.borrow_and_update() {
                // Disabled: no ticks at all until the flag flips back.
                tokio::select! {
                    open = flag_changed(&mut auto_update, flag_open) => {
                        flag_open = open;
                        ticker.reset();
                    }
                    _ = shutdown.changed() => break,
                }
                continue;
            }

            tokio::select! {
                _ = ticker.tick() => {
                    tokio::select! {
                        _ = self.poll_now() => {}
                        _ = shutdown.changed() => break,
                    }
                }
                open = flag_changed(&mut auto_update, flag_open) => flag_open = open,
                _ = shutdown.changed() => break,
            }
        }

        info!("poll scheduler stopped");
    }
}

/// Resolves when the flag changes; returns false once the sender is gone,
/// after which it never resolves again.
async fn flag_changed(flag: &mut watch::Receiver<bool>, open: bool) -> bool {
    if open && flag.changed().await.is_ok() {
        return true;
    }
    if open {
        debug!("auto-update flag sender dropped, flag is now fixed");
        return false;
    }
    std::future::pending().await
}

/// Running scheduler loop. Dropping the handle ends the loop; [`stop`]
/// additionally blocks any further repository write.
///
/// [`stop`]: PollerHandle::stop
pub struct PollerHandle {
    scheduler: Arc<PollScheduler>,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub async fn stop(self) {
        self.scheduler.stop();
        let _ = self.shutdown.send(true);
        if let Err(err) = self.task.await {
            warn!(error = %err, "poll scheduler task panicked");
        }
    }
}

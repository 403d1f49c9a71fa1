//! Debounced re-scanning on page mutation.
//!
//! ```text
//! Idle --structural mutation--> ScanScheduled --debounce expires, pass ends--> Idle
//!                                   |    ^
//!                                   +----+ further mutations restart the timer
//! ```
//!
//! Mutations read while a pass is running are the pass's own clicks and
//! are discarded.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::error::PageError;
use crate::page::{MutationRecord, Page};
use crate::task::DelayedTask;

/// What happened when a scan was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// A pass ran to the end.
    Completed,
    /// Another pass was running; the trigger was dropped.
    Skipped,
    /// Scanning is switched off.
    Disabled,
    /// The pass could not read the page.
    Failed,
}

/// Something that can run an extraction pass unless one is already running.
#[async_trait]
pub trait ScanTarget: Send + Sync {
    async fn scan_if_idle(&self) -> PassOutcome;

    /// Whether a pass is running right now.
    fn is_busy(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Idle,
    ScanScheduled,
}

struct Slot {
    state: MonitorState,
    generation: u64,
    pending: Option<DelayedTask>,
}

struct Inner {
    target: Arc<dyn ScanTarget>,
    debounce: Duration,
    slot: Mutex<Slot>,
}

impl Inner {
    async fn fire(&self, generation: u64) {
        {
            let mut slot = self.slot.lock();
            if slot.generation != generation {
                return;
            }
            slot.pending = None;
        }

        match self.target.scan_if_idle().await {
            PassOutcome::Completed => trace!("Debounced scan completed"),
            PassOutcome::Skipped => debug!("Debounced scan dropped, pass already running"),
            PassOutcome::Disabled => trace!("Debounced scan skipped, disabled"),
            PassOutcome::Failed => warn!("Debounced scan failed"),
        }

        // A newer signal owns the state now.
        let mut slot = self.slot.lock();
        if slot.generation == generation {
            slot.state = MonitorState::Idle;
        }
    }
}

/// Turns mutation signals into debounced scans.
#[derive(Clone)]
pub struct ChangeMonitor {
    inner: Arc<Inner>,
}

impl ChangeMonitor {
    pub fn new(target: Arc<dyn ScanTarget>, debounce: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                target,
                debounce,
                slot: Mutex::new(Slot {
                    state: MonitorState::Idle,
                    generation: 0,
                    pending: None,
                }),
            }),
        }
    }

    pub fn state(&self) -> MonitorState {
        self.inner.slot.lock().state
    }

    /// Feed a batch of mutation records. Returns whether a scan is now
    /// scheduled because of it.
    pub fn signal(&self, records: &[MutationRecord]) -> bool {
        if !records.iter().any(MutationRecord::is_structural) {
            trace!("Ignoring {} non-structural mutation records", records.len());
            return false;
        }

        let mut slot = self.inner.slot.lock();
        if let Some(previous) = slot.pending.take() {
            previous.cancel();
        }
        slot.generation += 1;
        slot.state = MonitorState::ScanScheduled;

        let generation = slot.generation;
        let inner = Arc::clone(&self.inner);
        slot.pending = Some(DelayedTask::spawn(self.inner.debounce, async move {
            inner.fire(generation).await;
        }));
        true
    }

    /// Drop any scheduled scan.
    pub fn cancel(&self) {
        let mut slot = self.inner.slot.lock();
        if let Some(pending) = slot.pending.take() {
            pending.cancel();
        }
        slot.generation += 1;
        slot.state = MonitorState::Idle;
    }

    /// Schedule one scan after each of `delays`, measured from now.
    ///
    /// Each fires independently of the debounce; a scan already running
    /// makes it a no-op.
    pub fn schedule_initial(&self, delays: &[Duration]) -> Vec<DelayedTask> {
        delays
            .iter()
            .map(|delay| {
                let target = Arc::clone(&self.inner.target);
                let delay = *delay;
                DelayedTask::spawn(delay, async move {
                    let outcome = target.scan_if_idle().await;
                    debug!("Initial scan after {:?}: {:?}", delay, outcome);
                })
            })
            .collect()
    }

    /// Poll the page for mutations until `shutdown` fires.
    ///
    /// Returns an error only when the page goes away.
    pub async fn run(
        &self,
        page: Arc<dyn Page>,
        poll_interval: Duration,
        shutdown: CancellationToken,
    ) -> Result<(), PageError> {
        let mut ticker = tokio::time::interval(poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        info!("Watching page for changes (debounce {:?})", self.inner.debounce);

        let result = loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Change monitor shutting down");
                    break Ok(());
                }
                _ = ticker.tick() => {
                    let busy_before = self.inner.target.is_busy();
                    match page.drain_mutations().await {
                        Ok(records) if records.is_empty() => {}
                        Ok(records) if busy_before || self.inner.target.is_busy() => {
                            trace!("Discarding {} mutation records made during a pass", records.len());
                        }
                        Ok(records) => {
                            if self.signal(&records) {
                                debug!("Structural change, scan scheduled");
                            }
                        }
                        Err(PageError::Detached(reason)) => {
                            break Err(PageError::Detached(reason));
                        }
                        Err(e) => warn!("Could not read mutations: {}", e),
                    }
                }
            }
        };

        self.cancel();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingTarget {
        scans: AtomicUsize,
        pass_time: Duration,
        busy: std::sync::atomic::AtomicBool,
    }

    #[async_trait]
    impl ScanTarget for CountingTarget {
        async fn scan_if_idle(&self) -> PassOutcome {
            self.scans.fetch_add(1, Ordering::SeqCst);
            self.busy.store(true, Ordering::SeqCst);
            tokio::time::sleep(self.pass_time).await;
            self.busy.store(false, Ordering::SeqCst);
            PassOutcome::Completed
        }

        fn is_busy(&self) -> bool {
            self.busy.load(Ordering::SeqCst)
        }
    }

    fn structural() -> Vec<MutationRecord> {
        vec![MutationRecord {
            target_in_overlay: false,
            added_elements: 1,
            added_outside_overlay: 1,
        }]
    }

    fn overlay_only() -> Vec<MutationRecord> {
        vec![MutationRecord {
            target_in_overlay: true,
            added_elements: 4,
            added_outside_overlay: 0,
        }]
    }

    fn monitor() -> (Arc<CountingTarget>, ChangeMonitor) {
        let target = Arc::new(CountingTarget::default());
        let monitor = ChangeMonitor::new(target.clone(), Duration::from_millis(500));
        (target, monitor)
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_collapses_bursts() {
        let (target, monitor) = monitor();

        for _ in 0..5 {
            assert!(monitor.signal(&structural()));
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
        assert_eq!(monitor.state(), MonitorState::ScanScheduled);
        assert_eq!(target.scans.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(target.scans.load(Ordering::SeqCst), 1);
        assert_eq!(monitor.state(), MonitorState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_state_idle_only_after_scan_finishes() {
        let target = Arc::new(CountingTarget {
            pass_time: Duration::from_secs(2),
            ..CountingTarget::default()
        });
        let monitor = ChangeMonitor::new(target.clone(), Duration::from_millis(500));

        monitor.signal(&structural());
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(target.scans.load(Ordering::SeqCst), 1);
        assert_eq!(monitor.state(), MonitorState::ScanScheduled);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(monitor.state(), MonitorState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mutations_during_pass_discarded() {
        use crate::testing::ScriptedPage;

        let target = Arc::new(CountingTarget {
            pass_time: Duration::from_secs(2),
            ..CountingTarget::default()
        });
        let monitor = ChangeMonitor::new(target.clone(), Duration::from_millis(500));
        let page = Arc::new(ScriptedPage::new());
        let shutdown = CancellationToken::new();

        let runner = {
            let monitor = monitor.clone();
            let page: Arc<dyn Page> = page.clone();
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                monitor
                    .run(page, Duration::from_millis(250), shutdown)
                    .await
            })
        };

        page.push_mutation(structural()[0].clone());
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert!(target.is_busy());

        // Made by the running pass.
        page.push_mutation(structural()[0].clone());
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(target.scans.load(Ordering::SeqCst), 1);
        assert_eq!(monitor.state(), MonitorState::Idle);

        shutdown.cancel();
        assert!(runner.await.unwrap().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlay_mutations_ignored() {
        let (target, monitor) = monitor();

        assert!(!monitor.signal(&overlay_only()));
        assert_eq!(monitor.state(), MonitorState::Idle);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(target.scans.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drops_scheduled_scan() {
        let (target, monitor) = monitor();
        monitor.signal(&structural());
        monitor.cancel();

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(target.scans.load(Ordering::SeqCst), 0);
        assert_eq!(monitor.state(), MonitorState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_scans_staggered() {
        let (target, monitor) = monitor();
        let _tasks = monitor.schedule_initial(&[
            Duration::from_millis(1000),
            Duration::from_millis(3000),
            Duration::from_millis(5000),
        ]);

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(target.scans.load(Ordering::SeqCst), 1);
        tokio::time::sleep(Duration::from_millis(4000)).await;
        assert_eq!(target.scans.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_polls_page_mutations() {
        use crate::testing::ScriptedPage;

        let (target, monitor) = monitor();
        let page = Arc::new(ScriptedPage::new());
        let shutdown = CancellationToken::new();

        let runner = {
            let monitor = monitor.clone();
            let page: Arc<dyn Page> = page.clone();
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                monitor
                    .run(page, Duration::from_millis(250), shutdown)
                    .await
            })
        };

        page.push_mutation(overlay_only()[0].clone());
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(target.scans.load(Ordering::SeqCst), 0);

        page.push_mutation(structural()[0].clone());
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(target.scans.load(Ordering::SeqCst), 1);

        shutdown.cancel();
        assert!(runner.await.unwrap().is_ok());
    }
}

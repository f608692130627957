//! Polling View
//!
//! Mounts a [`SnapshotSource`], fetches it once, then re-fetches on a fixed
//! interval until unmounted. Every fetch runs as its own task; whichever
//! response resolves last becomes the visible snapshot. Changing the
//! interval or the target restarts the timer, and dropping the view stops
//! it. Responses that resolve after a retarget or unmount are discarded.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, MissedTickBehavior};

use super::snapshot::{RankedEntry, RankedItem, RowCue, Snapshot};
use super::state::{FailurePolicy, ViewState, ViewStatus};
use crate::client::{ApiError, ApiResult};

/// Shortest refresh interval a view accepts
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// A remote list a view can poll
#[async_trait]
pub trait SnapshotSource: Send + Sync + 'static {
    type Item: RankedItem;
    /// Header data that travels with the list (tournament name, stats, ...)
    type Meta: Clone + Send + Sync + 'static;

    /// Identity of the resource being polled; a new target restarts the view
    fn target(&self) -> String;

    async fn fetch(&self) -> ApiResult<(Self::Meta, Vec<Self::Item>)>;
}

/// Mount-time settings for a view
#[derive(Debug, Clone)]
pub struct ViewConfig {
    pub interval: Duration,
    /// How long a changed row pulses
    pub highlight: Duration,
    pub auto_refresh: bool,
    pub failure_policy: FailurePolicy,
    /// Context a retry/back affordance points to
    pub parent: Option<String>,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            highlight: Duration::from_secs(2),
            auto_refresh: true,
            failure_policy: FailurePolicy::KeepStale,
            parent: None,
        }
    }
}

impl ViewConfig {
    pub fn every(interval: Duration) -> Self {
        Self {
            interval,
            ..Self::default()
        }
    }

    pub fn highlight(mut self, highlight: Duration) -> Self {
        self.highlight = highlight;
        self
    }

    pub fn policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn manual_only(mut self) -> Self {
        self.auto_refresh = false;
        self
    }

    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }
}

type SourceState<S> = ViewState<<S as SnapshotSource>::Item, <S as SnapshotSource>::Meta>;

#[derive(Debug, Clone, Copy)]
enum Trigger {
    Auto,
    Manual,
    Initial,
}

struct Inner<S: SnapshotSource> {
    source: RwLock<Arc<S>>,
    state: RwLock<SourceState<S>>,
    interval: Mutex<Duration>,
    highlight: Duration,
    parent: Option<String>,
    /// Bumped on retarget and unmount; responses from older generations are dropped
    generation: AtomicU64,
    manual_in_flight: AtomicUsize,
    fetches: AtomicU64,
    timer: Mutex<Option<JoinHandle<()>>>,
    updates: watch::Sender<u64>,
}

/// A mounted polling view. Dropping it unmounts.
pub struct PollingView<S: SnapshotSource> {
    inner: Arc<Inner<S>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<S: SnapshotSource> PollingView<S> {
    /// Mount a view and start its initial fetch.
    ///
    /// Must be called from within a tokio runtime.
    pub fn mount(source: S, config: ViewConfig) -> Self {
        Self::mount_shared(Arc::new(source), config)
    }

    /// Mount a view over a source that is also used elsewhere
    pub fn mount_shared(source: Arc<S>, config: ViewConfig) -> Self {
        let interval = config.interval.max(MIN_INTERVAL);
        let (updates, _) = watch::channel(0);

        tracing::debug!(
            resource = %source.target(),
            interval_ms = interval.as_millis() as u64,
            auto_refresh = config.auto_refresh,
            "Mounting polling view"
        );

        let view = Self {
            inner: Arc::new(Inner {
                source: RwLock::new(source),
                state: RwLock::new(ViewState::new(config.auto_refresh, config.failure_policy)),
                interval: Mutex::new(interval),
                highlight: config.highlight,
                parent: config.parent,
                generation: AtomicU64::new(0),
                manual_in_flight: AtomicUsize::new(0),
                fetches: AtomicU64::new(0),
                timer: Mutex::new(None),
                updates,
            }),
        };

        if config.auto_refresh {
            view.start_timer(true);
        } else {
            view.spawn_fetch(Trigger::Initial);
        }

        view
    }

    /// Copy of the current state
    pub async fn state(&self) -> SourceState<S> {
        let mut state = self.inner.state.read().await.clone();
        state.refresh.manual_refresh_in_flight =
            self.inner.manual_in_flight.load(Ordering::SeqCst) > 0;
        state
    }

    /// Map the visible snapshot through a render function.
    ///
    /// Returns no rows while loading, or when a blocking view has failed.
    pub async fn rows<R>(
        &self,
        render: impl FnMut(&RankedEntry<S::Item>, RowCue) -> R,
    ) -> Vec<R> {
        let state = self.inner.state.read().await;
        state
            .visible()
            .map(|snapshot| snapshot.render(Instant::now(), self.inner.highlight, render))
            .unwrap_or_default()
    }

    /// Receiver that ticks whenever the state changes
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.updates.subscribe()
    }

    /// Start a user-triggered refresh without waiting for it.
    ///
    /// The in-flight indicator is set before this returns and cleared when
    /// the fetch completes, whatever the outcome.
    pub fn trigger_refresh(&self) -> JoinHandle<ApiResult<()>> {
        self.inner.manual_in_flight.fetch_add(1, Ordering::SeqCst);
        self.inner.notify();

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let result = inner.fetch_and_apply(Trigger::Manual).await;
            inner.manual_in_flight.fetch_sub(1, Ordering::SeqCst);
            inner.notify();
            result
        })
    }

    /// Refresh now and wait for the outcome
    pub async fn refresh_now(&self) -> ApiResult<()> {
        self.trigger_refresh()
            .await
            .map_err(|e| ApiError::Network(format!("Refresh task failed: {}", e)))?
    }

    /// Turn the refresh timer on or off
    pub async fn set_auto_refresh(&self, enabled: bool) {
        {
            let mut state = self.inner.state.write().await;
            if state.refresh.auto_refresh_enabled == enabled {
                return;
            }
            state.refresh.auto_refresh_enabled = enabled;
        }

        if enabled {
            self.start_timer(false);
        } else {
            self.stop_timer();
        }
        tracing::debug!(enabled, "Auto refresh toggled");
        self.inner.notify();
    }

    /// Change the refresh interval, restarting the timer if it is running
    pub async fn set_interval(&self, interval: Duration) {
        let interval = interval.max(MIN_INTERVAL);
        {
            let mut current = lock(&self.inner.interval);
            if *current == interval {
                return;
            }
            *current = interval;
        }

        if self.inner.state.read().await.refresh.auto_refresh_enabled {
            self.start_timer(false);
        }
    }

    /// Point the view at a different resource.
    ///
    /// If the target identity changes, the old snapshot is dropped, the view
    /// goes back to loading, and the timer restarts with an immediate fetch.
    pub async fn retarget(&self, source: S) {
        let new_target = source.target();
        {
            let mut current = self.inner.source.write().await;
            let same = current.target() == new_target;
            *current = Arc::new(source);
            if same {
                return;
            }
            self.inner.generation.fetch_add(1, Ordering::SeqCst);
        }

        tracing::info!(resource = %new_target, "Retargeting polling view");

        let auto = {
            let mut state = self.inner.state.write().await;
            state.status = ViewStatus::Loading;
            state.snapshot = None;
            state.refresh.last_refreshed_at = None;
            state.refresh.auto_refresh_enabled
        };
        self.inner.notify();

        if auto {
            self.start_timer(true);
        } else {
            self.spawn_fetch(Trigger::Initial);
        }
    }

    /// Unmount the view; equivalent to dropping it
    pub fn unmount(self) {}

    pub async fn target(&self) -> String {
        self.inner.source.read().await.target()
    }

    pub fn interval(&self) -> Duration {
        *lock(&self.inner.interval)
    }

    pub fn highlight(&self) -> Duration {
        self.inner.highlight
    }

    /// Number of fetches issued since mount
    pub fn fetch_count(&self) -> u64 {
        self.inner.fetches.load(Ordering::SeqCst)
    }

    fn spawn_fetch(&self, trigger: Trigger) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let _ = inner.fetch_and_apply(trigger).await;
        });
    }

    fn start_timer(&self, immediate: bool) {
        let period = self.interval();
        let inner = Arc::clone(&self.inner);

        let handle = tokio::spawn(async move {
            let start = if immediate {
                Instant::now()
            } else {
                Instant::now() + period
            };
            let mut ticker = tokio::time::interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let inner = Arc::clone(&inner);
                tokio::spawn(async move {
                    let _ = inner.fetch_and_apply(Trigger::Auto).await;
                });
            }
        });

        if let Some(previous) = lock(&self.inner.timer).replace(handle) {
            previous.abort();
        }
    }

    fn stop_timer(&self) {
        if let Some(handle) = lock(&self.inner.timer).take() {
            handle.abort();
        }
    }
}

impl<S: SnapshotSource> Drop for PollingView<S> {
    fn drop(&mut self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        self.stop_timer();
        tracing::debug!("Polling view unmounted");
    }
}

impl<S: SnapshotSource> Inner<S> {
    async fn fetch_and_apply(&self, trigger: Trigger) -> ApiResult<()> {
        let (generation, source) = {
            let source = self.source.read().await;
            (self.generation.load(Ordering::SeqCst), Arc::clone(&*source))
        };
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let started = Instant::now();
        let result = source.fetch().await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let mut state = self.state.write().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(resource = %source.target(), ?trigger, "Discarding stale response");
            return result.map(|_| ());
        }

        match result {
            Ok((meta, items)) => {
                let snapshot = Snapshot::build(meta, items, state.snapshot.as_ref())
                    .with_requested_at(started);
                tracing::debug!(
                    resource = %source.target(),
                    ?trigger,
                    entries = snapshot.len(),
                    changed = snapshot.changed().count(),
                    elapsed_ms,
                    "View refreshed"
                );
                state.refresh.last_refreshed_at = Some(snapshot.refreshed_at());
                state.snapshot = Some(snapshot);
                state.status = ViewStatus::Ready;
                drop(state);
                self.notify();
                Ok(())
            }
            Err(error) => {
                tracing::warn!(
                    resource = %source.target(),
                    ?trigger,
                    error = %error,
                    elapsed_ms,
                    "View refresh failed"
                );
                state.status = ViewStatus::Unavailable {
                    error: error.clone(),
                    parent: self.parent.clone(),
                };
                drop(state);
                self.notify();
                Err(error)
            }
        }
    }

    fn notify(&self) {
        self.updates.send_modify(|version| *version = version.wrapping_add(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    #[derive(Debug, Clone, PartialEq)]
    struct Score {
        player: &'static str,
        strokes: i32,
    }

    impl RankedItem for Score {
        fn identity(&self) -> String {
            self.player.to_string()
        }

        fn display_value(&self) -> String {
            self.strokes.to_string()
        }
    }

    /// Replays `(delay_secs, strokes or error)` per call; the last step repeats
    struct Scripted {
        target: &'static str,
        calls: AtomicUsize,
        steps: Vec<(u64, Result<i32, ApiError>)>,
    }

    impl Scripted {
        fn new(target: &'static str, steps: Vec<(u64, Result<i32, ApiError>)>) -> Self {
            Self {
                target,
                calls: AtomicUsize::new(0),
                steps,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SnapshotSource for Scripted {
        type Item = Score;
        type Meta = ();

        fn target(&self) -> String {
            self.target.to_string()
        }

        async fn fetch(&self) -> ApiResult<((), Vec<Score>)> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let (delay, outcome) = self.steps[call.min(self.steps.len() - 1)].clone();
            sleep(Duration::from_secs(delay)).await;
            outcome.map(|strokes| {
                (
                    (),
                    vec![Score {
                        player: self.target,
                        strokes,
                    }],
                )
            })
        }
    }

    async fn strokes(view: &PollingView<Scripted>) -> Option<i32> {
        let state = view.state().await;
        state
            .visible()
            .and_then(|s| s.entries().first().map(|e| e.item.strokes))
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_refresh_fetch_count_and_unmount() {
        let source = Arc::new(Scripted::new("t1", vec![(0, Ok(70))]));
        let view = PollingView::mount_shared(Arc::clone(&source), ViewConfig::every(Duration::from_secs(10)));

        sleep(Duration::from_secs(35)).await;
        // Initial fetch plus ticks at 10s, 20s and 30s
        assert_eq!(source.calls(), 4);
        assert_eq!(view.fetch_count(), 4);

        view.unmount();
        sleep(Duration::from_secs(100)).await;
        assert_eq!(source.calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loading_then_ready() {
        let view = PollingView::mount(
            Scripted::new("t1", vec![(1, Ok(72))]),
            ViewConfig::every(Duration::from_secs(30)),
        );

        let state = view.state().await;
        assert!(state.is_loading());
        assert!(state.refresh.last_refreshed_at.is_none());

        sleep(Duration::from_secs(2)).await;
        let state = view.state().await;
        assert_eq!(state.status, ViewStatus::Ready);
        assert!(state.refresh.last_refreshed_at.is_some());
        assert_eq!(strokes(&view).await, Some(72));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_keeps_stale_snapshot() {
        let view = PollingView::mount(
            Scripted::new("t1", vec![(0, Ok(70)), (0, Err(ApiError::Timeout))]),
            ViewConfig::default().manual_only().parent("/tournaments/t1"),
        );
        sleep(Duration::from_millis(10)).await;

        assert_eq!(view.refresh_now().await, Err(ApiError::Timeout));

        let state = view.state().await;
        assert!(state.is_stale());
        assert_eq!(strokes(&view).await, Some(70));
        assert_eq!(
            state.status,
            ViewStatus::Unavailable {
                error: ApiError::Timeout,
                parent: Some("/tournaments/t1".to_string())
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_blocking_failure_hides_snapshot_until_success() {
        let view = PollingView::mount(
            Scripted::new(
                "t1",
                vec![(0, Ok(70)), (0, Err(ApiError::Timeout)), (0, Ok(71))],
            ),
            ViewConfig::default()
                .manual_only()
                .policy(FailurePolicy::Block),
        );
        sleep(Duration::from_millis(10)).await;

        let _ = view.refresh_now().await;
        assert!(view.rows(|e, _| e.identity.clone()).await.is_empty());

        view.refresh_now().await.unwrap();
        assert_eq!(strokes(&view).await, Some(71));
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_in_flight_clears_on_failure() {
        let view = PollingView::mount(
            Scripted::new("t1", vec![(0, Ok(70)), (3, Err(ApiError::Network("reset".into())))]),
            ViewConfig::default().manual_only(),
        );
        sleep(Duration::from_millis(10)).await;

        let handle = view.trigger_refresh();
        assert!(view.state().await.refresh.manual_refresh_in_flight);

        assert!(handle.await.unwrap().is_err());
        assert!(!view.state().await.refresh.manual_refresh_in_flight);
    }

    #[tokio::test(start_paused = true)]
    async fn test_last_resolved_response_wins() {
        let source = Scripted::new(
            "t1",
            vec![
                (0, Ok(70)), // initial
                (8, Ok(71)), // auto tick at 10s, resolves at 18s
                (1, Ok(72)), // manual at 12s, resolves at 13s
            ],
        );
        let view = PollingView::mount(source, ViewConfig::every(Duration::from_secs(10)));

        sleep(Duration::from_secs(12)).await;
        view.refresh_now().await.unwrap();
        assert_eq!(strokes(&view).await, Some(72));

        sleep(Duration::from_secs(6)).await;
        assert_eq!(strokes(&view).await, Some(71));
    }

    #[tokio::test(start_paused = true)]
    async fn test_changed_rows_pulse_then_clear() {
        let view = PollingView::mount(
            Scripted::new("t1", vec![(0, Ok(70)), (0, Ok(69))]),
            ViewConfig::default()
                .manual_only()
                .highlight(Duration::from_secs(2)),
        );
        sleep(Duration::from_millis(10)).await;
        assert_eq!(view.rows(|_, cue| cue.pulsing).await, vec![false]);

        view.refresh_now().await.unwrap();
        assert_eq!(view.rows(|_, cue| cue.pulsing).await, vec![true]);

        sleep(Duration::from_secs(3)).await;
        assert_eq!(view.rows(|_, cue| cue.pulsing).await, vec![false]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_value_refresh_does_not_cut_pulse_short() {
        let view = PollingView::mount(
            Scripted::new("t1", vec![(0, Ok(70)), (0, Ok(69)), (0, Ok(69))]),
            ViewConfig::default()
                .manual_only()
                .highlight(Duration::from_secs(2)),
        );
        sleep(Duration::from_millis(10)).await;

        view.refresh_now().await.unwrap();
        sleep(Duration::from_millis(500)).await;
        view.refresh_now().await.unwrap();
        assert_eq!(view.rows(|_, cue| cue.pulsing).await, vec![true]);

        sleep(Duration::from_millis(1600)).await;
        assert_eq!(view.rows(|_, cue| cue.pulsing).await, vec![false]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_records_when_fetch_was_issued() {
        let view = PollingView::mount(
            Scripted::new("t1", vec![(4, Ok(70))]),
            ViewConfig::default().manual_only(),
        );
        let mounted = Instant::now();
        sleep(Duration::from_secs(5)).await;

        let state = view.state().await;
        let snapshot = state.visible().unwrap();
        assert!(snapshot.requested_at() < mounted + Duration::from_secs(1));
        assert!(snapshot.received_at() >= mounted + Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retarget_discards_old_response() {
        let view = PollingView::mount(
            Scripted::new("t1", vec![(5, Ok(70))]),
            ViewConfig::every(Duration::from_secs(30)),
        );
        sleep(Duration::from_secs(1)).await;

        view.retarget(Scripted::new("t2", vec![(0, Ok(80))])).await;
        sleep(Duration::from_secs(10)).await;

        let state = view.state().await;
        let snapshot = state.visible().unwrap();
        assert_eq!(snapshot.entries()[0].identity, "t2");
        assert_eq!(snapshot.entries()[0].item.strokes, 80);
        assert_eq!(view.target().await, "t2");
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_change_restarts_timer() {
        let source = Arc::new(Scripted::new("t1", vec![(0, Ok(70))]));
        let view = PollingView::mount_shared(Arc::clone(&source), ViewConfig::every(Duration::from_secs(10)));

        sleep(Duration::from_secs(15)).await;
        assert_eq!(source.calls(), 2);

        view.set_interval(Duration::from_secs(3)).await;
        sleep(Duration::from_secs(10)).await;
        // New ticks at 18s, 21s and 24s
        assert_eq!(source.calls(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabling_auto_refresh_stops_timer() {
        let source = Arc::new(Scripted::new("t1", vec![(0, Ok(70))]));
        let view = PollingView::mount_shared(Arc::clone(&source), ViewConfig::every(Duration::from_secs(5)));

        sleep(Duration::from_secs(1)).await;
        view.set_auto_refresh(false).await;
        assert!(!view.state().await.refresh.auto_refresh_enabled);

        sleep(Duration::from_secs(60)).await;
        assert_eq!(source.calls(), 1);

        view.set_auto_refresh(true).await;
        sleep(Duration::from_secs(6)).await;
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_is_clamped() {
        let view = PollingView::mount(
            Scripted::new("t1", vec![(0, Ok(70))]),
            ViewConfig::every(Duration::ZERO),
        );
        assert_eq!(view.interval(), MIN_INTERVAL);
    }
}

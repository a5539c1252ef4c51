//! Interruptible animation worker
//!
//! A [`Worker`] drives a single value from `at` toward `to` over `dur`,
//! sampling every `tick`. Each run is bound to a pair of one-shot signals:
//!
//! - `die` is closed by whoever wants the run to stop
//! - `done` is closed by the run itself once it has finalized
//!
//! Starting a new run first closes `die` on the current pair and waits for
//! `done`, so the previous run has fully exited (and released its slot in
//! the [`RunCounter`]) before the new run's options are applied. The new run
//! continues from the live position of the old one.
//!
//! # Example
//!
//! ```ignore
//! use glide_animation::{RunOptions, Worker};
//! use std::time::Duration;
//!
//! let worker = Worker::new();
//! worker
//!     .start(RunOptions::new().from(10.0).to(0.0).duration(Duration::from_secs(10)))
//!     .await?;
//!
//! // Later: redirect toward a new target without jumping
//! worker
//!     .start(RunOptions::new().to(10.0).duration(Duration::from_secs(5)))
//!     .await?;
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::config::WorkerConfig;
use crate::counter::RunCounter;
use crate::easing::{lerp, Easing};
use crate::error::{AnimationError, Result};
use crate::ticker::Ticker;

/// Default sampling interval (~60Hz)
pub const DEFAULT_TICK: Duration = Duration::from_millis(16);

/// Callback invoked after every sample of a running animation
pub type UpdateFn = Arc<dyn Fn(&Snapshot) + Send + Sync>;

// ============================================================================
// Motion State
// ============================================================================

/// Read-only view of a worker, handed to update callbacks
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Snapshot {
    pub at: f64,
    pub pt: f64,
    pub to: f64,
    pub epoch: Option<Instant>,
    pub dur: Duration,
    pub tick: Duration,
    /// Value of the worker's run counter, if one is attached
    pub in_flight: Option<i64>,
}

/// Interpolation state of a worker
#[derive(Clone)]
pub struct Motion {
    at: f64,
    pt: f64,
    to: f64,
    interp: Easing,
    epoch: Option<Instant>,
    dur: Duration,
    tick: Duration,
    update: Option<UpdateFn>,
}

impl Motion {
    fn new(tick: Duration) -> Self {
        Self {
            at: 0.0,
            pt: 0.0,
            to: 0.0,
            interp: Easing::LinearDrive,
            epoch: None,
            dur: Duration::ZERO,
            tick,
            update: None,
        }
    }

    /// Start value of the current run
    pub fn at(&self) -> f64 {
        self.at
    }

    /// Last sampled value
    pub fn pt(&self) -> f64 {
        self.pt
    }

    /// Target of the current run
    pub fn to(&self) -> f64 {
        self.to
    }

    /// Curve applied to the elapsed fraction
    pub fn interp(&self) -> Easing {
        self.interp
    }

    /// Time the current run was baselined, `None` until the first tick
    /// when staged without one
    pub fn epoch(&self) -> Option<Instant> {
        self.epoch
    }

    /// Duration of the current run
    pub fn dur(&self) -> Duration {
        self.dur
    }

    /// Sampling interval
    pub fn tick(&self) -> Duration {
        self.tick
    }

    /// Advance the interpolation to `now`
    ///
    /// The first call after staging without an epoch only records the
    /// baseline and leaves `pt` alone. Once `dur` has elapsed the value
    /// snaps to the target and this returns `false`.
    pub fn step(&mut self, now: Instant) -> bool {
        let Some(epoch) = self.epoch else {
            self.epoch = Some(now);
            return true;
        };

        let since = now.saturating_duration_since(epoch);
        let ok = since < self.dur;
        if ok {
            let delta = self
                .interp
                .apply(since.as_secs_f64() / self.dur.as_secs_f64());
            self.pt = lerp(self.at, self.to, delta);
        } else {
            self.at = self.to;
            self.pt = self.to;
        }
        ok
    }

    /// Jump straight to the target
    fn snap(&mut self) {
        self.at = self.to;
        self.pt = self.to;
    }

    /// Freeze the current position as both endpoints of a new run
    fn rebase(&mut self, epoch: Option<Instant>) {
        self.epoch = epoch;
        self.at = self.pt;
        self.to = self.pt;
    }

    fn snapshot(&self, in_flight: Option<i64>) -> Snapshot {
        Snapshot {
            at: self.at,
            pt: self.pt,
            to: self.to,
            epoch: self.epoch,
            dur: self.dur,
            tick: self.tick,
            in_flight,
        }
    }
}

impl fmt::Debug for Motion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Motion")
            .field("at", &self.at)
            .field("pt", &self.pt)
            .field("to", &self.to)
            .field("interp", &self.interp)
            .field("epoch", &self.epoch)
            .field("dur", &self.dur)
            .field("tick", &self.tick)
            .field("update", &self.update.is_some())
            .finish()
    }
}

fn lock(motion: &Mutex<Motion>) -> MutexGuard<'_, Motion> {
    motion.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// Run Options
// ============================================================================

/// Configuration applied to a worker when a new run is staged
///
/// Unset fields keep the worker's current value, so e.g. the update
/// callback and curve carry over into later runs.
#[derive(Clone, Default)]
pub struct RunOptions {
    to: Option<f64>,
    from: Option<f64>,
    dur: Option<Duration>,
    tick: Option<Duration>,
    interp: Option<Easing>,
    update: Option<UpdateFn>,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Target value
    pub fn to(mut self, to: f64) -> Self {
        self.to = Some(to);
        self
    }

    /// Jump to `from` instead of continuing from the current position
    pub fn from(mut self, from: f64) -> Self {
        self.from = Some(from);
        self
    }

    /// Run duration; zero completes the run instantly
    pub fn duration(mut self, dur: Duration) -> Self {
        self.dur = Some(dur);
        self
    }

    /// Sampling interval; must be greater than zero
    pub fn tick(mut self, tick: Duration) -> Self {
        self.tick = Some(tick);
        self
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.interp = Some(easing);
        self
    }

    /// Callback invoked after every sample
    pub fn on_update<F>(mut self, update: F) -> Self
    where
        F: Fn(&Snapshot) + Send + Sync + 'static,
    {
        self.update = Some(Arc::new(update));
        self
    }

    fn apply(self, motion: &mut Motion) {
        if let Some(from) = self.from {
            motion.at = from;
            motion.pt = from;
        }
        if let Some(to) = self.to {
            motion.to = to;
        }
        if let Some(dur) = self.dur {
            motion.dur = dur;
        }
        if let Some(tick) = self.tick {
            motion.tick = tick;
        }
        if let Some(interp) = self.interp {
            motion.interp = interp;
        }
        if let Some(update) = self.update {
            motion.update = Some(update);
        }
    }
}

impl fmt::Debug for RunOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunOptions")
            .field("to", &self.to)
            .field("from", &self.from)
            .field("dur", &self.dur)
            .field("tick", &self.tick)
            .field("interp", &self.interp)
            .field("update", &self.update.is_some())
            .finish()
    }
}

// ============================================================================
// Run Signals
// ============================================================================

/// Worker side of a run's `(die, done)` pair
struct RunSignals {
    die: watch::Sender<bool>,
    done: watch::Receiver<bool>,
}

impl RunSignals {
    /// A pair with no run behind it: already told to die, already done
    fn closed() -> Self {
        let (die, _) = watch::channel(true);
        let (_, done) = watch::channel(true);
        Self { die, done }
    }

    fn open(run: u64, claim: Claim) -> (Self, RunLink) {
        let (die, die_rx) = watch::channel(false);
        let (done_tx, done) = watch::channel(false);
        let link = RunLink {
            die: die_rx,
            settle: Settle {
                run,
                done: done_tx,
                notify: claim.hand_over(),
            },
        };
        (Self { die, done }, link)
    }

    fn is_done(&self) -> bool {
        *self.done.borrow()
    }

    /// Close `die` and wait until the run has closed `done`
    async fn cancel(&mut self) {
        if self.is_done() {
            return;
        }
        self.die.send_replace(true);
        // A dropped sender means the run is gone, which counts as done
        let _ = self.done.wait_for(|done| *done).await;
    }
}

/// Run side of a `(die, done)` pair, owned by the sampler or the listener
struct RunLink {
    die: watch::Receiver<bool>,
    settle: Settle,
}

impl RunLink {
    /// Resolves once `die` is closed or the worker is gone
    async fn died(&mut self) {
        let _ = self.die.wait_for(|closed| *closed).await;
    }

    fn in_flight(&self) -> Option<i64> {
        self.settle.notify.as_ref().map(RunCounter::get)
    }
}

/// A counter slot taken by a stage that has not installed its run yet
///
/// Released on drop, so a stage abandoned while waiting for the previous
/// run leaves the counter balanced. Installing the run hands the slot to
/// its [`Settle`].
struct Claim {
    notify: Option<RunCounter>,
}

impl Claim {
    fn take(notify: Option<RunCounter>) -> Self {
        if let Some(notify) = &notify {
            notify.increment();
        }
        Self { notify }
    }

    fn hand_over(mut self) -> Option<RunCounter> {
        self.notify.take()
    }
}

impl Drop for Claim {
    fn drop(&mut self) {
        if let Some(notify) = self.notify.take() {
            let remaining = notify.decrement();
            tracing::debug!("abandoned stage released ({} in flight)", remaining);
        }
    }
}

/// Finalizes a run exactly once: releases its counter slot, then closes
/// `done`. Runs on drop so an aborted or panicked loop still settles.
struct Settle {
    run: u64,
    done: watch::Sender<bool>,
    notify: Option<RunCounter>,
}

impl Drop for Settle {
    fn drop(&mut self) {
        if let Some(notify) = &self.notify {
            let remaining = notify.decrement();
            tracing::debug!("run {} settled ({} in flight)", self.run, remaining);
        } else {
            tracing::debug!("run {} settled", self.run);
        }
        self.done.send_replace(true);
    }
}

// ============================================================================
// Worker
// ============================================================================

struct WorkerInner {
    motion: Arc<Mutex<Motion>>,
    run: tokio::sync::Mutex<RunSignals>,
    notify: Option<RunCounter>,
    next_run: AtomicU64,
}

/// Drives a value toward a target at regular intervals until complete
///
/// Clones share the same animation. All run operations need a Tokio
/// runtime.
#[derive(Clone)]
pub struct Worker {
    inner: Arc<WorkerInner>,
}

impl Worker {
    /// Create an idle worker that samples every 16ms once started
    pub fn new() -> Self {
        Self::build(DEFAULT_TICK, None)
    }

    /// Create an idle worker that reports runs in flight to `notify`
    pub fn with_notify(notify: RunCounter) -> Self {
        Self::build(DEFAULT_TICK, Some(notify))
    }

    /// Create an idle worker from configuration, optionally reporting runs
    /// in flight to `notify`
    pub fn from_config(config: &WorkerConfig, notify: Option<RunCounter>) -> Self {
        Self::build(config.tick(), notify)
    }

    fn build(tick: Duration, notify: Option<RunCounter>) -> Self {
        Self {
            inner: Arc::new(WorkerInner {
                motion: Arc::new(Mutex::new(Motion::new(tick))),
                run: tokio::sync::Mutex::new(RunSignals::closed()),
                notify,
                next_run: AtomicU64::new(1),
            }),
        }
    }

    /// Current position
    pub fn position(&self) -> f64 {
        lock(&self.inner.motion).pt
    }

    pub fn snapshot(&self) -> Snapshot {
        lock(&self.inner.motion).snapshot(self.in_flight())
    }

    /// Copy of the interpolation state
    pub fn motion(&self) -> Motion {
        lock(&self.inner.motion).clone()
    }

    /// The attached run counter, if any
    pub fn notify(&self) -> Option<&RunCounter> {
        self.inner.notify.as_ref()
    }

    fn in_flight(&self) -> Option<i64> {
        self.inner.notify.as_ref().map(RunCounter::get)
    }

    /// Whether the current run has finalized
    pub async fn is_done(&self) -> bool {
        self.inner.run.lock().await.is_done()
    }

    /// Wait until the current run has finalized
    ///
    /// Only the run current at call time is awaited; a run started later is
    /// not.
    pub async fn wait_done(&self) {
        let mut done = self.inner.run.lock().await.done.clone();
        let _ = done.wait_for(|done| *done).await;
    }

    /// Stop the current run, if any, and wait for it to finalize
    ///
    /// A no-op when nothing is running.
    pub async fn cancel(&self) {
        let mut run = self.inner.run.lock().await;
        if !run.is_done() {
            tracing::debug!("cancelling current run");
        }
        run.cancel().await;
    }

    /// Stop the current run and start a new one from the current position
    ///
    /// The run is baselined at the time of the call, so the first tick
    /// already moves the value. Fails without touching the worker if the
    /// resulting sampling interval would be zero.
    pub async fn start(&self, options: RunOptions) -> Result<()> {
        let link = self.stage(Some(Instant::now()), options, true).await?;

        let instant = {
            let mut motion = lock(&self.inner.motion);
            if motion.dur.is_zero() {
                motion.snap();
                true
            } else {
                false
            }
        };
        if instant {
            tracing::debug!("run {} completed instantly", link.settle.run);
            drop(link);
        } else {
            tokio::spawn(sample(Arc::clone(&self.inner.motion), link));
        }
        Ok(())
    }

    /// Stop the current run and stage a new one without sampling it
    ///
    /// The staged run only waits to be cancelled (by [`cancel`](Self::cancel)
    /// or a later stage/start). `epoch` of `None` leaves the run
    /// un-baselined.
    pub async fn stage_only(&self, epoch: Option<Instant>, options: RunOptions) -> Result<()> {
        let link = self.stage(epoch, options, false).await?;
        tokio::spawn(listen(link));
        Ok(())
    }

    /// Close out the current run and install a fresh signal pair
    ///
    /// With `sampled` set, a zero effective tick is rejected before the
    /// current run is touched.
    async fn stage(
        &self,
        epoch: Option<Instant>,
        options: RunOptions,
        sampled: bool,
    ) -> Result<RunLink> {
        let claim = Claim::take(self.inner.notify.clone());

        let mut run = self.inner.run.lock().await;
        if sampled {
            // Only stages change the tick, and they hold `run`
            let tick = options
                .tick
                .unwrap_or_else(|| lock(&self.inner.motion).tick);
            if tick.is_zero() {
                return Err(AnimationError::InvalidTickInterval(tick));
            }
        }
        run.cancel().await;

        let id = self.inner.next_run.fetch_add(1, Ordering::Relaxed);
        let (signals, link) = RunSignals::open(id, claim);
        *run = signals;

        let mut motion = lock(&self.inner.motion);
        motion.rebase(epoch);
        options.apply(&mut motion);
        tracing::debug!(
            "run {} staged: {} -> {} over {:?} ({:?}, tick {:?})",
            id,
            motion.at,
            motion.to,
            motion.dur,
            motion.interp,
            motion.tick
        );
        Ok(link)
    }
}

impl Default for Worker {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Worker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Worker")
            .field("motion", &*lock(&self.inner.motion))
            .field("notify", &self.in_flight())
            .finish()
    }
}

/// Sample the run on every tick until it completes or is told to die
async fn sample(motion: Arc<Mutex<Motion>>, mut link: RunLink) {
    let tick = lock(&motion).tick;
    let mut ticker = match Ticker::new(tick) {
        Ok(ticker) => ticker,
        Err(err) => {
            tracing::warn!("run {} could not start sampling: {}", link.settle.run, err);
            return;
        }
    };

    loop {
        tokio::select! {
            biased;

            _ = link.died() => {
                tracing::debug!("run {} cancelled", link.settle.run);
                break;
            }
            now = ticker.tick() => {
                let (ok, snapshot, update) = {
                    let mut motion = lock(&motion);
                    let ok = motion.step(now);
                    (ok, motion.snapshot(link.in_flight()), motion.update.clone())
                };
                if !ok {
                    tracing::debug!("run {} finished at {}", link.settle.run, snapshot.pt);
                    break;
                }
                tracing::trace!("run {} sample: {}", link.settle.run, snapshot.pt);
                if let Some(update) = update {
                    update(&snapshot);
                }
            }
        }
    }

    ticker.stop();
}

/// Hold a staged run until it is told to die
async fn listen(mut link: RunLink) {
    link.died().await;
    tracing::debug!("staged run {} released", link.settle.run);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn motion(at: f64, to: f64, dur_ms: u64) -> Motion {
        let mut motion = Motion::new(Duration::from_millis(1000));
        motion.at = at;
        motion.pt = at;
        motion.to = to;
        motion.dur = Duration::from_millis(dur_ms);
        motion
    }

    #[test]
    fn test_step_baselines_first() {
        let mut m = motion(10.0, 0.0, 10_000);
        m.pt = 7.0;
        let now = Instant::now();

        assert!(m.step(now));
        assert_eq!(m.epoch(), Some(now));
        assert_eq!(m.pt(), 7.0);
    }

    #[test]
    fn test_step_interpolates() {
        let mut m = motion(10.0, 0.0, 10_000);
        let epoch = Instant::now();
        m.epoch = Some(epoch);

        assert!(m.step(epoch + Duration::from_millis(5_000)));
        assert!((m.pt() - 5.0).abs() < 1e-9);

        assert!(m.step(epoch + Duration::from_millis(9_000)));
        assert!((m.pt() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_step_snaps_after_deadline() {
        let mut m = motion(10.0, 0.0, 10_000);
        let epoch = Instant::now();
        m.epoch = Some(epoch);

        assert!(!m.step(epoch + Duration::from_millis(10_000)));
        assert_eq!(m.pt(), 0.0);
        assert_eq!(m.at(), 0.0);

        assert!(!m.step(epoch + Duration::from_millis(60_000)));
        assert_eq!(m.pt(), 0.0);
    }

    #[test]
    fn test_step_zero_duration_snaps() {
        let mut m = motion(3.0, 4.0, 0);
        let epoch = Instant::now();
        m.epoch = Some(epoch);

        assert!(!m.step(epoch));
        assert_eq!(m.pt(), 4.0);
    }

    #[test]
    fn test_step_stays_on_segment() {
        for easing in [
            Easing::LinearDrive,
            Easing::LinearDecay,
            Easing::ExpDrive,
            Easing::ExpDecay,
        ] {
            let mut m = motion(-4.0, 6.0, 1_000);
            m.interp = easing;
            let epoch = Instant::now();
            m.epoch = Some(epoch);
            for ms in (0..1_000).step_by(50) {
                m.step(epoch + Duration::from_millis(ms));
                assert!(m.pt() >= -4.0 && m.pt() <= 6.0, "{:?} left segment", easing);
            }
        }
    }

    #[test]
    fn test_rebase_freezes_position() {
        let mut m = motion(10.0, 0.0, 10_000);
        m.pt = 4.5;
        m.rebase(None);

        assert_eq!(m.at(), 4.5);
        assert_eq!(m.to(), 4.5);
        assert!(m.epoch().is_none());
    }

    #[test]
    fn test_options_keep_unset_fields() {
        let mut m = motion(1.0, 2.0, 500);
        m.interp = Easing::ExpDecay;

        RunOptions::new().to(8.0).apply(&mut m);

        assert_eq!(m.to(), 8.0);
        assert_eq!(m.dur(), Duration::from_millis(500));
        assert_eq!(m.interp().name(), "exp-decay");
        assert_eq!(m.at(), 1.0);
    }

    #[test]
    fn test_options_from_jumps() {
        let mut m = motion(1.0, 2.0, 500);
        RunOptions::new().from(-3.0).apply(&mut m);
        assert_eq!(m.at(), -3.0);
        assert_eq!(m.pt(), -3.0);
    }

    #[tokio::test]
    async fn test_new_worker_is_idle() {
        let worker = Worker::new();
        assert!(worker.is_done().await);
        assert_eq!(worker.motion().tick(), DEFAULT_TICK);
        assert_eq!(worker.position(), 0.0);

        // Cancelling a never-started worker is a no-op
        worker.cancel().await;
        assert!(worker.is_done().await);
    }

    #[tokio::test]
    async fn test_start_rejects_zero_tick() {
        let notify = RunCounter::new();
        let worker = Worker::with_notify(notify.clone());

        let err = worker
            .start(RunOptions::new().to(1.0).tick(Duration::ZERO))
            .await
            .unwrap_err();

        assert_eq!(err, AnimationError::InvalidTickInterval(Duration::ZERO));
        assert_eq!(notify.get(), 0);
        assert_eq!(worker.motion().tick(), DEFAULT_TICK);
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_runs_once_when_loop_dropped() {
        let notify = RunCounter::new();
        let (mut signals, link) = RunSignals::open(7, Claim::take(Some(notify.clone())));

        let handle = tokio::spawn(listen(link));
        handle.abort();
        let _ = handle.await;

        assert!(signals.is_done());
        assert_eq!(notify.get(), 0);

        // Already done: cancel returns without touching the counter
        signals.cancel().await;
        assert_eq!(notify.get(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_wins_over_overdue_run() {
        let notify = RunCounter::new();
        let state = Arc::new(Mutex::new(motion(10.0, 0.0, 1_000)));
        {
            let mut m = lock(&state);
            m.pt = 6.0;
            m.epoch = Some(Instant::now());
        }

        // Well past the deadline: the next tick would snap to the target
        tokio::time::advance(Duration::from_millis(5_000)).await;

        let (mut signals, link) = RunSignals::open(3, Claim::take(Some(notify.clone())));
        assert_eq!(notify.get(), 1);
        signals.die.send_replace(true);

        sample(Arc::clone(&state), link).await;

        assert!(signals.is_done());
        assert_eq!(notify.get(), 0);
        {
            let m = lock(&state);
            assert_eq!(m.pt(), 6.0);
            assert_eq!(m.at(), 10.0);
            assert_eq!(m.to(), 0.0);
        }

        signals.cancel().await;
        assert_eq!(notify.get(), 0);
    }

    #[test]
    fn test_abandoned_claim_releases_slot() {
        let notify = RunCounter::new();
        let claim = Claim::take(Some(notify.clone()));
        assert_eq!(notify.get(), 1);
        drop(claim);
        assert_eq!(notify.get(), 0);

        // A handed-over claim leaves the slot to the run
        let claim = Claim::take(Some(notify.clone()));
        let handed = claim.hand_over();
        assert!(handed.is_some());
        assert_eq!(notify.get(), 1);
    }
}

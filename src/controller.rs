//! # Run Session Controller
//!
//! The session state machine:
//!
//! ```text
//! Idle ──start──▶ Active ◀──resume── Paused
//!                   │  └────pause────▶  │
//!                   └──────finish───────┴──▶ Finished ──start──▶ Active
//! ```
//!
//! Fixes from the [`PositionSource`] are consumed by one background task per
//! subscription and processed strictly serially under the session lock. Each
//! accepted fix is written through to the [`SessionStore`] (track point plus a
//! progress snapshot) so a restarted process can resume from the persisted row
//! without replaying track points.
//!
//! A separate display tick ([`RunSessionController::spawn_display_tick`]) only
//! reads the session; it never writes to the store.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::StreamExt;
use log::{debug, error, info, warn};
use once_cell::sync::Lazy;
use serde::Serialize;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::calories::estimate_kcal;
use crate::clock::{Clock, SessionClock};
use crate::config::{validate_weight, TrackerConfig};
use crate::error::{ErrorKind, Result, SourceError, TrackerError};
use crate::geo_utils::DistanceAccumulator;
use crate::pace::{format_pace, pace_min_per_km};
use crate::source::{FixStream, PositionSource};
use crate::store::SessionStore;
use crate::types::{ActivityType, PositionFix, RunSession, TrackPoint};

/// Process-wide serialization point for opening sessions.
///
/// The store enforces the single-open-session invariant; this gate keeps
/// concurrent `start()` / recovery calls in one process from interleaving.
static SESSION_GATE: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// Open sessions held by a live controller, keyed by store handle and session id.
static SESSION_OWNERS: Lazy<StdMutex<HashSet<(usize, i64)>>> =
    Lazy::new(|| StdMutex::new(HashSet::new()));

fn session_owners() -> MutexGuard<'static, HashSet<(usize, i64)>> {
    SESSION_OWNERS.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Ownership of one open session by one controller. Released on drop.
#[derive(Debug)]
struct SessionClaim {
    key: (usize, i64),
}

impl SessionClaim {
    /// Claim `session_id` in `store`, or `None` if another controller holds it.
    fn acquire(store: &Arc<dyn SessionStore>, session_id: i64) -> Option<Self> {
        let key = (Arc::as_ptr(store) as *const () as usize, session_id);
        session_owners().insert(key).then_some(SessionClaim { key })
    }
}

impl Drop for SessionClaim {
    fn drop(&mut self) {
        session_owners().remove(&self.key);
    }
}

/// Run a synchronous store write. On a multi-threaded runtime the worker is
/// handed off first so other tasks keep running while SQLite waits on locks.
fn blocking_write<R>(write: impl FnOnce() -> R) -> R {
    match Handle::try_current().map(|handle| handle.runtime_flavor()) {
        Ok(RuntimeFlavor::MultiThread) => tokio::task::block_in_place(write),
        _ => write(),
    }
}

// ============================================================================
// Public Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    Idle,
    Active,
    Paused,
    Finished,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Active => "active",
            SessionState::Paused => "paused",
            SessionState::Finished => "finished",
        };
        f.write_str(name)
    }
}

/// Health of the position feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum GpsStatus {
    /// No subscription has been opened
    Idle,
    Streaming,
    /// The stream failed or ended; values are frozen until resubscribed
    Unavailable { reason: String },
    /// Location updates were stopped deliberately
    Stopped,
}

/// What happened to a fix handed to the controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FixOutcome {
    Accepted {
        sequence_index: u32,
        delta_meters: f64,
        total_meters: f64,
    },
    /// Received while paused; discarded, not buffered
    DroppedPaused,
    /// No session is active
    Ignored,
}

/// Read-only view of the session for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveStats {
    pub state: SessionState,
    pub session_id: Option<i64>,
    pub activity_type: Option<ActivityType>,
    pub started_at: Option<DateTime<Utc>>,
    pub distance_meters: f64,
    pub elapsed_active_seconds: u64,
    pub pace_min_per_km: f64,
    pub pace_display: String,
    /// Running estimate while active; the final value once finished
    pub kcal: u32,
    pub points_recorded: u32,
    pub gps: GpsStatus,
    /// The durable snapshot is behind the in-memory totals
    pub persistence_lagging: bool,
}

// ============================================================================
// Internal State
// ============================================================================

#[derive(Debug, Clone)]
struct ActiveRun {
    session_id: i64,
    started_at: DateTime<Utc>,
    activity_type: ActivityType,
    next_sequence: u32,
    /// Last computed pace (min/km)
    pace: f64,
    persistence_lagging: bool,
}

struct Subscription {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl Subscription {
    /// Cancel the pump and wait for it to release the stream.
    async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            warn!("run_tracker: [Controller] Fix pump ended abnormally: {}", e);
        }
    }
}

struct Inner {
    state: SessionState,
    run: Option<ActiveRun>,
    clock: SessionClock,
    distance: DistanceAccumulator,
    gps: GpsStatus,
    /// Bumped on every (un)subscribe; stale pumps compare and exit
    generation: u64,
    subscription: Option<Subscription>,
    final_kcal: Option<u32>,
    claim: Option<SessionClaim>,
}

impl Inner {
    fn new() -> Self {
        Self {
            state: SessionState::Idle,
            run: None,
            clock: SessionClock::new(),
            distance: DistanceAccumulator::new(),
            gps: GpsStatus::Idle,
            generation: 0,
            subscription: None,
            final_kcal: None,
            claim: None,
        }
    }

    fn is_open(&self) -> bool {
        matches!(self.state, SessionState::Active | SessionState::Paused)
    }

    /// Detach the current subscription so no further fix is processed.
    fn detach(&mut self) -> Option<Subscription> {
        self.generation += 1;
        self.subscription.take()
    }

    /// Let go of a session whose row was closed outside this controller.
    ///
    /// Returns the cancelled subscription so the caller may await its release.
    fn abandon(&mut self) -> Option<Subscription> {
        let subscription = self.detach();
        if let Some(subscription) = &subscription {
            subscription.cancel.cancel();
        }
        self.state = SessionState::Idle;
        self.run = None;
        self.claim = None;
        self.clock = SessionClock::new();
        self.distance = DistanceAccumulator::new();
        self.gps = GpsStatus::Stopped;
        self.final_kcal = None;
        subscription
    }
}

struct Shared {
    inner: Mutex<Inner>,
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    config: TrackerConfig,
    /// Cancelled when the controller handle is dropped
    closed: CancellationToken,
}

impl Shared {
    fn process_fix(&self, inner: &mut Inner, fix: PositionFix) -> Result<FixOutcome> {
        match inner.state {
            SessionState::Active => {}
            SessionState::Paused => return Ok(FixOutcome::DroppedPaused),
            SessionState::Idle | SessionState::Finished => return Ok(FixOutcome::Ignored),
        }
        let Some(run) = inner.run.as_mut() else {
            return Ok(FixOutcome::Ignored);
        };

        let delta_meters = inner.distance.add_fix(&fix)?;
        let total_meters = inner.distance.total_meters();
        let elapsed = inner.clock.elapsed_active_seconds(self.clock.now());
        let pace = pace_min_per_km(total_meters, elapsed as f64);
        run.pace = pace;

        let session_id = run.session_id;
        let sequence_index = run.next_sequence;
        let appended = self
            .store
            .append_point(&TrackPoint::from_fix(session_id, sequence_index, &fix));
        if appended.is_ok() {
            run.next_sequence += 1;
        }
        let progress = self
            .store
            .update_session_progress(session_id, total_meters, elapsed, pace);

        let persisted = appended.and(progress);
        run.persistence_lagging = persisted.is_err();
        if matches!(persisted, Err(TrackerError::NoActiveSession)) {
            warn!(
                "run_tracker: [Controller] Session {} was closed outside this controller, releasing it",
                session_id
            );
            inner.abandon();
            return Err(TrackerError::NoActiveSession);
        }
        persisted?;

        debug!(
            "run_tracker: [Controller] Fix #{} +{:.1}m total={:.1}m elapsed={}s pace={:.2}",
            sequence_index, delta_meters, total_meters, elapsed, pace
        );

        Ok(FixOutcome::Accepted {
            sequence_index,
            delta_meters,
            total_meters,
        })
    }

    /// Write the current totals through to the store.
    fn persist_progress(&self, inner: &mut Inner, now: DateTime<Utc>) -> Result<()> {
        let elapsed = inner.clock.elapsed_active_seconds(now);
        let total = inner.distance.total_meters();
        let Some(run) = inner.run.as_mut() else {
            return Ok(());
        };
        run.pace = pace_min_per_km(total, elapsed as f64);
        let result = self
            .store
            .update_session_progress(run.session_id, total, elapsed, run.pace);
        run.persistence_lagging = result.is_err();
        result
    }

    async fn snapshot(&self) -> LiveStats {
        let inner = self.inner.lock().await;
        let now = self.clock.now();
        let elapsed = inner.clock.elapsed_active_seconds(now);
        let run = inner.run.as_ref();
        let pace = run.map_or(0.0, |r| r.pace);

        let kcal = match (inner.state, run) {
            (SessionState::Finished, _) => inner.final_kcal.unwrap_or(0),
            (_, Some(r)) => estimate_kcal(r.activity_type, r.pace, elapsed, self.config.weight_kg),
            (_, None) => 0,
        };

        LiveStats {
            state: inner.state,
            session_id: run.map(|r| r.session_id),
            activity_type: run.map(|r| r.activity_type),
            started_at: run.map(|r| r.started_at),
            distance_meters: inner.distance.total_meters(),
            elapsed_active_seconds: elapsed,
            pace_min_per_km: pace,
            pace_display: format_pace(pace),
            kcal,
            points_recorded: run.map_or(0, |r| r.next_sequence),
            gps: inner.gps.clone(),
            persistence_lagging: run.is_some_and(|r| r.persistence_lagging),
        }
    }
}

/// Consume one fix stream until it ends, fails or is cancelled.
async fn pump_fixes(
    shared: Arc<Shared>,
    mut stream: FixStream,
    cancel: CancellationToken,
    generation: u64,
) {
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = shared.closed.cancelled() => break,
            next = stream.next() => next,
        };

        let mut inner = shared.inner.lock().await;
        if inner.generation != generation || cancel.is_cancelled() {
            break;
        }

        match next {
            Some(Ok(fix)) => match blocking_write(|| shared.process_fix(&mut inner, fix)) {
                Ok(FixOutcome::DroppedPaused) => {
                    debug!("run_tracker: [Controller] Session paused, discarding fix");
                }
                Ok(_) => {}
                Err(e) if e.kind() == ErrorKind::Validation => {
                    warn!("run_tracker: [Controller] Dropping fix: {}", e);
                }
                Err(TrackerError::NoActiveSession) => break,
                Err(e) => {
                    error!(
                        "run_tracker: [Controller] Failed to persist fix, continuing in memory: {}",
                        e
                    );
                }
            },
            Some(Err(e)) => {
                warn!(
                    "run_tracker: [Controller] Position source failed, values frozen: {}",
                    e
                );
                inner.gps = GpsStatus::Unavailable {
                    reason: e.to_string(),
                };
                break;
            }
            None => {
                warn!("run_tracker: [Controller] Position stream ended, values frozen");
                inner.gps = GpsStatus::Unavailable {
                    reason: SourceError::Ended.to_string(),
                };
                break;
            }
        }
    }
    // Dropping the stream releases the subscription
}

// ============================================================================
// Controller
// ============================================================================

/// Single-owner handle to the run session.
pub struct RunSessionController {
    shared: Arc<Shared>,
    source: Arc<dyn PositionSource>,
}

impl RunSessionController {
    /// Create an idle controller. Use [`initialize`](Self::initialize) to also
    /// recover an open session from the store.
    ///
    /// Fails with a `Config` error if `config` does not validate.
    pub fn new(
        store: Arc<dyn SessionStore>,
        source: Arc<dyn PositionSource>,
        clock: Arc<dyn Clock>,
        config: TrackerConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner::new()),
                store,
                clock,
                config,
                closed: CancellationToken::new(),
            }),
            source,
        })
    }

    /// Create a controller and resume any session left open by a previous process.
    pub async fn initialize(
        store: Arc<dyn SessionStore>,
        source: Arc<dyn PositionSource>,
        clock: Arc<dyn Clock>,
        config: TrackerConfig,
    ) -> Result<Self> {
        let controller = Self::new(store, source, clock, config)?;
        controller.recover().await?;
        Ok(controller)
    }

    /// Re-hydrate an open session from its persisted row and resume it as Active.
    ///
    /// Track points are not replayed. Pause history from before the restart is
    /// not reconstructed: the persisted active seconds carry over and counting
    /// resumes from now. Returns the recovered session, if any.
    ///
    /// Fails with `SessionAlreadyActive` while another controller in this
    /// process owns the open session.
    pub async fn recover(&self) -> Result<Option<RunSession>> {
        let _gate = SESSION_GATE.lock().await;
        let mut inner = self.shared.inner.lock().await;
        if inner.is_open() {
            return Ok(None);
        }

        let Some(session) = self.shared.store.get_open_session()? else {
            return Ok(None);
        };
        let Some(claim) = SessionClaim::acquire(&self.shared.store, session.id) else {
            return Err(TrackerError::SessionAlreadyActive {
                session_id: session.id,
            });
        };
        let next_sequence = self.shared.store.next_sequence_index(session.id)?;
        let now = self.shared.clock.now();

        inner
            .clock
            .start_from_offset(now, session.elapsed_active_seconds);
        inner.distance = DistanceAccumulator::with_total(session.cumulative_distance_meters);
        inner.run = Some(ActiveRun {
            session_id: session.id,
            started_at: session.started_at,
            activity_type: session.activity_type,
            next_sequence,
            pace: pace_min_per_km(
                session.cumulative_distance_meters,
                session.elapsed_active_seconds as f64,
            ),
            persistence_lagging: false,
        });
        inner.final_kcal = None;
        inner.claim = Some(claim);
        inner.state = SessionState::Active;
        let previous = self.subscribe_locked(&mut inner);
        drop(inner);
        if let Some(previous) = previous {
            previous.shutdown().await;
        }

        info!(
            "run_tracker: [Controller] Recovered session {} ({:.1}m, {}s active, next point #{})",
            session.id,
            session.cumulative_distance_meters,
            session.elapsed_active_seconds,
            next_sequence
        );
        Ok(Some(session))
    }

    /// Open a new session and start consuming fixes.
    pub async fn start(&self, activity_type: ActivityType) -> Result<RunSession> {
        let _gate = SESSION_GATE.lock().await;
        let mut inner = self.shared.inner.lock().await;
        if inner.is_open() {
            let session_id = inner.run.as_ref().map_or(0, |r| r.session_id);
            return Err(TrackerError::SessionAlreadyActive { session_id });
        }

        let now = self.shared.clock.now();
        let session_id = self.shared.store.create_session(now, activity_type)?;
        let Some(claim) = SessionClaim::acquire(&self.shared.store, session_id) else {
            return Err(TrackerError::SessionAlreadyActive { session_id });
        };

        inner.run = Some(ActiveRun {
            session_id,
            started_at: now,
            activity_type,
            next_sequence: 0,
            pace: 0.0,
            persistence_lagging: false,
        });
        inner.clock.start(now);
        inner.distance = DistanceAccumulator::new();
        inner.final_kcal = None;
        inner.claim = Some(claim);
        inner.state = SessionState::Active;
        let previous = self.subscribe_locked(&mut inner);
        drop(inner);
        if let Some(previous) = previous {
            previous.shutdown().await;
        }

        info!(
            "run_tracker: [Controller] Started {} session {}",
            activity_type, session_id
        );

        Ok(RunSession {
            id: session_id,
            started_at: now,
            ended_at: None,
            cumulative_distance_meters: 0.0,
            elapsed_active_seconds: 0,
            pace_min_per_km: 0.0,
            kcal: None,
            activity_type,
        })
    }

    /// Pause the session clock; fixes received while paused are discarded.
    ///
    /// The transition always takes effect in memory. A returned persistence
    /// error only means the durable snapshot of the elapsed time lags.
    pub async fn pause(&self) -> Result<()> {
        let mut inner = self.shared.inner.lock().await;
        match inner.state {
            SessionState::Active => {}
            SessionState::Paused => return Ok(()),
            SessionState::Idle | SessionState::Finished => {
                return Err(TrackerError::NoActiveSession)
            }
        }

        let now = self.shared.clock.now();
        inner.clock.pause(now);
        inner.state = SessionState::Paused;
        info!("run_tracker: [Controller] Paused");

        self.shared.persist_progress(&mut inner, now)
    }

    pub async fn resume(&self) -> Result<()> {
        let mut inner = self.shared.inner.lock().await;
        match inner.state {
            SessionState::Paused => {}
            SessionState::Active => return Ok(()),
            SessionState::Idle | SessionState::Finished => {
                return Err(TrackerError::NoActiveSession)
            }
        }

        inner.clock.resume(self.shared.clock.now());
        inner.state = SessionState::Active;
        info!("run_tracker: [Controller] Resumed");
        Ok(())
    }

    /// Finish the session and return the kilocalories burned.
    ///
    /// Calories use the last known pace and the active (pause-excluded) time.
    /// If the store rejects the write the session stays open and `finish` may
    /// be retried; once it succeeds, further calls fail with `NoActiveSession`.
    /// A weight that is not a positive number is rejected before anything is
    /// written.
    pub async fn finish(&self, weight_kg: f64) -> Result<u32> {
        validate_weight(weight_kg)?;
        let mut inner = self.shared.inner.lock().await;
        if !inner.is_open() {
            return Err(TrackerError::NoActiveSession);
        }
        let Some(run) = inner.run.clone() else {
            return Err(TrackerError::NoActiveSession);
        };

        let now = self.shared.clock.now();
        let elapsed = inner.clock.elapsed_active_seconds(now);
        let total_meters = inner.distance.total_meters();
        let kcal = estimate_kcal(run.activity_type, run.pace, elapsed, weight_kg);

        let written = self
            .shared
            .store
            .update_session_progress(run.session_id, total_meters, elapsed, run.pace)
            .and_then(|()| self.shared.store.finish_session(run.session_id, now, kcal));
        if let Err(e) = written {
            if matches!(e, TrackerError::NoActiveSession) {
                warn!(
                    "run_tracker: [Controller] Session {} was closed outside this controller, releasing it",
                    run.session_id
                );
                let subscription = inner.abandon();
                drop(inner);
                if let Some(subscription) = subscription {
                    subscription.shutdown().await;
                }
            }
            return Err(e);
        }

        inner.clock.stop(now);
        inner.state = SessionState::Finished;
        inner.final_kcal = Some(kcal);
        inner.claim = None;
        inner.gps = GpsStatus::Stopped;
        if let Some(r) = inner.run.as_mut() {
            r.persistence_lagging = false;
        }
        let subscription = inner.detach();
        drop(inner);
        if let Some(subscription) = subscription {
            subscription.shutdown().await;
        }

        info!(
            "run_tracker: [Controller] Finished session {}: {:.1}m in {}s, {} kcal",
            run.session_id, total_meters, elapsed, kcal
        );
        Ok(kcal)
    }

    /// Feed one fix directly, bypassing the subscription.
    ///
    /// Invalid fixes fail with `InvalidFix`. A persistence failure is returned
    /// after the in-memory totals have already been updated.
    pub async fn ingest_fix(&self, fix: PositionFix) -> Result<FixOutcome> {
        let mut inner = self.shared.inner.lock().await;
        self.shared.process_fix(&mut inner, fix)
    }

    /// Open a fresh subscription after the source failed.
    pub async fn resubscribe(&self) -> Result<()> {
        let mut inner = self.shared.inner.lock().await;
        if !inner.is_open() {
            return Err(TrackerError::NoActiveSession);
        }
        let previous = self.subscribe_locked(&mut inner);
        drop(inner);
        if let Some(previous) = previous {
            previous.shutdown().await;
        }
        info!("run_tracker: [Controller] Resubscribed to position source");
        Ok(())
    }

    /// Stop consuming fixes (explicit stop or permission revocation).
    ///
    /// The session stays open; when this returns no further fix is processed.
    pub async fn stop_location_updates(&self) {
        let mut inner = self.shared.inner.lock().await;
        let subscription = inner.detach();
        if inner.is_open() {
            inner.gps = GpsStatus::Stopped;
        }
        drop(inner);
        if let Some(subscription) = subscription {
            subscription.shutdown().await;
            info!("run_tracker: [Controller] Location updates stopped");
        }
    }

    pub async fn state(&self) -> SessionState {
        self.shared.inner.lock().await.state
    }

    pub async fn snapshot(&self) -> LiveStats {
        self.shared.snapshot().await
    }

    pub fn last_known_fix(&self) -> Option<PositionFix> {
        self.source.last_known_fix()
    }

    pub fn list_sessions(&self) -> Result<Vec<RunSession>> {
        self.shared.store.list_sessions()
    }

    /// Start the elapsed-time display tick.
    ///
    /// Publishes a [`LiveStats`] every `display_tick_ms`, independent of fix
    /// arrival. The tick only reads session state.
    pub async fn spawn_display_tick(&self) -> DisplayTicker {
        let (tx, rx) = watch::channel(self.shared.snapshot().await);
        let cancel = CancellationToken::new();
        let shared = Arc::clone(&self.shared);
        let token = cancel.clone();
        let period = Duration::from_millis(self.shared.config.display_tick_ms);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = shared.closed.cancelled() => break,
                    _ = ticker.tick() => {
                        if tx.send(shared.snapshot().await).is_err() {
                            break;
                        }
                    }
                }
            }
        });

        DisplayTicker {
            receiver: rx,
            cancel,
            task: Some(task),
        }
    }

    /// Replace the subscription. Returns the previous one for shutdown
    /// once the lock is released.
    fn subscribe_locked(&self, inner: &mut Inner) -> Option<Subscription> {
        let previous = inner.detach();
        if let Some(previous) = &previous {
            previous.cancel.cancel();
        }

        let stream = self.source.subscribe();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(pump_fixes(
            Arc::clone(&self.shared),
            stream,
            cancel.clone(),
            inner.generation,
        ));
        inner.subscription = Some(Subscription { cancel, task });
        inner.gps = GpsStatus::Streaming;
        previous
    }
}

impl Drop for RunSessionController {
    fn drop(&mut self) {
        self.shared.closed.cancel();
        // Background tasks exit on `closed`; if the lock is busy the claim is
        // released once they have dropped the shared state.
        if let Ok(mut inner) = self.shared.inner.try_lock() {
            inner.claim = None;
            if let Some(subscription) = inner.detach() {
                subscription.cancel.cancel();
            }
        }
    }
}

// ============================================================================
// Display Tick
// ============================================================================

/// Handle to the running display tick.
pub struct DisplayTicker {
    receiver: watch::Receiver<LiveStats>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl DisplayTicker {
    pub fn receiver(&self) -> watch::Receiver<LiveStats> {
        self.receiver.clone()
    }

    pub fn latest(&self) -> LiveStats {
        self.receiver.borrow().clone()
    }

    /// Wait for the next published value. `None` once the tick has stopped.
    pub async fn changed(&mut self) -> Option<LiveStats> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for DisplayTicker {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

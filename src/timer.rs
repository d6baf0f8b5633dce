//! The countdown clock driving question timers.
//!
//! One engine owns at most one tick task at a time. Every control operation
//! first cancels the pending task, then applies the matching state
//! transition, then (when appropriate) spawns a fresh task. Pause and
//! resume cycles therefore never produce short or doubled seconds, and no
//! tick can fire into a torn-down store.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::AbortHandle;
use tokio::time::sleep;
use tracing::debug;

use crate::channel::SnapshotHub;
use crate::state::{Command, GameState, SharedStore};

/// Notification emitted when the countdown reaches zero.
///
/// Fired exactly once per expiry; subscribers are optional and send errors
/// are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeUp;

/// Countdown engine bound to a store and a broadcast hub.
///
/// The clock's value lives in [`crate::state::TimerState`] inside the game
/// state; the engine only schedules the once-per-second decrement and the
/// control transitions, publishing every change it commits.
pub struct TimerEngine {
    store: SharedStore,
    hub: Arc<SnapshotHub>,
    tick_task: Mutex<Option<AbortHandle>>,
    time_up: broadcast::Sender<TimeUp>,
}

impl TimerEngine {
    /// Build an engine over the given store and hub. The clock starts idle.
    pub fn new(store: SharedStore, hub: Arc<SnapshotHub>) -> Self {
        let (time_up, _receiver) = broadcast::channel(4);
        Self {
            store,
            hub,
            tick_task: Mutex::new(None),
            time_up,
        }
    }

    /// Subscribe to expiry notifications.
    pub fn subscribe_time_up(&self) -> broadcast::Receiver<TimeUp> {
        self.time_up.subscribe()
    }

    /// Arm the clock at `seconds` without starting it. Cancels any running
    /// countdown.
    pub async fn set_initial(&self, seconds: u32) -> GameState {
        self.cancel_tick_task();
        let next = self.store.apply(Command::TimerArmed { seconds }).await;
        self.hub.publish_state(&next);
        next
    }

    /// Start a countdown of `seconds` immediately. Restarting cancels the
    /// previous countdown first, so there is only ever one tick task.
    pub async fn start(&self, seconds: u32) -> GameState {
        self.cancel_tick_task();
        let next = self.store.apply(Command::TimerStarted { seconds }).await;
        self.hub.publish_state(&next);
        if next.timer.is_active {
            self.spawn_tick_task();
        }
        next
    }

    /// Pause a running countdown; a no-op in any other state.
    pub async fn pause(&self) -> GameState {
        let running = self.store.read(|state| state.timer.is_active).await;
        if !running {
            return self.store.snapshot().await;
        }

        self.cancel_tick_task();
        let next = self.store.apply(Command::TimerPaused).await;
        self.hub.publish_state(&next);
        next
    }

    /// Resume a paused countdown; a no-op unless paused with time remaining.
    ///
    /// A fresh tick task is spawned, so the first decrement lands a full
    /// second after resuming; a stale, partially elapsed delay is never
    /// reused.
    pub async fn resume(&self) -> GameState {
        let resumable = self
            .store
            .read(|state| !state.timer.is_active && state.timer.time_remaining > 0)
            .await;
        if !resumable {
            return self.store.snapshot().await;
        }

        self.cancel_tick_task();
        let next = self.store.apply(Command::TimerResumed).await;
        self.hub.publish_state(&next);
        if next.timer.is_active {
            self.spawn_tick_task();
        }
        next
    }

    /// Stop the countdown and return the clock to its initial value.
    pub async fn reset(&self) -> GameState {
        self.cancel_tick_task();
        let next = self.store.apply(Command::TimerReset).await;
        self.hub.publish_state(&next);
        next
    }

    /// Cancel the tick task. Called on teardown so a pending tick can never
    /// fire into a disposed store; also invoked by [`Drop`].
    pub fn shutdown(&self) {
        self.cancel_tick_task();
    }

    fn cancel_tick_task(&self) {
        let handle = self
            .tick_task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }
    }

    fn spawn_tick_task(&self) {
        let store = self.store.clone();
        let hub = self.hub.clone();
        let time_up = self.time_up.clone();

        let task = tokio::spawn(async move {
            loop {
                sleep(Duration::from_secs(1)).await;

                let next = store.apply(Command::TimerTicked).await;
                hub.publish_state(&next);

                if next.timer.is_active {
                    continue;
                }
                if next.timer.time_remaining == 0 && next.timer.initial_time > 0 {
                    debug!("countdown expired");
                    let _ = time_up.send(TimeUp);
                }
                break;
            }
        });

        let mut slot = self
            .tick_task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = Some(task.abort_handle());
    }
}

impl Drop for TimerEngine {
    fn drop(&mut self) {
        self.cancel_tick_task();
    }
}

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::Stream;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch};
use tokio::task::AbortHandle;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::channel::{
    DisplayRequest, GAME_STATE_UPDATE, ReverseMessage, ReverseSender, SnapshotHub, WireMessage,
};
use crate::state::GameState;

/// Identifier of one opened display surface.
pub type DisplayId = Uuid;

/// What the display currently knows.
///
/// A display starts out waiting, a distinct state the renderer must show
/// instead of a default empty game, and becomes connected on the first
/// accepted snapshot. The connected copy is wholly replaced on every
/// receipt, never merged.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayModel {
    /// No snapshot accepted yet.
    Waiting,
    /// Latest accepted snapshot.
    Connected(GameState),
}

/// Receiving end of the broadcast channel: the player display's local state.
///
/// The endpoint owns a forwarder task that drains the hub subscription,
/// verifies the sender origin, and replaces the local model. Renderers
/// observe the model through a watch channel, so only the latest snapshot
/// ever matters and missed intermediates are invisible.
pub struct DisplayEndpoint {
    id: DisplayId,
    origin: Uuid,
    model: watch::Receiver<DisplayModel>,
    requests: ReverseSender,
    closed: Arc<AtomicBool>,
    task: AbortHandle,
}

impl DisplayEndpoint {
    /// Open a display against `hub`, announcing readiness on `requests`.
    ///
    /// The ready signal fires exactly once, before any snapshot can be
    /// accepted, so a console that answers it with a push closes the race
    /// where a freshly opened display would otherwise wait for the next
    /// unrelated mutation.
    pub fn open(hub: &SnapshotHub, requests: ReverseSender) -> Self {
        let id = Uuid::new_v4();
        let origin = hub.origin();
        let receiver = hub.subscribe();
        let (model_tx, model_rx) = watch::channel(DisplayModel::Waiting);
        let closed = Arc::new(AtomicBool::new(false));

        let _ = requests.send(ReverseMessage {
            origin,
            request: DisplayRequest::PlayerViewReady,
        });

        let task =
            tokio::spawn(forward(id, origin, receiver, model_tx, closed.clone())).abort_handle();

        Self {
            id,
            origin,
            model: model_rx,
            requests,
            closed,
            task,
        }
    }

    /// Identifier of this display surface.
    pub fn id(&self) -> DisplayId {
        self.id
    }

    /// Whether the display has been torn down, from either side.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Watch handle for the local model; renderers await changes on it.
    pub fn model(&self) -> watch::Receiver<DisplayModel> {
        self.model.clone()
    }

    /// Copy of the current local model.
    pub fn current(&self) -> DisplayModel {
        self.model.borrow().clone()
    }

    /// The model as an async stream, yielding the latest value on change.
    pub fn model_stream(&self) -> impl Stream<Item = DisplayModel> + use<> {
        WatchStream::new(self.model.clone())
    }

    /// Relay the player-side scoreboard dismiss gesture to the console.
    ///
    /// The local copy is not touched; the console answers with an ordinary
    /// state broadcast like any other transition.
    pub fn hide_scoreboard(&self) {
        let _ = self.requests.send(ReverseMessage {
            origin: self.origin,
            request: DisplayRequest::HideScoreboard,
        });
    }

    /// Tear the display down. Idempotent, and never an error even when the
    /// other side already closed it.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.task.abort();
            info!(display = %self.id, "display closed");
        }
    }
}

impl Drop for DisplayEndpoint {
    fn drop(&mut self) {
        self.close();
    }
}

/// Forwarder: drain the hub subscription into the local model.
///
/// Foreign origins, unknown events, and undecodable payloads are dropped
/// silently; lag only skips intermediates the full-replace protocol never
/// needed anyway.
async fn forward(
    id: DisplayId,
    expected_origin: Uuid,
    mut receiver: broadcast::Receiver<WireMessage>,
    model: watch::Sender<DisplayModel>,
    closed: Arc<AtomicBool>,
) {
    loop {
        match receiver.recv().await {
            Ok(message) => {
                if message.origin != expected_origin {
                    debug!(display = %id, origin = %message.origin, "dropping message from unexpected origin");
                    continue;
                }
                if message.event != GAME_STATE_UPDATE {
                    debug!(display = %id, event = %message.event, "ignoring unknown event");
                    continue;
                }
                match serde_json::from_str::<GameState>(&message.data) {
                    Ok(state) => {
                        model.send_replace(DisplayModel::Connected(state));
                    }
                    Err(err) => {
                        warn!(display = %id, error = %err, "dropping undecodable snapshot")
                    }
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                debug!(display = %id, skipped, "skipped stale snapshots");
                continue;
            }
            Err(RecvError::Closed) => break,
        }
    }

    closed.store(true, Ordering::SeqCst);
    info!(display = %id, "display stream ended");
}

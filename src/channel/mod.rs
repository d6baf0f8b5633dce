//! One-way broadcast of [`GameState`] snapshots from the console to any
//! number of player displays, plus the narrow reverse channel for
//! player-side requests.
//!
//! The transport is an in-process message channel: the console serializes
//! the entire state on every mutation and fires it into a broadcast hub
//! with no acknowledgement and no subscriber requirement. Displays replace
//! their whole local copy on each accepted message, so duplicated or
//! coalesced deliveries are harmless.

pub mod display;

use serde::Serialize;
use tokio::sync::{broadcast, mpsc};
use tracing::warn;
use uuid::Uuid;

use crate::state::GameState;

pub use self::display::{DisplayEndpoint, DisplayId, DisplayModel};

/// Event tag carried by full-state snapshot messages.
pub const GAME_STATE_UPDATE: &str = "GAME_STATE_UPDATE";

/// Identity of the trusted message source. Both directions of the channel
/// are stamped with it, and receivers silently drop anything else.
pub type ChannelOrigin = Uuid;

/// Envelope dispatched from the console to the displays.
///
/// `data` is the payload pre-serialized to JSON, so every subscriber gets
/// the exact same bytes regardless of when it deserializes them.
#[derive(Debug, Clone)]
pub struct WireMessage {
    /// Identity of the sending console.
    pub origin: ChannelOrigin,
    /// Event tag, e.g. [`GAME_STATE_UPDATE`].
    pub event: String,
    /// JSON-serialized payload.
    pub data: String,
}

impl WireMessage {
    /// Serialize `payload` into an envelope tagged with `event`.
    pub fn json<T: Serialize>(
        origin: ChannelOrigin,
        event: &str,
        payload: &T,
    ) -> serde_json::Result<Self> {
        Ok(Self {
            origin,
            event: event.to_string(),
            data: serde_json::to_string(payload)?,
        })
    }
}

/// A player-side request relayed back to the console.
///
/// The display never mutates game state itself; these are the only gestures
/// it may express, and the console interprets them as ordinary transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayRequest {
    /// Fired once when a display finishes mounting, so the console can push
    /// the current snapshot instead of waiting for the next mutation.
    PlayerViewReady,
    /// The player-side scoreboard dismiss gesture.
    HideScoreboard,
}

/// Reverse-channel envelope, origin-stamped like the forward direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReverseMessage {
    /// Identity the display believes it shares with the console.
    pub origin: ChannelOrigin,
    /// The relayed request.
    pub request: DisplayRequest,
}

/// Sender half handed to display endpoints for the reverse channel.
pub type ReverseSender = mpsc::UnboundedSender<ReverseMessage>;

/// Receiver half drained by the console.
pub type ReverseReceiver = mpsc::UnboundedReceiver<ReverseMessage>;

/// Broadcast hub publishing state snapshots to every subscribed display.
///
/// Sends are fire-and-forget: delivery errors (no subscriber, lagged
/// receivers) are ignored, so the console stays fully usable with zero
/// displays open.
pub struct SnapshotHub {
    origin: ChannelOrigin,
    sender: broadcast::Sender<WireMessage>,
}

impl SnapshotHub {
    /// Construct a hub with a fresh origin identity and the given channel
    /// capacity. Lagged subscribers skip to newer messages; the display
    /// only ever renders the latest snapshot anyway.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self {
            origin: Uuid::new_v4(),
            sender,
        }
    }

    /// The identity stamped on every outbound message.
    pub fn origin(&self) -> ChannelOrigin {
        self.origin
    }

    /// Register a new subscriber that will receive subsequent snapshots.
    pub fn subscribe(&self) -> broadcast::Receiver<WireMessage> {
        self.sender.subscribe()
    }

    /// Serialize and publish a full state snapshot, ignoring delivery errors.
    pub fn publish_state(&self, state: &GameState) {
        match WireMessage::json(self.origin, GAME_STATE_UPDATE, state) {
            Ok(message) => {
                let _ = self.sender.send(message);
            }
            Err(err) => warn!(error = %err, "failed to serialize state snapshot"),
        }
    }

    /// Publish a pre-built envelope as-is, ignoring delivery errors.
    pub fn publish_raw(&self, message: WireMessage) {
        let _ = self.sender.send(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publishing_without_subscribers_is_harmless() {
        let hub = SnapshotHub::new(8);
        for _ in 0..50 {
            hub.publish_state(&GameState::new());
        }
    }

    #[tokio::test]
    async fn subscribers_receive_serialized_snapshots() {
        let hub = SnapshotHub::new(8);
        let mut receiver = hub.subscribe();

        hub.publish_state(&GameState::new());

        let message = receiver.recv().await.expect("snapshot");
        assert_eq!(message.event, GAME_STATE_UPDATE);
        assert_eq!(message.origin, hub.origin());
        let decoded: GameState = serde_json::from_str(&message.data).expect("valid JSON");
        assert_eq!(decoded, GameState::new());
    }
}

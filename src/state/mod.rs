//! Authoritative game state: the data model, the command reducer, and the
//! store that owns the single live [`GameState`] value.

pub mod command;
pub mod game;

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

pub use self::command::{Command, reduce};
pub use self::game::{
    AnswerMode, Difficulty, GamePhase, GameState, Player, Question, ScoreboardMode, Team,
    TeamPatch, TimerState,
};

/// Cheaply cloneable handle to a [`GameStore`].
pub type SharedStore = Arc<GameStore>;

/// Owner of the single authoritative [`GameState`].
///
/// Commands are applied atomically under a write lock, each producing a
/// brand-new state value; readers never observe a partial update. The store
/// itself performs no I/O; broadcasting the result is the caller's job.
/// Stores are plain instances, so tests can construct as many isolated ones
/// as they need.
#[derive(Debug, Default)]
pub struct GameStore {
    state: RwLock<GameState>,
}

impl GameStore {
    /// Create a store holding a fresh [`GameState`], wrapped for sharing.
    pub fn new() -> SharedStore {
        Arc::new(Self::default())
    }

    /// Create a store seeded with an existing state.
    pub fn with_state(state: GameState) -> SharedStore {
        Arc::new(Self {
            state: RwLock::new(state),
        })
    }

    /// Apply one command and return a copy of the resulting state.
    pub async fn apply(&self, command: Command) -> GameState {
        let mut guard = self.state.write().await;
        debug!(?command, "applying command");
        *guard = reduce(&guard, command);
        guard.clone()
    }

    /// Copy of the current state.
    pub async fn snapshot(&self) -> GameState {
        self.state.read().await.clone()
    }

    /// Run a closure against the current state without cloning it.
    pub async fn read<T>(&self, f: impl FnOnce(&GameState) -> T) -> T {
        let guard = self.state.read().await;
        f(&guard)
    }

    /// Replace the whole state, returning a copy of the new value. Used when
    /// the operator starts a new game from scratch.
    pub async fn replace(&self, state: GameState) -> GameState {
        let mut guard = self.state.write().await;
        *guard = state;
        guard.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn apply_returns_the_committed_state() {
        let store = GameStore::new();
        let state = store
            .apply(Command::AddPlayer(Player::named("Alice")))
            .await;
        assert_eq!(state.players.len(), 1);
        assert_eq!(store.snapshot().await, state);
    }

    #[tokio::test]
    async fn stores_are_isolated_instances() {
        let first = GameStore::new();
        let second = GameStore::new();
        first
            .apply(Command::UpdateScore {
                name: "Alice".into(),
                delta: 1,
            })
            .await;
        assert_eq!(second.snapshot().await, GameState::new());
    }
}

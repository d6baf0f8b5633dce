//! The game master console: sole writer of the authoritative state.
//!
//! Every operator gesture goes through here, is applied as one or more
//! store commands, and the resulting snapshot is broadcast to whatever
//! displays happen to be listening. The console is fully usable with zero
//! displays open.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{debug, info};
use uuid::Uuid;

use crate::channel::{
    DisplayEndpoint, DisplayId, DisplayRequest, ReverseReceiver, ReverseSender, SnapshotHub,
};
use crate::error::ServiceError;
use crate::services::scoring::{self, Award, AwardTarget};
use crate::state::{
    AnswerMode, Command, GamePhase, GameState, GameStore, Player, Question, ScoreboardMode,
    SharedStore, Team, TeamPatch,
};
use crate::timer::TimerEngine;

/// Broadcast channel capacity; lagged displays skip to newer snapshots.
const HUB_CAPACITY: usize = 16;

/// The operator-facing control surface.
///
/// Owns the store, the broadcast hub, the timer engine, and the registry of
/// open displays. Must be created inside a Tokio runtime (it spawns the
/// reverse-channel drain task).
pub struct Console {
    store: SharedStore,
    hub: Arc<SnapshotHub>,
    timer: TimerEngine,
    displays: DashMap<DisplayId, Arc<DisplayEndpoint>>,
    reverse_tx: ReverseSender,
    drain_task: AbortHandle,
}

impl Console {
    /// Build a console with a fresh store and channel.
    pub fn new() -> Self {
        let store = GameStore::new();
        let hub = Arc::new(SnapshotHub::new(HUB_CAPACITY));
        let timer = TimerEngine::new(store.clone(), hub.clone());
        let (reverse_tx, reverse_rx) = mpsc::unbounded_channel();
        let drain_task =
            tokio::spawn(drain_requests(store.clone(), hub.clone(), reverse_rx)).abort_handle();

        Self {
            store,
            hub,
            timer,
            displays: DashMap::new(),
            reverse_tx,
            drain_task,
        }
    }

    /// Apply one command and broadcast the committed state.
    async fn commit(&self, command: Command) -> GameState {
        let next = self.store.apply(command).await;
        self.hub.publish_state(&next);
        next
    }

    /// Copy of the current authoritative state.
    pub async fn snapshot(&self) -> GameState {
        self.store.snapshot().await
    }

    /// The countdown engine. Its operations broadcast like any other
    /// mutation.
    pub fn timer(&self) -> &TimerEngine {
        &self.timer
    }

    /// Register a player. A duplicate name is a no-op; preventing the
    /// collision up front is the caller's responsibility.
    pub async fn add_player(&self, player: Player) -> GameState {
        self.commit(Command::AddPlayer(player)).await
    }

    /// Remove a player, cascading through team rosters.
    pub async fn remove_player(&self, name: impl Into<String>) -> GameState {
        self.commit(Command::RemovePlayer(name.into())).await
    }

    /// Create a team.
    pub async fn add_team(&self, team: Team) -> GameState {
        self.commit(Command::AddTeam(team)).await
    }

    /// Delete a team; an unknown id is a no-op.
    pub async fn remove_team(&self, id: Uuid) -> GameState {
        self.commit(Command::RemoveTeam(id)).await
    }

    /// Rename, recolor, or re-roster a team.
    pub async fn update_team(&self, id: Uuid, patch: TeamPatch) -> GameState {
        self.commit(Command::UpdateTeam { id, patch }).await
    }

    /// Replace the question bank wholesale.
    pub async fn load_questions(&self, questions: Vec<Question>) -> GameState {
        self.commit(Command::LoadQuestions(questions)).await
    }

    /// Change the operator's working question selection.
    pub async fn set_current_question(&self, question: Option<Question>) -> GameState {
        self.commit(Command::SetCurrentQuestion(question)).await
    }

    /// Publish a question to the displays, re-arming the clock from its
    /// suggested timer.
    pub async fn send_question_to_players(&self, question: Question) -> GameState {
        self.commit(Command::SendQuestionToPlayers(question)).await
    }

    /// Blank the displayed question without touching timer or scores.
    pub async fn clear_player_view(&self) -> GameState {
        self.commit(Command::ClearPlayerView).await
    }

    /// Add a signed delta to the ledger entry for `name`.
    pub async fn update_score(&self, name: impl Into<String>, delta: i64) -> GameState {
        self.commit(Command::UpdateScore {
            name: name.into(),
            delta,
        })
        .await
    }

    /// Resolve an award gesture against the current mode and selections and
    /// apply the resulting delta. The store is untouched when the gesture
    /// cannot be satisfied.
    pub async fn award(&self, target: &AwardTarget, award: Award) -> Result<GameState, ServiceError> {
        let state = self.store.snapshot().await;
        let delta = scoring::resolve_award(&state, target, award)?;
        debug!(name = %delta.name, delta = delta.delta, "awarding points");
        Ok(self
            .commit(Command::UpdateScore {
                name: delta.name,
                delta: delta.delta,
            })
            .await)
    }

    /// Change the lifecycle phase.
    pub async fn set_phase(&self, phase: GamePhase) -> GameState {
        self.commit(Command::SetPhase(phase)).await
    }

    /// Switch the answer mode, atomically clearing every selection.
    pub async fn set_answer_mode(&self, mode: AnswerMode) -> GameState {
        self.commit(Command::SetAnswerMode(mode)).await
    }

    /// Select (or clear) the answerer.
    pub async fn set_selected_answerer(&self, name: Option<String>) -> GameState {
        self.commit(Command::SetSelectedAnswerer(name)).await
    }

    /// Select the duel opponents.
    pub async fn set_selected_opponents(
        &self,
        first: Option<String>,
        second: Option<String>,
    ) -> GameState {
        self.commit(Command::SetSelectedOpponents { first, second })
            .await
    }

    /// Clear both duel opponents.
    pub async fn clear_selected_opponents(&self) -> GameState {
        self.commit(Command::ClearSelectedOpponents).await
    }

    /// Replace one team's nominated champions.
    pub async fn set_selected_champions(
        &self,
        team: impl Into<String>,
        champions: Vec<String>,
    ) -> GameState {
        self.commit(Command::SetSelectedChampions {
            team: team.into(),
            champions,
        })
        .await
    }

    /// Drop every nominated champion.
    pub async fn clear_selected_champions(&self) -> GameState {
        self.commit(Command::ClearSelectedChampions).await
    }

    /// Change what the displays may show on their scoreboard.
    pub async fn set_scoreboard_mode(&self, mode: ScoreboardMode) -> GameState {
        self.commit(Command::SetScoreboardMode(mode)).await
    }

    /// Throw away the entire state and start a new game from setup.
    pub async fn start_new_game(&self) -> GameState {
        info!("starting a new game");
        self.timer.shutdown();
        let next = self.store.replace(GameState::new()).await;
        self.hub.publish_state(&next);
        next
    }

    /// Open the player display, or refocus the existing one.
    ///
    /// Idempotent from the console's perspective: while a live display
    /// exists, re-invoking returns it instead of duplicating. A display the
    /// operator closed behind our back is swept out first.
    pub fn open_display(&self) -> Arc<DisplayEndpoint> {
        self.displays.retain(|_, display| !display.is_closed());

        if let Some(entry) = self.displays.iter().next() {
            debug!(display = %entry.key(), "refocusing existing display");
            return entry.value().clone();
        }

        let display = Arc::new(DisplayEndpoint::open(&self.hub, self.reverse_tx.clone()));
        let display_id = display.id();
        info!(display = %display_id, "opened player display");
        self.displays.insert(display_id, display.clone());
        display
    }

    /// Close any open display. Never an error, even when the display was
    /// already closed from the other side.
    pub fn close_display(&self) {
        for entry in self.displays.iter() {
            entry.value().close();
        }
        self.displays.clear();
    }

    /// Whether a live display is currently attached.
    pub fn has_open_display(&self) -> bool {
        self.displays
            .iter()
            .any(|entry| !entry.value().is_closed())
    }

    /// Tear down the console: stop the clock, stop draining requests, close
    /// the displays.
    pub fn shutdown(&self) {
        self.timer.shutdown();
        self.drain_task.abort();
        self.close_display();
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Console {
    fn drop(&mut self) {
        self.drain_task.abort();
    }
}

/// Handle player-side requests arriving on the reverse channel.
///
/// Requests are interpreted as ordinary transitions; the display never
/// mutates shared state directly. Anything from an unexpected origin is
/// dropped silently.
async fn drain_requests(store: SharedStore, hub: Arc<SnapshotHub>, mut requests: ReverseReceiver) {
    let expected_origin = hub.origin();

    while let Some(message) = requests.recv().await {
        if message.origin != expected_origin {
            debug!(origin = %message.origin, "dropping reverse message from unexpected origin");
            continue;
        }

        match message.request {
            DisplayRequest::PlayerViewReady => {
                // Push the current snapshot so a freshly opened display does
                // not wait for the next unrelated mutation.
                debug!("display ready, pushing current snapshot");
                hub.publish_state(&store.snapshot().await);
            }
            DisplayRequest::HideScoreboard => {
                let next = store
                    .apply(Command::SetScoreboardMode(ScoreboardMode::Hidden))
                    .await;
                hub.publish_state(&next);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::DisplayModel;
    use crate::state::Difficulty;

    fn question(title: &str, timer: Option<u32>) -> Question {
        Question {
            title: title.into(),
            content: "?".into(),
            answer: "!".into(),
            difficulty: Difficulty::Easy,
            tags: vec![],
            targets: None,
            timer,
            photo: None,
        }
    }

    async fn wait_for_model(
        display: &DisplayEndpoint,
        predicate: impl Fn(&GameState) -> bool,
    ) -> GameState {
        let mut model = display.model();
        loop {
            if let DisplayModel::Connected(state) = &*model.borrow() {
                if predicate(state) {
                    return state.clone();
                }
            }
            model.changed().await.expect("model alive");
        }
    }

    #[tokio::test]
    async fn mutations_without_any_display_never_fail() {
        let console = Console::new();
        for round in 0..50 {
            console.update_score("Alice", 1).await;
            console.set_phase(GamePhase::Ongoing).await;
            if round % 10 == 0 {
                console.set_answer_mode(AnswerMode::Duel).await;
            }
        }
        assert_eq!(console.snapshot().await.score_of("Alice"), 50);
    }

    #[tokio::test]
    async fn late_display_receives_the_current_state_not_a_replay() {
        let console = Console::new();
        for _ in 0..50 {
            console.update_score("Alice", 1).await;
        }

        let display = console.open_display();
        // The ready push alone must bring the display fully up to date.
        let state = wait_for_model(&display, |s| s.score_of("Alice") == 50).await;
        assert_eq!(state, console.snapshot().await);
    }

    #[tokio::test]
    async fn open_display_refocuses_instead_of_duplicating() {
        let console = Console::new();
        let first = console.open_display();
        let second = console.open_display();
        assert_eq!(first.id(), second.id());

        first.close();
        let third = console.open_display();
        assert_ne!(first.id(), third.id());
    }

    #[tokio::test]
    async fn close_display_tolerates_an_already_closed_window() {
        let console = Console::new();
        let display = console.open_display();
        // The operator closes the window behind the console's back.
        display.close();

        console.close_display();
        assert!(!console.has_open_display());
    }

    #[tokio::test]
    async fn hide_scoreboard_request_becomes_an_ordinary_transition() {
        let console = Console::new();
        console.set_scoreboard_mode(ScoreboardMode::Players).await;

        let display = console.open_display();
        wait_for_model(&display, |s| s.scoreboard_mode == ScoreboardMode::Players).await;

        display.hide_scoreboard();
        let state = wait_for_model(&display, |s| s.scoreboard_mode == ScoreboardMode::Hidden).await;
        assert_eq!(state.scoreboard_mode, ScoreboardMode::Hidden);
        assert_eq!(
            console.snapshot().await.scoreboard_mode,
            ScoreboardMode::Hidden
        );
    }

    #[tokio::test]
    async fn award_goes_through_the_ledger_only() {
        let console = Console::new();
        console
            .set_current_question(Some(question("Q1", None)))
            .await;
        console
            .set_selected_answerer(Some("Alice".into()))
            .await;

        let state = console
            .award(&AwardTarget::Answerer, Award::Correct)
            .await
            .unwrap();
        assert_eq!(state.score_of("Alice"), 1);

        let err = console
            .award(&AwardTarget::Opponent(crate::services::scoring::OpponentSlot::First), Award::Wrong)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
        // The failed gesture left the ledger alone.
        assert_eq!(console.snapshot().await.score_of("Alice"), 1);
    }

    #[tokio::test]
    async fn send_question_broadcast_carries_the_re_armed_clock() {
        let console = Console::new();
        console.timer().start(20).await;

        let display = console.open_display();
        console
            .send_question_to_players(question("Q1", Some(45)))
            .await;

        let state = wait_for_model(&display, |s| s.displayed_question.is_some()).await;
        assert_eq!(state.timer.time_remaining, 45);
        assert_eq!(state.timer.initial_time, 45);
        assert!(!state.timer.is_active);
    }

    #[tokio::test]
    async fn start_new_game_resets_everything() {
        let console = Console::new();
        console.add_player(Player::named("Alice")).await;
        console.update_score("Alice", 5).await;
        console.set_phase(GamePhase::Completed).await;

        let state = console.start_new_game().await;
        assert_eq!(state, GameState::new());
    }
}

use uuid::Uuid;

use crate::state::game::{
    AnswerMode, GamePhase, GameState, Player, Question, ScoreboardMode, Team, TeamPatch,
    TimerState,
};

/// A named transition applied to [`GameState`].
///
/// Commands are the only way state changes. Every variant is total: applying
/// it to any well-formed state yields a well-formed state, and references to
/// unknown names or ids degrade to a silent no-op. Duplicate-name and
/// team-color policing is left to callers.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Append a player; a duplicate name is a no-op.
    AddPlayer(Player),
    /// Remove a player and drop the name from every team roster.
    RemovePlayer(String),
    /// Append a team; a duplicate id is a no-op.
    AddTeam(Team),
    /// Remove a team by id.
    RemoveTeam(Uuid),
    /// Patch an existing team; absent fields keep their value.
    UpdateTeam {
        /// Target team id.
        id: Uuid,
        /// Fields to change.
        patch: TeamPatch,
    },
    /// Replace the question bank wholesale.
    LoadQuestions(Vec<Question>),
    /// Change the operator's working question selection.
    SetCurrentQuestion(Option<Question>),
    /// Publish a question to the player display. Always re-arms the clock
    /// from the question's suggested timer (zero when it has none); this
    /// coupling is part of the contract, not incidental.
    SendQuestionToPlayers(Question),
    /// Blank the player display without touching timer or scores.
    ClearPlayerView,
    /// Add `delta` (possibly negative) to the ledger entry for `name`.
    UpdateScore {
        /// Player or team name.
        name: String,
        /// Signed score change.
        delta: i64,
    },
    /// Change the lifecycle phase. Any ordering is accepted.
    SetPhase(GamePhase),
    /// Change the answer mode and atomically clear every selection field.
    SetAnswerMode(AnswerMode),
    /// Select (or clear) the answerer for individual/teams modes.
    SetSelectedAnswerer(Option<String>),
    /// Select the two opponents for duel modes.
    SetSelectedOpponents {
        /// First opponent slot.
        first: Option<String>,
        /// Second opponent slot.
        second: Option<String>,
    },
    /// Clear both opponent slots.
    ClearSelectedOpponents,
    /// Replace the champion list nominated by one team. An empty list drops
    /// the team's entry.
    SetSelectedChampions {
        /// Team display name.
        team: String,
        /// Replacement champion roster for that team.
        champions: Vec<String>,
    },
    /// Drop every nominated champion.
    ClearSelectedChampions,
    /// Change what the player display may show on its scoreboard.
    SetScoreboardMode(ScoreboardMode),
    /// Arm the clock at `seconds` without starting it. Cancels any running
    /// countdown as far as the state cells are concerned.
    TimerArmed {
        /// New initial value in seconds.
        seconds: u32,
    },
    /// Arm and immediately start the clock at `seconds`. Starting at zero
    /// yields an already-expired clock.
    TimerStarted {
        /// Countdown length in seconds.
        seconds: u32,
    },
    /// One tick of the running clock. A no-op while inactive; reaching zero
    /// forces the clock inactive.
    TimerTicked,
    /// Stop the clock, keeping the remaining time.
    TimerPaused,
    /// Restart a paused clock. A no-op unless time remains.
    TimerResumed,
    /// Return the clock to its initial value, stopped.
    TimerReset,
}

/// Apply `command` to `state`, producing the next state.
///
/// Pure and total: no I/O, no failure path. The caller is responsible for
/// publishing the result.
pub fn reduce(state: &GameState, command: Command) -> GameState {
    let mut next = state.clone();

    match command {
        Command::AddPlayer(player) => {
            if !next.players.iter().any(|p| p.name == player.name) {
                next.players.push(player);
            }
        }
        Command::RemovePlayer(name) => {
            next.players.retain(|p| p.name != name);
            for team in next.teams.values_mut() {
                team.players.retain(|p| p.name != name);
            }
        }
        Command::AddTeam(team) => {
            if !next.teams.contains_key(&team.id) {
                next.teams.insert(team.id, team);
            }
        }
        Command::RemoveTeam(id) => {
            next.teams.shift_remove(&id);
        }
        Command::UpdateTeam { id, patch } => {
            if let Some(team) = next.teams.get_mut(&id) {
                if let Some(name) = patch.name {
                    team.name = name;
                }
                if let Some(color) = patch.color {
                    team.color = color;
                }
                if let Some(players) = patch.players {
                    team.players = players;
                }
            }
        }
        Command::LoadQuestions(questions) => {
            next.questions = questions;
        }
        Command::SetCurrentQuestion(question) => {
            next.current_question = question;
        }
        Command::SendQuestionToPlayers(question) => {
            next.timer = TimerState::armed(question.timer.unwrap_or(0));
            next.displayed_question = Some(question);
        }
        Command::ClearPlayerView => {
            next.displayed_question = None;
        }
        Command::UpdateScore { name, delta } => {
            *next.scores.entry(name).or_insert(0) += delta;
        }
        Command::SetPhase(phase) => {
            next.phase = phase;
        }
        Command::SetAnswerMode(mode) => {
            next.answer_mode = mode;
            next.selected_answerer = None;
            next.selected_opponent1 = None;
            next.selected_opponent2 = None;
            next.selected_champions = None;
        }
        Command::SetSelectedAnswerer(name) => {
            next.selected_answerer = name.filter(|n| !n.is_empty());
        }
        Command::SetSelectedOpponents { first, second } => {
            next.selected_opponent1 = first.filter(|n| !n.is_empty());
            next.selected_opponent2 = second.filter(|n| !n.is_empty());
        }
        Command::ClearSelectedOpponents => {
            next.selected_opponent1 = None;
            next.selected_opponent2 = None;
        }
        Command::SetSelectedChampions { team, champions } => {
            let mut map = next.selected_champions.take().unwrap_or_default();
            if champions.is_empty() {
                map.shift_remove(&team);
            } else {
                map.insert(team, champions);
            }
            next.selected_champions = if map.is_empty() { None } else { Some(map) };
        }
        Command::ClearSelectedChampions => {
            next.selected_champions = None;
        }
        Command::SetScoreboardMode(mode) => {
            next.scoreboard_mode = mode;
        }
        Command::TimerArmed { seconds } => {
            next.timer = TimerState::armed(seconds);
        }
        Command::TimerStarted { seconds } => {
            next.timer = TimerState {
                is_active: seconds > 0,
                time_remaining: seconds,
                initial_time: seconds,
            };
        }
        Command::TimerTicked => {
            if next.timer.is_active {
                next.timer.time_remaining = next.timer.time_remaining.saturating_sub(1);
                if next.timer.time_remaining == 0 {
                    next.timer.is_active = false;
                }
            }
        }
        Command::TimerPaused => {
            next.timer.is_active = false;
        }
        Command::TimerResumed => {
            if next.timer.time_remaining > 0 {
                next.timer.is_active = true;
            }
        }
        Command::TimerReset => {
            next.timer.time_remaining = next.timer.initial_time;
            next.timer.is_active = false;
        }
    }

    next
}

//! Translation of award gestures into score deltas.
//!
//! The rules here only decide *who* gets *how many* points from a gesture;
//! applying the delta is a plain `updateScore` transition and nothing else.
//! Gestures that cannot be satisfied with the current mode and selections
//! are rejected before the store is touched.

use crate::error::ServiceError;
use crate::state::{AnswerMode, GameState};

/// The operator's award gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Award {
    /// Correct answer: worth the current question's difficulty in points.
    Correct,
    /// Wrong answer: a fixed one-point penalty, never difficulty-scaled.
    Wrong,
    /// Operator-entered amount, possibly negative.
    Custom(i64),
}

/// Which of the two duel slots a gesture targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpponentSlot {
    /// The first selected opponent.
    First,
    /// The second selected opponent.
    Second,
}

/// Who an award gesture is aimed at, before name resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AwardTarget {
    /// The single selected answerer (individual and teams modes).
    Answerer,
    /// One duel opponent, awarded independently of the other.
    Opponent(OpponentSlot),
    /// A team competing in champions mode, named directly.
    ChampionsTeam(String),
    /// Any player or team by name, bypassing mode rules. Backs the manual
    /// score-adjustment control.
    Manual(String),
}

/// A resolved award: the ledger name and the signed amount to add.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreDelta {
    /// Player or team name keying the ledger.
    pub name: String,
    /// Signed score change.
    pub delta: i64,
}

/// Resolve a gesture against the current state.
///
/// Scoring awards a *name*, not an entity reference; the same ledger backs
/// players and teams. Question `targets` exclusions are a UI-level filter
/// and are not enforced here.
pub fn resolve_award(
    state: &GameState,
    target: &AwardTarget,
    award: Award,
) -> Result<ScoreDelta, ServiceError> {
    let name = resolve_target(state, target)?;
    let delta = award_amount(state, award)?;
    Ok(ScoreDelta { name, delta })
}

fn resolve_target(state: &GameState, target: &AwardTarget) -> Result<String, ServiceError> {
    match target {
        AwardTarget::Answerer => {
            if !matches!(state.answer_mode, AnswerMode::Individual | AnswerMode::Teams) {
                return Err(ServiceError::InvalidState(format!(
                    "answer mode {:?} has no single answerer",
                    state.answer_mode
                )));
            }
            state
                .selected_answerer
                .clone()
                .ok_or_else(|| ServiceError::InvalidState("no answerer selected".into()))
        }
        AwardTarget::Opponent(slot) => {
            if !matches!(state.answer_mode, AnswerMode::Duel | AnswerMode::TeamsDuel) {
                return Err(ServiceError::InvalidState(format!(
                    "answer mode {:?} has no opponents",
                    state.answer_mode
                )));
            }
            let selected = match slot {
                OpponentSlot::First => &state.selected_opponent1,
                OpponentSlot::Second => &state.selected_opponent2,
            };
            selected
                .clone()
                .ok_or_else(|| ServiceError::InvalidState("opponent slot not selected".into()))
        }
        AwardTarget::ChampionsTeam(team) => {
            if state.answer_mode != AnswerMode::Champions {
                return Err(ServiceError::InvalidState(format!(
                    "answer mode {:?} has no champions",
                    state.answer_mode
                )));
            }
            // Eligible as soon as the team nominated at least one champion;
            // rosters of different sizes may score against each other.
            let eligible = state
                .selected_champions
                .as_ref()
                .and_then(|champions| champions.get(team))
                .is_some_and(|roster| !roster.is_empty());
            if !eligible {
                return Err(ServiceError::InvalidState(format!(
                    "team `{team}` has no champions selected"
                )));
            }
            Ok(team.clone())
        }
        AwardTarget::Manual(name) => {
            if name.is_empty() {
                return Err(ServiceError::InvalidInput("empty award target name".into()));
            }
            Ok(name.clone())
        }
    }
}

fn award_amount(state: &GameState, award: Award) -> Result<i64, ServiceError> {
    match award {
        Award::Correct => state
            .current_question
            .as_ref()
            .map(|question| question.difficulty.points())
            .ok_or_else(|| ServiceError::InvalidState("no current question".into())),
        Award::Wrong => Ok(-1),
        Award::Custom(points) => Ok(points),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::game::{Difficulty, Question};
    use crate::state::{Command, reduce};

    fn question(difficulty: Difficulty) -> Question {
        Question {
            title: "Q1".into(),
            content: "?".into(),
            answer: "!".into(),
            difficulty,
            tags: vec![],
            targets: None,
            timer: None,
            photo: None,
        }
    }

    fn state_with(commands: impl IntoIterator<Item = Command>) -> GameState {
        commands
            .into_iter()
            .fold(GameState::new(), |state, command| reduce(&state, command))
    }

    #[test]
    fn correct_awards_the_question_difficulty() {
        let state = state_with([
            Command::SetCurrentQuestion(Some(question(Difficulty::Medium))),
            Command::SetSelectedAnswerer(Some("Alice".into())),
        ]);

        let delta = resolve_award(&state, &AwardTarget::Answerer, Award::Correct).unwrap();
        assert_eq!(delta, ScoreDelta { name: "Alice".into(), delta: 2 });
    }

    #[test]
    fn wrong_is_a_fixed_penalty_regardless_of_difficulty() {
        let state = state_with([
            Command::SetCurrentQuestion(Some(question(Difficulty::Hard))),
            Command::SetSelectedAnswerer(Some("Alice".into())),
        ]);

        let delta = resolve_award(&state, &AwardTarget::Answerer, Award::Wrong).unwrap();
        assert_eq!(delta.delta, -1);
    }

    #[test]
    fn correct_without_a_current_question_is_rejected() {
        let state = state_with([Command::SetSelectedAnswerer(Some("Alice".into()))]);
        let err = resolve_award(&state, &AwardTarget::Answerer, Award::Correct).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[test]
    fn answerer_gesture_requires_a_selection() {
        let state = state_with([Command::SetCurrentQuestion(Some(question(Difficulty::Easy)))]);
        let err = resolve_award(&state, &AwardTarget::Answerer, Award::Correct).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[test]
    fn opponents_are_awarded_independently() {
        let state = state_with([
            Command::SetAnswerMode(AnswerMode::Duel),
            Command::SetSelectedOpponents {
                first: Some("Alice".into()),
                second: Some("Bob".into()),
            },
        ]);

        let first = resolve_award(&state, &AwardTarget::Opponent(OpponentSlot::First), Award::Custom(2))
            .unwrap();
        let second = resolve_award(&state, &AwardTarget::Opponent(OpponentSlot::Second), Award::Wrong)
            .unwrap();
        assert_eq!(first, ScoreDelta { name: "Alice".into(), delta: 2 });
        assert_eq!(second, ScoreDelta { name: "Bob".into(), delta: -1 });
    }

    #[test]
    fn opponent_gesture_outside_duel_modes_is_rejected() {
        let state = state_with([Command::SetSelectedOpponents {
            first: Some("Alice".into()),
            second: Some("Bob".into()),
        }]);
        // Mode is still individual.
        let err = resolve_award(&state, &AwardTarget::Opponent(OpponentSlot::First), Award::Wrong)
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[test]
    fn champions_team_needs_at_least_one_champion() {
        let state = state_with([
            Command::SetAnswerMode(AnswerMode::Champions),
            Command::SetSelectedChampions {
                team: "Red".into(),
                champions: vec!["Alice".into()],
            },
        ]);

        let delta =
            resolve_award(&state, &AwardTarget::ChampionsTeam("Red".into()), Award::Custom(3))
                .unwrap();
        assert_eq!(delta.name, "Red");

        let err = resolve_award(&state, &AwardTarget::ChampionsTeam("Blue".into()), Award::Custom(3))
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[test]
    fn champions_rosters_may_have_unequal_sizes() {
        let state = state_with([
            Command::SetAnswerMode(AnswerMode::Champions),
            Command::SetSelectedChampions {
                team: "Red".into(),
                champions: vec!["Alice".into()],
            },
            Command::SetSelectedChampions {
                team: "Blue".into(),
                champions: vec!["Bob".into(), "Carol".into(), "Dan".into()],
            },
        ]);

        assert!(resolve_award(&state, &AwardTarget::ChampionsTeam("Red".into()), Award::Custom(1)).is_ok());
        assert!(resolve_award(&state, &AwardTarget::ChampionsTeam("Blue".into()), Award::Custom(1)).is_ok());
    }

    #[test]
    fn manual_adjustment_targets_any_name() {
        let state = GameState::new();
        let delta =
            resolve_award(&state, &AwardTarget::Manual("Whoever".into()), Award::Custom(-5))
                .unwrap();
        assert_eq!(delta, ScoreDelta { name: "Whoever".into(), delta: -5 });
    }
}

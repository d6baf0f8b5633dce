use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use uuid::Uuid;

/// A contestant known to the console.
///
/// The name doubles as the unique key: the score ledger, team rosters, and
/// every selection field reference players by name, never by index.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Display name, unique across the roster.
    pub name: String,
    /// Optional URI of a profile picture rendered by the display surfaces.
    pub profile_picture: Option<String>,
}

impl Player {
    /// Build a player without a profile picture.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            profile_picture: None,
        }
    }
}

/// A team of players competing under a shared name and color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    /// Opaque identifier generated at creation.
    pub id: Uuid,
    /// Display name, used as the team's key in the score ledger.
    pub name: String,
    /// Current roster. Names here always reference existing players; removing
    /// a player also removes them from every roster.
    pub players: Vec<Player>,
    /// Display color, typically drawn from the configured palette. Uniqueness
    /// across teams is advisory and never enforced by the store.
    pub color: String,
}

impl Team {
    /// Build a team with a freshly generated identifier.
    pub fn new(name: impl Into<String>, players: Vec<Player>, color: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            players,
            color: color.into(),
        }
    }
}

/// Partial update applied to an existing team; absent fields are untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamPatch {
    /// New display name.
    pub name: Option<String>,
    /// New display color.
    pub color: Option<String>,
    /// Replacement roster (replaces, does not merge).
    pub players: Option<Vec<Player>>,
}

/// Question difficulty on the fixed 1–3 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Difficulty {
    /// Worth one point.
    Easy,
    /// Worth two points.
    Medium,
    /// Worth three points.
    Hard,
}

impl Difficulty {
    /// Points awarded for a correct answer at this difficulty.
    pub fn points(self) -> i64 {
        match self {
            Difficulty::Easy => 1,
            Difficulty::Medium => 2,
            Difficulty::Hard => 3,
        }
    }
}

impl TryFrom<u8> for Difficulty {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Difficulty::Easy),
            2 => Ok(Difficulty::Medium),
            3 => Ok(Difficulty::Hard),
            other => Err(format!("difficulty must be 1, 2 or 3 (got {other})")),
        }
    }
}

impl From<Difficulty> for u8 {
    fn from(value: Difficulty) -> Self {
        match value {
            Difficulty::Easy => 1,
            Difficulty::Medium => 2,
            Difficulty::Hard => 3,
        }
    }
}

/// A quiz question as loaded from the question bank. Immutable once loaded.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Title, unique within a loaded set.
    pub title: String,
    /// Body shown to the players.
    pub content: String,
    /// The expected answer, visible only on the console side.
    pub answer: String,
    /// Difficulty, which also determines the points for a correct answer.
    pub difficulty: Difficulty,
    /// Free-form tags used for filtering.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Player names excluded from answering this question.
    pub targets: Option<Vec<String>>,
    /// Suggested countdown in seconds.
    pub timer: Option<u32>,
    /// Optional photo URI shown alongside the question.
    pub photo: Option<String>,
}

/// Countdown clock fields carried inside [`GameState`].
///
/// `time_remaining <= initial_time` holds except transiently while a new
/// initial value is being set, and `time_remaining == 0` always implies
/// `is_active == false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    /// Whether the countdown is currently running.
    pub is_active: bool,
    /// Seconds left on the clock.
    pub time_remaining: u32,
    /// Value the clock returns to on reset.
    pub initial_time: u32,
}

impl TimerState {
    /// An inactive clock holding `seconds` on both cells.
    pub fn armed(seconds: u32) -> Self {
        Self {
            is_active: false,
            time_remaining: seconds,
            initial_time: seconds,
        }
    }
}

/// High-level lifecycle phase of the game.
///
/// The setup → ongoing → completed direction is a convention of the console
/// UI; the store accepts any ordering (the console allows returning to setup
/// from completed).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GamePhase {
    /// Players, teams and questions are being configured.
    #[default]
    Setup,
    /// The game is being played.
    Ongoing,
    /// Final scores are shown.
    Completed,
}

/// Attribution scheme governing who can be awarded points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnswerMode {
    /// One player answers.
    #[default]
    Individual,
    /// Two players face off, each independently awardable.
    Duel,
    /// One team answers.
    Teams,
    /// Two teams face off.
    TeamsDuel,
    /// Each team nominates champions to answer on its behalf.
    Champions,
}

/// Which scoreboard the player display is allowed to show.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreboardMode {
    /// Nothing is shown.
    #[default]
    Hidden,
    /// Per-player scores.
    Players,
    /// Per-team scores.
    Teams,
}

/// The single authoritative game state.
///
/// Owned and mutated exclusively by the console; the player display only
/// ever holds a copy received over the broadcast channel. The whole value is
/// serialized and sent on every mutation, so every field is serde-friendly.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// Known players.
    pub players: Vec<Player>,
    /// Teams keyed by their opaque id, in creation order.
    pub teams: IndexMap<Uuid, Team>,
    /// The loaded question bank.
    pub questions: Vec<Question>,
    /// The operator's working selection; not necessarily visible to players.
    pub current_question: Option<Question>,
    /// The question actually broadcast to the player display. May lag or
    /// differ from [`Self::current_question`].
    pub displayed_question: Option<Question>,
    /// Name → score ledger, sparse: an absent name counts as zero.
    pub scores: IndexMap<String, i64>,
    /// Lifecycle phase.
    pub phase: GamePhase,
    /// Countdown clock.
    pub timer: TimerState,
    /// Current answer-attribution scheme.
    pub answer_mode: AnswerMode,
    /// Selected answerer for individual/teams modes.
    pub selected_answerer: Option<String>,
    /// First opponent in duel modes.
    pub selected_opponent1: Option<String>,
    /// Second opponent in duel modes.
    pub selected_opponent2: Option<String>,
    /// Team name → nominated champion names for champions mode.
    pub selected_champions: Option<IndexMap<String, Vec<String>>>,
    /// Scoreboard visibility on the player display.
    pub scoreboard_mode: ScoreboardMode,
}

impl GameState {
    /// Fresh state for a new game: empty rosters, setup phase, idle clock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current score for `name`, zero when the ledger has no entry.
    pub fn score_of(&self, name: &str) -> i64 {
        self.scores.get(name).copied().unwrap_or(0)
    }

    /// Look up a team by display name.
    pub fn team_by_name(&self, name: &str) -> Option<&Team> {
        self.teams.values().find(|team| team.name == name)
    }
}

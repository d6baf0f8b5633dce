//! The question-bank boundary.
//!
//! Parsing and file I/O live outside this crate; what arrives here is an
//! already-deserialized setup document. Loading is all-or-nothing: every
//! constraint is checked first and the store only sees data that passed,
//! so a rejected document leaves the game exactly as it was.

use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::config::Palette;
use crate::error::LoadError;
use crate::services::console::Console;
use crate::state::{Difficulty, GameState, Player, Question, Team};

/// One player entry in a setup document.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PlayerSpec {
    /// Display name, unique across the document.
    #[validate(length(min = 1, message = "player name must not be empty"))]
    pub name: String,
    /// Optional profile picture URI.
    pub profile_picture: Option<String>,
}

/// One team entry in a setup document.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TeamSpec {
    /// Display name, unique across the document.
    #[validate(length(min = 1, message = "team name must not be empty"))]
    pub name: String,
    /// Optional display color; assigned from the palette when absent.
    #[validate(custom(function = validate_color))]
    pub color: Option<String>,
    /// Roster of player names; each must reference a player in the document.
    #[serde(default)]
    pub players: Vec<String>,
}

/// One question entry in a setup document.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct QuestionSpec {
    /// Title, unique across the document.
    #[validate(length(min = 1, message = "question title must not be empty"))]
    pub title: String,
    /// Body shown to the players.
    pub content: String,
    /// Expected answer.
    pub answer: String,
    /// Difficulty on the fixed 1–3 scale.
    #[validate(range(min = 1, max = 3, message = "difficulty must be 1, 2 or 3"))]
    pub difficulty: u8,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Player names excluded from answering.
    pub targets: Option<Vec<String>>,
    /// Suggested countdown in seconds.
    pub timer: Option<u32>,
    /// Optional photo URI.
    pub photo: Option<String>,
}

/// A full game setup: initial players, teams, and the question bank.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct GameSetup {
    /// Initial players.
    #[serde(default)]
    #[validate(nested)]
    pub players: Vec<PlayerSpec>,
    /// Initial teams.
    #[serde(default)]
    #[validate(nested)]
    pub teams: Vec<TeamSpec>,
    /// The question bank.
    #[serde(default)]
    #[validate(nested)]
    pub questions: Vec<QuestionSpec>,
}

/// Validates a `#rrggbb` hex color.
fn validate_color(color: &str) -> Result<(), ValidationError> {
    let rest = color.strip_prefix('#').unwrap_or("");
    if rest.len() != 6 || !rest.chars().all(|c| c.is_ascii_hexdigit()) {
        let mut err = ValidationError::new("color_format");
        err.message = Some(format!("`{color}` is not a #rrggbb color").into());
        return Err(err);
    }
    Ok(())
}

/// Replace the question bank from a validated list of question specs.
pub async fn load_questions(
    console: &Console,
    specs: Vec<QuestionSpec>,
) -> Result<GameState, LoadError> {
    let setup = GameSetup {
        questions: specs,
        ..GameSetup::default()
    };
    let mut problems = validation_problems(&setup);
    problems.extend(question_cross_checks(&setup.questions));
    if !problems.is_empty() {
        return Err(LoadError::from_problems(problems));
    }

    let questions = build_questions(setup.questions)?;
    Ok(console.load_questions(questions).await)
}

/// Commit a full game setup: players, teams, and questions, in that order.
///
/// Teams without a color get the first palette entry not already taken by
/// the document (advisory only: a document may repeat colors on purpose).
pub async fn load_game_data(
    console: &Console,
    palette: &Palette,
    setup: GameSetup,
) -> Result<GameState, LoadError> {
    let mut problems = validation_problems(&setup);
    problems.extend(cross_checks(&setup));
    if !problems.is_empty() {
        return Err(LoadError::from_problems(problems));
    }

    let players: Vec<Player> = setup
        .players
        .iter()
        .map(|spec| Player {
            name: spec.name.clone(),
            profile_picture: spec.profile_picture.clone(),
        })
        .collect();

    let mut used_colors: Vec<String> = setup.teams.iter().filter_map(|t| t.color.clone()).collect();
    let mut teams = Vec::with_capacity(setup.teams.len());
    for spec in &setup.teams {
        let color = match &spec.color {
            Some(color) => color.clone(),
            None => {
                let color = palette.first_unused_color(&used_colors);
                used_colors.push(color.clone());
                color
            }
        };
        let roster = spec
            .players
            .iter()
            .filter_map(|name| players.iter().find(|p| &p.name == name).cloned())
            .collect();
        teams.push(Team::new(spec.name.clone(), roster, color));
    }

    let questions = build_questions(setup.questions)?;

    let mut state = console.snapshot().await;
    for player in players {
        state = console.add_player(player).await;
    }
    for team in teams {
        state = console.add_team(team).await;
    }
    state = console.load_questions(questions).await;
    Ok(state)
}

fn validation_problems(setup: &GameSetup) -> Vec<String> {
    match setup.validate() {
        Ok(()) => Vec::new(),
        Err(errors) => LoadError::from(errors).problems().to_vec(),
    }
}

fn build_questions(specs: Vec<QuestionSpec>) -> Result<Vec<Question>, LoadError> {
    specs
        .into_iter()
        .map(|spec| {
            let difficulty = Difficulty::try_from(spec.difficulty)
                .map_err(|message| LoadError::from_problems(vec![message]))?;
            Ok(Question {
                title: spec.title,
                content: spec.content,
                answer: spec.answer,
                difficulty,
                tags: spec.tags,
                targets: spec.targets,
                timer: spec.timer,
                photo: spec.photo,
            })
        })
        .collect()
}

/// Document-level constraints the field validators cannot express.
fn cross_checks(setup: &GameSetup) -> Vec<String> {
    let mut problems = Vec::new();

    problems.extend(duplicates(
        setup.players.iter().map(|p| p.name.as_str()),
        "duplicate player name",
    ));
    problems.extend(duplicates(
        setup.teams.iter().map(|t| t.name.as_str()),
        "duplicate team name",
    ));
    problems.extend(question_cross_checks(&setup.questions));

    let known: Vec<&str> = setup.players.iter().map(|p| p.name.as_str()).collect();
    for team in &setup.teams {
        for name in &team.players {
            if !known.contains(&name.as_str()) {
                problems.push(format!(
                    "team `{}` references unknown player `{name}`",
                    team.name
                ));
            }
        }
    }
    for question in &setup.questions {
        for name in question.targets.iter().flatten() {
            if !known.contains(&name.as_str()) {
                problems.push(format!(
                    "question `{}` targets unknown player `{name}`",
                    question.title
                ));
            }
        }
    }

    problems
}

fn question_cross_checks(questions: &[QuestionSpec]) -> Vec<String> {
    duplicates(
        questions.iter().map(|q| q.title.as_str()),
        "duplicate question title",
    )
}

fn duplicates<'a>(names: impl Iterator<Item = &'a str>, label: &str) -> Vec<String> {
    let mut seen = Vec::new();
    let mut problems = Vec::new();
    for name in names {
        if seen.contains(&name) {
            problems.push(format!("{label} `{name}`"));
        } else {
            seen.push(name);
        }
    }
    problems
}

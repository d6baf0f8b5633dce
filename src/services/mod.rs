//! Operator-facing services: the game master console, the scoring rules,
//! and the question-bank loading boundary.

pub mod console;
pub mod loader;
pub mod scoring;

pub use self::console::Console;
pub use self::loader::{GameSetup, PlayerSpec, QuestionSpec, TeamSpec};
pub use self::scoring::{Award, AwardTarget, OpponentSlot, ScoreDelta};

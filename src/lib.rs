//! Core of a live quiz-show control application: one authoritative game
//! state mutated only by the game master console, broadcast wholesale to
//! read-only player displays over an in-process, fire-and-forget channel.

pub mod channel;
pub mod config;
pub mod error;
pub mod services;
pub mod state;
pub mod timer;

//! The Dossier command engine.
//!
//! Takes a [`Case`](dossier_core::case::Case), a player's
//! [`Progression`](dossier_core::progression::Progression) and one line of
//! input, and decides what happens: a narrative response, a rejected move, or
//! a SQL statement run against a throwaway SQLite database rebuilt from the
//! case schema and the player's history.
//!
//! The engine is synchronous and holds no state between calls.

pub mod error;
pub mod focus;
mod narrative;
pub mod normalize;
pub mod processor;
pub mod sandbox;

pub use error::{Error, Result};
pub use normalize::normalize;
pub use processor::{Outcome, process_command, reset_response};
pub use sandbox::Sandbox;

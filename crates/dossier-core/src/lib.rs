//! Core types and trait definitions for the Dossier puzzle engine.
//!
//! This crate is deliberately free of HTTP and database dependencies. Cases
//! are authored data; progressions are the only mutable state, and storage
//! backends implement the traits in [`store`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod case;
pub mod condition;
pub mod error;
pub mod progression;
pub mod response;
pub mod store;

pub use error::{Error, Result};

/// Focus value meaning "not looking at anything".
pub const NO_FOCUS: &str = "none";

/// Input that resets a player's progression; handled before the engine runs.
pub const RESET_COMMAND: &str = "RESET";

/// Statement text that is never recorded in history.
pub const RESET_CASE_SENTINEL: &str = "RESET_CASE";

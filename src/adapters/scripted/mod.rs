//! In-memory live source used by tests and offline demos.

mod source;

pub use source::{ScriptStats, ScriptedOutcome, ScriptedSource};

//! Foundation module - Shared domain primitives.
//!
//! Identifiers, error types and the state machine trait used by the
//! live session model.

mod errors;
mod ids;
mod state_machine;

pub use errors::ValidationError;
pub use ids::{ClientId, SessionGeneration};
pub use state_machine::StateMachine;

//! Application layer - orchestration of the upstream session lifecycle.

pub mod session_manager;

pub use session_manager::{SessionManager, SessionSnapshot};

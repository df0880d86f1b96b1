//! UpstreamStatus enum for tracking the lifecycle of the upstream session.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::StateMachine;

/// Lifecycle status of the upstream live session.
///
/// ```text
/// Idle ─► Connecting ─┬─► Connected ─► Disconnected
///                     └─► Failed
/// ```
///
/// Clearing the session (disconnect or replace) is not a transition; the
/// session is simply dropped from whatever state it is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UpstreamStatus {
    #[default]
    Idle,
    Connecting,
    Connected,
    Failed,
    Disconnected,
}

impl UpstreamStatus {
    /// Returns true while the upstream transport may still deliver events.
    pub fn is_live(&self) -> bool {
        matches!(self, UpstreamStatus::Connecting | UpstreamStatus::Connected)
    }
}

impl StateMachine for UpstreamStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use UpstreamStatus::*;
        matches!(
            (self, target),
            (Idle, Connecting)
                | (Connecting, Connected)
                | (Connecting, Failed)
                | (Connected, Disconnected)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use UpstreamStatus::*;
        match self {
            Idle => vec![Connecting],
            Connecting => vec![Connected, Failed],
            Connected => vec![Disconnected],
            Failed | Disconnected => vec![],
        }
    }
}

impl fmt::Display for UpstreamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UpstreamStatus::Idle => "idle",
            UpstreamStatus::Connecting => "connecting",
            UpstreamStatus::Connected => "connected",
            UpstreamStatus::Failed => "failed",
            UpstreamStatus::Disconnected => "disconnected",
        };
        write!(f, "{}", s)
    }
}

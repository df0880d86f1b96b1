//! Upstream viewer events.
//!
//! Only the four interaction kinds the relay forwards are modelled. Payload
//! structs use the upstream's camelCase field names.

use serde::{Deserialize, Serialize};

/// A viewer interaction reported by the upstream live source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveEvent {
    Follow(UserAction),
    Share(UserAction),
    Gift(GiftEvent),
    Chat(ChatEvent),
}

impl LiveEvent {
    /// Handle of the viewer who triggered the event.
    pub fn unique_id(&self) -> &str {
        match self {
            LiveEvent::Follow(action) | LiveEvent::Share(action) => &action.unique_id,
            LiveEvent::Gift(gift) => &gift.unique_id,
            LiveEvent::Chat(chat) => &chat.unique_id,
        }
    }
}

/// Payload shared by follow and share events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAction {
    pub unique_id: String,
}

/// A gift sent by a viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftEvent {
    pub unique_id: String,
    pub gift_id: u64,
    #[serde(default = "default_repeat_count")]
    pub repeat_count: u32,
}

/// A chat comment posted by a viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatEvent {
    pub unique_id: String,
    pub comment: String,
}

/// Room details reported by the upstream once a connect succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomInfo {
    pub room_id: String,
}

fn default_repeat_count() -> u32 {
    1
}

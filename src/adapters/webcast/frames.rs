//! Upstream frame format of the webcast bridge.
//!
//! Every text frame is a JSON object tagged by `event`:
//!
//! ```json
//! {"event":"connected","roomId":"7301"}
//! {"event":"chat","uniqueId":"bob","comment":"hi"}
//! {"event":"streamEnd"}
//! ```
//!
//! Event names the relay does not forward decode as [`WebcastFrame::Other`].

use serde::Deserialize;

use crate::domain::live::{ChatEvent, GiftEvent, LiveEvent, RoomInfo, UserAction};
use crate::ports::SourceError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub(crate) enum WebcastFrame {
    Connected(RoomInfo),
    Error { message: String },
    Follow(UserAction),
    Share(UserAction),
    Gift(GiftEvent),
    Chat(ChatEvent),
    StreamEnd,
    #[serde(other)]
    Other,
}

impl WebcastFrame {
    pub(crate) fn parse(text: &str) -> Result<Self, SourceError> {
        serde_json::from_str(text).map_err(|e| SourceError::Protocol(e.to_string()))
    }

    /// The viewer event carried by this frame, if any.
    pub(crate) fn into_event(self) -> Option<LiveEvent> {
        match self {
            WebcastFrame::Follow(action) => Some(LiveEvent::Follow(action)),
            WebcastFrame::Share(action) => Some(LiveEvent::Share(action)),
            WebcastFrame::Gift(gift) => Some(LiveEvent::Gift(gift)),
            WebcastFrame::Chat(chat) => Some(LiveEvent::Chat(chat)),
            WebcastFrame::Connected(_)
            | WebcastFrame::Error { .. }
            | WebcastFrame::StreamEnd
            | WebcastFrame::Other => None,
        }
    }
}

//! Live stream domain.
//!
//! Upstream viewer events, the normalized events delivered to clients,
//! and the lifecycle status of the single upstream session.

mod events;
mod handle;
mod normalized;
mod status;

pub use events::{ChatEvent, GiftEvent, LiveEvent, RoomInfo, UserAction};
pub use handle::StreamerHandle;
pub use normalized::{translate, EventKind, NormalizedEvent, INTERNAL_ERROR_MESSAGE};
pub use status::UpstreamStatus;

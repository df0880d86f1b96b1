//! Domain layer - live session vocabulary and pure translation rules.

pub mod foundation;
pub mod live;

//! Live Relay - forwards live-stream viewer events to browser clients.
//!
//! Browser clients attach over WebSocket and ask to follow a streamer. The
//! relay holds a single upstream session to the live event feed, translates
//! follows, shares, gifts, and chat messages into a small JSON protocol, and
//! delivers them to the client that requested the session.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

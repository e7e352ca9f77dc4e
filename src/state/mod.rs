//! In-memory bot state.
//!
//! - [`rooms`]: membership and ban bookkeeping per joined monitored room
//! - [`welcome`]: live welcome rooms awaiting departure or timeout
//!
//! Nothing here is persisted; both stores are rebuilt from the homeserver
//! on every start.

mod dashmap_ext;
pub mod rooms;
pub mod welcome;

pub use dashmap_ext::DashMapExt;
pub use rooms::{JoinOutcome, RoomRecord, RoomStore};
pub use welcome::{WelcomeRegistry, WelcomeRoom};

//! Moderation services.
//!
//! Higher level behaviour built from [`Bot`](crate::bot::Bot) room operations:
//! - [`banlist`]: ban/unban propagation and startup reconciliation
//! - [`welcome`]: private welcome rooms, departure eviction and the sweep

pub mod banlist;
pub mod welcome;

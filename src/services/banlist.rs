//! Ban propagation engine.
//!
//! A room is an eligible target when it syncs bans and the bot can ban there
//! ([`RoomRecord::is_ban_target`]). Targets that already agree with the
//! change are skipped, so propagation never issues redundant actions. A
//! failed action is logged and that room skipped; its record stays as is.

use std::collections::BTreeMap;
use tracing::{info, warn};
use warden_proto::{MemberId, RoomId};

use crate::bot::Bot;
use crate::state::RoomRecord;

/// Ban `member` in every eligible room other than `source` that does not
/// already list them. Returns the rooms where the ban was applied.
pub async fn propagate_ban(bot: &Bot, source: &RoomId, member: &MemberId, reason: &str) -> Vec<RoomId> {
    let targets = bot
        .rooms
        .records_where(|r| &r.id != source && r.is_ban_target() && !r.banned.contains_key(member));

    let mut applied = Vec::with_capacity(targets.len());
    for target in targets {
        match bot.ban_member(&target.id, member, reason).await {
            Ok(()) => {
                crate::metrics::record_propagation("ban");
                applied.push(target.id);
            }
            Err(e) => {
                warn!(room = %target.id, member = %member, error = %e, "Ban propagation failed");
            }
        }
    }
    if !applied.is_empty() {
        info!(source = %source, member = %member, rooms = applied.len(), "Ban propagated");
    }
    applied
}

/// Unban `member` in every eligible room other than `source` that lists
/// them. Returns the rooms where the unban was applied.
pub async fn propagate_unban(bot: &Bot, source: &RoomId, member: &MemberId) -> Vec<RoomId> {
    let targets = bot
        .rooms
        .records_where(|r| &r.id != source && r.is_ban_target() && r.banned.contains_key(member));

    let mut applied = Vec::with_capacity(targets.len());
    for target in targets {
        match bot.unban_member(&target.id, member).await {
            Ok(()) => {
                crate::metrics::record_propagation("unban");
                applied.push(target.id);
            }
            Err(e) => {
                warn!(room = %target.id, member = %member, error = %e, "Unban propagation failed");
            }
        }
    }
    if !applied.is_empty() {
        info!(source = %source, member = %member, rooms = applied.len(), "Unban propagated");
    }
    applied
}

/// Union of the ban lists of every ban-sync room. The first reason seen for
/// a member wins.
pub fn ban_union(bot: &Bot) -> BTreeMap<MemberId, String> {
    let mut union = BTreeMap::new();
    for record in bot.rooms.records_where(RoomRecord::syncs_bans) {
        for (member, reason) in record.banned {
            union.entry(member).or_insert(reason);
        }
    }
    union
}

/// Startup reconciliation: apply the ban union to every eligible room.
///
/// Returns the number of bans issued.
pub async fn reconcile(bot: &Bot) -> usize {
    let union = ban_union(bot);
    let targets = bot.rooms.records_where(RoomRecord::is_ban_target);
    let mut issued = 0;

    for target in &targets {
        for (member, reason) in &union {
            if target.banned.contains_key(member) {
                continue;
            }
            match bot.ban_member(&target.id, member, reason).await {
                Ok(()) => issued += 1,
                Err(e) => {
                    warn!(room = %target.id, member = %member, error = %e, "Reconciliation ban failed");
                }
            }
        }
    }

    info!(
        banned = union.len(),
        rooms = targets.len(),
        issued,
        "Ban lists reconciled"
    );
    issued
}

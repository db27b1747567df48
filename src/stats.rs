//! Volunteer statistics: one completed-help counter per user.
//!
//! Counters are materialized lazily and only ever move up.

use serde::Serialize;

use crate::db::Database;
use crate::error::{Error, Result};
use crate::model::{UserId, VolunteerStat};

/// Public projection of a user for leaderboard and stats output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub id: UserId,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatEntry {
    pub user: UserSummary,
    pub completed_count: u32,
}

pub(crate) fn summarize(db: &Database, user_id: UserId) -> Result<UserSummary> {
    let user = db.require_user(user_id)?;
    Ok(UserSummary {
        id: user.id,
        username: user.username.clone(),
        email: user.email.clone(),
    })
}

/// Create-or-fetch the stat record for a user.
pub fn stat_for(db: &mut Database, user_id: UserId) -> Result<&mut VolunteerStat> {
    db.require_user(user_id)?;

    let idx = match db.stats.iter().position(|stat| stat.user_id == user_id) {
        Some(idx) => idx,
        None => {
            db.stats.push(VolunteerStat {
                user_id,
                completed_count: 0,
            });
            db.stats.len() - 1
        }
    };
    Ok(&mut db.stats[idx])
}

/// Add one completion to a user's counter. Returns the new value.
pub fn credit(db: &mut Database, user_id: UserId) -> Result<u32> {
    let stat = stat_for(db, user_id)?;
    stat.completed_count = stat.completed_count.checked_add(1).ok_or_else(|| {
        Error::OperationFailed(format!("completed_count overflow for user {user_id}"))
    })?;
    Ok(stat.completed_count)
}

/// Stat records ordered by count (desc) then username (asc), truncated to `limit`.
pub fn leaderboard(db: &Database, limit: usize) -> Result<Vec<StatEntry>> {
    let mut entries = db
        .stats
        .iter()
        .map(|stat| {
            Ok(StatEntry {
                user: summarize(db, stat.user_id)?,
                completed_count: stat.completed_count,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    entries.sort_by(|left, right| {
        right
            .completed_count
            .cmp(&left.completed_count)
            .then_with(|| left.user.username.cmp(&right.user.username))
    });
    entries.truncate(limit);
    Ok(entries)
}

/// A user's own stats, materializing a zero record on first access.
pub fn my_stats(db: &mut Database, user_id: UserId) -> Result<StatEntry> {
    let completed_count = stat_for(db, user_id)?.completed_count;
    Ok(StatEntry {
        user: summarize(db, user_id)?,
        completed_count,
    })
}

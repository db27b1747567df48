//! helpline leaderboard and stats commands

use serde::Serialize;

use crate::cli::{GlobalOptions, Session};
use crate::error::Result;
use crate::output::{emit_success, HumanOutput};
use crate::stats::StatEntry;

#[derive(Serialize)]
struct LeaderboardReport {
    limit: usize,
    entries: Vec<StatEntry>,
}

pub fn run_leaderboard(global: GlobalOptions) -> Result<()> {
    let session = Session::open(&global)?;
    let entries = session.desk.leaderboard()?;

    let mut human = HumanOutput::new(format!("Leaderboard ({})", entries.len()));
    for (rank, entry) in entries.iter().enumerate() {
        human.push_detail(format!(
            "{}. {} - {}",
            rank + 1,
            entry.user.username,
            entry.completed_count
        ));
    }
    if entries.is_empty() {
        human.push_next_step("helpline post respond <id>");
    }

    let report = LeaderboardReport {
        limit: session.desk.config().leaderboard.limit,
        entries,
    };
    emit_success(session.output, "leaderboard", &report, Some(&human))
}

pub fn run_stats(global: GlobalOptions) -> Result<()> {
    let session = Session::open(&global)?;
    let user = session.acting_user()?;
    let entry = session.desk.my_stats(user.id)?;

    let mut human = HumanOutput::new(format!("Stats for {}", entry.user.username));
    human.push_summary("completed", entry.completed_count.to_string());

    emit_success(session.output, "stats", &entry, Some(&human))
}

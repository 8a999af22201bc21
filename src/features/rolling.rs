//! Trailing moving averages
//!
//! Replaces each team's per-game statistics with the mean of its most recent
//! games, so week-to-week noise is smoothed while recent form still shows.

use crate::features::aggregate::{BaseStats, TeamGameRecord};
use crate::TeamCode;
use std::collections::{HashMap, VecDeque};

/// Replace each row's statistics with the trailing mean over the team's last
/// `window` games, current game included.
///
/// Rows are ordered by (season, week) within each team; the first game's
/// average is its own raw value. Each team's sequence is independent.
/// Output is sorted by (team, season, week).
pub fn rolling_team_stats(records: &[TeamGameRecord], window: usize) -> Vec<TeamGameRecord> {
    let window = window.max(1);

    let mut by_team: HashMap<&TeamCode, Vec<&TeamGameRecord>> = HashMap::new();
    for record in records {
        by_team.entry(&record.team).or_default().push(record);
    }

    let mut teams: Vec<_> = by_team.keys().cloned().collect();
    teams.sort();

    let mut out = Vec::with_capacity(records.len());
    for team in teams {
        let mut rows = by_team.remove(team).unwrap_or_default();
        rows.sort_by_key(|r| (r.season, r.week));

        let mut recent: VecDeque<BaseStats> = VecDeque::with_capacity(window);
        let mut sum = BaseStats::default();

        for row in rows {
            recent.push_back(row.stats);
            sum = sum.add(&row.stats);
            if recent.len() > window {
                if let Some(evicted) = recent.pop_front() {
                    sum = sum.sub(&evicted);
                }
            }

            let mut averaged = row.clone();
            averaged.stats = sum.scale(1.0 / recent.len() as f32);
            out.push(averaged);
        }
    }

    out
}

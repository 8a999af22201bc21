//! Team baselines for future games
//!
//! Per-team averages over a recent window of completed games, plus the
//! most-common-score table used by the prediction blender. Future schedule
//! entries have no per-game history, so these stand in for it.

use crate::features::aggregate::{BaseStats, TeamGameRecord};
use crate::TeamCode;
use std::collections::HashMap;

/// Mean of each base statistic per team over the supplied records
pub struct TeamBaselines {
    per_team: HashMap<TeamCode, BaseStats>,
    dataset_mean: BaseStats,
}

impl TeamBaselines {
    pub fn from_records(records: &[TeamGameRecord]) -> Self {
        let mut sums: HashMap<TeamCode, (BaseStats, f32)> = HashMap::new();
        let mut total = BaseStats::default();

        for record in records {
            let entry = sums
                .entry(record.team.clone())
                .or_insert((BaseStats::default(), 0.0));
            entry.0 = entry.0.add(&record.stats);
            entry.1 += 1.0;
            total = total.add(&record.stats);
        }

        let per_team = sums
            .into_iter()
            .map(|(team, (sum, n))| (team, sum.scale(1.0 / n)))
            .collect();

        let dataset_mean = if records.is_empty() {
            BaseStats::default()
        } else {
            total.scale(1.0 / records.len() as f32)
        };

        TeamBaselines {
            per_team,
            dataset_mean,
        }
    }

    pub fn get(&self, team: &TeamCode) -> Option<&BaseStats> {
        self.per_team.get(team)
    }

    pub fn contains(&self, team: &TeamCode) -> bool {
        self.per_team.contains_key(team)
    }

    /// Mean of each statistic over every record, used when a scheduled team
    /// never appears in the recent window
    pub fn dataset_mean(&self) -> BaseStats {
        self.dataset_mean
    }

    pub fn team_count(&self) -> usize {
        self.per_team.len()
    }
}

/// Per-team mode of observed final scores.
///
/// Ties are broken toward the smallest score, so the table is deterministic
/// regardless of input order.
pub struct CommonScores {
    per_team: HashMap<TeamCode, f32>,
}

impl CommonScores {
    pub fn from_records(records: &[TeamGameRecord]) -> Self {
        let mut counts: HashMap<TeamCode, HashMap<i64, u32>> = HashMap::new();
        for record in records {
            *counts
                .entry(record.team.clone())
                .or_default()
                .entry(record.score.round() as i64)
                .or_insert(0) += 1;
        }

        let per_team = counts
            .into_iter()
            .filter_map(|(team, scores)| {
                scores
                    .into_iter()
                    .max_by_key(|(score, count)| (*count, -score))
                    .map(|(score, _)| (team, score as f32))
            })
            .collect();

        CommonScores { per_team }
    }

    /// The team's most frequent score, if the team has any history
    pub fn get(&self, team: &TeamCode) -> Option<f32> {
        self.per_team.get(team).copied()
    }
}

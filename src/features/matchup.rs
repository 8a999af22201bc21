//! Opponent-adjusted features
//!
//! Compares each row's statistics against what its opponent looked like in
//! seasons strictly before the row's own, so no same-season (or future)
//! information leaks into the adjustment.

use crate::features::aggregate::{BaseStats, TeamGameRecord};
use crate::TeamCode;
use std::collections::HashMap;

/// Lookup from team to its chronologically ordered stat rows.
///
/// Replaces a per-row scan over the whole dataset: the selection rule is
/// unchanged (most recent row with season strictly below the query season,
/// dataset-wide mean when none exists).
pub struct OpponentIndex {
    rows: HashMap<TeamCode, Vec<(u16, BaseStats)>>,
    global_mean: BaseStats,
}

impl OpponentIndex {
    pub fn build(records: &[TeamGameRecord]) -> Self {
        let mut keyed: HashMap<TeamCode, Vec<(u16, u8, BaseStats)>> = HashMap::new();
        let mut sum = BaseStats::default();
        for record in records {
            keyed
                .entry(record.team.clone())
                .or_default()
                .push((record.season, record.week, record.stats));
            sum = sum.add(&record.stats);
        }

        let global_mean = if records.is_empty() {
            BaseStats::default()
        } else {
            sum.scale(1.0 / records.len() as f32)
        };

        let rows = keyed
            .into_iter()
            .map(|(team, mut entries)| {
                entries.sort_by_key(|(season, week, _)| (*season, *week));
                let ordered = entries
                    .into_iter()
                    .map(|(season, _, stats)| (season, stats))
                    .collect();
                (team, ordered)
            })
            .collect();

        OpponentIndex { rows, global_mean }
    }

    /// Mean of each statistic across every row in the dataset
    pub fn global_mean(&self) -> BaseStats {
        self.global_mean
    }

    /// The opponent's most recent row from a season strictly before
    /// `season`, falling back to the dataset-wide mean.
    pub fn baseline_before(&self, team: &TeamCode, season: u16) -> BaseStats {
        self.rows
            .get(team)
            .and_then(|rows| {
                let idx = rows.partition_point(|(s, _)| *s < season);
                idx.checked_sub(1).map(|i| rows[i].1)
            })
            .unwrap_or(self.global_mean)
    }
}

/// `TeamGameRecord` extended with per-statistic deltas against the
/// opponent's historical baseline
#[derive(Debug, Clone, PartialEq)]
pub struct AdjustedRecord {
    pub record: TeamGameRecord,
    pub vs_opp: BaseStats,
}

impl AdjustedRecord {
    /// Flat feature row: base statistics then vs-opponent deltas
    pub fn features(&self) -> Vec<f32> {
        let mut v = self.record.stats.to_vec();
        v.extend(self.vs_opp.to_vec());
        v
    }
}

/// Compute vs-opponent deltas for every row
pub fn adjust_records(records: &[TeamGameRecord]) -> Vec<AdjustedRecord> {
    let index = OpponentIndex::build(records);

    records
        .iter()
        .map(|record| {
            let baseline = index.baseline_before(&record.opponent, record.season);
            AdjustedRecord {
                record: record.clone(),
                vs_opp: record.stats.sub(&baseline),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_record(team: &str, opponent: &str, season: u16, week: u8, yards: f32) -> TeamGameRecord {
        TeamGameRecord {
            game_id: format!("{}_{}_{}", season, week, team),
            season,
            week,
            team: team.into(),
            opponent: opponent.into(),
            stats: BaseStats {
                yards,
                ..BaseStats::default()
            },
            score: 20.0,
        }
    }

    #[test]
    fn test_prior_season_row_selected() {
        let records = vec![
            make_record("BB", "XX", 2018, 1, 300.0),
            make_record("BB", "XX", 2019, 5, 350.0),
            make_record("AA", "BB", 2020, 1, 400.0),
        ];
        let index = OpponentIndex::build(&records);

        // Most recent BB row before 2020 is the 2019 one
        let baseline = index.baseline_before(&"BB".into(), 2020);
        assert_eq!(baseline.yards, 350.0);
    }

    #[test]
    fn test_same_season_rows_ignored() {
        // Opponent data from the row's own season (or later) must not move
        // the delta.
        let base = vec![
            make_record("BB", "XX", 2019, 1, 350.0),
            make_record("AA", "BB", 2020, 1, 400.0),
        ];
        let mut with_leak = base.clone();
        with_leak.push(make_record("BB", "XX", 2020, 2, 1000.0));
        with_leak.push(make_record("BB", "XX", 2021, 1, 2000.0));

        let clean = OpponentIndex::build(&base).baseline_before(&"BB".into(), 2020);
        let leaky = OpponentIndex::build(&with_leak).baseline_before(&"BB".into(), 2020);
        assert_eq!(clean.yards, leaky.yards);
    }

    #[test]
    fn test_fallback_is_global_mean() {
        let records = vec![
            make_record("AA", "CC", 2018, 1, 100.0),
            make_record("BB", "CC", 2018, 1, 300.0),
        ];
        let adjusted = adjust_records(&records);

        // CC has no rows at all, let alone before 2018
        let global_yards = (100.0 + 300.0) / 2.0;
        assert_eq!(adjusted[0].vs_opp.yards, 100.0 - global_yards);
        assert_eq!(adjusted[1].vs_opp.yards, 300.0 - global_yards);
    }

    #[test]
    fn test_earliest_season_falls_back() {
        let records = vec![
            make_record("AA", "BB", 2018, 1, 100.0),
            make_record("BB", "AA", 2018, 1, 300.0),
        ];
        let index = OpponentIndex::build(&records);

        // BB exists but only in 2018 itself
        let baseline = index.baseline_before(&"BB".into(), 2018);
        assert_eq!(baseline, index.global_mean());
    }

    #[test]
    fn test_feature_row_layout() {
        let records = vec![make_record("AA", "BB", 2018, 1, 100.0)];
        let adjusted = adjust_records(&records);
        let features = adjusted[0].features();

        assert_eq!(features.len(), BaseStats::DIM * 2);
        // yards is column 3; its delta sits DIM columns later
        assert_eq!(features[3], 100.0);
        assert_eq!(features[3 + BaseStats::DIM], adjusted[0].vs_opp.yards);
    }
}

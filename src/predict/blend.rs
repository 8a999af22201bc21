//! Score blending and rounding
//!
//! Raw regression output is a smooth real number, but football scores
//! cluster near sums of field goals and touchdowns. Blending toward the
//! team's most common historical score and snapping the remainder onto
//! {3, 7} keeps the displayed prediction plausible without simulating
//! scoring events.

use crate::features::CommonScores;
use crate::{AdjustConfig, TeamCode};

/// Pure transform from raw model output to a presentable score.
///
/// Same (team, raw score) in, same score out, for a fixed common-score table.
pub struct ScoreRounder<'a> {
    common: &'a CommonScores,
    blend_weight: f32,
    add_points: f32,
    snap_targets: Vec<f32>,
}

impl<'a> ScoreRounder<'a> {
    pub fn new(common: &'a CommonScores, config: &AdjustConfig) -> Self {
        ScoreRounder {
            common,
            blend_weight: config.blend_weight,
            add_points: config.add_points,
            snap_targets: config.snap_targets.clone(),
        }
    }

    /// Blend toward the team's common score (skipped when the team has no
    /// score history), add the flat constant, then snap onto the lattice.
    pub fn round(&self, team: &TeamCode, raw: f32) -> f32 {
        let blended = match self.common.get(team) {
            Some(common) => raw * (1.0 - self.blend_weight) + common * self.blend_weight,
            None => raw,
        };
        snap_to_targets(blended + self.add_points, &self.snap_targets)
    }
}

/// Decompose a score into a multiple of ten plus a remainder in [0, 10) and
/// replace the remainder with the closest target. Ties keep the first listed
/// target.
pub fn snap_to_targets(score: f32, targets: &[f32]) -> f32 {
    if targets.is_empty() {
        return score;
    }
    let tens = (score / 10.0).floor();
    let remainder = score - tens * 10.0;

    let mut best = targets[0];
    let mut best_dist = (targets[0] - remainder).abs();
    for &candidate in &targets[1..] {
        let dist = (candidate - remainder).abs();
        if dist < best_dist {
            best = candidate;
            best_dist = dist;
        }
    }

    tens * 10.0 + best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::aggregate::{BaseStats, TeamGameRecord};

    const TARGETS: [f32; 2] = [3.0, 7.0];

    fn make_record(team: &str, score: f32) -> TeamGameRecord {
        TeamGameRecord {
            game_id: "g".to_string(),
            season: 2023,
            week: 1,
            team: team.into(),
            opponent: "OPP".into(),
            stats: BaseStats::default(),
            score,
        }
    }

    fn default_adjust() -> AdjustConfig {
        AdjustConfig {
            home_field_advantage: 2.5,
            blend_weight: 0.3,
            add_points: 3.0,
            snap_targets: TARGETS.to_vec(),
        }
    }

    #[test]
    fn test_snap_basic() {
        assert_eq!(snap_to_targets(24.4, &TARGETS), 23.0);
        assert_eq!(snap_to_targets(26.0, &TARGETS), 27.0);
        assert_eq!(snap_to_targets(30.0, &TARGETS), 33.0);
        assert_eq!(snap_to_targets(9.9, &TARGETS), 7.0);
    }

    #[test]
    fn test_snap_tie_prefers_first_target() {
        // Remainder exactly 5 is equidistant from 3 and 7
        assert_eq!(snap_to_targets(25.0, &TARGETS), 23.0);
        assert_eq!(snap_to_targets(5.0, &TARGETS), 3.0);
    }

    #[test]
    fn test_blend_formula() {
        let records = vec![make_record("AA", 20.0)];
        let common = CommonScores::from_records(&records);
        let rounder = ScoreRounder::new(&common, &default_adjust());

        // 30*0.7 + 20*0.3 = 27, +3 = 30, remainder 0 snaps to 3
        assert_eq!(rounder.round(&"AA".into(), 30.0), 33.0);
    }

    #[test]
    fn test_blend_skipped_without_common_score() {
        let common = CommonScores::from_records(&[]);
        let rounder = ScoreRounder::new(&common, &default_adjust());

        // Raw used unchanged: 21.4 + 3 = 24.4 → 23
        assert_eq!(rounder.round(&"AA".into(), 21.4), 23.0);
    }

    #[test]
    fn test_round_is_deterministic() {
        let records = vec![make_record("AA", 24.0), make_record("AA", 21.0)];
        let common = CommonScores::from_records(&records);
        let rounder = ScoreRounder::new(&common, &default_adjust());

        let first = rounder.round(&"AA".into(), 22.7);
        let second = rounder.round(&"AA".into(), 22.7);
        assert_eq!(first, second);
    }
}

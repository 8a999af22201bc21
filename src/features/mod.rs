//! Feature engineering
//!
//! Raw plays → per-game statistics → trailing averages → opponent-adjusted
//! deltas, plus the baselines used for unplayed games.

pub mod aggregate;
pub mod baseline;
pub mod matchup;
pub mod rolling;

pub use aggregate::{aggregate_plays, merge_final_scores, BaseStats, GameTeamStat, TeamGameRecord};
pub use baseline::{CommonScores, TeamBaselines};
pub use matchup::{adjust_records, AdjustedRecord, OpponentIndex};
pub use rolling::rolling_team_stats;

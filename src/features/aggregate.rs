//! Per-game team statistics
//!
//! Groups raw plays into one row per (game, offense team) and merges final
//! scores from the schedule.

use crate::{PlayEvent, ScheduleRow, TeamCode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-game base statistics, in fixed feature-column order
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BaseStats {
    /// Offensive plays run
    pub plays: f32,
    /// Summed expected points added
    pub total_epa: f32,
    /// Mean expected points added per play
    pub avg_epa: f32,
    /// Yards gained
    pub yards: f32,
    /// Touchdowns
    pub tds: f32,
    /// Pass attempts
    pub passes: f32,
    /// Rush attempts
    pub rushes: f32,
    /// Interceptions thrown
    pub turnovers: f32,
    /// Fumbles lost
    pub fumbles: f32,
    /// Third-down conversions as a share of all plays
    pub third_down_pct: f32,
    /// Fourth-down conversions as a share of all plays
    pub fourth_down_pct: f32,
    /// Plays snapped inside the opponent's 20
    pub red_zone_plays: f32,
}

impl BaseStats {
    /// Number of base statistics
    pub const DIM: usize = 12;

    /// Column names, matching `to_vec` order
    pub const NAMES: [&'static str; Self::DIM] = [
        "plays",
        "total_epa",
        "avg_epa",
        "yards",
        "tds",
        "passes",
        "rushes",
        "turnovers",
        "fumbles",
        "third_down_pct",
        "fourth_down_pct",
        "red_zone_plays",
    ];

    /// Convert to flat vector in `NAMES` order
    pub fn to_vec(&self) -> Vec<f32> {
        vec![
            self.plays,
            self.total_epa,
            self.avg_epa,
            self.yards,
            self.tds,
            self.passes,
            self.rushes,
            self.turnovers,
            self.fumbles,
            self.third_down_pct,
            self.fourth_down_pct,
            self.red_zone_plays,
        ]
    }

    /// Elementwise combination of two stat rows
    pub fn zip_map(&self, other: &BaseStats, f: impl Fn(f32, f32) -> f32) -> BaseStats {
        BaseStats {
            plays: f(self.plays, other.plays),
            total_epa: f(self.total_epa, other.total_epa),
            avg_epa: f(self.avg_epa, other.avg_epa),
            yards: f(self.yards, other.yards),
            tds: f(self.tds, other.tds),
            passes: f(self.passes, other.passes),
            rushes: f(self.rushes, other.rushes),
            turnovers: f(self.turnovers, other.turnovers),
            fumbles: f(self.fumbles, other.fumbles),
            third_down_pct: f(self.third_down_pct, other.third_down_pct),
            fourth_down_pct: f(self.fourth_down_pct, other.fourth_down_pct),
            red_zone_plays: f(self.red_zone_plays, other.red_zone_plays),
        }
    }

    /// Elementwise transformation
    pub fn map(&self, f: impl Fn(f32) -> f32) -> BaseStats {
        self.zip_map(self, |a, _| f(a))
    }

    pub fn add(&self, other: &BaseStats) -> BaseStats {
        self.zip_map(other, |a, b| a + b)
    }

    pub fn sub(&self, other: &BaseStats) -> BaseStats {
        self.zip_map(other, |a, b| a - b)
    }

    pub fn scale(&self, k: f32) -> BaseStats {
        self.map(|a| a * k)
    }
}

/// One row per (game, team-as-offense)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameTeamStat {
    pub game_id: String,
    pub season: u16,
    pub week: u8,
    pub team: TeamCode,
    pub opponent: TeamCode,
    pub stats: BaseStats,
}

/// `GameTeamStat` merged with the team's final score for that game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamGameRecord {
    pub game_id: String,
    pub season: u16,
    pub week: u8,
    pub team: TeamCode,
    pub opponent: TeamCode,
    pub stats: BaseStats,
    pub score: f32,
}

/// Running sums for one (game, team) group
#[derive(Debug, Clone, Default)]
struct GroupAccum {
    n: f32,
    epa: f32,
    yards: f32,
    tds: f32,
    passes: f32,
    rushes: f32,
    interceptions: f32,
    fumbles: f32,
    third_conversions: f32,
    fourth_conversions: f32,
    red_zone: f32,
}

fn flag(v: Option<f32>) -> f32 {
    v.unwrap_or(0.0)
}

impl GroupAccum {
    fn push(&mut self, play: &PlayEvent) {
        let converted = play.first_down.map_or(false, |v| v == 1.0);

        self.n += 1.0;
        self.epa += flag(play.epa);
        self.yards += flag(play.yards_gained);
        self.tds += flag(play.touchdown);
        self.passes += flag(play.pass_attempt);
        self.rushes += flag(play.rush_attempt);
        self.interceptions += flag(play.interception);
        self.fumbles += flag(play.fumble_lost);
        if play.down == Some(3) && converted {
            self.third_conversions += 1.0;
        }
        if play.down == Some(4) && converted {
            self.fourth_conversions += 1.0;
        }
        if play.yardline_100.map_or(false, |y| y <= 20.0) {
            self.red_zone += 1.0;
        }
    }

    fn finish(&self) -> BaseStats {
        BaseStats {
            plays: self.n,
            total_epa: self.epa,
            avg_epa: self.epa / self.n,
            yards: self.yards,
            tds: self.tds,
            passes: self.passes,
            rushes: self.rushes,
            turnovers: self.interceptions,
            fumbles: self.fumbles,
            third_down_pct: self.third_conversions / self.n,
            fourth_down_pct: self.fourth_conversions / self.n,
            red_zone_plays: self.red_zone,
        }
    }
}

/// Group plays by (game, season, week, offense, defense) and summarize each
/// group. Plays missing either team identifier are dropped. Pure: the same
/// input always yields the same output, in (game_id, team) order.
pub fn aggregate_plays(plays: &[PlayEvent]) -> Vec<GameTeamStat> {
    let mut groups: HashMap<(String, u16, u8, TeamCode, TeamCode), GroupAccum> = HashMap::new();

    for play in plays {
        let (Some(team), Some(opponent)) = (&play.posteam, &play.defteam) else {
            continue;
        };
        let key = (
            play.game_id.clone(),
            play.season,
            play.week,
            team.clone(),
            opponent.clone(),
        );
        groups.entry(key).or_default().push(play);
    }

    let mut rows: Vec<GameTeamStat> = groups
        .into_iter()
        .map(|((game_id, season, week, team, opponent), accum)| GameTeamStat {
            game_id,
            season,
            week,
            team,
            opponent,
            stats: accum.finish(),
        })
        .collect();

    rows.sort_by(|a, b| (&a.game_id, &a.team).cmp(&(&b.game_id, &b.team)));
    rows
}

/// Inner-join aggregated rows with final scores from the schedule.
///
/// Rows for games the schedule has no completed score for are dropped.
pub fn merge_final_scores(
    stats: Vec<GameTeamStat>,
    schedules: &[ScheduleRow],
) -> Vec<TeamGameRecord> {
    let mut scores: HashMap<(&str, &TeamCode), f32> = HashMap::new();
    for row in schedules {
        if let (Some(home), Some(away)) = (row.home_score, row.away_score) {
            scores.insert((row.game_id.as_str(), &row.home_team), home);
            scores.insert((row.game_id.as_str(), &row.away_team), away);
        }
    }

    stats
        .into_iter()
        .filter_map(|s| {
            let score = *scores.get(&(s.game_id.as_str(), &s.team))?;
            Some(TeamGameRecord {
                game_id: s.game_id,
                season: s.season,
                week: s.week,
                team: s.team,
                opponent: s.opponent,
                stats: s.stats,
                score,
            })
        })
        .collect()
}

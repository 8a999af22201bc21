//! NFL game score prediction from play-by-play data
//!
//! A batch pipeline: aggregate raw plays into per-game team statistics,
//! smooth them with trailing averages, adjust for opponent strength, train a
//! regression model on historical scores, and emit blended score predictions
//! for an upcoming schedule.

pub mod data;
pub mod features;
pub mod model;
pub mod predict;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Team abbreviation as used by the data provider (e.g. "KC", "BUF")
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct TeamCode(pub String);

impl TeamCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TeamCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TeamCode {
    fn from(s: &str) -> Self {
        TeamCode(s.to_string())
    }
}

/// A single play from the provider's play-by-play feed.
///
/// Numeric fields are optional because the provider marks unavailable values
/// with `NA`; outcome flags are 0/1 indicators.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayEvent {
    pub game_id: String,
    pub season: u16,
    pub week: u8,
    /// Offense (possession) team; plays without one are dropped
    #[serde(default, deserialize_with = "crate::data::na::opt_team")]
    pub posteam: Option<TeamCode>,
    /// Defense team; plays without one are dropped
    #[serde(default, deserialize_with = "crate::data::na::opt_team")]
    pub defteam: Option<TeamCode>,
    #[serde(default, deserialize_with = "crate::data::na::opt_u8")]
    pub down: Option<u8>,
    #[serde(default, deserialize_with = "crate::data::na::opt_f32")]
    pub yards_gained: Option<f32>,
    /// Expected points added
    #[serde(default, deserialize_with = "crate::data::na::opt_f32")]
    pub epa: Option<f32>,
    #[serde(default, deserialize_with = "crate::data::na::opt_f32")]
    pub pass_attempt: Option<f32>,
    #[serde(default, deserialize_with = "crate::data::na::opt_f32")]
    pub rush_attempt: Option<f32>,
    #[serde(default, deserialize_with = "crate::data::na::opt_f32")]
    pub touchdown: Option<f32>,
    #[serde(default, deserialize_with = "crate::data::na::opt_f32")]
    pub interception: Option<f32>,
    #[serde(default, deserialize_with = "crate::data::na::opt_f32")]
    pub fumble_lost: Option<f32>,
    #[serde(default, deserialize_with = "crate::data::na::opt_f32")]
    pub first_down: Option<f32>,
    /// Yards from the opponent's goal line at the snap
    #[serde(default, deserialize_with = "crate::data::na::opt_f32")]
    pub yardline_100: Option<f32>,
}

/// One schedule entry from the provider, with market and venue metadata.
///
/// Scores are absent for games that have not been played yet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleRow {
    pub game_id: String,
    pub season: u16,
    pub week: u8,
    #[serde(default, deserialize_with = "crate::data::na::opt_date")]
    pub gameday: Option<NaiveDate>,
    #[serde(default, deserialize_with = "crate::data::na::opt_string")]
    pub gametime: Option<String>,
    pub home_team: TeamCode,
    pub away_team: TeamCode,
    #[serde(default, deserialize_with = "crate::data::na::opt_f32")]
    pub home_score: Option<f32>,
    #[serde(default, deserialize_with = "crate::data::na::opt_f32")]
    pub away_score: Option<f32>,
    #[serde(default, deserialize_with = "crate::data::na::opt_string")]
    pub stadium: Option<String>,
    #[serde(default, deserialize_with = "crate::data::na::opt_string")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "crate::data::na::opt_string")]
    pub roof: Option<String>,
    #[serde(default, deserialize_with = "crate::data::na::opt_string")]
    pub surface: Option<String>,
    #[serde(default, deserialize_with = "crate::data::na::opt_f32")]
    pub temp: Option<f32>,
    #[serde(default, deserialize_with = "crate::data::na::opt_f32")]
    pub wind: Option<f32>,
    #[serde(default, deserialize_with = "crate::data::na::opt_f32")]
    pub away_moneyline: Option<f32>,
    #[serde(default, deserialize_with = "crate::data::na::opt_f32")]
    pub home_moneyline: Option<f32>,
    #[serde(default, deserialize_with = "crate::data::na::opt_f32")]
    pub spread_line: Option<f32>,
    #[serde(default, deserialize_with = "crate::data::na::opt_f32")]
    pub away_spread_odds: Option<f32>,
    #[serde(default, deserialize_with = "crate::data::na::opt_f32")]
    pub home_spread_odds: Option<f32>,
    #[serde(default, deserialize_with = "crate::data::na::opt_f32")]
    pub total_line: Option<f32>,
    #[serde(default, deserialize_with = "crate::data::na::opt_f32")]
    pub under_odds: Option<f32>,
    #[serde(default, deserialize_with = "crate::data::na::opt_f32")]
    pub over_odds: Option<f32>,
    #[serde(default, deserialize_with = "crate::data::na::opt_string")]
    pub away_qb_name: Option<String>,
    #[serde(default, deserialize_with = "crate::data::na::opt_string")]
    pub home_qb_name: Option<String>,
    #[serde(default, deserialize_with = "crate::data::na::opt_string")]
    pub away_coach: Option<String>,
    #[serde(default, deserialize_with = "crate::data::na::opt_string")]
    pub home_coach: Option<String>,
}

impl ScheduleRow {
    /// Winner by final score, if both scores are known
    pub fn actual_winner(&self) -> Option<TeamCode> {
        let (home, away) = (self.home_score?, self.away_score?);
        if home > away {
            Some(self.home_team.clone())
        } else {
            Some(self.away_team.clone())
        }
    }
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum GridironError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{dataset} returned no rows for seasons {seasons}")]
    EmptyDataset { dataset: String, seasons: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Estimator error: {0}")]
    Estimator(String),
}

pub type Result<T> = std::result::Result<T, GridironError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub data: DataConfig,
    pub seasons: SeasonConfig,
    pub features: FeatureConfig,
    pub model: ModelConfig,
    pub adjust: AdjustConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub cache_dir: String,
    pub output_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonConfig {
    /// First season of training history (inclusive)
    pub history_start: u16,
    /// Last season of training history (inclusive)
    pub history_end: u16,
    /// Seasons averaged into team baselines for future games
    pub baseline: Vec<u16>,
    /// Season whose schedule is predicted
    pub target: u16,
}

impl SeasonConfig {
    pub fn history(&self) -> Vec<u16> {
        (self.history_start..=self.history_end).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Seasons' worth of games in the trailing average window
    pub rolling_seasons: usize,
    /// Regular-season games per team per season
    pub games_per_season: usize,
}

impl FeatureConfig {
    /// Trailing window size in games
    pub fn window(&self) -> usize {
        (self.rolling_seasons * self.games_per_season).max(1)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub hidden_dims: Vec<usize>,
    pub epochs: usize,
    pub learning_rate: f64,
    pub seed: u64,
    /// Fraction of training rows held out for the MAE report
    pub holdout_fraction: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustConfig {
    /// Points added to the home team's total EPA feature
    pub home_field_advantage: f32,
    /// Weight of the team's most common score in the blend
    pub blend_weight: f32,
    /// Flat points added after blending
    pub add_points: f32,
    /// Remainder candidates the snapped score may end in
    pub snap_targets: Vec<f32>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data: DataConfig {
                cache_dir: "data/cache".to_string(),
                output_path: "data/nfl_predictions.json".to_string(),
            },
            seasons: SeasonConfig {
                history_start: 2018,
                history_end: 2023,
                baseline: vec![2023, 2024],
                target: 2025,
            },
            features: FeatureConfig {
                rolling_seasons: 2,
                games_per_season: 17,
            },
            model: ModelConfig {
                hidden_dims: vec![64, 32],
                epochs: 300,
                learning_rate: 1e-3,
                seed: 42,
                holdout_fraction: 0.2,
            },
            adjust: AdjustConfig {
                home_field_advantage: 2.5,
                blend_weight: 0.3,
                add_points: 3.0,
                snap_targets: vec![3.0, 7.0],
            },
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            GridironError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        toml::from_str(&content)
            .map_err(|e| GridironError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| GridironError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

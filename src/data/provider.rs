//! Historical data provider
//!
//! Downloads nflverse play-by-play and schedule CSVs over HTTP.
//! Supports caching the raw files for offline runs and reduced load.

use crate::{GridironError, PlayEvent, Result, ScheduleRow};
use std::path::{Path, PathBuf};

/// Source of historical plays and schedules.
///
/// A fetch that fails or returns no rows is fatal for the pipeline; all
/// downstream stages assume a non-empty dataset.
pub trait DataProvider {
    fn fetch_play_by_play(&self, seasons: &[u16]) -> Result<Vec<PlayEvent>>;
    fn fetch_schedules(&self, seasons: &[u16]) -> Result<Vec<ScheduleRow>>;
}

const PBP_URL: &str = "https://github.com/nflverse/nflverse-data/releases/download/pbp";
const GAMES_URL: &str = "https://raw.githubusercontent.com/nflverse/nfldata/master/data/games.csv";

/// Provider backed by the public nflverse CSV releases
pub struct NflverseProvider {
    client: reqwest::blocking::Client,
    /// Optional cache directory for downloaded CSV files
    cache_dir: Option<PathBuf>,
    /// If true, only use cache (no network requests)
    offline_only: bool,
}

impl Default for NflverseProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl NflverseProvider {
    pub fn new() -> Self {
        let client = reqwest::blocking::Client::builder()
            .user_agent("gridiron/0.1")
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");

        NflverseProvider {
            client,
            cache_dir: None,
            offline_only: false,
        }
    }

    /// Create provider with a cache directory
    pub fn with_cache<P: AsRef<Path>>(mut self, cache_dir: P) -> Self {
        self.cache_dir = Some(cache_dir.as_ref().to_path_buf());
        self
    }

    /// Set offline-only mode (no network requests, cache must exist)
    pub fn offline_only(mut self, offline: bool) -> Self {
        self.offline_only = offline;
        self
    }

    /// Cached file names present on disk, for status reporting
    pub fn cached_files(&self) -> Vec<String> {
        let Some(dir) = &self.cache_dir else {
            return Vec::new();
        };
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .into_iter()
            .flatten()
            .flatten()
            .filter_map(|e| e.file_name().into_string().ok())
            .filter(|n| n.ends_with(".csv"))
            .collect();
        names.sort();
        names
    }

    fn cache_path(&self, name: &str) -> Option<PathBuf> {
        self.cache_dir.as_ref().map(|dir| dir.join(name))
    }

    fn load_from_cache(&self, name: &str) -> Option<String> {
        let path = self.cache_path(name)?;
        if path.exists() {
            log::debug!("Loading from cache: {}", path.display());
            std::fs::read_to_string(&path).ok()
        } else {
            None
        }
    }

    fn save_to_cache(&self, name: &str, text: &str) -> Result<()> {
        if let Some(path) = self.cache_path(name) {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, text)?;
            log::debug!("Saved to cache: {}", path.display());
        }
        Ok(())
    }

    /// Fetch a CSV, preferring the cache
    fn fetch_text(&self, url: &str, cache_name: &str) -> Result<String> {
        if let Some(text) = self.load_from_cache(cache_name) {
            return Ok(text);
        }
        if self.offline_only {
            return Err(GridironError::Config(format!(
                "Offline mode but {} is not cached",
                cache_name
            )));
        }

        log::info!("Downloading {}", url);
        let text = self.client.get(url).send()?.error_for_status()?.text()?;
        self.save_to_cache(cache_name, &text)?;
        Ok(text)
    }
}

impl DataProvider for NflverseProvider {
    fn fetch_play_by_play(&self, seasons: &[u16]) -> Result<Vec<PlayEvent>> {
        let mut plays = Vec::new();
        for &season in seasons {
            let url = format!("{}/play_by_play_{}.csv", PBP_URL, season);
            let name = format!("play_by_play_{}.csv", season);
            let text = self.fetch_text(&url, &name)?;
            let season_plays = parse_play_csv(&text)?;
            log::info!("Season {}: {} plays", season, season_plays.len());
            plays.extend(season_plays);
        }

        if plays.is_empty() {
            return Err(GridironError::EmptyDataset {
                dataset: "play-by-play".to_string(),
                seasons: format_seasons(seasons),
            });
        }
        Ok(plays)
    }

    fn fetch_schedules(&self, seasons: &[u16]) -> Result<Vec<ScheduleRow>> {
        let text = self.fetch_text(GAMES_URL, "games.csv")?;
        let rows: Vec<ScheduleRow> = parse_schedule_csv(&text)?
            .into_iter()
            .filter(|r| seasons.contains(&r.season))
            .collect();

        if rows.is_empty() {
            return Err(GridironError::EmptyDataset {
                dataset: "schedules".to_string(),
                seasons: format_seasons(seasons),
            });
        }
        Ok(rows)
    }
}

/// Parse a play-by-play CSV export
pub fn parse_play_csv(text: &str) -> Result<Vec<PlayEvent>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut plays = Vec::new();
    for record in reader.deserialize() {
        let play: PlayEvent = record?;
        plays.push(play);
    }
    Ok(plays)
}

/// Parse a schedules CSV export
pub fn parse_schedule_csv(text: &str) -> Result<Vec<ScheduleRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        let row: ScheduleRow = record?;
        rows.push(row);
    }
    Ok(rows)
}

fn format_seasons(seasons: &[u16]) -> String {
    seasons
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAY_CSV: &str = "\
game_id,season,week,posteam,defteam,down,yards_gained,epa,pass_attempt,rush_attempt,touchdown,interception,fumble_lost,first_down,yardline_100
2023_01_DET_KC,2023,1,DET,KC,1,5,0.3,0,1,0,0,0,0,75
2023_01_DET_KC,2023,1,DET,KC,3,12,1.1,1,0,0,0,0,1,70
2023_01_DET_KC,2023,1,NA,NA,NA,NA,NA,0,0,0,0,0,0,NA
";

    const SCHEDULE_CSV: &str = "\
game_id,season,week,gameday,gametime,home_team,away_team,home_score,away_score,stadium,spread_line
2023_01_DET_KC,2023,1,2023-09-07,20:20,KC,DET,20,21,GEHA Field at Arrowhead Stadium,4.5
2025_01_DAL_PHI,2025,1,2025-09-04,20:20,PHI,DAL,NA,NA,Lincoln Financial Field,-7
";

    #[test]
    fn test_parse_plays() {
        let plays = parse_play_csv(PLAY_CSV).unwrap();
        assert_eq!(plays.len(), 3);
        assert_eq!(plays[0].posteam, Some("DET".into()));
        assert_eq!(plays[1].down, Some(3));
        assert_eq!(plays[1].first_down, Some(1.0));
        // Missing-team row still parses; the aggregator drops it
        assert_eq!(plays[2].posteam, None);
        assert_eq!(plays[2].epa, None);
    }

    #[test]
    fn test_parse_schedule() {
        let rows = parse_schedule_csv(SCHEDULE_CSV).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].home_score, Some(20.0));
        assert_eq!(rows[0].actual_winner(), Some("DET".into()));
        // Future game has no score and no winner
        assert_eq!(rows[1].home_score, None);
        assert_eq!(rows[1].actual_winner(), None);
    }

    #[test]
    fn test_offline_without_cache_fails() {
        let provider = NflverseProvider::new().offline_only(true);
        assert!(provider.fetch_play_by_play(&[2023]).is_err());
    }
}

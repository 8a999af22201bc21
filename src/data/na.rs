//! `NA`-tolerant field deserializers
//!
//! The provider's CSV files are exported from R, which writes missing values
//! as `NA` (or leaves the field empty). These helpers map both to `None`.

use crate::TeamCode;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

fn is_missing(s: &str) -> bool {
    s.is_empty() || s == "NA"
}

pub fn opt_f32<'de, D>(de: D) -> Result<Option<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(de)?;
    if is_missing(s.trim()) {
        return Ok(None);
    }
    s.trim()
        .parse::<f32>()
        .map(Some)
        .map_err(serde::de::Error::custom)
}

/// Integer-valued fields are occasionally written as floats ("3.0")
pub fn opt_u8<'de, D>(de: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(de)?;
    if is_missing(s.trim()) {
        return Ok(None);
    }
    s.trim()
        .parse::<f32>()
        .map(|v| Some(v as u8))
        .map_err(serde::de::Error::custom)
}

pub fn opt_string<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(de)?;
    if is_missing(s.trim()) {
        Ok(None)
    } else {
        Ok(Some(s))
    }
}

pub fn opt_team<'de, D>(de: D) -> Result<Option<TeamCode>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(de)?;
    let trimmed = s.trim();
    if is_missing(trimmed) {
        Ok(None)
    } else {
        Ok(Some(TeamCode(trimmed.to_string())))
    }
}

pub fn opt_date<'de, D>(de: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(de)?;
    if is_missing(s.trim()) {
        return Ok(None);
    }
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map(Some)
        .map_err(serde::de::Error::custom)
}

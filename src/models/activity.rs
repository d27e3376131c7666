use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use super::trip::Trip;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Food,
    Transport,
    Activity,
    Lodging,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Activity {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    /// Time of day, `HH:MM`.
    pub time: String,
    pub location: String,
    pub activity_type: ActivityType,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub cost: Option<f64>,
    /// 1-based day index relative to the trip start.
    pub day: u32,
    #[serde(default)]
    pub order: i32,
}

impl Activity {
    pub fn start_time(&self) -> Option<NaiveTime> {
        NaiveTime::parse_from_str(&self.time, "%H:%M").ok()
    }
}

/// Client payload for creating or replacing an activity. Any `_id` in the
/// body is ignored; identifiers are always assigned by the server.
#[derive(Debug, Clone, Deserialize)]
pub struct ActivityInput {
    pub title: String,
    pub time: String,
    pub location: String,
    pub activity_type: ActivityType,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub cost: Option<f64>,
    pub day: u32,
    #[serde(default)]
    pub order: i32,
}

impl ActivityInput {
    pub fn validate(&self) -> AppResult<()> {
        if self.day == 0 {
            return Err(AppError::InvalidInput(
                "Activity day must be 1 or greater".to_string(),
            ));
        }
        if NaiveTime::parse_from_str(&self.time, "%H:%M").is_err() {
            return Err(AppError::InvalidInput(
                "Activity time must be formatted as HH:MM".to_string(),
            ));
        }
        if let Some(cost) = self.cost {
            if !cost.is_finite() || cost < 0.0 {
                return Err(AppError::InvalidInput(
                    "Activity cost must be a non-negative amount".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Rejects a `day` past the last day of `trip`.
    pub fn validate_for(&self, trip: &Trip) -> AppResult<()> {
        if i64::from(self.day) > trip.day_count() {
            return Err(AppError::InvalidInput(format!(
                "Activity day must be between 1 and {}",
                trip.day_count()
            )));
        }
        Ok(())
    }

    pub fn into_activity(self, id: String) -> Activity {
        Activity {
            id,
            title: self.title,
            time: self.time,
            location: self.location,
            activity_type: self.activity_type,
            notes: self.notes,
            cost: self.cost,
            day: self.day,
            order: self.order,
        }
    }
}

/// One entry of a reorder request. Entries missing either key are skipped.
#[derive(Debug, Deserialize)]
pub struct ActivityOrder {
    #[serde(default)]
    pub activity_id: Option<String>,
    #[serde(default)]
    pub order: Option<i32>,
}

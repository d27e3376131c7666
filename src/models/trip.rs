use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{activity::Activity, expense::Expense, packing::PackingItem};
use crate::error::{AppError, AppResult};

/// A trip and its embedded sub-resources, stored as one document.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Trip {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub destination: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub budget: f64,
    pub owner_id: String,
    #[serde(default)]
    pub collaborators: Vec<String>,
    #[serde(default)]
    pub activities: Vec<Activity>,
    #[serde(default)]
    pub expenses: Vec<Expense>,
    #[serde(default)]
    pub packing_items: Vec<PackingItem>,
    #[serde(default)]
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Trip {
    pub fn new(input: TripCreate, owner_id: String, id: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: input.title,
            destination: input.destination,
            start_date: input.start_date,
            end_date: input.end_date,
            budget: input.budget,
            owner_id,
            collaborators: Vec::new(),
            activities: Vec::new(),
            expenses: Vec::new(),
            packing_items: Vec::new(),
            notes: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Number of calendar days the trip spans, counting both ends.
    pub fn day_count(&self) -> i64 {
        (self.end_date.date_naive() - self.start_date.date_naive()).num_days() + 1
    }
}

#[derive(Debug, Deserialize)]
pub struct TripCreate {
    pub title: String,
    pub destination: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub budget: f64,
}

impl TripCreate {
    pub fn validate(&self) -> AppResult<()> {
        if self.title.trim().is_empty() {
            return Err(AppError::InvalidInput("Trip title is required".to_string()));
        }
        validate_dates(self.start_date, self.end_date)?;
        validate_budget(self.budget)
    }
}

/// Partial update of trip details. Absent fields are left untouched.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct TripUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl TripUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.destination.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.budget.is_none()
            && self.notes.is_none()
    }

    /// Checks the update against the values it would be merged into.
    pub fn validate_against(&self, trip: &Trip) -> AppResult<()> {
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err(AppError::InvalidInput("Trip title is required".to_string()));
            }
        }
        validate_dates(
            self.start_date.unwrap_or(trip.start_date),
            self.end_date.unwrap_or(trip.end_date),
        )?;
        match self.budget {
            Some(budget) => validate_budget(budget),
            None => Ok(()),
        }
    }
}

fn validate_dates(start: DateTime<Utc>, end: DateTime<Utc>) -> AppResult<()> {
    if end < start {
        return Err(AppError::InvalidInput(
            "Trip end date must not be before its start date".to_string(),
        ));
    }
    Ok(())
}

fn validate_budget(budget: f64) -> AppResult<()> {
    if !budget.is_finite() || budget < 0.0 {
        return Err(AppError::InvalidInput(
            "Budget must be a non-negative amount".to_string(),
        ));
    }
    Ok(())
}

/// The embedded arrays of a trip document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripCollection {
    Activities,
    Expenses,
    PackingItems,
}

impl TripCollection {
    pub fn field(self) -> &'static str {
        match self {
            TripCollection::Activities => "activities",
            TripCollection::Expenses => "expenses",
            TripCollection::PackingItems => "packing_items",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn trip() -> Trip {
        let start = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        Trip::new(
            TripCreate {
                title: "Lisbon".to_string(),
                destination: "Portugal".to_string(),
                start_date: start,
                end_date: start + chrono::Duration::days(5),
                budget: 1200.0,
            },
            "owner".to_string(),
            "trip".to_string(),
            start,
        )
    }

    #[test]
    fn update_rejects_end_before_existing_start() {
        let trip = trip();
        let update = TripUpdate {
            end_date: Some(trip.start_date - chrono::Duration::days(1)),
            ..Default::default()
        };
        assert!(matches!(
            update.validate_against(&trip),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn empty_update_is_detected() {
        assert!(TripUpdate::default().is_empty());
        let update = TripUpdate {
            notes: Some(String::new()),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }

    #[test]
    fn negative_budget_is_rejected() {
        let trip = trip();
        let update = TripUpdate {
            budget: Some(-1.0),
            ..Default::default()
        };
        assert!(update.validate_against(&trip).is_err());
    }

    #[test]
    fn day_count_includes_both_ends() {
        assert_eq!(trip().day_count(), 6);
    }
}

use mongodb::bson::Bson;

use crate::error::AppResult;
use crate::models::{
    self, new_id, parse_id,
    activity::{Activity, ActivityInput, ActivityOrder},
    trip::TripCollection,
};
use crate::services::trip_service::TripService;

impl TripService {
    pub async fn add_activity(
        &self,
        trip_id: &str,
        user_id: &str,
        input: ActivityInput,
    ) -> AppResult<Activity> {
        input.validate()?;
        let trip = self.load(trip_id, user_id).await?;
        input.validate_for(&trip)?;
        let activity = input.into_activity(new_id());
        self.push_item(&trip, TripCollection::Activities, &activity)
            .await?;
        Ok(activity)
    }

    pub async fn list_activities(&self, trip_id: &str, user_id: &str) -> AppResult<Vec<Activity>> {
        Ok(self.load(trip_id, user_id).await?.activities)
    }

    pub async fn update_activity(
        &self,
        trip_id: &str,
        activity_id: &str,
        user_id: &str,
        input: ActivityInput,
    ) -> AppResult<Activity> {
        let activity_id = parse_id(activity_id, "activity")?;
        input.validate()?;
        let trip = self.load(trip_id, user_id).await?;
        input.validate_for(&trip)?;
        let activity = input.into_activity(activity_id.clone());
        self.replace_item(
            &trip,
            TripCollection::Activities,
            &activity_id,
            &activity,
            "Activity not found",
        )
        .await?;
        Ok(activity)
    }

    pub async fn delete_activity(
        &self,
        trip_id: &str,
        activity_id: &str,
        user_id: &str,
    ) -> AppResult<()> {
        let activity_id = parse_id(activity_id, "activity")?;
        let trip = self.load(trip_id, user_id).await?;
        self.pull_item(&trip, TripCollection::Activities, &activity_id)
            .await
    }

    /// Applies each `(activity_id, order)` pair on its own. Entries with a
    /// missing key, a malformed id or an id not in the trip are skipped.
    /// Returns how many activities were updated.
    pub async fn reorder_activities(
        &self,
        trip_id: &str,
        user_id: &str,
        entries: Vec<ActivityOrder>,
    ) -> AppResult<usize> {
        let trip = self.load(trip_id, user_id).await?;

        let mut applied = 0;
        for entry in entries {
            let (Some(raw_id), Some(order)) = (entry.activity_id, entry.order) else {
                continue;
            };
            let Ok(activity_id) = parse_id(&raw_id, "activity") else {
                log::debug!("Skipping reorder entry with invalid id {:?}", raw_id);
                continue;
            };
            let matched = self
                .trips
                .set_item_field(
                    &trip.id,
                    TripCollection::Activities,
                    &activity_id,
                    "order",
                    Bson::Int32(order),
                    models::now(),
                )
                .await?;
            if matched {
                applied += 1;
            }
        }
        Ok(applied)
    }
}

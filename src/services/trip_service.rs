use std::sync::Arc;

use mongodb::bson::{self, Document};
use serde::Serialize;

use crate::db::{timestamp, TripRepository, UserRepository};
use crate::error::{AppError, AppResult};
use crate::models::{
    self, new_id, parse_id,
    trip::{Trip, TripCollection, TripCreate, TripUpdate},
};
use crate::services::access::{can_access, can_manage};

/// Trip aggregate operations. Every method loads the trip, checks the caller's
/// access and then applies a single-document update.
///
/// Sub-resource operations live in `activity_service`, `expense_service`,
/// `packing_service` and `collaboration_service`.
#[derive(Clone)]
pub struct TripService {
    pub(crate) trips: Arc<dyn TripRepository>,
    pub(crate) users: Arc<dyn UserRepository>,
}

impl TripService {
    pub fn new(trips: Arc<dyn TripRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { trips, users }
    }

    /// Loads a trip the caller owns or collaborates on.
    pub async fn load(&self, trip_id: &str, user_id: &str) -> AppResult<Trip> {
        let trip = self.find(trip_id).await?;
        if !can_access(&trip, user_id) {
            return Err(AppError::access_denied());
        }
        Ok(trip)
    }

    /// Loads a trip only its owner may modify. `denied` is the message used
    /// when the caller is not the owner.
    pub async fn load_managed(&self, trip_id: &str, user_id: &str, denied: &str) -> AppResult<Trip> {
        let trip = self.find(trip_id).await?;
        if !can_manage(&trip, user_id) {
            return Err(AppError::AccessDenied(denied.to_string()));
        }
        Ok(trip)
    }

    /// Round-trip to the store, for health checks.
    pub async fn ping(&self) -> AppResult<()> {
        Ok(self.trips.ping().await?)
    }

    pub(crate) async fn find(&self, trip_id: &str) -> AppResult<Trip> {
        let trip_id = parse_id(trip_id, "trip")?;
        self.trips
            .find_trip(&trip_id)
            .await?
            .ok_or_else(AppError::trip_not_found)
    }

    pub async fn create_trip(&self, owner_id: &str, input: TripCreate) -> AppResult<Trip> {
        input.validate()?;
        let trip = Trip::new(input, owner_id.to_string(), new_id(), models::now());
        self.trips.insert_trip(&trip).await?;
        log::info!("Trip {} created by {}", trip.id, owner_id);
        Ok(trip)
    }

    /// Trips the user owns or collaborates on, newest first.
    pub async fn list_trips(&self, user_id: &str) -> AppResult<Vec<Trip>> {
        let mut trips = self.trips.find_trips_for_member(user_id).await?;
        trips.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(trips)
    }

    pub async fn get_trip(&self, trip_id: &str, user_id: &str) -> AppResult<Trip> {
        self.load(trip_id, user_id).await
    }

    pub async fn update_trip(
        &self,
        trip_id: &str,
        user_id: &str,
        update: TripUpdate,
    ) -> AppResult<Trip> {
        let trip = self
            .load_managed(trip_id, user_id, "Only trip owner can update trip details")
            .await?;
        if update.is_empty() {
            return Ok(trip);
        }
        update.validate_against(&trip)?;

        let mut fields = bson::to_document(&update)
            .map_err(|e| AppError::Internal(format!("Failed to encode trip update: {}", e)))?;
        fields.insert("updated_at", timestamp(models::now())?);

        if !self.trips.set_trip_fields(&trip.id, fields).await? {
            return Err(AppError::trip_not_found());
        }
        self.trips
            .find_trip(&trip.id)
            .await?
            .ok_or_else(AppError::trip_not_found)
    }

    pub async fn delete_trip(&self, trip_id: &str, user_id: &str) -> AppResult<()> {
        let trip = self
            .load_managed(trip_id, user_id, "Only trip owner can delete trip")
            .await?;
        if !self.trips.delete_trip(&trip.id).await? {
            return Err(AppError::trip_not_found());
        }
        log::info!("Trip {} deleted by {}", trip.id, user_id);
        Ok(())
    }

    /// Appends a sub-resource to one of the trip's embedded collections.
    pub(crate) async fn push_item<T: Serialize>(
        &self,
        trip: &Trip,
        collection: TripCollection,
        item: &T,
    ) -> AppResult<()> {
        let doc = encode(item)?;
        if !self
            .trips
            .push_item(&trip.id, collection, doc, models::now())
            .await?
        {
            return Err(AppError::trip_not_found());
        }
        Ok(())
    }

    /// Replaces a sub-resource wholesale. `missing` is the not-found message
    /// when the element is gone at write time.
    pub(crate) async fn replace_item<T: Serialize>(
        &self,
        trip: &Trip,
        collection: TripCollection,
        item_id: &str,
        item: &T,
        missing: &str,
    ) -> AppResult<()> {
        let doc = encode(item)?;
        if !self
            .trips
            .replace_item(&trip.id, collection, item_id, doc, models::now())
            .await?
        {
            return Err(AppError::NotFound(missing.to_string()));
        }
        Ok(())
    }

    /// Removes a sub-resource. Removing an absent element is not an error.
    pub(crate) async fn pull_item(
        &self,
        trip: &Trip,
        collection: TripCollection,
        item_id: &str,
    ) -> AppResult<()> {
        let removed = self
            .trips
            .pull_item(&trip.id, collection, item_id, models::now())
            .await?;
        if !removed {
            log::debug!(
                "No {} element {} in trip {}",
                collection.field(),
                item_id,
                trip.id
            );
        }
        Ok(())
    }
}

fn encode<T: Serialize>(item: &T) -> AppResult<Document> {
    bson::to_document(item).map_err(|e| AppError::Internal(format!("Failed to encode item: {}", e)))
}

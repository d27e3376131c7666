use crate::error::{AppError, AppResult};
use crate::models::trip::Trip;
use crate::services::trip_service::TripService;

/// Outcome of an add-collaborator request.
#[derive(Debug, PartialEq, Eq)]
pub enum CollaboratorChange {
    Added,
    /// The user was already a member of the trip.
    Unchanged,
}

impl TripService {
    pub async fn add_collaborator(
        &self,
        trip_id: &str,
        owner_id: &str,
        email: &str,
    ) -> AppResult<CollaboratorChange> {
        let trip = self
            .load_managed(trip_id, owner_id, "Only trip owner can add collaborators")
            .await?;

        let email = email.trim().to_lowercase();
        let user = self
            .users
            .find_user_by_email(&email)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        // The owner is never listed as a collaborator.
        if user.id == trip.owner_id || trip.collaborators.contains(&user.id) {
            return Ok(CollaboratorChange::Unchanged);
        }

        if !self.trips.add_collaborator(&trip.id, &user.id).await? {
            return Err(AppError::trip_not_found());
        }
        log::info!("User {} added to trip {}", user.id, trip.id);
        Ok(CollaboratorChange::Added)
    }

    /// Adds the caller to the trip's collaborators and returns the updated trip.
    pub async fn join_trip(&self, trip_id: &str, user_id: &str) -> AppResult<Trip> {
        let trip = self.find(trip_id).await?;

        if trip.owner_id == user_id {
            return Err(AppError::Conflict(
                "You are already the owner of this trip".to_string(),
            ));
        }
        if trip.collaborators.iter().any(|c| c == user_id) {
            return Err(AppError::Conflict(
                "You are already a collaborator of this trip".to_string(),
            ));
        }

        if !self.trips.add_collaborator(&trip.id, user_id).await? {
            return Err(AppError::trip_not_found());
        }
        self.trips
            .find_trip(&trip.id)
            .await?
            .ok_or_else(AppError::trip_not_found)
    }
}

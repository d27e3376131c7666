//! Document store adapter.
//!
//! Trips are stored as single documents with their activities, expenses and
//! packing items embedded. Every sub-resource mutation is one atomic update of
//! one array field inside one trip document, so the repository exposes those
//! array operations directly instead of whole-document writes.

pub mod memory;
pub mod mongo;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson::{Bson, Document};

use crate::models::{
    trip::{Trip, TripCollection},
    user::{PasswordReset, User},
};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Failed to encode document: {0}")]
    Encode(#[from] mongodb::bson::ser::Error),

    #[error("Failed to decode document: {0}")]
    Decode(#[from] mongodb::bson::de::Error),

    #[error("Malformed document: {0}")]
    Malformed(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage for trip aggregates.
///
/// Methods returning `bool` report whether a document (or, for element
/// operations, an element) matched the filter.
#[async_trait]
pub trait TripRepository: Send + Sync {
    async fn insert_trip(&self, trip: &Trip) -> StoreResult<()>;

    async fn find_trip(&self, trip_id: &str) -> StoreResult<Option<Trip>>;

    /// Trips the user owns or collaborates on, in no particular order.
    async fn find_trips_for_member(&self, user_id: &str) -> StoreResult<Vec<Trip>>;

    /// `$set` of top-level trip fields.
    async fn set_trip_fields(&self, trip_id: &str, fields: Document) -> StoreResult<bool>;

    async fn delete_trip(&self, trip_id: &str) -> StoreResult<bool>;

    /// Adds the user to `collaborators` unless already present.
    async fn add_collaborator(&self, trip_id: &str, user_id: &str) -> StoreResult<bool>;

    async fn push_item(
        &self,
        trip_id: &str,
        collection: TripCollection,
        item: Document,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<bool>;

    /// Replaces the element whose `_id` equals `item_id`. Returns false when no
    /// such element exists at write time.
    async fn replace_item(
        &self,
        trip_id: &str,
        collection: TripCollection,
        item_id: &str,
        item: Document,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<bool>;

    /// Removes the element whose `_id` equals `item_id`, if any.
    async fn pull_item(
        &self,
        trip_id: &str,
        collection: TripCollection,
        item_id: &str,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<bool>;

    /// Sets one field on the element whose `_id` equals `item_id`.
    async fn set_item_field(
        &self,
        trip_id: &str,
        collection: TripCollection,
        item_id: &str,
        field: &str,
        value: Bson,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<bool>;

    async fn ping(&self) -> StoreResult<()>;
}

/// Storage for accounts and password-reset tokens.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with [`StoreError::Duplicate`] when the email is taken.
    async fn insert_user(&self, user: &User) -> StoreResult<()>;

    async fn find_user_by_id(&self, user_id: &str) -> StoreResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn set_user_fields(&self, user_id: &str, fields: Document) -> StoreResult<bool>;

    async fn insert_password_reset(&self, reset: &PasswordReset) -> StoreResult<()>;

    /// Removes and returns the reset record for `token`, expired or not.
    async fn take_password_reset(&self, token: &str) -> StoreResult<Option<PasswordReset>>;
}

/// Encodes a timestamp the same way the models serialize it.
pub(crate) fn timestamp(at: DateTime<Utc>) -> StoreResult<Bson> {
    Ok(mongodb::bson::to_bson(&at)?)
}

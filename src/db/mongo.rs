use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Bson, Document},
    error::{ErrorKind, WriteError, WriteFailure},
    options::{ClientOptions, IndexOptions, ServerApi, ServerApiVersion},
    Client, Collection, Database, IndexModel,
};
use std::time::Duration;

use super::{timestamp, StoreError, StoreResult, TripRepository, UserRepository};
use crate::models::{
    trip::{Trip, TripCollection},
    user::{PasswordReset, User},
};

const DUPLICATE_KEY: i32 = 11000;

pub async fn create_mongo_client(uri: &str) -> StoreResult<Client> {
    log::info!("Connecting to MongoDB");

    let mut client_options = ClientOptions::parse(uri).await?;

    client_options.connect_timeout = Some(Duration::from_secs(10));
    client_options.server_selection_timeout = Some(Duration::from_secs(10));
    client_options.max_pool_size = Some(10);
    client_options.min_pool_size = Some(1);
    client_options.app_name = Some("travelmate-api".to_string());

    let server_api = ServerApi::builder().version(ServerApiVersion::V1).build();
    client_options.server_api = Some(server_api);

    let client = Client::with_options(client_options)?;

    match client.database("admin").run_command(doc! {"ping": 1}).await {
        Ok(_) => log::info!("Connected to MongoDB and verified with ping"),
        Err(e) => {
            log::warn!("Connected to MongoDB but ping failed: {}", e);
        }
    }

    Ok(client)
}

/// MongoDB-backed store. Trips, users and password resets live in three
/// collections of one database.
#[derive(Clone)]
pub struct MongoStore {
    db: Database,
    trips: Collection<Trip>,
    users: Collection<User>,
    resets: Collection<PasswordReset>,
}

impl MongoStore {
    pub fn new(client: &Client, database: &str) -> Self {
        let db = client.database(database);
        Self {
            trips: db.collection("trips"),
            users: db.collection("users"),
            resets: db.collection("password_resets"),
            db,
        }
    }

    pub async fn connect(uri: &str, database: &str) -> StoreResult<Self> {
        let client = create_mongo_client(uri).await?;
        let store = Self::new(&client, database);
        store.ensure_indexes().await?;
        Ok(store)
    }

    /// Email uniqueness is enforced by the index, not only by the
    /// registration pre-check.
    pub async fn ensure_indexes(&self) -> StoreResult<()> {
        let unique = || IndexOptions::builder().unique(true).build();

        self.users
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "email": 1 })
                    .options(unique())
                    .build(),
            )
            .await?;
        self.trips
            .create_index(IndexModel::builder().keys(doc! { "owner_id": 1 }).build())
            .await?;
        self.trips
            .create_index(IndexModel::builder().keys(doc! { "collaborators": 1 }).build())
            .await?;
        self.resets
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "token": 1 })
                    .options(unique())
                    .build(),
            )
            .await?;
        Ok(())
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(WriteError {
            code: DUPLICATE_KEY,
            ..
        }))
    )
}

fn element_filter(trip_id: &str, collection: TripCollection, item_id: &str) -> Document {
    doc! {
        "_id": trip_id,
        format!("{}._id", collection.field()): item_id,
    }
}

#[async_trait]
impl TripRepository for MongoStore {
    async fn insert_trip(&self, trip: &Trip) -> StoreResult<()> {
        self.trips.insert_one(trip).await?;
        Ok(())
    }

    async fn find_trip(&self, trip_id: &str) -> StoreResult<Option<Trip>> {
        Ok(self.trips.find_one(doc! { "_id": trip_id }).await?)
    }

    async fn find_trips_for_member(&self, user_id: &str) -> StoreResult<Vec<Trip>> {
        let filter = doc! {
            "$or": [
                { "owner_id": user_id },
                { "collaborators": user_id },
            ]
        };
        let cursor = self.trips.find(filter).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn set_trip_fields(&self, trip_id: &str, fields: Document) -> StoreResult<bool> {
        let result = self
            .trips
            .update_one(doc! { "_id": trip_id }, doc! { "$set": fields })
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_trip(&self, trip_id: &str) -> StoreResult<bool> {
        let result = self.trips.delete_one(doc! { "_id": trip_id }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn add_collaborator(&self, trip_id: &str, user_id: &str) -> StoreResult<bool> {
        let result = self
            .trips
            .update_one(
                doc! { "_id": trip_id },
                doc! { "$addToSet": { "collaborators": user_id } },
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn push_item(
        &self,
        trip_id: &str,
        collection: TripCollection,
        item: Document,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let update = doc! {
            "$push": { collection.field(): item },
            "$set": { "updated_at": timestamp(updated_at)? },
        };
        let result = self
            .trips
            .update_one(doc! { "_id": trip_id }, update)
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn replace_item(
        &self,
        trip_id: &str,
        collection: TripCollection,
        item_id: &str,
        item: Document,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let update = doc! {
            "$set": {
                format!("{}.$", collection.field()): item,
                "updated_at": timestamp(updated_at)?,
            }
        };
        let result = self
            .trips
            .update_one(element_filter(trip_id, collection, item_id), update)
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn pull_item(
        &self,
        trip_id: &str,
        collection: TripCollection,
        item_id: &str,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let update = doc! {
            "$pull": { collection.field(): { "_id": item_id } },
            "$set": { "updated_at": timestamp(updated_at)? },
        };
        let result = self
            .trips
            .update_one(element_filter(trip_id, collection, item_id), update)
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn set_item_field(
        &self,
        trip_id: &str,
        collection: TripCollection,
        item_id: &str,
        field: &str,
        value: Bson,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let update = doc! {
            "$set": {
                format!("{}.$.{}", collection.field(), field): value,
                "updated_at": timestamp(updated_at)?,
            }
        };
        let result = self
            .trips
            .update_one(element_filter(trip_id, collection, item_id), update)
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn ping(&self) -> StoreResult<()> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MongoStore {
    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        match self.users.insert_one(user).await {
            Ok(_) => Ok(()),
            Err(err) if is_duplicate_key(&err) => {
                Err(StoreError::Duplicate("Email already registered".to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn find_user_by_id(&self, user_id: &str) -> StoreResult<Option<User>> {
        Ok(self.users.find_one(doc! { "_id": user_id }).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.users.find_one(doc! { "email": email }).await?)
    }

    async fn set_user_fields(&self, user_id: &str, fields: Document) -> StoreResult<bool> {
        let result = self
            .users
            .update_one(doc! { "_id": user_id }, doc! { "$set": fields })
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn insert_password_reset(&self, reset: &PasswordReset) -> StoreResult<()> {
        self.resets.insert_one(reset).await?;
        Ok(())
    }

    async fn take_password_reset(&self, token: &str) -> StoreResult<Option<PasswordReset>> {
        Ok(self
            .resets
            .find_one_and_delete(doc! { "token": token })
            .await?)
    }
}

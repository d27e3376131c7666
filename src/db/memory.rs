//! In-process document store with the same update semantics as the MongoDB
//! adapter. Used when no `MONGODB_URI` is configured, and by the tests.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::lock::Mutex;
use mongodb::bson::{self, Bson, Document};

use super::{timestamp, StoreError, StoreResult, TripRepository, UserRepository};
use crate::models::{
    trip::{Trip, TripCollection},
    user::{PasswordReset, User},
};

#[derive(Default)]
pub struct MemoryStore {
    trips: Mutex<BTreeMap<String, Document>>,
    users: Mutex<BTreeMap<String, Document>>,
    resets: Mutex<HashMap<String, PasswordReset>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn id_of(doc: &Document) -> Option<&str> {
    doc.get_str("_id").ok()
}

fn array_mut<'a>(doc: &'a mut Document, field: &str) -> StoreResult<&'a mut Vec<Bson>> {
    if !doc.contains_key(field) {
        doc.insert(field, Bson::Array(Vec::new()));
    }
    match doc.get_mut(field) {
        Some(Bson::Array(items)) => Ok(items),
        _ => Err(StoreError::Malformed(format!("{} is not an array", field))),
    }
}

/// Runs `apply` on the element of `collection` whose `_id` is `item_id`.
/// Returns false when the trip or the element does not exist.
async fn with_element<F>(
    trips: &Mutex<BTreeMap<String, Document>>,
    trip_id: &str,
    collection: TripCollection,
    item_id: &str,
    updated_at: DateTime<Utc>,
    apply: F,
) -> StoreResult<bool>
where
    F: FnOnce(&mut Vec<Bson>, usize) -> StoreResult<()>,
{
    let mut trips = trips.lock().await;
    let Some(trip) = trips.get_mut(trip_id) else {
        return Ok(false);
    };

    let items = array_mut(trip, collection.field())?;
    let position = items.iter().position(|item| match item {
        Bson::Document(doc) => id_of(doc) == Some(item_id),
        _ => false,
    });
    let Some(index) = position else {
        return Ok(false);
    };

    apply(items, index)?;
    trip.insert("updated_at", timestamp(updated_at)?);
    Ok(true)
}

#[async_trait]
impl TripRepository for MemoryStore {
    async fn insert_trip(&self, trip: &Trip) -> StoreResult<()> {
        let doc = bson::to_document(trip)?;
        self.trips.lock().await.insert(trip.id.clone(), doc);
        Ok(())
    }

    async fn find_trip(&self, trip_id: &str) -> StoreResult<Option<Trip>> {
        let trips = self.trips.lock().await;
        match trips.get(trip_id) {
            Some(doc) => Ok(Some(bson::from_document(doc.clone())?)),
            None => Ok(None),
        }
    }

    async fn find_trips_for_member(&self, user_id: &str) -> StoreResult<Vec<Trip>> {
        let trips = self.trips.lock().await;
        let mut found = Vec::new();
        for doc in trips.values() {
            let owns = doc.get_str("owner_id").ok() == Some(user_id);
            let collaborates = doc
                .get_array("collaborators")
                .map(|members| members.iter().any(|m| m.as_str() == Some(user_id)))
                .unwrap_or(false);
            if owns || collaborates {
                found.push(bson::from_document(doc.clone())?);
            }
        }
        Ok(found)
    }

    async fn set_trip_fields(&self, trip_id: &str, fields: Document) -> StoreResult<bool> {
        let mut trips = self.trips.lock().await;
        let Some(trip) = trips.get_mut(trip_id) else {
            return Ok(false);
        };
        for (key, value) in fields {
            trip.insert(key, value);
        }
        Ok(true)
    }

    async fn delete_trip(&self, trip_id: &str) -> StoreResult<bool> {
        Ok(self.trips.lock().await.remove(trip_id).is_some())
    }

    async fn add_collaborator(&self, trip_id: &str, user_id: &str) -> StoreResult<bool> {
        let mut trips = self.trips.lock().await;
        let Some(trip) = trips.get_mut(trip_id) else {
            return Ok(false);
        };
        let members = array_mut(trip, "collaborators")?;
        if !members.iter().any(|m| m.as_str() == Some(user_id)) {
            members.push(Bson::String(user_id.to_string()));
        }
        Ok(true)
    }

    async fn push_item(
        &self,
        trip_id: &str,
        collection: TripCollection,
        item: Document,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let mut trips = self.trips.lock().await;
        let Some(trip) = trips.get_mut(trip_id) else {
            return Ok(false);
        };
        array_mut(trip, collection.field())?.push(Bson::Document(item));
        trip.insert("updated_at", timestamp(updated_at)?);
        Ok(true)
    }

    async fn replace_item(
        &self,
        trip_id: &str,
        collection: TripCollection,
        item_id: &str,
        item: Document,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        with_element(
            &self.trips,
            trip_id,
            collection,
            item_id,
            updated_at,
            |items, index| {
                items[index] = Bson::Document(item);
                Ok(())
            },
        )
        .await
    }

    async fn pull_item(
        &self,
        trip_id: &str,
        collection: TripCollection,
        item_id: &str,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        with_element(
            &self.trips,
            trip_id,
            collection,
            item_id,
            updated_at,
            |items, index| {
                items.remove(index);
                Ok(())
            },
        )
        .await
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
        with_element(
            &self.trips,
            trip_id,
            collection,
            item_id,
            updated_at,
            |items, index| match &mut items[index] {
                Bson::Document(doc) => {
                    doc.insert(field, value);
                    Ok(())
                }
                _ => Err(StoreError::Malformed(format!(
                    "{} element is not a document",
                    collection.field()
                ))),
            },
        )
        .await
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        let mut users = self.users.lock().await;
        if users
            .values()
            .any(|doc| doc.get_str("email").ok() == Some(user.email.as_str()))
        {
            return Err(StoreError::Duplicate("Email already registered".to_string()));
        }
        users.insert(user.id.clone(), bson::to_document(user)?);
        Ok(())
    }

    async fn find_user_by_id(&self, user_id: &str) -> StoreResult<Option<User>> {
        let users = self.users.lock().await;
        match users.get(user_id) {
            Some(doc) => Ok(Some(bson::from_document(doc.clone())?)),
            None => Ok(None),
        }
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let users = self.users.lock().await;
        match users
            .values()
            .find(|doc| doc.get_str("email").ok() == Some(email))
        {
            Some(doc) => Ok(Some(bson::from_document(doc.clone())?)),
            None => Ok(None),
        }
    }

    async fn set_user_fields(&self, user_id: &str, fields: Document) -> StoreResult<bool> {
        let mut users = self.users.lock().await;
        let Some(user) = users.get_mut(user_id) else {
            return Ok(false);
        };
        for (key, value) in fields {
            user.insert(key, value);
        }
        Ok(true)
    }

    async fn insert_password_reset(&self, reset: &PasswordReset) -> StoreResult<()> {
        self.resets
            .lock()
            .await
            .insert(reset.token.clone(), reset.clone());
        Ok(())
    }

    async fn take_password_reset(&self, token: &str) -> StoreResult<Option<PasswordReset>> {
        Ok(self.resets.lock().await.remove(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        new_id,
        packing::{PackingCategory, PackingItem},
        trip::TripCreate,
    };
    use chrono::TimeZone;

    fn trip(owner: &str) -> Trip {
        let start = Utc.with_ymd_and_hms(2025, 9, 1, 0, 0, 0).unwrap();
        Trip::new(
            TripCreate {
                title: "Kyoto".to_string(),
                destination: "Japan".to_string(),
                start_date: start,
                end_date: start + chrono::Duration::days(7),
                budget: 3000.0,
            },
            owner.to_string(),
            new_id(),
            start,
        )
    }

    fn item(name: &str) -> PackingItem {
        PackingItem {
            id: new_id(),
            name: name.to_string(),
            category: PackingCategory::Clothes,
            packed: false,
            notes: None,
        }
    }

    #[actix_rt::test]
    async fn element_operations_touch_only_the_target() {
        let store = MemoryStore::new();
        let trip = trip("owner");
        store.insert_trip(&trip).await.unwrap();

        let socks = item("Socks");
        let hat = item("Hat");
        for it in [&socks, &hat] {
            let doc = bson::to_document(it).unwrap();
            assert!(store
                .push_item(&trip.id, TripCollection::PackingItems, doc, Utc::now())
                .await
                .unwrap());
        }

        assert!(store
            .set_item_field(
                &trip.id,
                TripCollection::PackingItems,
                &hat.id,
                "packed",
                Bson::Boolean(true),
                Utc::now(),
            )
            .await
            .unwrap());

        let stored = store.find_trip(&trip.id).await.unwrap().unwrap();
        assert_eq!(stored.packing_items.len(), 2);
        assert!(!stored.packing_items[0].packed);
        assert!(stored.packing_items[1].packed);
        assert!(stored.updated_at > trip.updated_at);

        assert!(store
            .pull_item(&trip.id, TripCollection::PackingItems, &socks.id, Utc::now())
            .await
            .unwrap());
        assert!(!store
            .pull_item(&trip.id, TripCollection::PackingItems, &socks.id, Utc::now())
            .await
            .unwrap());

        let stored = store.find_trip(&trip.id).await.unwrap().unwrap();
        assert_eq!(stored.packing_items, vec![PackingItem { packed: true, ..hat }]);
    }

    #[actix_rt::test]
    async fn replace_of_missing_element_reports_no_match() {
        let store = MemoryStore::new();
        let trip = trip("owner");
        store.insert_trip(&trip).await.unwrap();

        let doc = bson::to_document(&item("Scarf")).unwrap();
        let matched = store
            .replace_item(&trip.id, TripCollection::PackingItems, &new_id(), doc, Utc::now())
            .await
            .unwrap();
        assert!(!matched);
    }

    #[actix_rt::test]
    async fn collaborators_are_a_set() {
        let store = MemoryStore::new();
        let trip = trip("owner");
        store.insert_trip(&trip).await.unwrap();

        store.add_collaborator(&trip.id, "friend").await.unwrap();
        store.add_collaborator(&trip.id, "friend").await.unwrap();

        let stored = store.find_trip(&trip.id).await.unwrap().unwrap();
        assert_eq!(stored.collaborators, vec!["friend".to_string()]);
        assert_eq!(store.find_trips_for_member("friend").await.unwrap().len(), 1);
        assert!(store.find_trips_for_member("stranger").await.unwrap().is_empty());
    }

    #[actix_rt::test]
    async fn duplicate_email_is_rejected() {
        let store = MemoryStore::new();
        let user = User {
            id: new_id(),
            email: "ana@example.com".to_string(),
            username: "ana".to_string(),
            name: None,
            hashed_password: String::new(),
            created_at: Utc::now(),
            profile: Default::default(),
            profile_picture: None,
        };
        store.insert_user(&user).await.unwrap();

        let again = User {
            id: new_id(),
            ..user
        };
        assert!(matches!(
            store.insert_user(&again).await,
            Err(StoreError::Duplicate(_))
        ));
    }
}

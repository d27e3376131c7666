use std::collections::BTreeMap;

use mongodb::bson::Bson;

use crate::error::{AppError, AppResult};
use crate::models::{
    self, new_id,
    packing::{
        group_by_category, PackedStatus, PackingCategory, PackingGroup, PackingItem,
        PackingItemInput,
    },
    parse_id,
    trip::TripCollection,
};
use crate::services::trip_service::TripService;

const ITEM_NOT_FOUND: &str = "Packing item not found";

impl TripService {
    pub async fn add_packing_item(
        &self,
        trip_id: &str,
        user_id: &str,
        input: PackingItemInput,
    ) -> AppResult<PackingItem> {
        let trip = self.load(trip_id, user_id).await?;
        let item = input.into_item(new_id());
        self.push_item(&trip, TripCollection::PackingItems, &item)
            .await?;
        Ok(item)
    }

    pub async fn list_packing_items(
        &self,
        trip_id: &str,
        user_id: &str,
    ) -> AppResult<Vec<PackingItem>> {
        Ok(self.load(trip_id, user_id).await?.packing_items)
    }

    pub async fn update_packing_item(
        &self,
        trip_id: &str,
        item_id: &str,
        user_id: &str,
        input: PackingItemInput,
    ) -> AppResult<PackingItem> {
        let item_id = parse_id(item_id, "packing item")?;
        let trip = self.load(trip_id, user_id).await?;
        let item = input.into_item(item_id.clone());
        self.replace_item(
            &trip,
            TripCollection::PackingItems,
            &item_id,
            &item,
            ITEM_NOT_FOUND,
        )
        .await?;
        Ok(item)
    }

    pub async fn delete_packing_item(
        &self,
        trip_id: &str,
        item_id: &str,
        user_id: &str,
    ) -> AppResult<()> {
        let item_id = parse_id(item_id, "packing item")?;
        let trip = self.load(trip_id, user_id).await?;
        self.pull_item(&trip, TripCollection::PackingItems, &item_id)
            .await
    }

    pub async fn toggle_packing_item(
        &self,
        trip_id: &str,
        item_id: &str,
        user_id: &str,
    ) -> AppResult<PackedStatus> {
        let item_id = parse_id(item_id, "packing item")?;
        let trip = self.load(trip_id, user_id).await?;

        let current = trip
            .packing_items
            .iter()
            .find(|item| item.id == item_id)
            .map(|item| item.packed)
            .ok_or_else(|| AppError::NotFound(ITEM_NOT_FOUND.to_string()))?;

        let packed = !current;
        let matched = self
            .trips
            .set_item_field(
                &trip.id,
                TripCollection::PackingItems,
                &item_id,
                "packed",
                Bson::Boolean(packed),
                models::now(),
            )
            .await?;
        if !matched {
            return Err(AppError::NotFound(ITEM_NOT_FOUND.to_string()));
        }
        Ok(PackedStatus { packed })
    }

    pub async fn packing_categories(
        &self,
        trip_id: &str,
        user_id: &str,
    ) -> AppResult<BTreeMap<PackingCategory, PackingGroup>> {
        let trip = self.load(trip_id, user_id).await?;
        Ok(group_by_category(&trip.packing_items))
    }
}

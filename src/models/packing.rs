use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PackingCategory {
    Clothes,
    Toiletries,
    Electronics,
    Documents,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PackingItem {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub category: PackingCategory,
    #[serde(default)]
    pub packed: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PackingItemInput {
    pub name: String,
    pub category: PackingCategory,
    #[serde(default)]
    pub packed: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

impl PackingItemInput {
    pub fn into_item(self, id: String) -> PackingItem {
        PackingItem {
            id,
            name: self.name,
            category: self.category,
            packed: self.packed,
            notes: self.notes,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PackedStatus {
    pub packed: bool,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PackingGroup {
    pub items: Vec<PackingItem>,
    pub packed_count: usize,
    pub total_count: usize,
}

/// Groups items by category. Categories with no items are omitted.
pub fn group_by_category(items: &[PackingItem]) -> BTreeMap<PackingCategory, PackingGroup> {
    let mut groups: BTreeMap<PackingCategory, PackingGroup> = BTreeMap::new();
    for item in items {
        let group = groups.entry(item.category).or_default();
        group.total_count += 1;
        if item.packed {
            group.packed_count += 1;
        }
        group.items.push(item.clone());
    }
    groups
}

use crate::models::trip::Trip;

/// Owners and collaborators may read and edit a trip's contents.
pub fn can_access(trip: &Trip, user_id: &str) -> bool {
    trip.owner_id == user_id || trip.collaborators.iter().any(|c| c == user_id)
}

/// Only the owner may change trip details, delete it, or manage collaborators.
pub fn can_manage(trip: &Trip, user_id: &str) -> bool {
    trip.owner_id == user_id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::trip::TripCreate;
    use chrono::Utc;

    fn trip() -> Trip {
        let now = Utc::now();
        let mut trip = Trip::new(
            TripCreate {
                title: "Oslo".to_string(),
                destination: "Norway".to_string(),
                start_date: now,
                end_date: now,
                budget: 0.0,
            },
            "owner".to_string(),
            "trip".to_string(),
            now,
        );
        trip.collaborators.push("friend".to_string());
        trip
    }

    #[test]
    fn owner_can_access_and_manage() {
        let trip = trip();
        assert!(can_access(&trip, "owner"));
        assert!(can_manage(&trip, "owner"));
    }

    #[test]
    fn collaborator_can_access_but_not_manage() {
        let trip = trip();
        assert!(can_access(&trip, "friend"));
        assert!(!can_manage(&trip, "friend"));
    }

    #[test]
    fn strangers_get_nothing() {
        let trip = trip();
        assert!(!can_access(&trip, "stranger"));
        assert!(!can_manage(&trip, "stranger"));
    }
}

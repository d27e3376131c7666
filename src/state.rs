use std::sync::Arc;

use crate::config::{ConfigError, Settings};
use crate::db::{memory::MemoryStore, TripRepository, UserRepository};
use crate::services::{
    auth_service::AuthService, email_service::EmailService, oauth_service::OAuthService,
    trip_rooms::TripRooms, trip_service::TripService, weather_service::WeatherService,
};

/// Everything handlers share, wrapped once in `web::Data`.
pub struct AppState {
    pub settings: Settings,
    pub trips: TripService,
    pub auth: AuthService,
    pub oauth: OAuthService,
    pub weather: WeatherService,
    pub rooms: TripRooms<actix_ws::Session>,
}

impl AppState {
    pub fn new(
        settings: Settings,
        trips: Arc<dyn TripRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Result<Self, ConfigError> {
        let mailer = EmailService::new(&settings);
        Ok(Self {
            trips: TripService::new(trips, users.clone()),
            auth: AuthService::new(users, &settings, mailer),
            oauth: OAuthService::new(&settings)?,
            weather: WeatherService::new(&settings),
            rooms: TripRooms::new(),
            settings,
        })
    }

    /// State backed by the in-process store.
    pub fn in_memory(settings: Settings) -> Result<Self, ConfigError> {
        let store = Arc::new(MemoryStore::new());
        Self::new(settings, store.clone(), store)
    }
}

pub mod access;
pub mod activity_service;
pub mod auth_service;
pub mod collaboration_service;
pub mod email_service;
pub mod export_service;
pub mod expense_service;
pub mod oauth_service;
pub mod packing_service;
pub mod trip_rooms;
pub mod trip_service;
pub mod weather_service;

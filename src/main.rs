use std::io;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;

use travelmate_api::{
    config::Settings,
    db::mongo::MongoStore,
    routes,
    state::AppState,
};

fn cors(origins: &[String]) -> Cors {
    origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .supports_credentials()
        .allow_any_method()
        .allow_any_header()
        .max_age(3600)
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    let settings =
        Settings::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    env_logger::init_from_env(Env::default().default_filter_or(settings.log_level.as_str()));
    log::info!("Application starting...");

    let state = match settings.mongodb_uri.as_deref() {
        Some(uri) => {
            log::info!("Connecting to MongoDB database {}", settings.database_name);
            let store = MongoStore::connect(uri, &settings.database_name)
                .await
                .map_err(|e| io::Error::new(io::ErrorKind::ConnectionRefused, e))?;
            let store = Arc::new(store);
            AppState::new(settings.clone(), store.clone(), store)
        }
        None => {
            log::warn!("MONGODB_URI not set, using the in-memory store");
            AppState::in_memory(settings.clone())
        }
    }
    .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let state = web::Data::new(state);

    log::info!("Starting HTTP server on {}:{}", settings.host, settings.port);
    let origins = settings.cors_origins.clone();

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(cors(&origins))
            .wrap(Logger::default())
            .configure(routes::configure)
    })
    .bind((settings.host.as_str(), settings.port))?
    .run()
    .await
}

//! Runtime settings, read once at startup from the environment (and `.env`).

use std::env;
use std::str::FromStr;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8001;
const DEFAULT_DATABASE: &str = "vacation_planner";
const DEFAULT_SECRET: &str = "your-secret-key-here-change-in-production";
const DEFAULT_CORS_ORIGINS: [&str; 2] = ["http://localhost:3000", "http://localhost:8080"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// OAuth client credentials for a single provider.
#[derive(Debug, Clone)]
pub struct OAuthClientSettings {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    /// When absent the service runs on the in-process document store.
    pub mongodb_uri: Option<String>,
    pub database_name: String,

    pub secret_key: String,
    pub access_token_expire_minutes: i64,
    pub bcrypt_cost: u32,

    pub cors_origins: Vec<String>,
    pub log_level: String,

    pub enable_pdf_export: bool,
    pub enable_calendar_export: bool,

    pub google: Option<OAuthClientSettings>,
    pub apple: Option<OAuthClientSettings>,

    pub sendgrid_api_key: Option<String>,
    pub from_email: String,
    pub frontend_url: String,

    pub openweather_api_key: Option<String>,
    pub openweather_base_url: String,
}

impl Default for Settings {
    /// Defaults used by tests; cheap bcrypt cost and no outbound services.
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            mongodb_uri: None,
            database_name: DEFAULT_DATABASE.to_string(),
            secret_key: "test-secret-key".to_string(),
            access_token_expire_minutes: 30,
            bcrypt_cost: 4,
            cors_origins: DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect(),
            log_level: "info".to_string(),
            enable_pdf_export: true,
            enable_calendar_export: true,
            google: None,
            apple: None,
            sendgrid_api_key: None,
            from_email: "noreply@travelmate.com".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
            openweather_api_key: None,
            openweather_base_url: "http://api.openweathermap.org/data/2.5".to_string(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            port: parse_var("PORT", DEFAULT_PORT)?,
            mongodb_uri: non_empty_var("MONGODB_URI"),
            database_name: env::var("MONGODB_DATABASE")
                .unwrap_or_else(|_| DEFAULT_DATABASE.to_string()),
            secret_key: env::var("SECRET_KEY").unwrap_or_else(|_| DEFAULT_SECRET.to_string()),
            access_token_expire_minutes: parse_var("ACCESS_TOKEN_EXPIRE_MINUTES", 30)?,
            bcrypt_cost: parse_var("BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            cors_origins: match env::var("CORS_ORIGINS") {
                Ok(raw) => parse_cors_origins(&raw),
                Err(_) => DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect(),
            },
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            enable_pdf_export: parse_var("ENABLE_PDF_EXPORT", true)?,
            enable_calendar_export: parse_var("ENABLE_CALENDAR_EXPORT", true)?,
            google: oauth_client("GOOGLE"),
            apple: oauth_client("APPLE"),
            sendgrid_api_key: non_empty_var("SENDGRID_API_KEY"),
            from_email: env::var("FROM_EMAIL")
                .unwrap_or_else(|_| "noreply@travelmate.com".to_string()),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            openweather_api_key: non_empty_var("OPENWEATHER_API_KEY"),
            openweather_base_url: env::var("OPENWEATHER_BASE_URL")
                .unwrap_or_else(|_| "http://api.openweathermap.org/data/2.5".to_string()),
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match non_empty_var(name) {
        None => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

fn oauth_client(prefix: &str) -> Option<OAuthClientSettings> {
    Some(OAuthClientSettings {
        client_id: non_empty_var(&format!("{}_CLIENT_ID", prefix))?,
        client_secret: non_empty_var(&format!("{}_CLIENT_SECRET", prefix))?,
        redirect_uri: non_empty_var(&format!("{}_REDIRECT_URI", prefix))?,
    })
}

/// Accepts either a JSON array of origins or a comma-separated list.
pub fn parse_cors_origins(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Vec::new();
    }

    if let Ok(list) = serde_json::from_str::<Vec<String>>(raw) {
        return list
            .into_iter()
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();
    }

    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn cors_origins_accept_json_list() {
        let origins = parse_cors_origins(r#"["http://a.test", " http://b.test ", ""]"#);
        assert_eq!(origins, vec!["http://a.test", "http://b.test"]);
    }

    #[test]
    fn cors_origins_accept_comma_list() {
        let origins = parse_cors_origins("http://a.test, http://b.test,,");
        assert_eq!(origins, vec!["http://a.test", "http://b.test"]);
    }

    #[test]
    fn blank_cors_origins_are_empty() {
        assert!(parse_cors_origins("   ").is_empty());
    }

    #[test]
    #[serial]
    fn settings_from_env() {
        env::set_var("PORT", "9000");
        env::set_var("ACCESS_TOKEN_EXPIRE_MINUTES", "45");
        env::set_var("ENABLE_PDF_EXPORT", "false");
        env::set_var("GOOGLE_CLIENT_ID", "gid");
        env::set_var("GOOGLE_CLIENT_SECRET", "gsecret");
        env::remove_var("GOOGLE_REDIRECT_URI");

        let settings = Settings::from_env().expect("settings should load");
        assert_eq!(settings.port, 9000);
        assert_eq!(settings.access_token_expire_minutes, 45);
        assert!(!settings.enable_pdf_export);
        assert!(settings.enable_calendar_export);
        // Incomplete provider credentials leave the provider disabled.
        assert!(settings.google.is_none());

        env::remove_var("PORT");
        env::remove_var("ACCESS_TOKEN_EXPIRE_MINUTES");
        env::remove_var("ENABLE_PDF_EXPORT");
        env::remove_var("GOOGLE_CLIENT_ID");
        env::remove_var("GOOGLE_CLIENT_SECRET");
    }

    #[test]
    #[serial]
    fn malformed_port_is_rejected() {
        env::set_var("PORT", "eighty");
        let err = Settings::from_env().expect_err("port should not parse");
        assert!(err.to_string().contains("PORT"));
        env::remove_var("PORT");
    }
}

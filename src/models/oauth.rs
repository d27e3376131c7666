use serde::{Deserialize, Serialize};

// Query parameters on the provider callback
#[derive(Debug, Deserialize)]
pub struct OAuthCallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

// User info from Google
#[derive(Debug, Serialize, Deserialize)]
pub struct GoogleUserInfo {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
}

// Claims we read out of an Apple ID token
#[derive(Debug, Deserialize)]
pub struct AppleIdClaims {
    pub sub: String,
    pub email: Option<String>,
}

/// The identity an OAuth provider vouched for.
#[derive(Debug, Clone)]
pub struct OAuthIdentity {
    pub provider: &'static str,
    pub provider_id: String,
    pub email: String,
    pub username: String,
}

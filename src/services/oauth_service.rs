use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use oauth2::{
    basic::{
        BasicErrorResponse, BasicRevocationErrorResponse, BasicTokenIntrospectionResponse,
        BasicTokenType,
    },
    reqwest::async_http_client,
    AuthType, AuthUrl, AuthorizationCode, Client, ClientId, ClientSecret, CsrfToken,
    ExtraTokenFields, RedirectUrl, Scope, StandardRevocableToken, StandardTokenResponse,
    TokenResponse, TokenUrl,
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::{ConfigError, OAuthClientSettings, Settings};
use crate::error::{AppError, AppResult};
use crate::models::oauth::{AppleIdClaims, GoogleUserInfo, OAuthIdentity};

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

const APPLE_AUTH_URL: &str = "https://appleid.apple.com/auth/authorize";
const APPLE_TOKEN_URL: &str = "https://appleid.apple.com/auth/token";

/// Token endpoints of OpenID providers return an `id_token` next to the
/// access token.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct IdTokenFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
}

impl ExtraTokenFields for IdTokenFields {}

type ProviderTokenResponse = StandardTokenResponse<IdTokenFields, BasicTokenType>;

type ProviderClient = Client<
    BasicErrorResponse,
    ProviderTokenResponse,
    BasicTokenType,
    BasicTokenIntrospectionResponse,
    StandardRevocableToken,
    BasicRevocationErrorResponse,
>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Google,
    Apple,
}

impl Provider {
    pub fn parse(raw: &str) -> AppResult<Self> {
        match raw {
            "google" => Ok(Provider::Google),
            "apple" => Ok(Provider::Apple),
            _ => Err(AppError::NotFound("Unknown OAuth provider".to_string())),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Provider::Google => "google",
            Provider::Apple => "apple",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Provider::Google => "Google",
            Provider::Apple => "Apple",
        }
    }

    /// Apple posts the callback as a form when scopes are requested.
    pub fn posts_callback(self) -> bool {
        matches!(self, Provider::Apple)
    }
}

fn build_client(
    prefix: &'static str,
    settings: &OAuthClientSettings,
    auth_url: &str,
    token_url: &str,
) -> Result<ProviderClient, ConfigError> {
    let invalid = |value: &str| ConfigError::Invalid {
        name: prefix,
        value: value.to_string(),
    };

    let client = ProviderClient::new(
        ClientId::new(settings.client_id.clone()),
        Some(ClientSecret::new(settings.client_secret.clone())),
        AuthUrl::new(auth_url.to_string()).map_err(|_| invalid(auth_url))?,
        Some(TokenUrl::new(token_url.to_string()).map_err(|_| invalid(token_url))?),
    )
    .set_redirect_uri(
        RedirectUrl::new(settings.redirect_uri.clone())
            .map_err(|_| invalid(&settings.redirect_uri))?,
    );
    Ok(client)
}

/// Authorization-code sign-in with Google and Apple.
#[derive(Clone)]
pub struct OAuthService {
    google: Option<ProviderClient>,
    apple: Option<ProviderClient>,
    http: reqwest::Client,
    frontend_url: String,
}

impl OAuthService {
    pub fn new(settings: &Settings) -> Result<Self, ConfigError> {
        let google = settings
            .google
            .as_ref()
            .map(|s| build_client("GOOGLE_REDIRECT_URI", s, GOOGLE_AUTH_URL, GOOGLE_TOKEN_URL))
            .transpose()?;
        let apple = settings
            .apple
            .as_ref()
            .map(|s| {
                build_client("APPLE_REDIRECT_URI", s, APPLE_AUTH_URL, APPLE_TOKEN_URL)
                    .map(|client| client.set_auth_type(AuthType::RequestBody))
            })
            .transpose()?;

        Ok(Self {
            google,
            apple,
            http: reqwest::Client::new(),
            frontend_url: settings.frontend_url.trim_end_matches('/').to_string(),
        })
    }

    fn client(&self, provider: Provider) -> AppResult<&ProviderClient> {
        let client = match provider {
            Provider::Google => self.google.as_ref(),
            Provider::Apple => self.apple.as_ref(),
        };
        client.ok_or_else(|| {
            AppError::ServiceUnavailable(format!("{} OAuth not configured", provider.label()))
        })
    }

    pub fn ensure_configured(&self, provider: Provider) -> AppResult<()> {
        self.client(provider).map(|_| ())
    }

    /// Provider authorization URL plus the CSRF state the callback must echo.
    pub fn authorize_url(&self, provider: Provider) -> AppResult<(Url, CsrfToken)> {
        let client = self.client(provider)?;
        let request = client.authorize_url(CsrfToken::new_random);
        let (url, state) = match provider {
            Provider::Google => request
                .add_scope(Scope::new("openid".to_string()))
                .add_scope(Scope::new("email".to_string()))
                .add_scope(Scope::new("profile".to_string()))
                .url(),
            Provider::Apple => request
                .add_scope(Scope::new("name".to_string()))
                .add_scope(Scope::new("email".to_string()))
                .add_extra_param("response_mode", "form_post")
                .url(),
        };
        Ok((url, state))
    }

    /// Exchanges the authorization code and reads the user's identity.
    pub async fn exchange(&self, provider: Provider, code: String) -> AppResult<OAuthIdentity> {
        let client = self.client(provider)?;
        let token = client
            .exchange_code(AuthorizationCode::new(code))
            .request_async(async_http_client)
            .await
            .map_err(|e| AppError::Upstream(format!("OAuth authentication failed: {}", e)))?;

        match provider {
            Provider::Google => {
                let info = self.google_user_info(token.access_token().secret()).await?;
                let username = info
                    .name
                    .clone()
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| local_part(&info.email));
                Ok(OAuthIdentity {
                    provider: provider.name(),
                    provider_id: info.id,
                    email: info.email,
                    username,
                })
            }
            Provider::Apple => {
                let id_token = token.extra_fields().id_token.as_deref().ok_or_else(|| {
                    AppError::Upstream("No ID token received from Apple".to_string())
                })?;
                let claims = decode_id_token_claims(id_token)?;
                let email = claims.email.ok_or_else(|| {
                    AppError::InvalidInput("Email not provided by Apple".to_string())
                })?;
                Ok(OAuthIdentity {
                    provider: provider.name(),
                    provider_id: claims.sub,
                    username: local_part(&email),
                    email,
                })
            }
        }
    }

    async fn google_user_info(&self, access_token: &str) -> AppResult<GoogleUserInfo> {
        let response = self
            .http
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to request user info: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "Google API returned error status: {}",
                response.status()
            )));
        }

        response
            .json::<GoogleUserInfo>()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to parse user info: {}", e)))
    }

    /// Where the browser lands after a successful sign-in.
    pub fn frontend_redirect(&self, token: &str, provider: Provider) -> AppResult<String> {
        let mut url = Url::parse(&format!("{}/auth/callback", self.frontend_url))
            .map_err(|e| AppError::Internal(format!("Invalid FRONTEND_URL: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("token", token)
            .append_pair("provider", provider.name());
        Ok(url.to_string())
    }
}

fn local_part(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}

/// Reads the claims of an ID token. The token came straight from the
/// provider's token endpoint over TLS, so its signature is not re-verified.
fn decode_id_token_claims(id_token: &str) -> AppResult<AppleIdClaims> {
    let malformed = || AppError::Upstream("Malformed ID token".to_string());
    let payload = id_token.split('.').nth(1).ok_or_else(malformed)?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|_| malformed())?;
    serde_json::from_slice(&bytes).map_err(|_| malformed())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> Settings {
        Settings {
            google: Some(OAuthClientSettings {
                client_id: "gid".to_string(),
                client_secret: "gsecret".to_string(),
                redirect_uri: "http://localhost:8001/auth/oauth/google/callback".to_string(),
            }),
            ..Settings::default()
        }
    }

    #[test]
    fn unconfigured_provider_is_unavailable() {
        let oauth = OAuthService::new(&configured()).unwrap();
        assert!(matches!(
            oauth.authorize_url(Provider::Apple),
            Err(AppError::ServiceUnavailable(_))
        ));
    }

    #[test]
    fn google_authorize_url_carries_state_and_scopes() {
        let oauth = OAuthService::new(&configured()).unwrap();
        let (url, state) = oauth.authorize_url(Provider::Google).unwrap();
        let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        assert!(url.as_str().starts_with(GOOGLE_AUTH_URL));
        assert!(query.contains(&("state".to_string(), state.secret().clone())));
        assert!(query.contains(&("scope".to_string(), "openid email profile".to_string())));
        assert!(query.contains(&("client_id".to_string(), "gid".to_string())));
    }

    #[test]
    fn frontend_redirect_encodes_token() {
        let oauth = OAuthService::new(&configured()).unwrap();
        let url = oauth.frontend_redirect("a.b.c", Provider::Google).unwrap();
        assert_eq!(
            url,
            "http://localhost:3000/auth/callback?token=a.b.c&provider=google"
        );
    }

    #[test]
    fn id_token_claims_are_decoded() {
        let payload = URL_SAFE_NO_PAD.encode(r#"{"sub":"001234.abc","email":"ana@example.com"}"#);
        let token = format!("header.{}.signature", payload);
        let claims = decode_id_token_claims(&token).unwrap();
        assert_eq!(claims.sub, "001234.abc");
        assert_eq!(claims.email.as_deref(), Some("ana@example.com"));

        assert!(decode_id_token_claims("no-dots").is_err());
    }

    #[test]
    fn unknown_provider_is_not_found() {
        assert!(matches!(
            Provider::parse("facebook"),
            Err(AppError::NotFound(_))
        ));
    }
}

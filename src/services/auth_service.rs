use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use chrono::Duration;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use mongodb::bson::doc;
use rand::{distributions::Alphanumeric, Rng};
use regex::Regex;

use crate::config::Settings;
use crate::db::UserRepository;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::Claims;
use crate::models::{
    self, new_id,
    oauth::OAuthIdentity,
    user::{
        PasswordChangeRequest, PasswordReset, PasswordResetConfirm, Token, User, UserCreate,
        UserLogin, UserProfile, UserUpdate,
    },
};
use crate::services::email_service::EmailService;

const BAD_CREDENTIALS: &str = "Incorrect email or password";
const RESET_TOKEN_LENGTH: usize = 32;
const RESET_TOKEN_HOURS: i64 = 24;

/// Issues and validates HS256 bearer tokens.
#[derive(Clone)]
pub struct TokenService {
    secret: String,
    expire_minutes: i64,
}

impl TokenService {
    pub fn new(secret: &str, expire_minutes: i64) -> Self {
        Self {
            secret: secret.to_string(),
            expire_minutes,
        }
    }

    pub fn issue(&self, user: &User) -> AppResult<String> {
        let now = models::now();
        let claims = Claims {
            sub: user.email.clone(),
            iat: now.timestamp() as usize,
            exp: (now + Duration::minutes(self.expire_minutes)).timestamp() as usize,
            user_id: user.id.clone(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
    }

    pub fn resolve(&self, token: &str) -> AppResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat", "sub", "user_id"]);

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|err| {
            log::debug!("Rejected bearer token: {}", err);
            AppError::Unauthenticated("Could not validate credentials".to_string())
        })
    }
}

pub fn is_valid_email(email: &str) -> bool {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL
        .get_or_init(|| {
            Regex::new(
                r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]*[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]*[a-zA-Z0-9])?)*$",
            )
            .expect("email pattern is valid")
        })
        .is_match(email)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn generate_reset_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RESET_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Accounts, sessions and password management.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    tokens: TokenService,
    mailer: EmailService,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, settings: &Settings, mailer: EmailService) -> Self {
        Self {
            users,
            tokens: TokenService::new(&settings.secret_key, settings.access_token_expire_minutes),
            mailer,
            bcrypt_cost: settings.bcrypt_cost,
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    fn hash_password(&self, password: &str) -> AppResult<String> {
        bcrypt::hash(password, self.bcrypt_cost)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
    }

    pub async fn register(&self, input: UserCreate) -> AppResult<Token> {
        let email = normalize_email(&input.email);
        if !is_valid_email(&email) {
            return Err(AppError::InvalidInput("Invalid email address".to_string()));
        }
        if input.username.trim().is_empty() {
            return Err(AppError::InvalidInput("Username is required".to_string()));
        }
        if input.password.is_empty() {
            return Err(AppError::InvalidInput("Password is required".to_string()));
        }

        if self.users.find_user_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let user = User {
            id: new_id(),
            email,
            username: input.username.trim().to_string(),
            name: input.name,
            hashed_password: self.hash_password(&input.password)?,
            created_at: models::now(),
            profile: HashMap::new(),
            profile_picture: None,
        };
        // The unique index turns a concurrent duplicate into a Conflict too.
        self.users.insert_user(&user).await?;
        log::info!("Registered user {}", user.id);

        Ok(Token::bearer(self.tokens.issue(&user)?))
    }

    pub async fn login(&self, input: UserLogin) -> AppResult<Token> {
        let email = normalize_email(&input.email);
        let user = self
            .users
            .find_user_by_email(&email)
            .await?
            .ok_or_else(|| AppError::Unauthenticated(BAD_CREDENTIALS.to_string()))?;

        // OAuth-only accounts have no password hash and cannot log in this way.
        let verified = !user.hashed_password.is_empty()
            && bcrypt::verify(&input.password, &user.hashed_password).unwrap_or(false);
        if !verified {
            log::debug!("Failed login for {}", email);
            return Err(AppError::Unauthenticated(BAD_CREDENTIALS.to_string()));
        }

        Ok(Token::bearer(self.tokens.issue(&user)?))
    }

    /// Maps verified claims back to the stored user.
    pub async fn current_user(&self, claims: &Claims) -> AppResult<User> {
        self.users
            .find_user_by_id(&claims.user_id)
            .await?
            .ok_or_else(|| AppError::Unauthenticated("Could not validate credentials".to_string()))
    }

    pub async fn update_profile(&self, user_id: &str, update: UserUpdate) -> AppResult<UserProfile> {
        if update.is_empty() {
            return Err(AppError::InvalidInput("No data to update".to_string()));
        }

        let mut fields = doc! {};
        if let Some(name) = update.name {
            fields.insert("name", name);
        }
        if let Some(picture) = update.profile_picture {
            fields.insert("profile_picture", picture);
        }

        if !self.users.set_user_fields(user_id, fields).await? {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        self.users
            .find_user_by_id(user_id)
            .await?
            .map(UserProfile::from)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn change_password(&self, user: &User, request: PasswordChangeRequest) -> AppResult<()> {
        let current_ok = !user.hashed_password.is_empty()
            && bcrypt::verify(&request.current_password, &user.hashed_password).unwrap_or(false);
        if !current_ok {
            return Err(AppError::InvalidInput(
                "Current password is incorrect".to_string(),
            ));
        }
        if request.new_password.is_empty() {
            return Err(AppError::InvalidInput("Password is required".to_string()));
        }

        let hashed = self.hash_password(&request.new_password)?;
        if !self
            .users
            .set_user_fields(&user.id, doc! { "hashed_password": hashed })
            .await?
        {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        Ok(())
    }

    /// Stores and mails a reset token when the account exists. Callers get the
    /// same answer either way, so mail failures are only logged.
    pub async fn request_password_reset(&self, email: &str) -> AppResult<()> {
        let email = normalize_email(email);
        let Some(user) = self.users.find_user_by_email(&email).await? else {
            log::debug!("Password reset requested for unknown email");
            return Ok(());
        };

        let now = models::now();
        let reset = PasswordReset {
            token: generate_reset_token(),
            email: user.email.clone(),
            created_at: now,
            expires_at: now + Duration::hours(RESET_TOKEN_HOURS),
        };
        self.users.insert_password_reset(&reset).await?;

        if let Err(err) = self.mailer.send_password_reset(&user.email, &reset.token).await {
            log::error!("Failed to send password reset email: {}", err);
        }
        Ok(())
    }

    pub async fn confirm_password_reset(&self, request: PasswordResetConfirm) -> AppResult<()> {
        let invalid = || AppError::InvalidInput("Invalid or expired reset token".to_string());

        if request.new_password.is_empty() {
            return Err(AppError::InvalidInput("Password is required".to_string()));
        }

        // Taking the record consumes it, so a token can only ever be tried once.
        let reset = self
            .users
            .take_password_reset(&request.token)
            .await?
            .ok_or_else(invalid)?;
        if reset.expires_at <= models::now() {
            return Err(invalid());
        }

        let user = self
            .users
            .find_user_by_email(&reset.email)
            .await?
            .ok_or_else(invalid)?;
        let hashed = self.hash_password(&request.new_password)?;
        self.users
            .set_user_fields(&user.id, doc! { "hashed_password": hashed })
            .await?;
        log::info!("Password reset for user {}", user.id);
        Ok(())
    }

    /// Finds or creates the account for an identity vouched for by an OAuth
    /// provider and returns a session token for it.
    pub async fn oauth_login(&self, identity: OAuthIdentity) -> AppResult<String> {
        let email = normalize_email(&identity.email);
        if let Some(user) = self.users.find_user_by_email(&email).await? {
            return self.tokens.issue(&user);
        }

        let mut profile = HashMap::new();
        profile.insert(
            "oauth_provider".to_string(),
            serde_json::Value::String(identity.provider.to_string()),
        );
        profile.insert(
            "oauth_id".to_string(),
            serde_json::Value::String(identity.provider_id),
        );

        let user = User {
            id: new_id(),
            email,
            username: identity.username,
            name: None,
            hashed_password: String::new(),
            created_at: models::now(),
            profile,
            profile_picture: None,
        };
        self.users.insert_user(&user).await?;
        log::info!("Created {} account {}", identity.provider, user.id);

        self.tokens.issue(&user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;

    fn service() -> AuthService {
        let settings = Settings::default();
        AuthService::new(
            Arc::new(MemoryStore::new()),
            &settings,
            EmailService::new(&settings),
        )
    }

    fn signup(email: &str) -> UserCreate {
        UserCreate {
            email: email.to_string(),
            username: "traveler".to_string(),
            name: None,
            password: "s3cret!".to_string(),
        }
    }

    #[test]
    fn email_syntax() {
        assert!(is_valid_email("ana@example.com"));
        assert!(is_valid_email("first.last+tag@sub.example.org"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("ana@"));
    }

    #[test]
    fn reset_tokens_are_32_alphanumerics() {
        let token = generate_reset_token();
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[actix_rt::test]
    async fn issued_token_resolves_to_user() {
        let auth = service();
        let token = auth.register(signup("Ana@Example.com")).await.unwrap();
        assert_eq!(token.token_type, "bearer");

        let claims = auth.tokens().resolve(&token.access_token).unwrap();
        assert_eq!(claims.sub, "ana@example.com");
        let user = auth.current_user(&claims).await.unwrap();
        assert_eq!(user.id, claims.user_id);
    }

    #[actix_rt::test]
    async fn token_signed_with_other_secret_is_rejected() {
        let auth = service();
        let token = auth.register(signup("ana@example.com")).await.unwrap();
        let other = TokenService::new("another-secret", 30);
        assert!(matches!(
            other.resolve(&token.access_token),
            Err(AppError::Unauthenticated(_))
        ));
    }

    #[actix_rt::test]
    async fn expired_token_is_rejected() {
        let auth = service();
        auth.register(signup("ana@example.com")).await.unwrap();
        let user = auth
            .users
            .find_user_by_email("ana@example.com")
            .await
            .unwrap()
            .unwrap();
        let stale = TokenService::new(&Settings::default().secret_key, -5)
            .issue(&user)
            .unwrap();
        assert!(auth.tokens().resolve(&stale).is_err());
    }

    #[actix_rt::test]
    async fn login_failures_share_one_message() {
        let auth = service();
        auth.register(signup("ana@example.com")).await.unwrap();

        let unknown = auth
            .login(UserLogin {
                email: "nobody@example.com".to_string(),
                password: "s3cret!".to_string(),
            })
            .await
            .unwrap_err();
        let wrong = auth
            .login(UserLogin {
                email: "ana@example.com".to_string(),
                password: "guess".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(unknown.to_string(), BAD_CREDENTIALS);
        assert_eq!(wrong.to_string(), BAD_CREDENTIALS);
    }

    #[actix_rt::test]
    async fn oauth_only_account_cannot_password_login() {
        let auth = service();
        auth.oauth_login(OAuthIdentity {
            provider: "google",
            provider_id: "g-123".to_string(),
            email: "ana@example.com".to_string(),
            username: "ana".to_string(),
        })
        .await
        .unwrap();

        let err = auth
            .login(UserLogin {
                email: "ana@example.com".to_string(),
                password: String::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated(_)));

        let user = auth
            .users
            .find_user_by_email("ana@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.profile["oauth_provider"], "google");
    }

    #[actix_rt::test]
    async fn reset_token_works_once() {
        let auth = service();
        auth.register(signup("ana@example.com")).await.unwrap();

        let reset = PasswordReset {
            token: "T".repeat(32),
            email: "ana@example.com".to_string(),
            created_at: models::now(),
            expires_at: models::now() + Duration::hours(1),
        };
        auth.users.insert_password_reset(&reset).await.unwrap();

        let confirm = || PasswordResetConfirm {
            token: reset.token.clone(),
            new_password: "n3w-pass".to_string(),
        };
        auth.confirm_password_reset(confirm()).await.unwrap();
        assert!(auth.confirm_password_reset(confirm()).await.is_err());

        auth.login(UserLogin {
            email: "ana@example.com".to_string(),
            password: "n3w-pass".to_string(),
        })
        .await
        .unwrap();
    }

    #[actix_rt::test]
    async fn expired_reset_token_is_rejected() {
        let auth = service();
        auth.register(signup("ana@example.com")).await.unwrap();
        let reset = PasswordReset {
            token: "E".repeat(32),
            email: "ana@example.com".to_string(),
            created_at: models::now() - Duration::hours(25),
            expires_at: models::now() - Duration::hours(1),
        };
        auth.users.insert_password_reset(&reset).await.unwrap();

        let err = auth
            .confirm_password_reset(PasswordResetConfirm {
                token: reset.token,
                new_password: "n3w-pass".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid or expired reset token");
    }
}

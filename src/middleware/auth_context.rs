use std::future::{ready, Ready};

use actix_web::{dev::Payload, Error, FromRequest, HttpMessage, HttpRequest};

use crate::error::AppError;
use crate::middleware::auth::Claims;

/// The caller behind a request that passed [`AuthMiddleware`](crate::middleware::auth::AuthMiddleware).
#[derive(Clone)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub claims: Claims,
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        if let Some(claims) = req.extensions().get::<Claims>() {
            ready(Ok(AuthenticatedUser {
                user_id: claims.user_id.clone(),
                claims: claims.clone(),
            }))
        } else {
            ready(Err(
                AppError::Unauthenticated("Not authenticated".to_string()).into()
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[actix_rt::test]
    async fn extracts_user_from_verified_claims() {
        let req = TestRequest::default().to_http_request();
        req.extensions_mut().insert(Claims {
            sub: "ana@example.com".to_string(),
            exp: 2,
            iat: 1,
            user_id: "65a1b2c3d4e5f6a7b8c9d0e1".to_string(),
        });

        let user = AuthenticatedUser::extract(&req).await.unwrap();
        assert_eq!(user.user_id, "65a1b2c3d4e5f6a7b8c9d0e1");
        assert_eq!(user.claims.sub, "ana@example.com");
    }

    #[actix_rt::test]
    async fn missing_claims_are_unauthenticated() {
        let req = TestRequest::default().to_http_request();
        let err = AuthenticatedUser::extract(&req).await.err().unwrap();
        assert_eq!(err.as_response_error().status_code(), 401);
    }
}

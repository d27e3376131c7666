use actix_web::{web, Either, HttpResponse};

use crate::error::AppResult;
use crate::middleware::{auth::AuthMiddleware, auth_context::AuthenticatedUser};
use crate::models::user::{
    PasswordChangeRequest, PasswordResetConfirm, PasswordResetRequest, UserCreate, UserLogin,
    UserProfile, UserUpdate,
};
use crate::routes::MessageResponse;
use crate::state::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/register", web::post().to(register))
            .route("/login", web::post().to(login))
            .route(
                "/password-reset/request",
                web::post().to(request_password_reset),
            )
            .route(
                "/password-reset/confirm",
                web::post().to(confirm_password_reset),
            )
            .service(
                web::resource("/me")
                    .wrap(AuthMiddleware)
                    .route(web::get().to(me)),
            )
            .service(
                web::resource("/profile")
                    .wrap(AuthMiddleware)
                    .route(web::put().to(update_profile)),
            )
            .service(
                web::resource("/change-password")
                    .wrap(AuthMiddleware)
                    .route(web::put().to(change_password)),
            ),
    );
}

pub async fn register(
    state: web::Data<AppState>,
    input: web::Json<UserCreate>,
) -> AppResult<HttpResponse> {
    let token = state.auth.register(input.into_inner()).await?;
    Ok(HttpResponse::Ok().json(token))
}

pub async fn login(
    state: web::Data<AppState>,
    input: web::Json<UserLogin>,
) -> AppResult<HttpResponse> {
    let token = state.auth.login(input.into_inner()).await?;
    Ok(HttpResponse::Ok().json(token))
}

pub async fn me(state: web::Data<AppState>, user: AuthenticatedUser) -> AppResult<HttpResponse> {
    let user = state.auth.current_user(&user.claims).await?;
    Ok(HttpResponse::Ok().json(UserProfile::from(user)))
}

pub async fn update_profile(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    input: web::Json<UserUpdate>,
) -> AppResult<HttpResponse> {
    let user = state.auth.current_user(&user.claims).await?;
    let profile = state
        .auth
        .update_profile(&user.id, input.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(profile))
}

pub async fn change_password(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    input: web::Json<PasswordChangeRequest>,
) -> AppResult<HttpResponse> {
    let user = state.auth.current_user(&user.claims).await?;
    state
        .auth
        .change_password(&user, input.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Password updated successfully")))
}

/// Password reset parameters arrive either as a JSON body or as a query string.
type ResetParams<T> = Either<web::Json<T>, web::Query<T>>;

fn reset_params<T>(params: ResetParams<T>) -> T {
    match params {
        Either::Left(body) => body.into_inner(),
        Either::Right(query) => query.into_inner(),
    }
}

pub async fn request_password_reset(
    state: web::Data<AppState>,
    input: ResetParams<PasswordResetRequest>,
) -> AppResult<HttpResponse> {
    let input = reset_params(input);
    state.auth.request_password_reset(&input.email).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new(
        "Password reset email sent if the email is registered.",
    )))
}

pub async fn confirm_password_reset(
    state: web::Data<AppState>,
    input: ResetParams<PasswordResetConfirm>,
) -> AppResult<HttpResponse> {
    state
        .auth
        .confirm_password_reset(reset_params(input))
        .await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new(
        "Password has been reset successfully.",
    )))
}

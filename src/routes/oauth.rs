use actix_web::{
    cookie::{time::Duration, Cookie, SameSite},
    http::header,
    web, HttpRequest, HttpResponse,
};

use crate::error::{AppError, AppResult};
use crate::models::oauth::OAuthCallbackParams;
use crate::services::oauth_service::Provider;
use crate::state::AppState;

const COOKIE_PATH: &str = "/auth/oauth";

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth/oauth")
            .route("/{provider}/login", web::get().to(oauth_login))
            .route("/{provider}/callback", web::get().to(oauth_callback))
            // Apple answers with a form post
            .route("/{provider}/callback", web::post().to(oauth_callback_form)),
    );
}

fn state_cookie_name(provider: Provider) -> String {
    format!("oauth_state_{}", provider.name())
}

fn state_cookie(provider: Provider, value: String) -> Cookie<'static> {
    // A cross-site form post only carries cookies marked SameSite=None.
    let same_site = if provider.posts_callback() {
        SameSite::None
    } else {
        SameSite::Lax
    };
    Cookie::build(state_cookie_name(provider), value)
        .path(COOKIE_PATH)
        .http_only(true)
        .secure(provider.posts_callback())
        .same_site(same_site)
        .max_age(Duration::minutes(10))
        .finish()
}

/// Redirects the browser to the provider's consent page.
pub async fn oauth_login(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let provider = Provider::parse(&path)?;
    let (url, csrf) = state.oauth.authorize_url(provider)?;
    log::debug!("Starting {} sign-in", provider.name());

    Ok(HttpResponse::Found()
        .cookie(state_cookie(provider, csrf.secret().clone()))
        .insert_header((header::LOCATION, url.to_string()))
        .finish())
}

pub async fn oauth_callback(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    query: web::Query<OAuthCallbackParams>,
) -> AppResult<HttpResponse> {
    complete_sign_in(&state, &req, &path, query.into_inner()).await
}

pub async fn oauth_callback_form(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    form: web::Form<OAuthCallbackParams>,
) -> AppResult<HttpResponse> {
    complete_sign_in(&state, &req, &path, form.into_inner()).await
}

async fn complete_sign_in(
    state: &AppState,
    req: &HttpRequest,
    provider: &str,
    params: OAuthCallbackParams,
) -> AppResult<HttpResponse> {
    let provider = Provider::parse(provider)?;
    state.oauth.ensure_configured(provider)?;

    if let Some(error) = params.error {
        return Err(AppError::InvalidInput(format!("OAuth error: {}", error)));
    }

    let expected = req
        .cookie(&state_cookie_name(provider))
        .map(|c| c.value().to_string());
    match (params.state.as_deref(), expected.as_deref()) {
        (Some(got), Some(want)) if !got.is_empty() && got == want => {}
        _ => {
            log::debug!("OAuth state mismatch for {}", provider.name());
            return Err(AppError::InvalidInput(
                "Invalid state parameter".to_string(),
            ));
        }
    }

    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::InvalidInput("Missing authorization code".to_string()))?;

    let identity = state.oauth.exchange(provider, code).await?;
    let token = state.auth.oauth_login(identity).await?;
    let redirect = state.oauth.frontend_redirect(&token, provider)?;

    let mut spent = state_cookie(provider, String::new());
    spent.make_removal();

    Ok(HttpResponse::Found()
        .cookie(spent)
        .insert_header((header::LOCATION, redirect))
        .finish())
}

use actix_web::{web, HttpResponse};

use crate::error::AppResult;
use crate::middleware::{auth::AuthMiddleware, auth_context::AuthenticatedUser};
use crate::models::weather::WeatherQuery;
use crate::state::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/weather")
            .wrap(AuthMiddleware)
            .route("/{city}", web::get().to(forecast)),
    );
}

pub async fn forecast(
    state: web::Data<AppState>,
    _user: AuthenticatedUser,
    path: web::Path<String>,
    query: web::Query<WeatherQuery>,
) -> AppResult<HttpResponse> {
    let forecast = state
        .weather
        .forecast(&path, &query.start_date, &query.end_date)
        .await?;
    Ok(HttpResponse::Ok().json(forecast))
}

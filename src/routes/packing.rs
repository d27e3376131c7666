use actix_web::{web, HttpResponse};

use crate::error::AppResult;
use crate::middleware::{auth::AuthMiddleware, auth_context::AuthenticatedUser};
use crate::models::packing::PackingItemInput;
use crate::routes::MessageResponse;
use crate::state::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/packing")
            .wrap(AuthMiddleware)
            .route("/{trip_id}", web::post().to(add_item))
            .route("/{trip_id}", web::get().to(list_items))
            .route("/{trip_id}/categories", web::get().to(categories))
            .route("/{trip_id}/{item_id}", web::put().to(update_item))
            .route("/{trip_id}/{item_id}", web::delete().to(delete_item))
            .route("/{trip_id}/{item_id}/toggle", web::put().to(toggle_item)),
    );
}

pub async fn add_item(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    input: web::Json<PackingItemInput>,
) -> AppResult<HttpResponse> {
    let item = state
        .trips
        .add_packing_item(&path, &user.user_id, input.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(item))
}

pub async fn list_items(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let items = state.trips.list_packing_items(&path, &user.user_id).await?;
    Ok(HttpResponse::Ok().json(items))
}

pub async fn update_item(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<(String, String)>,
    input: web::Json<PackingItemInput>,
) -> AppResult<HttpResponse> {
    let (trip_id, item_id) = path.into_inner();
    let item = state
        .trips
        .update_packing_item(&trip_id, &item_id, &user.user_id, input.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(item))
}

pub async fn delete_item(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<(String, String)>,
) -> AppResult<HttpResponse> {
    let (trip_id, item_id) = path.into_inner();
    state
        .trips
        .delete_packing_item(&trip_id, &item_id, &user.user_id)
        .await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Packing item deleted successfully")))
}

pub async fn toggle_item(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<(String, String)>,
) -> AppResult<HttpResponse> {
    let (trip_id, item_id) = path.into_inner();
    let status = state
        .trips
        .toggle_packing_item(&trip_id, &item_id, &user.user_id)
        .await?;
    Ok(HttpResponse::Ok().json(status))
}

pub async fn categories(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let groups = state.trips.packing_categories(&path, &user.user_id).await?;
    Ok(HttpResponse::Ok().json(groups))
}

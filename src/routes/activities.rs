use actix_web::{web, HttpResponse};

use crate::error::AppResult;
use crate::middleware::{auth::AuthMiddleware, auth_context::AuthenticatedUser};
use crate::models::activity::{ActivityInput, ActivityOrder};
use crate::routes::MessageResponse;
use crate::state::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/activities")
            .wrap(AuthMiddleware)
            .route("/{trip_id}", web::post().to(add_activity))
            .route("/{trip_id}", web::get().to(list_activities))
            // Must be registered ahead of /{trip_id}/{activity_id}
            .route("/{trip_id}/reorder", web::put().to(reorder_activities))
            .route("/{trip_id}/{activity_id}", web::put().to(update_activity))
            .route("/{trip_id}/{activity_id}", web::delete().to(delete_activity)),
    );
}

pub async fn add_activity(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    input: web::Json<ActivityInput>,
) -> AppResult<HttpResponse> {
    let activity = state
        .trips
        .add_activity(&path, &user.user_id, input.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(activity))
}

pub async fn list_activities(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let activities = state.trips.list_activities(&path, &user.user_id).await?;
    Ok(HttpResponse::Ok().json(activities))
}

pub async fn update_activity(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<(String, String)>,
    input: web::Json<ActivityInput>,
) -> AppResult<HttpResponse> {
    let (trip_id, activity_id) = path.into_inner();
    let activity = state
        .trips
        .update_activity(&trip_id, &activity_id, &user.user_id, input.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(activity))
}

pub async fn delete_activity(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<(String, String)>,
) -> AppResult<HttpResponse> {
    let (trip_id, activity_id) = path.into_inner();
    state
        .trips
        .delete_activity(&trip_id, &activity_id, &user.user_id)
        .await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Activity deleted successfully")))
}

pub async fn reorder_activities(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    input: web::Json<Vec<ActivityOrder>>,
) -> AppResult<HttpResponse> {
    let applied = state
        .trips
        .reorder_activities(&path, &user.user_id, input.into_inner())
        .await?;
    log::debug!("Reordered {} activities in trip {}", applied, path.as_str());
    Ok(HttpResponse::Ok().json(MessageResponse::new(
        "Activities reordered successfully",
    )))
}

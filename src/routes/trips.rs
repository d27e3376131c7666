use actix_web::{
    http::header::{self, ContentDisposition, DispositionParam, DispositionType},
    web, HttpResponse,
};

use crate::error::{AppError, AppResult};
use crate::middleware::{auth::AuthMiddleware, auth_context::AuthenticatedUser};
use crate::models::trip::{TripCreate, TripUpdate};
use crate::routes::MessageResponse;
use crate::services::{collaboration_service::CollaboratorChange, export_service};
use crate::state::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/trips")
            .wrap(AuthMiddleware)
            .route("", web::post().to(create_trip))
            .route("", web::get().to(list_trips))
            .route("/join/{trip_id}", web::post().to(join_trip))
            .route("/{trip_id}", web::get().to(get_trip))
            .route("/{trip_id}", web::put().to(update_trip))
            .route("/{trip_id}", web::delete().to(delete_trip))
            .route(
                "/{trip_id}/collaborators/{email}",
                web::post().to(add_collaborator),
            )
            .route("/{trip_id}/export/pdf", web::get().to(export_pdf))
            .route("/{trip_id}/export/calendar", web::get().to(export_calendar))
            .route("/{trip_id}/export/json", web::get().to(export_json)),
    );
}

pub async fn create_trip(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    input: web::Json<TripCreate>,
) -> AppResult<HttpResponse> {
    let trip = state
        .trips
        .create_trip(&user.user_id, input.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(trip))
}

pub async fn list_trips(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> AppResult<HttpResponse> {
    let trips = state.trips.list_trips(&user.user_id).await?;
    Ok(HttpResponse::Ok().json(trips))
}

pub async fn get_trip(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let trip = state.trips.get_trip(&path, &user.user_id).await?;
    Ok(HttpResponse::Ok().json(trip))
}

pub async fn update_trip(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    input: web::Json<TripUpdate>,
) -> AppResult<HttpResponse> {
    let trip = state
        .trips
        .update_trip(&path, &user.user_id, input.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(trip))
}

pub async fn delete_trip(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    state.trips.delete_trip(&path, &user.user_id).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Trip deleted successfully")))
}

pub async fn add_collaborator(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<(String, String)>,
) -> AppResult<HttpResponse> {
    let (trip_id, email) = path.into_inner();
    let message = match state
        .trips
        .add_collaborator(&trip_id, &user.user_id, &email)
        .await?
    {
        CollaboratorChange::Added => "Collaborator added successfully",
        CollaboratorChange::Unchanged => "User is already a member of this trip",
    };
    Ok(HttpResponse::Ok().json(MessageResponse::new(message)))
}

pub async fn join_trip(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let trip = state.trips.join_trip(&path, &user.user_id).await?;
    Ok(HttpResponse::Ok().json(trip))
}

fn attachment(filename: String) -> ContentDisposition {
    ContentDisposition {
        disposition: DispositionType::Attachment,
        parameters: vec![DispositionParam::Filename(filename)],
    }
}

pub async fn export_pdf(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    if !state.settings.enable_pdf_export {
        return Err(AppError::AccessDenied("PDF export is disabled".to_string()));
    }
    let trip = state.trips.get_trip(&path, &user.user_id).await?;
    let body = export_service::trip_pdf(&trip)
        .map_err(|e| AppError::Internal(format!("Failed to render PDF: {}", e)))?;

    Ok(HttpResponse::Ok()
        .content_type("application/pdf")
        .insert_header(attachment(export_service::export_filename(
            &trip,
            "report.pdf",
        )))
        .body(body))
}

pub async fn export_calendar(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    if !state.settings.enable_calendar_export {
        return Err(AppError::AccessDenied(
            "Calendar export is disabled".to_string(),
        ));
    }
    let trip = state.trips.get_trip(&path, &user.user_id).await?;

    Ok(HttpResponse::Ok()
        .content_type("text/calendar; charset=utf-8")
        .insert_header(attachment(export_service::export_filename(
            &trip,
            "calendar.ics",
        )))
        .body(export_service::trip_calendar(&trip)))
}

pub async fn export_json(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let trip = state.trips.get_trip(&path, &user.user_id).await?;
    let body = export_service::trip_json(&trip)
        .map_err(|e| AppError::Internal(format!("Failed to serialize export: {}", e)))?;

    Ok(HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .insert_header(attachment(export_service::export_filename(
            &trip,
            "data.json",
        )))
        .body(body))
}

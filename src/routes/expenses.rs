use actix_web::{web, HttpResponse};

use crate::error::AppResult;
use crate::middleware::{auth::AuthMiddleware, auth_context::AuthenticatedUser};
use crate::models::expense::ExpenseInput;
use crate::routes::MessageResponse;
use crate::state::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/expenses")
            .wrap(AuthMiddleware)
            .route("/{trip_id}", web::post().to(add_expense))
            .route("/{trip_id}", web::get().to(list_expenses))
            .route("/{trip_id}/summary", web::get().to(expense_summary))
            .route("/{trip_id}/{expense_id}", web::put().to(update_expense))
            .route("/{trip_id}/{expense_id}", web::delete().to(delete_expense)),
    );
}

pub async fn add_expense(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    input: web::Json<ExpenseInput>,
) -> AppResult<HttpResponse> {
    let expense = state
        .trips
        .add_expense(&path, &user.user_id, input.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(expense))
}

pub async fn list_expenses(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let expenses = state.trips.list_expenses(&path, &user.user_id).await?;
    Ok(HttpResponse::Ok().json(expenses))
}

pub async fn update_expense(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<(String, String)>,
    input: web::Json<ExpenseInput>,
) -> AppResult<HttpResponse> {
    let (trip_id, expense_id) = path.into_inner();
    let expense = state
        .trips
        .update_expense(&trip_id, &expense_id, &user.user_id, input.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(expense))
}

pub async fn delete_expense(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<(String, String)>,
) -> AppResult<HttpResponse> {
    let (trip_id, expense_id) = path.into_inner();
    state
        .trips
        .delete_expense(&trip_id, &expense_id, &user.user_id)
        .await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Expense deleted successfully")))
}

pub async fn expense_summary(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let summary = state.trips.expense_summary(&path, &user.user_id).await?;
    Ok(HttpResponse::Ok().json(summary))
}

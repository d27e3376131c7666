use actix_web::{web, HttpRequest, HttpResponse};
use actix_ws::Message;
use futures::StreamExt;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RoomQuery {
    pub token: Option<String>,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/ws/{trip_id}", web::get().to(trip_room));
}

/// Upgrades to a WebSocket joined to the trip's room. Browsers cannot set
/// headers on the upgrade request, so the token travels in the query string.
pub async fn trip_room(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Payload,
    path: web::Path<String>,
    query: web::Query<RoomQuery>,
) -> AppResult<HttpResponse> {
    let token = query
        .token
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthenticated("Not authenticated".to_string()))?;
    let claims = state.auth.tokens().resolve(token)?;
    let trip = state.trips.load(&path, &claims.user_id).await?;

    let (response, session, mut messages) = actix_ws::handle(&req, body)
        .map_err(|e| AppError::InvalidInput(format!("WebSocket handshake failed: {}", e)))?;

    let trip_id = trip.id;
    let connection = state.rooms.join(&trip_id, session.clone());
    log::info!("User {} connected to trip room {}", claims.user_id, trip_id);

    let state = state.into_inner();
    actix_web::rt::spawn(async move {
        let mut session = session;
        while let Some(Ok(msg)) = messages.next().await {
            match msg {
                Message::Text(text) => {
                    state.rooms.broadcast(&trip_id, &text).await;
                }
                Message::Ping(bytes) => {
                    if session.pong(&bytes).await.is_err() {
                        break;
                    }
                }
                Message::Close(reason) => {
                    let _ = session.close(reason).await;
                    break;
                }
                _ => {}
            }
        }
        state.rooms.leave(&trip_id, connection);
        log::info!("Connection {} closed for trip room {}", connection, trip_id);
    });

    Ok(response)
}

//! Live chat stream (Server-Sent Events).
//!
//! GET /api/chat/rooms/:room_id/stream?token=JWT
//!
//! EventSource cannot send custom headers, so the token may come as a
//! `?token=` query param; the Authorization header is used when the param is
//! absent or does not verify. Only ACTIVE participants of the room may
//! subscribe, and the stream closes once the subscriber leaves.

use std::convert::Infallible;

use axum::{
    extract::{Extension, Path, Query},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::future;
use futures::stream::{self, StreamExt};
use serde::Deserialize;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tracing::{debug, warn};

use crate::common::RoomId;
use crate::domains::chatrooms::{room_topic, ChatError};
use crate::server::app::AppState;
use crate::server::middleware::AuthUser;

#[derive(Deserialize)]
pub struct StreamQuery {
    /// JWT token for authentication
    token: Option<String>,
}

pub async fn stream_handler(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
    Path(room_id): Path<RoomId>,
    Query(query): Query<StreamQuery>,
) -> Result<Sse<impl futures::Stream<Item = Result<Event, Infallible>>>, ChatError> {
    // A query token that fails verification falls back to the header.
    let identity = query
        .token
        .as_deref()
        .and_then(|token| state.deps.jwt_service.verify_token(token).ok())
        .map(|claims| claims.sub)
        .or_else(|| auth.map(|Extension(user)| user.email))
        .unwrap_or_default();

    let member_id = state
        .deps
        .session
        .authorize_stream(room_id, &identity)
        .await?;

    let rx = state.deps.stream_hub.subscribe(&room_topic(room_id)).await;
    debug!(room_id = %room_id, member_id = %member_id, "Live chat stream opened");

    let connected =
        stream::once(async { Ok::<_, Infallible>(Event::default().event("connected").data("ok")) });

    // Membership is re-checked per payload; the stream ends once the
    // subscriber is no longer an ACTIVE participant.
    let registry = state.deps.participants.clone();
    let events = BroadcastStream::new(rx)
        .then(move |result| {
            let registry = registry.clone();
            async move {
                let membership = registry.is_active_participant(room_id, member_id).await;
                let still_active = match membership {
                    Ok(active) => active,
                    Err(e) => {
                        warn!(room_id = %room_id, error = %e, "Membership check failed");
                        false
                    }
                };
                (still_active, result)
            }
        })
        .take_while(move |(still_active, _)| {
            if !*still_active {
                debug!(room_id = %room_id, member_id = %member_id, "Closing stream of departed member");
            }
            future::ready(*still_active)
        })
        .filter_map(|(_, result)| async move {
            match result {
                Ok(value) => {
                    let event_name = value
                        .get("messageType")
                        .and_then(|t| t.as_str())
                        .unwrap_or("NORMAL")
                        .to_ascii_lowercase();
                    Event::default()
                        .event(event_name)
                        .json_data(&value)
                        .ok()
                        .map(Ok)
                }
                Err(BroadcastStreamRecvError::Lagged(n)) => Event::default()
                    .event("lagged")
                    .json_data(serde_json::json!({"missed": n}))
                    .ok()
                    .map(Ok),
            }
        });

    Ok(Sse::new(connected.chain(events)).keep_alive(KeepAlive::default()))
}

//! Chat room REST endpoints.
//!
//! Every handler resolves the caller from the `AuthUser` extension; a missing
//! user is passed on as a blank identity, which the chat layer rejects.

use axum::{
    extract::{Extension, Path},
    Json,
};

use crate::common::{ListingId, RoomId};
use crate::domains::chatrooms::data::{CreateRoomRequest, SendMessageRequest};
use crate::domains::chatrooms::{ChatError, MessageDto, RoomSummary};
use crate::server::app::AppState;
use crate::server::envelope::ApiResponse;
use crate::server::middleware::{caller_identity, AuthUser};

/// GET /api/chat/rooms/:room_id/messages
pub async fn get_messages_handler(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
    Path(room_id): Path<RoomId>,
) -> Result<ApiResponse<Vec<MessageDto>>, ChatError> {
    let identity = caller_identity(auth.as_ref().map(|Extension(user)| user));
    let messages = state.deps.session.get_messages(room_id, identity).await?;

    Ok(ApiResponse::ok("Fetched chat messages", messages))
}

/// POST /api/chat/rooms/:listing_id
pub async fn create_room_handler(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
    Path(listing_id): Path<ListingId>,
    body: Option<Json<CreateRoomRequest>>,
) -> Result<ApiResponse<RoomId>, ChatError> {
    let identity = caller_identity(auth.as_ref().map(|Extension(user)| user));
    let room_name = body.and_then(|Json(request)| request.room_name);

    let room_id = state
        .deps
        .room_manager
        .create_or_get_room(listing_id, identity, room_name)
        .await?;

    Ok(ApiResponse::ok("Chat room ready", room_id))
}

/// GET /api/chat/rooms/my
pub async fn my_rooms_handler(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
) -> Result<ApiResponse<Vec<RoomSummary>>, ChatError> {
    let identity = caller_identity(auth.as_ref().map(|Extension(user)| user));
    let rooms = state.deps.session.list_my_rooms(identity).await?;

    Ok(ApiResponse::ok("Fetched my chat rooms", rooms))
}

/// DELETE /api/chat/rooms/:room_id
pub async fn leave_room_handler(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
    Path(room_id): Path<RoomId>,
) -> Result<ApiResponse<()>, ChatError> {
    let identity = caller_identity(auth.as_ref().map(|Extension(user)| user));
    state.deps.participants.leave(room_id, identity).await?;

    Ok(ApiResponse::<()>::ok_empty("Left chat room"))
}

/// POST /api/chat/rooms/:room_id/messages
pub async fn send_message_handler(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
    Path(room_id): Path<RoomId>,
    Json(request): Json<SendMessageRequest>,
) -> Result<ApiResponse<MessageDto>, ChatError> {
    let identity = caller_identity(auth.as_ref().map(|Extension(user)| user));
    let message = state
        .deps
        .session
        .send_message(room_id, identity, &request.content)
        .await?;

    Ok(ApiResponse::ok("Message sent", message))
}

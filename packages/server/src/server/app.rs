//! Application setup and server configuration.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::kernel::ServerDeps;
use crate::server::middleware::jwt_auth_middleware;
use crate::server::routes::{
    create_room_handler, get_messages_handler, health_handler, leave_room_handler,
    my_rooms_handler, send_message_handler, stream_handler,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub deps: Arc<ServerDeps>,
}

/// Build the Axum application router
pub fn build_app(deps: Arc<ServerDeps>) -> Router {
    let jwt_service = deps.jwt_service.clone();
    let state = AppState { deps };

    // CORS configuration - allow any origin; auth is bearer-token based
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    Router::new()
        .route("/api/chat/rooms/my", get(my_rooms_handler))
        .route(
            "/api/chat/rooms/:id",
            post(create_room_handler).delete(leave_room_handler),
        )
        .route(
            "/api/chat/rooms/:id/messages",
            get(get_messages_handler).post(send_message_handler),
        )
        .route("/api/chat/rooms/:id/stream", get(stream_handler))
        .route("/health", get(health_handler))
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(middleware::from_fn(move |req, next| {
            jwt_auth_middleware(jwt_service.clone(), req, next)
        }))
        .layer(Extension(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

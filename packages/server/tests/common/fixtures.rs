//! In-memory application fixture for HTTP tests, plus Postgres seed helpers.

#![allow(dead_code)]

use anyhow::Result;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use serde_json::Value;
use sqlx::PgPool;
use std::sync::Arc;
use tower::ServiceExt;

use dealroom_core::common::{ListingId, MemberId};
use dealroom_core::domains::auth::JwtService;
use dealroom_core::domains::chatrooms::broker::LoopbackPublisher;
use dealroom_core::domains::listings::Listing;
use dealroom_core::domains::member::Member;
use dealroom_core::kernel::{
    ChatStores, InMemoryChatStore, NatsPublisher, ServerDeps, StreamHub, TestNats,
};
use dealroom_core::server::build_app;

pub const SELLER: &str = "seller@example.com";
pub const BUYER: &str = "buyer@example.com";
pub const STRANGER: &str = "stranger@example.com";

/// The full router over the in-memory backend.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryChatStore>,
    pub nats: Arc<TestNats>,
    pub hub: StreamHub,
    pub jwt: Arc<JwtService>,
    pub seller: Member,
    pub buyer: Member,
    pub stranger: Member,
    pub listing: Listing,
}

impl TestApp {
    /// Publishes into a recording `TestNats`.
    pub fn new() -> Self {
        let nats = Arc::new(TestNats::new());
        Self::build(nats.clone(), nats, StreamHub::new())
    }

    /// Publishes through the loopback transport into `hub`.
    pub fn with_loopback() -> Self {
        let hub = StreamHub::new();
        Self::build(
            Arc::new(LoopbackPublisher::new(hub.clone())),
            Arc::new(TestNats::new()),
            hub,
        )
    }

    fn build(publisher: Arc<dyn NatsPublisher>, nats: Arc<TestNats>, hub: StreamHub) -> Self {
        let store = Arc::new(InMemoryChatStore::new());
        let seller = store.add_member(SELLER, "Sally");
        let buyer = store.add_member(BUYER, "Bob");
        let stranger = store.add_member(STRANGER, "Sam");
        let listing = store.add_listing("Road bike", seller.id);

        let jwt = Arc::new(JwtService::new("test_secret", "dealroom".to_string()));
        let deps = ServerDeps::new(
            None,
            ChatStores::from_backend(store.clone()),
            publisher,
            "chat.messages",
            true,
            hub.clone(),
            jwt.clone(),
        );

        Self {
            router: build_app(Arc::new(deps)),
            store,
            nats,
            hub,
            jwt,
            seller,
            buyer,
            stranger,
            listing,
        }
    }

    pub fn token_for(&self, email: &str) -> String {
        self.jwt.create_token(email).expect("token")
    }

    /// Send a request as `email` (or anonymously) and decode the JSON reply.
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        email: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(email) = email {
            builder = builder.header("authorization", format!("Bearer {}", self.token_for(email)));
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = self.router.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, json)
    }

    /// Open the buyer's room on the fixture listing and return its id.
    pub async fn open_room(&self) -> String {
        let (status, body) = self
            .call(
                Method::POST,
                &format!("/api/chat/rooms/{}", self.listing.id),
                Some(BUYER),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["data"].as_str().expect("room id").to_string()
    }
}

// =============================================================================
// Postgres seed helpers
// =============================================================================

pub async fn create_test_member(pool: &PgPool, name: &str) -> Result<Member> {
    let id = MemberId::new();
    Member {
        id,
        email: format!("{}-{}@example.com", name.to_lowercase(), id),
        name: name.to_string(),
        created_at: Utc::now(),
    }
    .insert(pool)
    .await
}

pub async fn create_test_listing(pool: &PgPool, title: &str, author_id: MemberId) -> Result<Listing> {
    Listing {
        id: ListingId::new(),
        title: title.to_string(),
        author_id,
        created_at: Utc::now(),
    }
    .insert(pool)
    .await
}

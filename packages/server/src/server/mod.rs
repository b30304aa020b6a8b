// HTTP server setup (Axum)
pub mod app;
pub mod envelope;
pub mod middleware;
pub mod routes;

pub use app::*;
pub use envelope::ApiResponse;

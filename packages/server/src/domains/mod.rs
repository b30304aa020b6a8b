// Business domains
pub mod auth;
pub mod chatrooms;
pub mod listings;
pub mod member;

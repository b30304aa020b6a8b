// HTTP routes
pub mod chat;
pub mod health;
pub mod stream;

pub use chat::*;
pub use health::*;
pub use stream::*;

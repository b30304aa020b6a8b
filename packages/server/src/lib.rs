// Dealroom - chat subsystem of the marketplace
//
// Negotiation rooms between a listing author and an interested member:
// room lifecycle, membership, durable message history and live fan-out.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;

//! WebSocket push channel.
//!
//! Every connected client receives every row-change notification. Clients
//! never need to send anything; text they do send is echoed back.

mod manager;
mod protocol;

pub use manager::ConnectionManager;
pub use protocol::*;

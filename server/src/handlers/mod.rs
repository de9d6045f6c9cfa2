//! Connection handlers.

mod websocket;

pub use websocket::*;

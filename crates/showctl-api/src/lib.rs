// showctl-api: websocket transport for show-control console clients

pub mod error;
pub mod websocket;

pub use error::Error;
pub use websocket::{ReconnectConfig, TransportEvent, WebSocketHandle};

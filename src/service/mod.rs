//! Service layer: maps decoded protocol requests onto the registry.
//!
//! The [`ProtocolDispatcher`] never touches a socket; the WebSocket layer
//! owns all I/O.

pub mod protocol_dispatcher;

pub use protocol_dispatcher::ProtocolDispatcher;

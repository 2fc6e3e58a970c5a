//! WebSocket layer: framing, codec, and the per-connection session.
//!
//! The WebSocket endpoint at `/websocket` carries the subscription protocol.
//! Only text frames are accepted; each one holds a single JSON envelope.

pub mod codec;
pub mod connection;
pub mod frame_reader;
pub mod handler;
pub mod messages;

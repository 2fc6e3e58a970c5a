//! # subscription-gateway
//!
//! WebSocket server (and client) for a small subscription registration
//! protocol. Clients register a named subscriber against a topic and get a
//! server-issued subscription id back; they later unregister by that id.
//!
//! The protocol only records interest. It never publishes topic events.
//!
//! ## Architecture
//!
//! ```text
//! Clients (WebSocket, HTTP)
//!     │
//!     ├── WS Handler + Session (ws/)
//!     │       FrameReader → codec::decode
//!     │
//!     ├── ProtocolDispatcher (service/)
//!     │
//!     ├── SubscriberRegistry (domain/)
//!     │
//!     └── REST inspection + /restapi greeting (api/)
//! ```

pub mod api;
pub mod app_state;
pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod router;
pub mod service;
pub mod ws;

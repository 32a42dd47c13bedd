//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, connection limits)
//!     → connection.rs (slot + lifetime tracking)
//!     → axum::serve (HTTP/1.1 or HTTP/2 detection)
//! ```
//!
//! # Design Decisions
//! - Bounded accept prevents resource exhaustion
//! - One port serves both protocols; the HTTP layer sniffs the preface

pub mod connection;
pub mod listener;

pub use connection::{Connection, ConnectionId, ConnectionTracker};
pub use listener::{Listener, ListenerError};

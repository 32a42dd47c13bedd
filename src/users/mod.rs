//! User lookup behind the `GetUser` method.
//!
//! # Data Flow
//! ```text
//! GetUser handler
//!     → service.rs (use-case layer, logs failures)
//!     → store.rs (UserStore trait, in-memory implementation)
//! ```

pub mod service;
pub mod store;

use serde::{Deserialize, Serialize};

pub use service::UserService;
pub use store::{InMemoryUserStore, StoreError, UserStore};

/// A user record.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

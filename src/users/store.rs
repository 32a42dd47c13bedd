//! User storage.

use async_trait::async_trait;
use dashmap::DashMap;

use super::User;

/// Errors surfaced by a [`UserStore`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("user {0} not found")]
    NotFound(u64),
    #[error("user store unavailable: {0}")]
    Unavailable(String),
}

/// Read access to user records.
#[async_trait]
pub trait UserStore: Send + Sync + std::fmt::Debug {
    async fn get_user(&self, id: u64) -> Result<User, StoreError>;
}

/// Concurrent in-memory store, seeded from configuration.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: DashMap<u64, User>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record.
    pub fn insert(&self, user: User) {
        self.users.insert(user.id, user);
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl FromIterator<User> for InMemoryUserStore {
    fn from_iter<I: IntoIterator<Item = User>>(iter: I) -> Self {
        let store = Self::new();
        for user in iter {
            store.insert(user);
        }
        store
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn get_user(&self, id: u64) -> Result<User, StoreError> {
        self.users
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(StoreError::NotFound(id))
    }
}

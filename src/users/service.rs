//! User use cases.

use std::sync::Arc;

use super::store::{StoreError, UserStore};
use super::User;

/// Use-case layer between the RPC handler and the store.
#[derive(Debug, Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// Fetch a user's details.
    pub async fn get_user(&self, id: u64) -> Result<User, StoreError> {
        match self.store.get_user(id).await {
            Ok(user) => Ok(user),
            Err(e) => {
                tracing::error!(user_id = id, error = %e, "get user detail failed");
                Err(e)
            }
        }
    }
}

impl From<StoreError> for tonic::Status {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => tonic::Status::not_found(err.to_string()),
            StoreError::Unavailable(_) => tonic::Status::unavailable(err.to_string()),
        }
    }
}

//! In-memory user store for tests and local development.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{StoreError, UserStore};
use crate::models::UserRecord;

/// HashMap-backed store. Enforces email uniqueness like the real schema.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, UserRecord>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip a stored user's activity flag. Stands in for the admin path
    /// that disables accounts in production.
    pub async fn set_active(&self, id: Uuid, active: bool) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        let record = users.get_mut(&id).ok_or(StoreError::NotFound)?;
        record.user.is_active = active;
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, record: &UserRecord) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        if users.values().any(|r| r.user.email == record.user.email) {
            return Err(StoreError::UniqueViolation);
        }
        users.insert(record.user.id, record.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<UserRecord, StoreError> {
        self.users
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn get_by_email(&self, email: &str) -> Result<UserRecord, StoreError> {
        self.users
            .read()
            .await
            .values()
            .find(|r| r.user.email == email)
            .cloned()
            .ok_or(StoreError::NotFound)
    }
}

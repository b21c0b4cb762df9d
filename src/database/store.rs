//! User store interface shared by the PostgreSQL and in-memory backends

use async_trait::async_trait;
use thiserror::Error;

use crate::database::users::UserProfile;
use crate::reputation::{Role, UserReputation};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("user {identity} not found")]
    NotFound { identity: String },

    #[error("user {identity} already exists")]
    Duplicate { identity: String },

    /// The stored rating count moved since it was read
    #[error("concurrent update on user {identity}: expected rating count {expected}")]
    Conflict { identity: String, expected: u32 },

    /// A counter no longer fits the INTEGER column
    #[error("{field} value {value} exceeds the storable range")]
    OutOfRange { field: &'static str, value: u32 },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Reputation fields written by a single rating event.
///
/// Applied only while the stored rating count still equals
/// `expected_rating_count`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReputationUpdate {
    pub classification: f64,
    pub rating_count: u32,
    pub points: u32,
    pub expected_rating_count: u32,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, profile: &UserProfile) -> Result<(), StoreError>;

    async fn find_by_identity(&self, identity: &str) -> Result<Option<UserProfile>, StoreError>;

    /// Every user whose classification is set
    async fn find_all_with_classification(&self) -> Result<Vec<UserReputation>, StoreError>;

    async fn find_all_by_role(&self, role: Role) -> Result<Vec<UserReputation>, StoreError>;

    /// Compare-and-swap on the rating count; see [`ReputationUpdate`]
    async fn update_reputation(
        &self,
        identity: &str,
        update: &ReputationUpdate,
    ) -> Result<(), StoreError>;

    /// Returns false when no such user existed
    async fn remove(&self, identity: &str) -> Result<bool, StoreError>;
}

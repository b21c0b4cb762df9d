//! In-memory user store, used when PostgreSQL is disabled

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::database::store::{ReputationUpdate, StoreError, UserStore};
use crate::database::users::UserProfile;
use crate::reputation::{Role, UserReputation};

#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<String, UserProfile>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, profile: &UserProfile) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        if users.contains_key(&profile.identity) {
            return Err(StoreError::Duplicate {
                identity: profile.identity.clone(),
            });
        }
        users.insert(profile.identity.clone(), profile.clone());
        Ok(())
    }

    async fn find_by_identity(&self, identity: &str) -> Result<Option<UserProfile>, StoreError> {
        Ok(self.users.read().await.get(identity).cloned())
    }

    async fn find_all_with_classification(&self) -> Result<Vec<UserReputation>, StoreError> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .filter(|u| u.classification.is_some_and(f64::is_finite))
            .map(UserProfile::reputation)
            .collect())
    }

    async fn find_all_by_role(&self, role: Role) -> Result<Vec<UserReputation>, StoreError> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .filter(|u| u.role == role)
            .map(UserProfile::reputation)
            .collect())
    }

    async fn update_reputation(
        &self,
        identity: &str,
        update: &ReputationUpdate,
    ) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        let user = users.get_mut(identity).ok_or_else(|| StoreError::NotFound {
            identity: identity.to_string(),
        })?;

        if user.rating_count != update.expected_rating_count {
            return Err(StoreError::Conflict {
                identity: identity.to_string(),
                expected: update.expected_rating_count,
            });
        }

        user.classification = Some(update.classification);
        user.rating_count = update.rating_count;
        user.points = update.points;
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn remove(&self, identity: &str) -> Result<bool, StoreError> {
        Ok(self.users.write().await.remove(identity).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(identity: &str, role: Role) -> UserProfile {
        UserProfile::new(
            identity.to_string(),
            format!("User {}", identity),
            format!("{}@example.edu", identity),
            role,
        )
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicates() {
        let store = MemoryUserStore::new();
        store.insert(&profile("111", Role::Student)).await.unwrap();

        let err = store.insert(&profile("111", Role::Student)).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { .. }));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_update_is_conditional_on_rating_count() {
        let store = MemoryUserStore::new();
        store.insert(&profile("111", Role::Student)).await.unwrap();

        let update = ReputationUpdate {
            classification: 3.5,
            rating_count: 1,
            points: 3,
            expected_rating_count: 0,
        };
        store.update_reputation("111", &update).await.unwrap();

        // Same expectation again: the count has moved on
        let err = store.update_reputation("111", &update).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { expected: 0, .. }));

        let user = store.find_by_identity("111").await.unwrap().unwrap();
        assert_eq!(user.classification, Some(3.5));
        assert_eq!(user.rating_count, 1);
        assert_eq!(user.points, 3);
    }

    #[tokio::test]
    async fn test_update_missing_user() {
        let store = MemoryUserStore::new();
        let update = ReputationUpdate {
            classification: 3.0,
            rating_count: 1,
            points: 2,
            expected_rating_count: 0,
        };
        let err = store.update_reputation("404", &update).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_queries_filter_by_role_and_classification() {
        let store = MemoryUserStore::new();
        store.insert(&profile("1", Role::Student)).await.unwrap();
        store.insert(&profile("2", Role::Administrator)).await.unwrap();
        let mut rated = profile("3", Role::Student);
        rated.classification = Some(4.0);
        store.insert(&rated).await.unwrap();

        assert_eq!(store.find_all_by_role(Role::Student).await.unwrap().len(), 2);
        assert_eq!(store.find_all_by_role(Role::Administrator).await.unwrap().len(), 1);

        let classified = store.find_all_with_classification().await.unwrap();
        assert_eq!(classified.len(), 1);
        assert_eq!(classified[0].identity, "3");
    }

    #[tokio::test]
    async fn test_remove() {
        let store = MemoryUserStore::new();
        store.insert(&profile("1", Role::Student)).await.unwrap();
        assert!(store.remove("1").await.unwrap());
        assert!(!store.remove("1").await.unwrap());
        assert!(store.is_empty().await);
    }
}

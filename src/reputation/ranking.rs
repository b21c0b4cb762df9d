//! Leaderboards over the student population
//!
//! Ties on points break by identity (ascending). Classification ties break by
//! rating count (descending), then identity. Unrated students, including
//! anyone sitting at exactly 0, always come after rated ones.

use serde::Serialize;
use std::cmp::Ordering;
use std::sync::Arc;

use crate::database::{StoreError, UserStore};
use crate::reputation::{Role, UserReputation};

/// Leaderboard size when none is configured
pub const DEFAULT_RANKING_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingEntry {
    /// 1-based position on the board
    pub position: usize,
    pub identity: String,
    pub classification: f64,
    pub rating_count: u32,
    pub points: u32,
}

fn into_entries(users: Vec<UserReputation>, limit: usize) -> Vec<RankingEntry> {
    users
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, u)| RankingEntry {
            position: i + 1,
            classification: u.classification_or_zero(),
            identity: u.identity,
            rating_count: u.rating_count,
            points: u.points,
        })
        .collect()
}

/// Students by points, highest first
pub fn rank_by_points(mut users: Vec<UserReputation>, limit: usize) -> Vec<RankingEntry> {
    users.retain(|u| u.role == Role::Student);
    users.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then_with(|| a.identity.cmp(&b.identity))
    });
    into_entries(users, limit)
}

/// Students by classification, highest first, unrated last
pub fn rank_by_classification(mut users: Vec<UserReputation>, limit: usize) -> Vec<RankingEntry> {
    users.retain(|u| u.role == Role::Student);
    users.sort_by(|a, b| {
        a.is_unrated()
            .cmp(&b.is_unrated())
            .then_with(|| {
                b.classification_or_zero()
                    .partial_cmp(&a.classification_or_zero())
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| b.rating_count.cmp(&a.rating_count))
            .then_with(|| a.identity.cmp(&b.identity))
    });
    into_entries(users, limit)
}

pub struct RankingProjector {
    store: Arc<dyn UserStore>,
}

impl RankingProjector {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    pub async fn top_by_points(&self, limit: usize) -> Result<Vec<RankingEntry>, StoreError> {
        let students = self.store.find_all_by_role(Role::Student).await?;
        Ok(rank_by_points(students, limit))
    }

    pub async fn top_by_classification(
        &self,
        limit: usize,
    ) -> Result<Vec<RankingEntry>, StoreError> {
        let students = self.store.find_all_by_role(Role::Student).await?;
        Ok(rank_by_classification(students, limit))
    }
}

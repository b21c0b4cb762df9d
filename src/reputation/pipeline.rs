//! Rating Pipeline - Main Orchestrator
//!
//! Folds one rating into the target's classification, vote count and points.
//! Updates on the same target are serialized in-process, and the store write
//! is a compare-and-swap on the rating count so a writer in another process
//! cannot be silently overwritten.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use crate::database::{ReputationUpdate, StoreError, UserStore};
use crate::reputation::aggregate::{aggregate, DEFAULT_MIN_VOTES};
use crate::reputation::global::GlobalAverageEstimator;
use crate::reputation::points::points_for_score;
use crate::reputation::score::{is_valid_score, MAX_SCORE, MIN_SCORE};

#[derive(Debug, Error)]
pub enum RatingError {
    #[error("score must be a number between 0 and 5, got {score}")]
    InvalidScore { score: f64 },

    #[error("{field} must not be empty")]
    MissingField { field: &'static str },

    #[error("users cannot rate themselves")]
    SelfRating,

    #[error("user {identity} not found")]
    TargetNotFound { identity: String },

    #[error("user {identity} was updated concurrently, retry the rating")]
    Conflict { identity: String },

    #[error("user {identity} cannot receive more ratings")]
    VoteCountOverflow { identity: String },

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for RatingError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { identity } => RatingError::TargetNotFound { identity },
            StoreError::Conflict { identity, .. } => RatingError::Conflict { identity },
            other => RatingError::Store(other),
        }
    }
}

/// Before/after snapshot of a rating, returned for auditing
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingOutcome {
    pub target_identity: String,
    pub score: f64,
    pub previous_classification: Option<f64>,
    pub simple_average: f64,
    pub classification: f64,
    pub rating_count: u32,
    pub global_average: f64,
    pub global_average_degraded: bool,
    pub points_delta: u32,
    pub points_before: u32,
    pub points_after: u32,
}

#[derive(Default)]
struct TargetSlot {
    mutex: Arc<Mutex<()>>,
    /// Leases holding or waiting on `mutex`
    holders: usize,
}

/// One async mutex per target identity, dropped once nobody holds or waits on it
#[derive(Default)]
struct TargetLocks {
    slots: DashMap<String, TargetSlot>,
}

impl TargetLocks {
    async fn lock(&self, identity: &str) -> TargetLease<'_> {
        let mutex = {
            let mut slot = self.slots.entry(identity.to_string()).or_default();
            slot.holders += 1;
            slot.mutex.clone()
        };

        // Registered before waiting, so a cancelled wait still releases the slot
        let mut lease = TargetLease {
            locks: self,
            identity: identity.to_string(),
            guard: None,
        };
        lease.guard = Some(mutex.lock_owned().await);
        lease
    }

    fn release(&self, identity: &str) {
        if let Entry::Occupied(mut slot) = self.slots.entry(identity.to_string()) {
            let holders = slot.get().holders.saturating_sub(1);
            if holders == 0 {
                slot.remove();
            } else {
                slot.get_mut().holders = holders;
            }
        }
    }

    fn len(&self) -> usize {
        self.slots.len()
    }
}

/// Exclusive access to one target; releases its slot on drop, including
/// when the rating future is cancelled mid-flight
struct TargetLease<'a> {
    locks: &'a TargetLocks,
    identity: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for TargetLease<'_> {
    fn drop(&mut self) {
        self.guard.take();
        self.locks.release(&self.identity);
    }
}

pub struct RatingPipeline {
    store: Arc<dyn UserStore>,
    estimator: GlobalAverageEstimator,
    min_votes: u32,
    locks: TargetLocks,
}

impl RatingPipeline {
    pub fn new(store: Arc<dyn UserStore>, estimator: GlobalAverageEstimator) -> Self {
        Self {
            store,
            estimator,
            min_votes: DEFAULT_MIN_VOTES,
            locks: TargetLocks::default(),
        }
    }

    pub fn with_min_votes(mut self, min_votes: u32) -> Self {
        self.min_votes = min_votes;
        self
    }

    pub fn min_votes(&self) -> u32 {
        self.min_votes
    }

    /// Number of targets with a live lock entry
    pub fn pending_targets(&self) -> usize {
        self.locks.len()
    }

    /// Apply `score` from `rater` to `target`
    pub async fn rate(
        &self,
        rater: &str,
        target: &str,
        score: f64,
    ) -> Result<RatingOutcome, RatingError> {
        if !is_valid_score(score) {
            return Err(RatingError::InvalidScore { score });
        }
        if rater.trim().is_empty() {
            return Err(RatingError::MissingField { field: "rater" });
        }
        if target.trim().is_empty() {
            return Err(RatingError::MissingField {
                field: "targetIdentity",
            });
        }
        if rater == target {
            warn!(identity = %rater, "Rejected self-rating attempt");
            return Err(RatingError::SelfRating);
        }

        let _lease = self.locks.lock(target).await;
        self.apply(target, score).await
    }

    async fn apply(&self, target: &str, score: f64) -> Result<RatingOutcome, RatingError> {
        let user = self
            .store
            .find_by_identity(target)
            .await?
            .ok_or_else(|| RatingError::TargetNotFound {
                identity: target.to_string(),
            })?;

        let old_votes = user.rating_count;
        let new_votes = old_votes
            .checked_add(1)
            .ok_or_else(|| RatingError::VoteCountOverflow {
                identity: target.to_string(),
            })?;
        let old_classification = user.classification.unwrap_or(0.0);
        let simple_average =
            (old_classification * old_votes as f64 + score) / new_votes as f64;

        let global = self.estimator.estimate().await;

        let aggregated = aggregate(simple_average, new_votes, global.value, self.min_votes);
        let classification = match aggregated {
            Ok(value) => value.clamp(MIN_SCORE, MAX_SCORE),
            Err(e) => {
                warn!(
                    error = %e,
                    identity = %target,
                    "Aggregation failed, using simple average"
                );
                simple_average
            }
        };

        let points_delta = points_for_score(score);
        let points_after = user.points.saturating_add(points_delta);

        let update = ReputationUpdate {
            classification,
            rating_count: new_votes,
            points: points_after,
            expected_rating_count: old_votes,
        };
        self.store.update_reputation(target, &update).await?;

        info!(
            identity = %target,
            score,
            classification,
            rating_count = new_votes,
            points_delta,
            "Rating applied"
        );
        debug!(
            identity = %target,
            simple_average,
            global_average = global.value,
            degraded = global.is_degraded(),
            "Rating details"
        );

        Ok(RatingOutcome {
            target_identity: target.to_string(),
            score,
            previous_classification: user.classification,
            simple_average,
            classification,
            rating_count: new_votes,
            global_average: global.value,
            global_average_degraded: global.is_degraded(),
            points_delta,
            points_before: user.points,
            points_after,
        })
    }
}

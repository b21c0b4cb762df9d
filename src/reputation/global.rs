//! Population-wide average classification
//!
//! Full scan per call. A cold-start population or a failed read yields the
//! configured default so rating never blocks on it.

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::database::UserStore;
use crate::reputation::UserReputation;

/// Mean used when no user has been rated yet
pub const DEFAULT_GLOBAL_AVERAGE: f64 = 3.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalEstimate {
    pub value: f64,
    /// Users that contributed to the mean
    pub sample_size: usize,
    /// Read failure that forced the fallback, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded: Option<String>,
}

impl GlobalEstimate {
    pub fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }
}

/// Arithmetic mean of every set, finite classification
pub fn mean_classification(users: &[UserReputation]) -> Option<(f64, usize)> {
    let values: Vec<f64> = users
        .iter()
        .filter_map(|u| u.classification)
        .filter(|c| c.is_finite())
        .collect();

    if values.is_empty() {
        return None;
    }

    let sum: f64 = values.iter().sum();
    Some((sum / values.len() as f64, values.len()))
}

pub struct GlobalAverageEstimator {
    store: Arc<dyn UserStore>,
    fallback: f64,
}

impl GlobalAverageEstimator {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self::with_fallback(store, DEFAULT_GLOBAL_AVERAGE)
    }

    pub fn with_fallback(store: Arc<dyn UserStore>, fallback: f64) -> Self {
        Self { store, fallback }
    }

    pub fn fallback(&self) -> f64 {
        self.fallback
    }

    pub async fn estimate(&self) -> GlobalEstimate {
        match self.store.find_all_with_classification().await {
            Ok(users) => match mean_classification(&users) {
                Some((value, sample_size)) => {
                    debug!(value, sample_size, "Global average computed");
                    GlobalEstimate {
                        value,
                        sample_size,
                        degraded: None,
                    }
                }
                None => {
                    debug!(fallback = self.fallback, "No classified users, using default average");
                    GlobalEstimate {
                        value: self.fallback,
                        sample_size: 0,
                        degraded: None,
                    }
                }
            },
            Err(e) => {
                warn!(
                    error = %e,
                    fallback = self.fallback,
                    "Global average read failed, continuing with default"
                );
                GlobalEstimate {
                    value: self.fallback,
                    sample_size: 0,
                    degraded: Some(e.to_string()),
                }
            }
        }
    }
}

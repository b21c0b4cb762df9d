//! Reputation Types
//!
//! Classification is a Bayesian-adjusted average on a 0-5 scale.
//! Points are a gamification tally that only ever grows.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Upper bound of the rating scale
pub const MAX_SCORE: f64 = 5.0;

/// Lower bound of the rating scale
pub const MIN_SCORE: f64 = 0.0;

/// Platform role; only students appear on leaderboards
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Student,
    Administrator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Administrator => "administrator",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "administrator" => Ok(Role::Administrator),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// Reputation projection of a user record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserReputation {
    /// National ID, unique per user
    pub identity: String,

    /// Bayesian-adjusted average, unset until the first rating
    pub classification: Option<f64>,

    /// Ratings folded into `classification`
    pub rating_count: u32,

    /// Gamification tally
    pub points: u32,

    pub role: Role,
}

impl UserReputation {
    pub fn new(identity: impl Into<String>, role: Role) -> Self {
        Self {
            identity: identity.into(),
            classification: None,
            rating_count: 0,
            points: 0,
            role,
        }
    }

    /// Classification with "never rated" read as 0
    pub fn classification_or_zero(&self) -> f64 {
        self.classification.unwrap_or(0.0)
    }

    /// Unrated users and users sitting at exactly 0 are treated alike
    pub fn is_unrated(&self) -> bool {
        self.classification_or_zero() == 0.0
    }
}

/// Checks that a raw rating is a finite value on the 0-5 scale
pub fn is_valid_score(score: f64) -> bool {
    score.is_finite() && (MIN_SCORE..=MAX_SCORE).contains(&score)
}

//! Reputation System
//!
//! Turns peer ratings into a public classification and a points tally, and
//! projects both into leaderboards.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────┐     ┌────────────────┐     ┌──────────────────┐
//! │ GlobalAverageEstimator │────►│ RatingPipeline │◄────│ aggregate()      │
//! │ (population mean)      │     │ (orchestrator) │     │ (Bayesian blend) │
//! └────────────────────────┘     └────────────────┘     └──────────────────┘
//!                                        │
//!                                        ▼
//!                                ┌────────────────┐     ┌──────────────────┐
//!                                │   UserStore    │────►│ RankingProjector │
//!                                └────────────────┘     │ (leaderboards)   │
//!                                                       └──────────────────┘
//! ```
//!
//! ## Score Model
//!
//! - Ratings are 0-5; classification is the Bayesian-adjusted average
//! - `min_votes` (default 2) sets how strongly few ratings shrink toward the mean
//! - Points grow by a fixed tier of the raw rating and never decrease
//! - A user cannot rate themself

pub mod aggregate;
pub mod global;
pub mod pipeline;
pub mod points;
pub mod ranking;
mod score;

pub use aggregate::{aggregate, AggregateError, DEFAULT_MIN_VOTES};
pub use global::{GlobalAverageEstimator, GlobalEstimate, DEFAULT_GLOBAL_AVERAGE};
pub use pipeline::{RatingError, RatingOutcome, RatingPipeline};
pub use points::points_for_score;
pub use ranking::{RankingEntry, RankingProjector, DEFAULT_RANKING_LIMIT};
pub use score::{is_valid_score, Role, UserReputation, MAX_SCORE, MIN_SCORE};

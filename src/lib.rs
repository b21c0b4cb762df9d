//! Carpool Community Backend
//!
//! REST backend for a student carpool community: user profiles, peer ratings
//! folded into a Bayesian classification, leaderboards, and email
//! verification codes.
//!
//! ## Module Structure
//!
//! ```text
//! src/
//! ├── lib.rs          - Crate root with re-exports
//! ├── main.rs         - Server entrypoint
//! ├── app.rs          - Service wiring and route table
//! ├── config.rs       - Configuration management
//! ├── reputation/     - Rating and ranking core
//! │   ├── aggregate.rs - Bayesian average
//! │   ├── global.rs    - Population mean with cold-start default
//! │   ├── points.rs    - Points tier table
//! │   ├── pipeline.rs  - Rating orchestrator
//! │   ├── ranking.rs   - Leaderboards
//! │   └── score.rs     - Reputation types
//! ├── verification/   - Expiring email verification codes
//! ├── api/            - HTTP API endpoints
//! │   ├── rating.rs       - POST /rate
//! │   ├── ranking.rs      - GET /ranking, /ranking/clasificaciones
//! │   ├── users.rs        - Profile CRUD
//! │   ├── verification.rs - Code issue/check
//! │   ├── response.rs     - Envelopes and error mapping
//! │   └── middleware.rs   - Auth, rate limiting, headers, logging
//! └── database/       - PostgreSQL and in-memory user stores
//! ```

pub mod api;
pub mod app;
pub mod config;
pub mod database;
pub mod reputation;
pub mod verification;

pub use app::Services;
pub use config::AppConfig;
pub use database::{DatabasePool, MemoryUserStore, StoreError, UserProfile, UserStore};
pub use reputation::{
    aggregate, GlobalAverageEstimator, GlobalEstimate, RankingEntry, RankingProjector,
    RatingError, RatingOutcome, RatingPipeline, Role, UserReputation,
};
pub use verification::{VerificationCodeStore, VerificationError};

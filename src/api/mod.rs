//! HTTP API endpoints
//!
//! Provides REST APIs for:
//! - Rating other users and reading leaderboards
//! - User profiles
//! - Email verification codes
//! - Security middleware (auth, rate limiting, headers, logging)

pub mod middleware;
pub mod ranking;
pub mod rating;
pub mod response;
pub mod users;
pub mod verification;

use axum::{middleware as axum_middleware, Router};
use tower_http::trace::TraceLayer;

pub use middleware::{
    auth_middleware, body_size_middleware, logging_middleware, rate_limit_middleware,
    security_headers_middleware, CallerIdentity, RateLimiter, SecurityMiddlewareConfig,
    SecurityState, CALLER_IDENTITY_HEADER,
};
pub use ranking::{create_router as create_ranking_router, RankingApiState};
pub use rating::{create_router as create_rating_router, RatingApiState};
pub use response::{ApiError, Envelope};
pub use users::{create_router as create_user_router, UserApiState};
pub use verification::{create_router as create_verification_router, VerificationApiState};

/// Wrap `router` in the middleware stack; the last layer added runs first
pub fn with_security(router: Router, security: SecurityState) -> Router {
    router
        .layer(axum_middleware::from_fn_with_state(
            security.clone(),
            body_size_middleware,
        ))
        .layer(axum_middleware::from_fn_with_state(
            security.clone(),
            auth_middleware,
        ))
        .layer(axum_middleware::from_fn_with_state(
            security.clone(),
            rate_limit_middleware,
        ))
        .layer(axum_middleware::from_fn_with_state(
            security,
            logging_middleware,
        ))
        .layer(axum_middleware::from_fn(security_headers_middleware))
        .layer(TraceLayer::new_for_http())
}

//! Service wiring shared by the server binary and the HTTP tests

use axum::{routing::get, Router};
use std::sync::Arc;

use crate::api::{
    create_ranking_router, create_rating_router, create_user_router,
    create_verification_router, RankingApiState, RatingApiState, UserApiState,
    VerificationApiState,
};
use crate::config::AppConfig;
use crate::database::UserStore;
use crate::reputation::{GlobalAverageEstimator, RankingProjector, RatingPipeline};
use crate::verification::VerificationCodeStore;

pub struct Services {
    pub store: Arc<dyn UserStore>,
    pub pipeline: Arc<RatingPipeline>,
    pub ranking: Arc<RankingProjector>,
    pub codes: Arc<VerificationCodeStore>,
    ranking_limit: usize,
    sanitize_logs: bool,
}

impl Services {
    pub fn new(store: Arc<dyn UserStore>, config: &AppConfig) -> Self {
        let estimator = GlobalAverageEstimator::with_fallback(
            store.clone(),
            config.reputation.default_global_average,
        );
        let pipeline = RatingPipeline::new(store.clone(), estimator)
            .with_min_votes(config.reputation.min_votes);
        let ranking = RankingProjector::new(store.clone());
        let codes = VerificationCodeStore::new(
            config.verification.code_ttl(),
            config.verification.code_length,
        )
        .with_max_attempts(config.verification.max_attempts);

        Self {
            store,
            pipeline: Arc::new(pipeline),
            ranking: Arc::new(ranking),
            codes: Arc::new(codes),
            ranking_limit: config.reputation.ranking_limit,
            sanitize_logs: config.logging.sanitize_logs,
        }
    }

    /// All routes, without the security middleware
    pub fn router(&self) -> Router {
        Router::new()
            .merge(create_rating_router(RatingApiState {
                pipeline: self.pipeline.clone(),
            }))
            .merge(create_ranking_router(RankingApiState {
                projector: self.ranking.clone(),
                limit: self.ranking_limit,
            }))
            .merge(create_user_router(UserApiState {
                store: self.store.clone(),
            }))
            .merge(create_verification_router(VerificationApiState {
                codes: self.codes.clone(),
                sanitize_logs: self.sanitize_logs,
            }))
            .route("/health", get(|| async { "OK" }))
    }
}

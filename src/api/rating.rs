//! Rating endpoint
//!
//! Endpoints:
//!   POST /rate -> Rate another user (caller from `x-user-identity`)

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::api::middleware::CallerIdentity;
use crate::api::response::{respond, ApiError, Envelope};
use crate::reputation::{RatingOutcome, RatingPipeline};

#[derive(Clone)]
pub struct RatingApiState {
    pub pipeline: Arc<RatingPipeline>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateRequest {
    pub target_identity: String,
    pub score: f64,
}

pub fn create_router(state: RatingApiState) -> Router {
    Router::new()
        .route("/rate", post(rate_user))
        .with_state(state)
}

async fn rate_user(
    State(state): State<RatingApiState>,
    CallerIdentity(rater): CallerIdentity,
    payload: Result<Json<RateRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Envelope<RatingOutcome>>), ApiError> {
    let Json(req) = payload?;

    let outcome = state
        .pipeline
        .rate(&rater, req.target_identity.trim(), req.score)
        .await?;

    Ok(respond(StatusCode::OK, "Rating recorded", outcome))
}

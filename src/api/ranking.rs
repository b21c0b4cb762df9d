//! Leaderboard endpoints
//!
//! Endpoints:
//!   GET /ranking                  -> Top students by points
//!   GET /ranking/clasificaciones  -> Top students by classification
//!
//! Both answer 204 when there is nobody to rank.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;

use crate::api::response::{respond, ApiError};
use crate::reputation::{RankingEntry, RankingProjector};

#[derive(Clone)]
pub struct RankingApiState {
    pub projector: Arc<RankingProjector>,
    pub limit: usize,
}

pub fn create_router(state: RankingApiState) -> Router {
    Router::new()
        .route("/ranking", get(ranking_by_points))
        .route("/ranking/clasificaciones", get(ranking_by_classification))
        .with_state(state)
}

fn leaderboard(entries: Vec<RankingEntry>, message: &str) -> Response {
    if entries.is_empty() {
        return StatusCode::NO_CONTENT.into_response();
    }
    respond(StatusCode::OK, message, entries).into_response()
}

async fn ranking_by_points(State(state): State<RankingApiState>) -> Result<Response, ApiError> {
    let entries = state.projector.top_by_points(state.limit).await?;
    Ok(leaderboard(entries, "Ranking by points"))
}

async fn ranking_by_classification(
    State(state): State<RankingApiState>,
) -> Result<Response, ApiError> {
    let entries = state.projector.top_by_classification(state.limit).await?;
    Ok(leaderboard(entries, "Ranking by classification"))
}

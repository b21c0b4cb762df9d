//! Email verification endpoints
//!
//! Endpoints:
//!   POST /verification/send  -> Issue a code for an email address
//!   POST /verification/check -> Check (and consume) a code

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::api::response::{respond, ApiError, Envelope};
use crate::api::users::is_plausible_email;
use crate::config::sanitize_for_logging;
use crate::verification::VerificationCodeStore;

#[derive(Clone)]
pub struct VerificationApiState {
    pub codes: Arc<VerificationCodeStore>,
    pub sanitize_logs: bool,
}

#[derive(Debug, Deserialize)]
pub struct SendCodeRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct CheckCodeRequest {
    pub email: String,
    pub code: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeIssued {
    pub email: String,
    pub expires_in_secs: u64,
}

pub fn create_router(state: VerificationApiState) -> Router {
    Router::new()
        .route("/verification/send", post(send_code))
        .route("/verification/check", post(check_code))
        .with_state(state)
}

async fn send_code(
    State(state): State<VerificationApiState>,
    payload: Result<Json<SendCodeRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Envelope<CodeIssued>>), ApiError> {
    let Json(req) = payload?;
    let email = req.email.trim().to_lowercase();
    if !is_plausible_email(&email) {
        return Err(ApiError::bad_request("Validation failed").with_details("email is not valid"));
    }

    let code = state.codes.issue(&email);

    if state.sanitize_logs {
        info!(
            email = %sanitize_for_logging(&email),
            "Verification code issued"
        );
    } else {
        info!(email = %email, code = %code, "Verification code issued");
    }

    Ok(respond(
        StatusCode::OK,
        "Verification code sent",
        CodeIssued {
            email,
            expires_in_secs: state.codes.ttl().as_secs(),
        },
    ))
}

async fn check_code(
    State(state): State<VerificationApiState>,
    payload: Result<Json<CheckCodeRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Envelope<String>>), ApiError> {
    let Json(req) = payload?;
    let email = req.email.trim().to_lowercase();

    state.codes.verify(&email, &req.code)?;
    info!(email = %sanitize_for_logging(&email), "Email verified");

    Ok(respond(StatusCode::OK, "Email verified", email))
}

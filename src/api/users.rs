//! User profile endpoints
//!
//! Endpoints:
//!   POST   /users                        -> Create profile (reputation starts empty)
//!   GET    /users/{identity}             -> Get profile
//!   GET    /users/{identity}/reputation  -> Get reputation projection
//!   DELETE /users/{identity}             -> Delete account

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::api::response::{respond, ApiError, Envelope};
use crate::database::{UserProfile, UserStore};
use crate::reputation::{Role, UserReputation};

#[derive(Clone)]
pub struct UserApiState {
    pub store: Arc<dyn UserStore>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub identity: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
}

impl CreateUserRequest {
    /// Field-level validation; returns the trimmed profile
    fn into_profile(self) -> Result<UserProfile, ApiError> {
        let identity = self.identity.trim().to_string();
        let name = self.name.trim().to_string();
        let email = self.email.trim().to_lowercase();

        if identity.is_empty() || identity.len() > 32 {
            return Err(ApiError::bad_request("Validation failed")
                .with_details("identity must be 1-32 characters"));
        }
        if !identity.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(ApiError::bad_request("Validation failed")
                .with_details("identity may only contain letters, digits and '-'"));
        }
        if name.is_empty() {
            return Err(ApiError::bad_request("Validation failed").with_details("name is required"));
        }
        if !is_plausible_email(&email) {
            return Err(
                ApiError::bad_request("Validation failed").with_details("email is not valid")
            );
        }

        Ok(UserProfile::new(identity, name, email, self.role))
    }
}

pub(crate) fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

pub fn create_router(state: UserApiState) -> Router {
    Router::new()
        .route("/users", post(create_user))
        .route("/users/{identity}", get(get_user).delete(delete_user))
        .route("/users/{identity}/reputation", get(get_reputation))
        .with_state(state)
}

async fn create_user(
    State(state): State<UserApiState>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Envelope<UserProfile>>), ApiError> {
    let Json(req) = payload?;
    let profile = req.into_profile()?;

    state.store.insert(&profile).await?;
    info!(identity = %profile.identity, role = %profile.role, "User created");

    Ok(respond(StatusCode::CREATED, "User created", profile))
}

async fn find_user(store: &dyn UserStore, identity: &str) -> Result<UserProfile, ApiError> {
    store
        .find_by_identity(identity)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("user {} not found", identity)))
}

async fn get_user(
    State(state): State<UserApiState>,
    Path(identity): Path<String>,
) -> Result<(StatusCode, Json<Envelope<UserProfile>>), ApiError> {
    let profile = find_user(state.store.as_ref(), &identity).await?;
    Ok(respond(StatusCode::OK, "User found", profile))
}

async fn get_reputation(
    State(state): State<UserApiState>,
    Path(identity): Path<String>,
) -> Result<(StatusCode, Json<Envelope<UserReputation>>), ApiError> {
    let profile = find_user(state.store.as_ref(), &identity).await?;
    Ok(respond(StatusCode::OK, "Reputation found", profile.reputation()))
}

async fn delete_user(
    State(state): State<UserApiState>,
    Path(identity): Path<String>,
) -> Result<(StatusCode, Json<Envelope<String>>), ApiError> {
    if !state.store.remove(&identity).await? {
        return Err(ApiError::not_found(format!("user {} not found", identity)));
    }
    info!(identity = %identity, "User deleted");
    Ok(respond(StatusCode::OK, "User deleted", identity))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(identity: &str, name: &str, email: &str) -> CreateUserRequest {
        CreateUserRequest {
            identity: identity.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            role: Role::Student,
        }
    }

    #[test]
    fn test_valid_request_is_normalized() {
        let profile = request(" 40123456 ", " Ana ", "Ana@Example.EDU")
            .into_profile()
            .unwrap();
        assert_eq!(profile.identity, "40123456");
        assert_eq!(profile.name, "Ana");
        assert_eq!(profile.email, "ana@example.edu");
        assert_eq!(profile.classification, None);
        assert_eq!(profile.points, 0);
    }

    #[test]
    fn test_invalid_fields_rejected() {
        assert!(request("", "Ana", "a@b.edu").into_profile().is_err());
        assert!(request("40 12", "Ana", "a@b.edu").into_profile().is_err());
        assert!(request("401", "", "a@b.edu").into_profile().is_err());
        assert!(request("401", "Ana", "not-an-email").into_profile().is_err());
    }

    #[test]
    fn test_email_plausibility() {
        assert!(is_plausible_email("a@b.edu"));
        assert!(!is_plausible_email("@b.edu"));
        assert!(!is_plausible_email("a@edu"));
        assert!(!is_plausible_email("a@.edu"));
        assert!(!is_plausible_email("a b@c.edu"));
    }
}

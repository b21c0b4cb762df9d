//! HTTP contract tests
//!
//! Requests go through the full router with `tower::ServiceExt::oneshot`,
//! backed by the in-memory store.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use carpool_backend::api::{with_security, SecurityMiddlewareConfig, SecurityState};
use carpool_backend::{AppConfig, MemoryUserStore, Role, Services, UserProfile};

// ============================================================================
// Test Helpers
// ============================================================================

fn services() -> Services {
    Services::new(Arc::new(MemoryUserStore::new()), &AppConfig::default())
}

async fn seed(services: &Services, identity: &str, role: Role, points: u32) {
    let mut profile = UserProfile::new(
        identity.to_string(),
        format!("User {}", identity),
        format!("{}@example.edu", identity),
        role,
    );
    profile.points = points;
    services.store.insert(&profile).await.unwrap();
}

fn json_request(method: Method, uri: &str, caller: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(caller) = caller {
        builder = builder.header("x-user-identity", caller);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

// ============================================================================
// POST /rate
// ============================================================================

mod rate {
    use super::*;

    #[tokio::test]
    async fn test_rate_success_envelope() {
        let services = services();
        seed(&services, "target", Role::Student, 0).await;

        let (status, body) = send(
            services.router(),
            json_request(
                Method::POST,
                "/rate",
                Some("rater"),
                json!({ "targetIdentity": "target", "score": 5 }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["message"].is_string());
        assert_eq!(body["data"]["pointsDelta"], 3);
        assert_eq!(body["data"]["ratingCount"], 1);
        let classification = body["data"]["classification"].as_f64().unwrap();
        assert!((classification - 3.667).abs() < 1e-3);
    }

    #[tokio::test]
    async fn test_out_of_range_score_is_bad_request() {
        let services = services();
        seed(&services, "target", Role::Student, 0).await;

        let (status, body) = send(
            services.router(),
            json_request(
                Method::POST,
                "/rate",
                Some("rater"),
                json!({ "targetIdentity": "target", "score": 7 }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].is_string());
        assert!(body.get("data").is_none());
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let services = services();
        let (status, _) = send(
            services.router(),
            json_request(Method::POST, "/rate", Some("rater"), json!({ "score": 3 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_self_rating_is_bad_request() {
        let services = services();
        seed(&services, "same", Role::Student, 0).await;

        let (status, _) = send(
            services.router(),
            json_request(
                Method::POST,
                "/rate",
                Some("same"),
                json!({ "targetIdentity": "same", "score": 5 }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let stored = services.store.find_by_identity("same").await.unwrap().unwrap();
        assert_eq!(stored.rating_count, 0);
    }

    #[tokio::test]
    async fn test_unknown_target_is_not_found() {
        let services = services();
        let (status, body) = send(
            services.router(),
            json_request(
                Method::POST,
                "/rate",
                Some("rater"),
                json!({ "targetIdentity": "ghost", "score": 4 }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn test_missing_caller_is_unauthorized() {
        let services = services();
        seed(&services, "target", Role::Student, 0).await;

        let (status, _) = send(
            services.router(),
            json_request(
                Method::POST,
                "/rate",
                None,
                json!({ "targetIdentity": "target", "score": 4 }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}

// ============================================================================
// GET /ranking
// ============================================================================

mod ranking {
    use super::*;

    #[tokio::test]
    async fn test_empty_leaderboards_are_no_content() {
        let services = services();
        let (status, _) = send(services.router(), get("/ranking")).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(services.router(), get("/ranking/clasificaciones")).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_admins_only_is_no_content() {
        let services = services();
        seed(&services, "admin", Role::Administrator, 50).await;
        let (status, _) = send(services.router(), get("/ranking")).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_points_leaderboard_is_top_ten() {
        let services = services();
        for i in 0..14 {
            seed(&services, &format!("s{:02}", i), Role::Student, i).await;
        }

        let (status, body) = send(services.router(), get("/ranking")).await;
        assert_eq!(status, StatusCode::OK);

        let entries = body["data"].as_array().unwrap();
        assert_eq!(entries.len(), 10);
        assert_eq!(entries[0]["identity"], "s13");
        assert_eq!(entries[0]["position"], 1);
        assert_eq!(entries[9]["identity"], "s04");
    }

    #[tokio::test]
    async fn test_classification_leaderboard_after_rating() {
        let services = services();
        seed(&services, "ana", Role::Student, 0).await;
        seed(&services, "beto", Role::Student, 0).await;

        let (status, _) = send(
            services.router(),
            json_request(
                Method::POST,
                "/rate",
                Some("ana"),
                json!({ "targetIdentity": "beto", "score": 4 }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(services.router(), get("/ranking/clasificaciones")).await;
        assert_eq!(status, StatusCode::OK);
        let entries = body["data"].as_array().unwrap();
        assert_eq!(entries[0]["identity"], "beto");
        assert_eq!(entries[1]["identity"], "ana");
        assert_eq!(entries[1]["classification"], 0.0);
    }
}

// ============================================================================
// Profiles
// ============================================================================

mod users {
    use super::*;

    #[tokio::test]
    async fn test_profile_lifecycle() {
        let services = services();
        let create = json!({
            "identity": "40123456",
            "name": "Ana",
            "email": "ana@example.edu"
        });

        let (status, body) = send(
            services.router(),
            json_request(Method::POST, "/users", None, create.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["role"], "student");
        assert!(body["data"]["classification"].is_null());

        let (status, _) = send(
            services.router(),
            json_request(Method::POST, "/users", None, create),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = send(services.router(), get("/users/40123456/reputation")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["points"], 0);

        let delete = Request::builder()
            .method(Method::DELETE)
            .uri("/users/40123456")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(services.router(), delete).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(services.router(), get("/users/40123456")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_profile_has_details() {
        let services = services();
        let (status, body) = send(
            services.router(),
            json_request(
                Method::POST,
                "/users",
                None,
                json!({ "identity": "401", "name": "Ana", "email": "nope" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["details"].is_string());
    }
}

// ============================================================================
// Verification Codes
// ============================================================================

mod verification {
    use super::*;

    #[tokio::test]
    async fn test_send_reports_expiry() {
        let services = services();
        let (status, body) = send(
            services.router(),
            json_request(
                Method::POST,
                "/verification/send",
                None,
                json!({ "email": "Ana@Example.edu" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["email"], "ana@example.edu");
        assert_eq!(body["data"]["expiresInSecs"], 600);
        assert_eq!(services.codes.pending(), 1);
    }

    #[tokio::test]
    async fn test_check_consumes_code() {
        let services = services();
        let code = services.codes.issue("ana@example.edu");

        let wrong = json!({ "email": "ana@example.edu", "code": "not-it" });
        let (status, _) = send(
            services.router(),
            json_request(Method::POST, "/verification/check", None, wrong),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let right = json!({ "email": "ana@example.edu", "code": code });
        let (status, _) = send(
            services.router(),
            json_request(Method::POST, "/verification/check", None, right.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(
            services.router(),
            json_request(Method::POST, "/verification/check", None, right),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_repeated_wrong_codes_revoke_the_code() {
        let services = services();
        let code = services.codes.issue("ana@example.edu");
        let max = services.codes.max_attempts();

        let mut last = Value::Null;
        for _ in 0..max {
            let wrong = json!({ "email": "ana@example.edu", "code": "xxxxxx" });
            let (status, body) = send(
                services.router(),
                json_request(Method::POST, "/verification/check", None, wrong),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            last = body;
        }
        assert!(last["details"]
            .as_str()
            .is_some_and(|d| d.contains("too many failed attempts")));

        let right = json!({ "email": "ana@example.edu", "code": code });
        let (status, _) = send(
            services.router(),
            json_request(Method::POST, "/verification/check", None, right),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(services.codes.pending(), 0);
    }
}

// ============================================================================
// Security Middleware
// ============================================================================

mod security {
    use super::*;

    fn secured(services: &Services, rate_limit: u32) -> Router {
        let config = SecurityMiddlewareConfig {
            enable_auth: true,
            api_keys: vec!["secret-key-1234".to_string()],
            rate_limit_per_minute: rate_limit,
            ..SecurityMiddlewareConfig::default()
        };
        with_security(services.router(), SecurityState::new(config))
    }

    #[tokio::test]
    async fn test_api_key_required_except_health() {
        let services = services();
        let router = secured(&services, 100);

        let (status, _) = send(router.clone(), get("/health")).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(router.clone(), get("/ranking")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["message"].is_string());

        let request = Request::builder()
            .uri("/ranking")
            .header("x-api-key", "secret-key-1234")
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(response.headers()["x-frame-options"], "DENY");
    }

    #[tokio::test]
    async fn test_rate_limit_rejects_burst() {
        let services = services();
        let router = secured(&services, 2);

        for _ in 0..2 {
            let (status, _) = send(router.clone(), get("/health")).await;
            assert_eq!(status, StatusCode::OK);
        }
        let (status, _) = send(router, get("/health")).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    }
}

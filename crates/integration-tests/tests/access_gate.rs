#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Session gates, OTP verification and session cookies.

use std::net::SocketAddr;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Method, Request, StatusCode, header};
use serde_json::json;

use foodlane_integration_tests::{PASSWORD, TestApp, token};

#[tokio::test]
async fn test_protected_routes_require_a_session() {
    let app = TestApp::new();
    for uri in ["/user/profile", "/user/orders", "/vendor/profile", "/vendor/orders"] {
        let response = app.get(uri, None).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(response.message(), "Not authorized");
    }
}

#[tokio::test]
async fn test_garbage_token_is_rejected() {
    let app = TestApp::new();
    let response = app.get("/user/profile", Some("not-a-token")).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unverified_user_only_reaches_otp_routes() {
    let app = TestApp::new();
    let pending = app.signup("asha@example.com").await;

    let profile = app.get("/user/profile", Some(&pending)).await;
    assert_eq!(profile.status, StatusCode::UNAUTHORIZED);

    let resend = app
        .json(Method::POST, "/user/otp", Some(&pending), &json!(null))
        .await;
    assert_eq!(resend.status, StatusCode::OK, "{:?}", resend.body);
}

#[tokio::test]
async fn test_verified_user_cannot_use_otp_routes() {
    let app = TestApp::new();
    let verified = app.verified_user("asha@example.com").await;

    let resend = app
        .json(Method::POST, "/user/otp", Some(&verified), &json!(null))
        .await;
    assert_eq!(resend.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_user_token_cannot_reach_vendor_routes() {
    let app = TestApp::new();
    let user = app.verified_user("asha@example.com").await;
    app.onboard_vendor("kitchen@example.com", "560001").await;
    let vendor = app.vendor_login("kitchen@example.com").await;

    assert_eq!(
        app.get("/vendor/profile", Some(&user)).await.status,
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        app.get("/user/profile", Some(&vendor)).await.status,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_wrong_otp_then_right_otp() {
    let app = TestApp::new();
    let pending = app.signup("asha@example.com").await;
    let code = app.otp_for("asha@example.com");
    let wrong = if code == 999_999 { 100_000 } else { code + 1 };

    let rejected = app
        .json(
            Method::POST,
            "/user/verify",
            Some(&pending),
            &json!({ "otp": wrong }),
        )
        .await;
    assert_eq!(rejected.status, StatusCode::BAD_REQUEST);

    let accepted = app
        .json(
            Method::POST,
            "/user/verify",
            Some(&pending),
            &json!({ "otp": code.to_string() }),
        )
        .await;
    assert_eq!(accepted.status, StatusCode::OK);
    assert_eq!(accepted.body["verified"], true);
    assert_eq!(accepted.message(), "User verified");
}

#[tokio::test]
async fn test_otp_cannot_be_replayed() {
    let app = TestApp::new();
    let pending = app.signup("asha@example.com").await;
    let code = app.otp_for("asha@example.com");

    let first = app
        .json(Method::POST, "/user/verify", Some(&pending), &json!({ "otp": code }))
        .await;
    assert_eq!(first.status, StatusCode::OK);

    let replay = app
        .json(Method::POST, "/user/verify", Some(&pending), &json!({ "otp": code }))
        .await;
    assert_eq!(replay.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_resent_otp_replaces_old_code() {
    let app = TestApp::new();
    let pending = app.signup("asha@example.com").await;
    let first = app.otp_for("asha@example.com");

    let resend = app
        .json(Method::POST, "/user/otp", Some(&pending), &json!(null))
        .await;
    assert_eq!(resend.message(), "OTP sent to your registered phone number");
    let second = app.otp_for("asha@example.com");

    if first != second {
        let stale = app
            .json(Method::POST, "/user/verify", Some(&pending), &json!({ "otp": first }))
            .await;
        assert_eq!(stale.status, StatusCode::BAD_REQUEST);
    }

    let response = app
        .json(Method::POST, "/user/verify", Some(&pending), &json!({ "otp": second }))
        .await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_login_errors() {
    let app = TestApp::new();
    app.signup("asha@example.com").await;

    let unknown = app
        .json(
            Method::POST,
            "/user/login",
            None,
            &json!({ "email": "nobody@example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(unknown.status, StatusCode::CONFLICT);

    let wrong = app
        .json(
            Method::POST,
            "/user/login",
            None,
            &json!({ "email": "asha@example.com", "password": "not-the-password" }),
        )
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);

    let duplicate = app
        .json(
            Method::POST,
            "/user/signup",
            None,
            &json!({
                "email": "asha@example.com",
                "password": PASSWORD,
                "phone": "9000000000",
            }),
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_session_cookie_is_accepted() {
    let app = TestApp::new();
    app.verified_user("ravi@example.com").await;

    let login = app
        .json(
            Method::POST,
            "/user/login",
            None,
            &json!({ "email": "ravi@example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);
    let set_cookie = login.headers[header::SET_COOKIE].to_str().unwrap();
    assert!(set_cookie.starts_with("foodlane_session="));
    assert!(set_cookie.contains("HttpOnly"));

    let cookie = set_cookie.split(';').next().unwrap();
    let request = Request::builder()
        .uri("/user/profile")
        .header(header::COOKIE, format!("theme=dark; {cookie}"))
        .body(Body::empty())
        .unwrap();
    let profile = app.send(request).await;
    assert_eq!(profile.status, StatusCode::OK, "{:?}", profile.body);
    assert_eq!(profile.body["email"], "ravi@example.com");
    assert!(!token(&login).is_empty());
}

fn login_from(peer: [u8; 4]) -> Request<Body> {
    let body = json!({ "email": "nobody@example.com", "password": PASSWORD });
    Request::builder()
        .method(Method::POST)
        .uri("/user/login")
        .header(header::CONTENT_TYPE, "application/json")
        .extension(ConnectInfo(SocketAddr::from((peer, 40000))))
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_rate_limited_login_without_proxy_headers() {
    let app = TestApp::rate_limited();

    let first = app
        .json(
            Method::POST,
            "/user/login",
            None,
            &json!({ "email": "nobody@example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(first.status, StatusCode::CONFLICT, "{:?}", first.body);
    assert!(!first.message().is_empty());

    let vendor = app
        .json(
            Method::POST,
            "/vendor/login",
            None,
            &json!({ "email": "nobody@example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(vendor.status, StatusCode::CONFLICT, "{:?}", vendor.body);
    assert!(!vendor.message().is_empty());
}

#[tokio::test]
async fn test_rate_limit_is_per_peer_address() {
    let app = TestApp::rate_limited();

    for _ in 0..5 {
        let response = app.send(login_from([192, 0, 2, 1])).await;
        assert_eq!(response.status, StatusCode::CONFLICT);
    }
    let limited = app.send(login_from([192, 0, 2, 1])).await;
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);

    let other = app.send(login_from([192, 0, 2, 2])).await;
    assert_eq!(other.status, StatusCode::CONFLICT);
}

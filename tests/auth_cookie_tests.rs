// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Auth cookie attribute tests.
//!
//! Removal cookies on logout must carry the same path, domain and flags the
//! cookies were created with, or browsers keep the originals.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use tower::ServiceExt;

mod common;

const ALL_COOKIES: &str = "statcard_session=test; statcard_logged_in=1; statcard_oauth_nonce=nonce";

fn logout_request(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_logout_cookie_removal_localhost_attributes() {
    let (app, _) = common::create_test_app_with_frontend_url("http://localhost:5173");

    let response = app
        .oneshot(logout_request("/auth/logout", ALL_COOKIES))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let set_cookies = common::set_cookie_headers(&response);
    let session = common::find_cookie(&set_cookies, "statcard_session");
    let hint = common::find_cookie(&set_cookies, "statcard_logged_in");
    let nonce = common::find_cookie(&set_cookies, "statcard_oauth_nonce");

    assert!(session.contains("Path=/"));
    assert!(session.contains("HttpOnly"));
    assert!(session.contains("SameSite=Lax"));
    assert!(session.contains("Max-Age=0"));
    assert!(!session.contains("Secure"));
    assert!(!session.contains("Domain="));

    assert!(hint.contains("Path=/"));
    assert!(hint.contains("SameSite=Lax"));
    assert!(hint.contains("Max-Age=0"));
    assert!(!hint.contains("HttpOnly"));
    assert!(!hint.contains("Secure"));
    assert!(!hint.contains("Domain="));

    assert!(nonce.contains("Path=/auth/strava/callback"));
    assert!(nonce.contains("HttpOnly"));
    assert!(nonce.contains("Max-Age=0"));
    assert!(!nonce.contains("Secure"));
}

#[tokio::test]
async fn test_logout_cookie_removal_production_domain_attributes() {
    let (app, _) = common::create_test_app_with_frontend_url("https://cards.statcard.app");

    let response = app
        .oneshot(logout_request("/auth/logout", ALL_COOKIES))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let set_cookies = common::set_cookie_headers(&response);
    let session = common::find_cookie(&set_cookies, "statcard_session");
    let hint = common::find_cookie(&set_cookies, "statcard_logged_in");
    let nonce = common::find_cookie(&set_cookies, "statcard_oauth_nonce");

    assert!(session.contains("HttpOnly"));
    assert!(session.contains("Secure"));
    assert!(session.contains("Max-Age=0"));
    assert!(!session.contains("Domain="));

    assert!(hint.contains("Secure"));
    assert!(hint.contains("Max-Age=0"));
    assert!(hint.contains("Domain=statcard.app"));
    assert!(!hint.contains("HttpOnly"));

    assert!(nonce.contains("Path=/auth/strava/callback"));
    assert!(nonce.contains("Secure"));
    assert!(!nonce.contains("Domain="));
}

#[tokio::test]
async fn test_logout_without_session_still_succeeds() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(logout_request("/auth/logout?revoke=true", ""))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_logout_with_revoke_deletes_tokens_and_deauthorizes() {
    let (app, state, mock) = common::create_test_app_with_mock_strava().await;
    common::store_tokens(&state, common::ATHLETE_ID, "access-stored", 3600).await;

    let response = app
        .oneshot(logout_request(
            "/auth/logout?revoke=true",
            &common::session_cookie(common::ATHLETE_ID),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(state.db.get_tokens(common::ATHLETE_ID).await.unwrap().is_none());
    assert_eq!(mock.deauthorizations(), 1);
    assert_eq!(mock.refreshes(), 0);
}

#[tokio::test]
async fn test_plain_logout_keeps_tokens() {
    let (app, state, mock) = common::create_test_app_with_mock_strava().await;
    common::store_tokens(&state, common::ATHLETE_ID, "access-stored", 3600).await;

    let response = app
        .oneshot(logout_request(
            "/auth/logout",
            &common::session_cookie(common::ATHLETE_ID),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(state.db.get_tokens(common::ATHLETE_ID).await.unwrap().is_some());
    assert_eq!(mock.deauthorizations(), 0);
}

#[tokio::test]
async fn test_hint_cookie_host_only_on_shared_hosting() {
    let (app, _) = common::create_test_app_with_frontend_url("https://statcard.vercel.app");

    let response = app
        .oneshot(logout_request("/auth/logout", ALL_COOKIES))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let set_cookies = common::set_cookie_headers(&response);
    let hint = common::find_cookie(&set_cookies, "statcard_logged_in");
    assert!(hint.contains("Max-Age=0"));
    assert!(!hint.contains("Domain="));
}

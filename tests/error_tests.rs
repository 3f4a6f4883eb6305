// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::http::StatusCode;
use axum::response::IntoResponse;
use statcard::error::AppError;

mod common;

#[test]
fn test_is_strava_token_error_matches() {
    let err = AppError::StravaApi("Token expired".to_string());
    assert!(err.is_strava_token_error());

    let err = AppError::StravaApi("Invalid access token".to_string());
    assert!(err.is_strava_token_error());

    let err = AppError::StravaApi(AppError::STRAVA_TOKEN_ERROR.to_string());
    assert!(err.is_strava_token_error());
}

#[test]
fn test_is_strava_token_error_no_match() {
    let err = AppError::StravaApi(AppError::STRAVA_RATE_LIMIT.to_string());
    assert!(!err.is_strava_token_error());

    let err = AppError::StravaApi("HTTP 500 Internal Server Error: boom".to_string());
    assert!(!err.is_strava_token_error());

    let err = AppError::BadRequest("Bad Request".to_string());
    assert!(!err.is_strava_token_error());
}

#[tokio::test]
async fn test_error_response_bodies() {
    let response = AppError::NotFound("Activity 7".to_string()).into_response();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = common::body_json(response).await;
    assert_eq!(body["error"], "not_found");
    assert_eq!(body["details"], "Activity 7");

    let response = AppError::StravaApi(AppError::STRAVA_RATE_LIMIT.to_string()).into_response();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    // Internal details never leak.
    let response = AppError::Database("connection reset".to_string()).into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = common::body_json(response).await;
    assert_eq!(body["error"], "database_error");
    assert!(body.get("details").is_none());
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava OAuth authentication routes.
//!
//! The `state` parameter is `frontend_url|timestamp_hex|nonce|signature_hex`,
//! base64url encoded. The nonce is also set as an HttpOnly cookie scoped to
//! the callback path, so a state minted for one browser can't complete a
//! login in another.

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::Redirect,
    routing::{get, post},
    Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use ring::rand::{SecureRandom, SystemRandom};
use serde::Deserialize;
use sha2::Sha256;
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, session_token, verify_jwt, SESSION_COOKIE, SESSION_TTL_SECS};
use crate::routes::allowed_origin;
use crate::services::strava::OAUTH_SCOPES;
use crate::AppState;

type HmacSha256 = Hmac<Sha256>;

/// Readable cookie the frontend checks to decide whether to show the dashboard.
pub const LOGGED_IN_COOKIE: &str = "statcard_logged_in";
pub const NONCE_COOKIE: &str = "statcard_oauth_nonce";

const CALLBACK_PATH: &str = "/auth/strava/callback";

/// How long a signed state stays valid.
pub const STATE_MAX_AGE_MS: i64 = 10 * 60 * 1000;
/// Tolerated clock skew for states minted "in the future".
const STATE_FUTURE_SKEW_MS: i64 = 60 * 1000;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/strava", get(auth_start))
        .route(CALLBACK_PATH, get(auth_callback))
        .route("/auth/logout", post(logout))
}

// ─── State Signing ───────────────────────────────────────────

/// Frontend URL and nonce recovered from a valid state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedState {
    pub frontend_url: String,
    pub nonce: String,
}

fn state_signature(payload: &str, key: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(key).ok()?;
    mac.update(payload.as_bytes());
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Build a signed, URL-safe OAuth state.
pub fn sign_state(frontend_url: &str, timestamp_ms: i64, nonce: &str, key: &[u8]) -> Result<String> {
    let payload = format!("{}|{:x}|{}", frontend_url, timestamp_ms, nonce);
    let signature = state_signature(&payload, key)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("HMAC init failed")))?;

    Ok(URL_SAFE_NO_PAD.encode(format!("{}|{}", payload, signature)))
}

/// Check signature and age of an OAuth state.
pub fn verify_state(state: &str, key: &[u8], now_ms: i64) -> Option<VerifiedState> {
    let bytes = URL_SAFE_NO_PAD.decode(state).ok()?;
    let decoded = String::from_utf8(bytes).ok()?;

    // Split from the right so a `|` inside the URL can't shift fields.
    let mut parts = decoded.rsplitn(4, '|');
    let signature = parts.next()?;
    let nonce = parts.next()?;
    let timestamp_hex = parts.next()?;
    let frontend_url = parts.next()?;

    let payload = format!("{}|{}|{}", frontend_url, timestamp_hex, nonce);
    let expected = state_signature(&payload, key)?;
    if !bool::from(expected.as_bytes().ct_eq(signature.as_bytes())) {
        tracing::warn!("OAuth state signature mismatch");
        return None;
    }

    let timestamp = i64::from_str_radix(timestamp_hex, 16).ok()?;
    if now_ms - timestamp > STATE_MAX_AGE_MS || timestamp - now_ms > STATE_FUTURE_SKEW_MS {
        tracing::warn!(age_ms = now_ms - timestamp, "OAuth state expired");
        return None;
    }

    Some(VerifiedState {
        frontend_url: frontend_url.to_string(),
        nonce: nonce.to_string(),
    })
}

fn generate_nonce() -> Result<String> {
    let mut bytes = [0u8; 16];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Failed to generate OAuth nonce")))?;
    Ok(hex::encode(bytes))
}

// ─── Cookies ─────────────────────────────────────────────────

/// Hosting platforms where every subdomain belongs to a different owner.
const SHARED_HOST_SUFFIXES: &[&str] = &[
    "vercel.app",
    "netlify.app",
    "pages.dev",
    "github.io",
    "web.app",
    "firebaseapp.com",
    "appspot.com",
    "run.app",
    "herokuapp.com",
    "onrender.com",
    "fly.dev",
];

/// Country suffixes registered one level below the TLD.
const SECOND_LEVEL_SUFFIXES: &[&str] = &[
    "co.uk", "org.uk", "ac.uk", "com.au", "net.au", "co.nz", "co.jp", "com.br", "co.in", "co.za",
];

/// Registrable parent of the frontend host, so a frontend on a sibling
/// subdomain can read the logged-in hint.
///
/// Only the suffixes listed above are recognised. Anything else is treated
/// as `name.tld`. On a shared hosting platform the cookie stays host-only.
fn hint_cookie_domain(config: &Config) -> Option<String> {
    let url = reqwest::Url::parse(&config.frontend_url).ok()?;
    let host = url.host_str()?;
    if host == "localhost" || host.parse::<std::net::IpAddr>().is_ok() {
        return None;
    }

    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() < 2 {
        return None;
    }
    let parent = labels[labels.len() - 2..].join(".");

    if SHARED_HOST_SUFFIXES.contains(&parent.as_str()) {
        return None;
    }
    if SECOND_LEVEL_SUFFIXES.contains(&parent.as_str()) {
        return (labels.len() >= 3).then(|| labels[labels.len() - 3..].join("."));
    }
    Some(parent)
}

fn session_cookie(value: String, config: &Config) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.secure_cookies())
        .max_age(time::Duration::seconds(SESSION_TTL_SECS))
        .build()
}

fn logged_in_cookie(value: String, config: &Config) -> Cookie<'static> {
    let mut cookie = Cookie::build((LOGGED_IN_COOKIE, value))
        .path("/")
        .http_only(false)
        .same_site(SameSite::Lax)
        .secure(config.secure_cookies())
        .max_age(time::Duration::seconds(SESSION_TTL_SECS))
        .build();
    if let Some(domain) = hint_cookie_domain(config) {
        cookie.set_domain(domain);
    }
    cookie
}

fn nonce_cookie(value: String, config: &Config) -> Cookie<'static> {
    Cookie::build((NONCE_COOKIE, value))
        .path(CALLBACK_PATH)
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.secure_cookies())
        .max_age(time::Duration::milliseconds(STATE_MAX_AGE_MS))
        .build()
}

/// Same attributes as the original, emptied and expired.
fn expired(mut cookie: Cookie<'static>) -> Cookie<'static> {
    cookie.set_value("");
    cookie.set_max_age(time::Duration::ZERO);
    cookie
}

// ─── Handlers ────────────────────────────────────────────────

/// Query parameters for starting OAuth flow.
#[derive(Deserialize)]
pub struct AuthStartParams {
    /// Frontend URL to return to; defaults to FRONTEND_URL.
    #[serde(default)]
    redirect_uri: Option<String>,
}

/// Start OAuth flow - redirect to Strava authorization.
async fn auth_start(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<AuthStartParams>,
) -> Result<(CookieJar, Redirect)> {
    let frontend_url = match params.redirect_uri {
        Some(uri) => allowed_origin(&uri, &state.config).ok_or_else(|| {
            tracing::warn!(redirect_uri = %uri, "Rejected OAuth redirect_uri");
            AppError::BadRequest("redirect_uri not allowed".to_string())
        })?,
        None => state.config.frontend_url.clone(),
    };

    let nonce = generate_nonce()?;
    let oauth_state = sign_state(
        &frontend_url,
        chrono::Utc::now().timestamp_millis(),
        &nonce,
        &state.config.oauth_state_key,
    )?;

    let callback_url = format!("{}{}", state.config.api_url, CALLBACK_PATH);

    let auth_url = format!(
        "{}/authorize?client_id={}&redirect_uri={}&response_type=code&approval_prompt=auto&scope={}&state={}",
        state.config.strava_oauth_url,
        urlencoding::encode(&state.config.strava_client_id),
        urlencoding::encode(&callback_url),
        OAUTH_SCOPES,
        oauth_state
    );

    tracing::info!(frontend_url = %frontend_url, "Starting OAuth flow, redirecting to Strava");

    let jar = jar.add(nonce_cookie(nonce, &state.config));
    Ok((jar, Redirect::temporary(&auth_url)))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback - exchange code for tokens, create session.
async fn auth_callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Result<(CookieJar, Redirect)> {
    let now_ms = chrono::Utc::now().timestamp_millis();
    let verified = params
        .state
        .as_deref()
        .and_then(|s| verify_state(s, &state.config.oauth_state_key, now_ms))
        .ok_or_else(|| AppError::BadRequest("Invalid OAuth state".to_string()))?;

    let nonce_matches = jar
        .get(NONCE_COOKIE)
        .map(|c| bool::from(c.value().as_bytes().ct_eq(verified.nonce.as_bytes())))
        .unwrap_or(false);
    if !nonce_matches {
        tracing::warn!("OAuth nonce cookie missing or mismatched");
        return Err(AppError::BadRequest("Invalid OAuth state".to_string()));
    }

    let jar = jar.add(expired(nonce_cookie(String::new(), &state.config)));
    let frontend_url = verified.frontend_url;

    if let Some(error) = params.error {
        tracing::warn!(error = %error, "OAuth error from Strava");
        let redirect = format!("{}/?error={}", frontend_url, urlencoding::encode(&error));
        return Ok((jar, Redirect::temporary(&redirect)));
    }

    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing authorization code".to_string()))?;

    let oauth_result = match state.strava_service.handle_oauth_callback(&code).await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(error = %e, "OAuth code exchange failed");
            let redirect = format!("{}/?error=exchange_failed", frontend_url);
            return Ok((jar, Redirect::temporary(&redirect)));
        }
    };

    tracing::info!(athlete_id = oauth_result.athlete_id, "OAuth successful");

    let jwt = create_jwt(oauth_result.athlete_id, &state.config.jwt_signing_key)?;

    let jar = jar
        .add(session_cookie(jwt, &state.config))
        .add(logged_in_cookie("1".to_string(), &state.config));

    Ok((jar, Redirect::temporary(&format!("{}/dashboard", frontend_url))))
}

#[derive(Deserialize)]
pub struct LogoutParams {
    /// Also delete stored tokens and deauthorize the app on Strava.
    #[serde(default)]
    revoke: bool,
}

/// Clear the session. Always succeeds.
async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    jar: CookieJar,
    Query(params): Query<LogoutParams>,
) -> (CookieJar, StatusCode) {
    if params.revoke {
        let athlete_id = session_token(&jar, &headers)
            .and_then(|t| verify_jwt(&t, &state.config.jwt_signing_key));
        match athlete_id {
            Some(athlete_id) => {
                if let Err(e) = state.strava_service.revoke(athlete_id).await {
                    tracing::warn!(athlete_id, error = %e, "Failed to revoke Strava link on logout");
                }
            }
            None => tracing::debug!("Logout with revoke but no valid session"),
        }
    }

    let config = &state.config;
    let jar = jar
        .add(expired(session_cookie(String::new(), config)))
        .add(expired(logged_in_cookie(String::new(), config)))
        .add(expired(nonce_cookie(String::new(), config)));

    (jar, StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8] = b"secret_key";
    const NOW: i64 = 1_790_000_000_000;

    #[test]
    fn test_state_roundtrip() {
        let state = sign_state("https://cards.example.com", NOW, "abc123", KEY).unwrap();
        let verified = verify_state(&state, KEY, NOW + 1000).unwrap();

        assert_eq!(verified.frontend_url, "https://cards.example.com");
        assert_eq!(verified.nonce, "abc123");
        assert!(!state.contains('+') && !state.contains('/') && !state.contains('='));
    }

    #[test]
    fn test_state_wrong_key_or_tampered() {
        let state = sign_state("https://cards.example.com", NOW, "abc123", KEY).unwrap();
        assert_eq!(verify_state(&state, b"wrong_key", NOW), None);

        let decoded = String::from_utf8(URL_SAFE_NO_PAD.decode(&state).unwrap()).unwrap();
        let tampered = decoded.replace("cards.example.com", "evil.example.com");
        let tampered = URL_SAFE_NO_PAD.encode(tampered);
        assert_eq!(verify_state(&tampered, KEY, NOW), None);
    }

    #[test]
    fn test_state_age_limits() {
        let state = sign_state("http://localhost:5173", NOW, "n", KEY).unwrap();
        assert!(verify_state(&state, KEY, NOW + STATE_MAX_AGE_MS).is_some());
        assert!(verify_state(&state, KEY, NOW + STATE_MAX_AGE_MS + 1).is_none());
        assert!(verify_state(&state, KEY, NOW - 2 * STATE_FUTURE_SKEW_MS).is_none());
    }

    #[test]
    fn test_state_malformed() {
        assert_eq!(verify_state("not-valid-base64!!!", KEY, NOW), None);
        assert_eq!(verify_state(&URL_SAFE_NO_PAD.encode("a|b"), KEY, NOW), None);
        assert_eq!(verify_state("", KEY, NOW), None);
    }

    #[test]
    fn test_nonce_is_random_hex() {
        let a = generate_nonce().unwrap();
        let b = generate_nonce().unwrap();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_hint_cookie_domain() {
        let mut config = Config::test_default();
        assert_eq!(hint_cookie_domain(&config), None);

        config.frontend_url = "https://cards.example.com".to_string();
        assert_eq!(hint_cookie_domain(&config).as_deref(), Some("example.com"));

        config.frontend_url = "http://192.168.1.10:5173".to_string();
        assert_eq!(hint_cookie_domain(&config), None);
    }

    #[test]
    fn test_hint_cookie_domain_skips_public_suffixes() {
        let mut config = Config::test_default();

        config.frontend_url = "https://statcard.vercel.app".to_string();
        assert_eq!(hint_cookie_domain(&config), None);

        config.frontend_url = "https://statcard-abc123-uc.a.run.app".to_string();
        assert_eq!(hint_cookie_domain(&config), None);

        config.frontend_url = "https://cards.statcard.co.uk".to_string();
        assert_eq!(hint_cookie_domain(&config).as_deref(), Some("statcard.co.uk"));

        config.frontend_url = "https://statcard.co.uk".to_string();
        assert_eq!(hint_cookie_domain(&config).as_deref(), Some("statcard.co.uk"));

        config.frontend_url = "https://co.uk".to_string();
        assert_eq!(hint_cookie_domain(&config), None);
    }
}

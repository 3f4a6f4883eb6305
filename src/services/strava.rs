// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava API client and token lifecycle.
//!
//! Handles:
//! - OAuth code exchange, refresh and deauthorization
//! - Activity list and detail fetching
//! - Token refresh shortly before expiry
//! - Short-lived in-memory activity cache

use crate::config::Config;
use crate::error::AppError;
use crate::models::StravaActivity;
use serde::Deserialize;

/// Scopes requested at authorization and recorded with the stored tokens.
pub const OAUTH_SCOPES: &str = "read,activity:read_all,profile:read_all";

/// Page size used for the dashboard list.
pub const RECENT_ACTIVITIES_PER_PAGE: u32 = 30;

/// Strava API client.
#[derive(Clone)]
pub struct StravaClient {
    http: reqwest::Client,
    api_url: String,
    oauth_url: String,
    client_id: String,
    client_secret: String,
}

impl StravaClient {
    /// Create a new Strava client with OAuth credentials.
    pub fn new(client_id: String, client_secret: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: "https://www.strava.com/api/v3".to_string(),
            oauth_url: "https://www.strava.com/oauth".to_string(),
            client_id,
            client_secret,
        }
    }

    /// Point the client at different hosts (a mock server in tests).
    pub fn with_base_urls(mut self, api_url: &str, oauth_url: &str) -> Self {
        self.api_url = api_url.trim_end_matches('/').to_string();
        self.oauth_url = oauth_url.trim_end_matches('/').to_string();
        self
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.strava_client_id.clone(),
            config.strava_client_secret.clone(),
        )
        .with_base_urls(&config.strava_api_url, &config.strava_oauth_url)
    }

    /// Exchange an authorization code for tokens and the athlete profile.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenExchangeResponse, AppError> {
        let response = self
            .http
            .post(format!("{}/token", self.oauth_url))
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| AppError::StravaApi(format!("Token exchange failed: {}", e)))?;

        check_response_json(response).await
    }

    /// Refresh an expiring access token.
    pub async fn refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenRefreshResponse, AppError> {
        let response = self
            .http
            .post(format!("{}/token", self.oauth_url))
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| AppError::StravaApi(format!("Token refresh request failed: {}", e)))?;

        check_response_json(response).await
    }

    /// List the athlete's activities, newest first.
    pub async fn list_activities(
        &self,
        access_token: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<StravaActivity>, AppError> {
        let url = format!("{}/athlete/activities", self.api_url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .query(&[("page", page.to_string()), ("per_page", per_page.to_string())])
            .send()
            .await
            .map_err(|e| AppError::StravaApi(e.to_string()))?;

        check_response_json(response).await
    }

    /// Get a detailed activity by ID.
    pub async fn get_activity(
        &self,
        access_token: &str,
        activity_id: u64,
    ) -> Result<StravaActivity, AppError> {
        let url = format!("{}/activities/{}", self.api_url, activity_id);
        self.get_json(&url, access_token)
            .await
            .map_err(|e| match e {
                AppError::NotFound(_) => AppError::NotFound(format!("Activity {}", activity_id)),
                other => other,
            })
    }

    /// Get authenticated athlete profile.
    pub async fn get_athlete(&self, access_token: &str) -> Result<StravaAthlete, AppError> {
        let url = format!("{}/athlete", self.api_url);
        self.get_json(&url, access_token).await
    }

    /// Deauthorize the application for a user.
    ///
    /// Invalidates all access and refresh tokens for the athlete and removes
    /// the app from their Strava settings.
    pub async fn deauthorize(&self, access_token: &str) -> Result<(), AppError> {
        let response = self
            .http
            .post(format!("{}/deauthorize", self.oauth_url))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::StravaApi(format!("Deauthorization request failed: {}", e)))?;

        check_response(response).await?;
        tracing::info!("Strava deauthorization successful");
        Ok(())
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        access_token: &str,
    ) -> Result<T, AppError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::StravaApi(e.to_string()))?;

        check_response_json(response).await
    }
}

/// Map a non-success status to the matching error.
async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status.as_u16() {
        429 => {
            tracing::warn!("Strava rate limit hit (429)");
            Err(AppError::StravaApi(AppError::STRAVA_RATE_LIMIT.to_string()))
        }
        401 => Err(AppError::StravaApi(
            AppError::STRAVA_TOKEN_ERROR.to_string(),
        )),
        404 => Err(AppError::NotFound("Strava resource".to_string())),
        _ => {
            let body = response.text().await.unwrap_or_default();
            Err(AppError::StravaApi(format!("HTTP {}: {}", status, body)))
        }
    }
}

async fn check_response_json<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, AppError> {
    check_response(response)
        .await?
        .json()
        .await
        .map_err(|e| AppError::StravaApi(format!("JSON parse error: {}", e)))
}

/// Token refresh response from Strava.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenRefreshResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
}

/// Token exchange response from Strava OAuth (includes athlete info).
#[derive(Debug, Clone, Deserialize)]
pub struct TokenExchangeResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
    pub athlete: StravaAthlete,
}

/// Athlete profile as Strava reports it.
#[derive(Debug, Clone, Deserialize)]
pub struct StravaAthlete {
    pub id: u64,
    #[serde(default)]
    pub firstname: Option<String>,
    #[serde(default)]
    pub lastname: Option<String>,
    #[serde(default)]
    pub profile: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// StravaService - High-level service with token management
// ─────────────────────────────────────────────────────────────────────────────

use crate::db::FirestoreDb;
use crate::models::{User, UserTokens};
use crate::time_utils::{format_utc_rfc3339, unix_now};
use dashmap::DashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Margin before token expiration when we proactively refresh (5 minutes).
pub const TOKEN_REFRESH_MARGIN_SECS: i64 = 5 * 60;

/// True when a token expiring at `expires_at` must be refreshed at `now`
/// (both Unix seconds).
pub fn needs_refresh(expires_at: i64, now: i64) -> bool {
    now + TOKEN_REFRESH_MARGIN_SECS > expires_at
}

/// Cached access token with expiry information.
#[derive(Clone)]
pub struct CachedToken {
    access_token: String,
    expires_at: i64,
}

/// Shared token cache type.
pub type TokenCache = Arc<DashMap<u64, CachedToken>>;

/// Shared refresh locks type.
pub type RefreshLocks = Arc<DashMap<u64, Arc<Mutex<()>>>>;

struct Cached<T> {
    value: T,
    fetched_at: Instant,
}

/// Recently fetched activities, per athlete.
///
/// Only successful fetches are stored. A zero TTL disables caching.
/// Stale entries are dropped when read and swept on every store.
pub struct ActivityCache {
    ttl: Duration,
    lists: DashMap<u64, Cached<Vec<StravaActivity>>>,
    details: DashMap<(u64, u64), Cached<StravaActivity>>,
}

impl ActivityCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            lists: DashMap::new(),
            details: DashMap::new(),
        }
    }

    fn is_fresh<T>(&self, entry: &Cached<T>) -> bool {
        entry.fetched_at.elapsed() < self.ttl
    }

    fn lookup<K: Eq + Hash, T: Clone>(&self, map: &DashMap<K, Cached<T>>, key: &K) -> Option<T> {
        // The read guard must be gone before `remove_if` takes the shard lock.
        let hit = map
            .get(key)
            .and_then(|e| self.is_fresh(e.value()).then(|| e.value().value.clone()));
        if hit.is_none() {
            map.remove_if(key, |_, e| !self.is_fresh(e));
        }
        hit
    }

    pub fn list(&self, athlete_id: u64) -> Option<Vec<StravaActivity>> {
        self.lookup(&self.lists, &athlete_id)
    }

    pub fn store_list(&self, athlete_id: u64, activities: Vec<StravaActivity>) {
        if self.ttl.is_zero() {
            return;
        }
        self.lists.retain(|_, e| self.is_fresh(e));
        self.lists.insert(
            athlete_id,
            Cached {
                value: activities,
                fetched_at: Instant::now(),
            },
        );
    }

    pub fn detail(&self, athlete_id: u64, activity_id: u64) -> Option<StravaActivity> {
        self.lookup(&self.details, &(athlete_id, activity_id))
    }

    pub fn store_detail(&self, athlete_id: u64, activity: StravaActivity) {
        if self.ttl.is_zero() {
            return;
        }
        self.details.retain(|_, e| self.is_fresh(e));
        self.details.insert(
            (athlete_id, activity.id),
            Cached {
                value: activity,
                fetched_at: Instant::now(),
            },
        );
    }

    pub fn evict(&self, athlete_id: u64) {
        self.lists.remove(&athlete_id);
        self.details.retain(|(athlete, _), _| *athlete != athlete_id);
    }
}

/// High-level Strava service that manages token lifecycle and API calls.
///
/// This service encapsulates:
/// - Token retrieval from the store and in-memory caching
/// - Automatic token refresh when expiring (with 5-minute margin)
/// - Per-user locking to prevent duplicate refresh calls
/// - Activity caching
#[derive(Clone)]
pub struct StravaService {
    client: StravaClient,
    db: FirestoreDb,
    token_cache: TokenCache,
    refresh_locks: RefreshLocks,
    activity_cache: Arc<ActivityCache>,
}

impl StravaService {
    pub fn new(client: StravaClient, db: FirestoreDb, activity_cache_ttl: Duration) -> Self {
        Self {
            client,
            db,
            token_cache: Arc::new(DashMap::new()),
            refresh_locks: Arc::new(DashMap::new()),
            activity_cache: Arc::new(ActivityCache::new(activity_cache_ttl)),
        }
    }

    pub fn from_config(config: &Config, db: FirestoreDb) -> Self {
        Self::new(
            StravaClient::from_config(config),
            db,
            Duration::from_secs(config.activity_cache_ttl_secs),
        )
    }

    // ─── Token Management ────────────────────────────────────────────────────

    /// Get a valid (non-expiring) access token for the given athlete.
    ///
    /// 1. Check in-memory cache (no I/O)
    /// 2. Acquire per-user lock and re-check the cache
    /// 3. Load tokens from the store
    /// 4. Refresh with Strava if within the margin, then persist
    pub async fn get_valid_access_token(&self, athlete_id: u64) -> Result<String, AppError> {
        if let Some(token) = self.cached_token(athlete_id) {
            return Ok(token);
        }

        let lock = self
            .refresh_locks
            .entry(athlete_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let _guard = lock.lock().await;

        // Another task may have refreshed while we were waiting.
        if let Some(token) = self.cached_token(athlete_id) {
            return Ok(token);
        }

        let tokens = self.db.get_tokens(athlete_id).await?.ok_or_else(|| {
            AppError::NotFound(format!("No Strava account linked for athlete {}", athlete_id))
        })?;

        if !needs_refresh(tokens.expires_at, unix_now()) {
            self.cache_token(athlete_id, &tokens.access_token, tokens.expires_at);
            return Ok(tokens.access_token);
        }

        tracing::info!(athlete_id, "Access token expiring, refreshing");

        // If another instance already refreshed, Strava rejects the old
        // refresh token; the winner's pair is in the store.
        let refreshed = match self.client.refresh_token(&tokens.refresh_token).await {
            Ok(t) => t,
            Err(AppError::StravaApi(ref msg)) if msg.contains("invalid_grant") => {
                tracing::info!(athlete_id, "Refresh token already rotated, reloading from store");
                return self.reload_from_db(athlete_id).await;
            }
            Err(e) => {
                tracing::warn!(athlete_id, error = %e, "Token refresh failed");
                return Err(e);
            }
        };

        let updated = UserTokens {
            access_token: refreshed.access_token,
            refresh_token: refreshed.refresh_token,
            expires_at: refreshed.expires_at,
            scopes: tokens.scopes,
        };
        self.db.set_tokens(athlete_id, &updated).await?;
        self.cache_token(athlete_id, &updated.access_token, updated.expires_at);

        tracing::info!(athlete_id, expires_at = updated.expires_at, "Token refreshed");
        Ok(updated.access_token)
    }

    fn cached_token(&self, athlete_id: u64) -> Option<String> {
        self.token_cache
            .get(&athlete_id)
            .filter(|cached| !needs_refresh(cached.expires_at, unix_now()))
            .map(|cached| cached.access_token.clone())
    }

    fn cache_token(&self, athlete_id: u64, access_token: &str, expires_at: i64) {
        self.token_cache.insert(
            athlete_id,
            CachedToken {
                access_token: access_token.to_string(),
                expires_at,
            },
        );
    }

    async fn reload_from_db(&self, athlete_id: u64) -> Result<String, AppError> {
        let tokens = self
            .db
            .get_tokens(athlete_id)
            .await?
            .filter(|t| !needs_refresh(t.expires_at, unix_now()))
            .ok_or_else(|| AppError::StravaApi(AppError::STRAVA_TOKEN_ERROR.to_string()))?;

        self.cache_token(athlete_id, &tokens.access_token, tokens.expires_at);
        Ok(tokens.access_token)
    }

    /// Drop a cached token Strava rejected so the next call reloads it.
    fn forget_rejected_token(&self, athlete_id: u64, err: &AppError) {
        if err.is_strava_token_error() {
            self.token_cache.remove(&athlete_id);
        }
    }

    // ─── OAuth Callback Handling ─────────────────────────────────────────────

    /// Exchange the code, store the athlete's profile and tokens.
    pub async fn handle_oauth_callback(&self, code: &str) -> Result<OAuthResult, AppError> {
        let exchange = self.client.exchange_code(code).await?;
        let athlete = exchange.athlete;
        let athlete_id = athlete.id;
        let now = format_utc_rfc3339(chrono::Utc::now());

        let created_at = match self.db.get_user(athlete_id).await {
            Ok(Some(existing)) => existing.created_at,
            Ok(None) => now.clone(),
            Err(e) => {
                tracing::warn!(athlete_id, error = %e, "Failed to load existing user");
                now.clone()
            }
        };

        let user = User {
            strava_athlete_id: athlete_id,
            firstname: athlete.firstname.unwrap_or_default(),
            lastname: athlete.lastname.unwrap_or_default(),
            profile_picture: athlete.profile,
            created_at,
            last_active: now,
        };

        if let Err(e) = self.db.upsert_user(&user).await {
            tracing::warn!(error = %e, "Failed to store user profile, continuing anyway");
        }

        let tokens = UserTokens {
            access_token: exchange.access_token,
            refresh_token: exchange.refresh_token,
            expires_at: exchange.expires_at,
            scopes: OAUTH_SCOPES.split(',').map(str::to_string).collect(),
        };
        self.db.set_tokens(athlete_id, &tokens).await?;
        self.cache_token(athlete_id, &tokens.access_token, tokens.expires_at);
        self.activity_cache.evict(athlete_id);

        tracing::info!(athlete_id, "OAuth callback handled, user and tokens stored");

        Ok(OAuthResult {
            athlete_id,
            firstname: user.firstname,
            lastname: user.lastname,
        })
    }

    // ─── API Wrappers ────────────────────────────────────────────────────────

    /// The athlete's latest activities for the dashboard.
    ///
    /// Never fails: any problem is logged and yields an empty list.
    pub async fn recent_activities(&self, athlete_id: u64) -> Vec<StravaActivity> {
        if let Some(cached) = self.activity_cache.list(athlete_id) {
            return cached;
        }

        match self.fetch_recent_activities(athlete_id).await {
            Ok(activities) => {
                tracing::debug!(athlete_id, count = activities.len(), "Fetched activities");
                self.activity_cache.store_list(athlete_id, activities.clone());
                activities
            }
            Err(e) => {
                tracing::warn!(athlete_id, error = %e, "Failed to fetch activities");
                Vec::new()
            }
        }
    }

    async fn fetch_recent_activities(&self, athlete_id: u64) -> Result<Vec<StravaActivity>, AppError> {
        let access_token = self.get_valid_access_token(athlete_id).await?;
        self.client
            .list_activities(&access_token, 1, RECENT_ACTIVITIES_PER_PAGE)
            .await
            .inspect_err(|e| self.forget_rejected_token(athlete_id, e))
    }

    /// Get a detailed activity by ID.
    pub async fn get_activity(
        &self,
        athlete_id: u64,
        activity_id: u64,
    ) -> Result<StravaActivity, AppError> {
        if let Some(cached) = self.activity_cache.detail(athlete_id, activity_id) {
            return Ok(cached);
        }

        let access_token = self.get_valid_access_token(athlete_id).await?;
        let activity = self
            .client
            .get_activity(&access_token, activity_id)
            .await
            .inspect_err(|e| self.forget_rejected_token(athlete_id, e))?;

        self.activity_cache.store_detail(athlete_id, activity.clone());
        Ok(activity)
    }

    /// Forget the athlete's Strava link.
    ///
    /// Tokens are deleted from the store first; Strava deauthorization is
    /// best effort. Returns `false` when nothing was linked.
    pub async fn revoke(&self, athlete_id: u64) -> Result<bool, AppError> {
        let tokens = self.db.get_tokens(athlete_id).await?;
        self.db.delete_tokens(athlete_id).await?;
        self.token_cache.remove(&athlete_id);
        self.activity_cache.evict(athlete_id);

        let Some(tokens) = tokens else {
            return Ok(false);
        };

        let mut access_token = tokens.access_token;
        if needs_refresh(tokens.expires_at, unix_now()) {
            match self.client.refresh_token(&tokens.refresh_token).await {
                Ok(refreshed) => access_token = refreshed.access_token,
                Err(e) => {
                    tracing::warn!(athlete_id, error = %e, "Refresh before deauthorization failed");
                }
            }
        }

        if let Err(e) = self.client.deauthorize(&access_token).await {
            tracing::warn!(athlete_id, error = %e, "Strava deauthorization failed (ignored)");
        }

        tracing::info!(athlete_id, "Strava link revoked");
        Ok(true)
    }
}

/// Result of handling OAuth callback.
#[derive(Debug, Clone)]
pub struct OAuthResult {
    pub athlete_id: u64,
    pub firstname: String,
    pub lastname: String,
}
